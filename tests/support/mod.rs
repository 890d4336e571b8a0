#![allow(dead_code)]

use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::service::Service;
use hyper::{Method, Request, Response};
use ranger::{RequestService, RequestServiceBuilder, Router};
use std::net::SocketAddr;

pub struct Serve {
    service: RequestService,
}

impl Serve {
    pub fn new_request(&self, method: Method, route: &str) -> http::request::Builder {
        Request::builder().method(method).uri(route)
    }

    pub async fn send(&self, req: Request<Full<Bytes>>) -> Response<Full<Bytes>> {
        self.service.call(req).await.unwrap()
    }

    pub async fn request(&self, method: Method, route: &str) -> Response<Full<Bytes>> {
        let req = self.new_request(method, route).body(Full::new(Bytes::new())).unwrap();
        self.send(req).await
    }
}

pub fn serve(router: Router) -> Serve {
    let remote_addr: SocketAddr = "127.0.0.1:41000".parse().unwrap();
    let service = RequestServiceBuilder::new(router).build(remote_addr);
    Serve { service }
}

pub async fn into_text<B>(body: B) -> String
where
    B: hyper::body::Body<Data = Bytes> + Send,
    B::Error: std::error::Error + Send + Sync + 'static,
{
    String::from_utf8_lossy(&body.collect().await.unwrap().to_bytes()).to_string()
}

pub fn header<'a>(res: &'a Response<Full<Bytes>>, name: &str) -> Option<&'a str> {
    res.headers().get(name).and_then(|v| v.to_str().ok())
}

pub fn method_set(listing: &str) -> Vec<String> {
    let mut methods = listing.split(", ").map(str::to_owned).collect::<Vec<_>>();
    methods.sort();
    methods
}

pub fn sorted(methods: &[&str]) -> Vec<String> {
    let mut methods = methods.iter().map(|m| m.to_string()).collect::<Vec<_>>();
    methods.sort();
    methods
}
