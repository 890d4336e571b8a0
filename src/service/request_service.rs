use crate::error::ErrorResponse;
use crate::helpers;
use crate::router::Router;
use crate::types::RequestMeta;
use crate::Error;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Bytes};
use hyper::{service::Service, Request, Response, StatusCode};
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;

/// The per-connection hyper service dispatching requests to a shared [Router](./struct.Router.html).
///
/// Request bodies are collected before dispatch, up to the optional size limit. The service never fails:
/// every outcome, including routing failures and unhandled errors, is a response.
#[derive(Debug)]
pub struct RequestService {
    pub(crate) router: Arc<Router>,
    pub(crate) remote_addr: SocketAddr,
    pub(crate) max_body_size: Option<usize>,
}

impl<B> Service<Request<B>> for RequestService
where
    B: Body + Send + 'static,
    B::Data: Send,
    B::Error: Into<crate::RouteError>,
{
    type Response = Response<Full<Bytes>>;
    type Error = crate::RouteError;
    #[allow(clippy::type_complexity)]
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<B>) -> Self::Future {
        let router = self.router.clone();
        let remote_addr = self.remote_addr;
        let max_body_size = self.max_body_size;

        let fut = async move {
            let (mut parts, body) = req.into_parts();

            let collected = match max_body_size {
                Some(limit) => Limited::new(body, limit).collect().await,
                None => body.collect().await.map_err(Into::into),
            };

            let body = match collected {
                Ok(collected) => collected.to_bytes(),
                Err(err) if err.is::<LengthLimitError>() => {
                    tracing::debug!(limit = max_body_size, "request body exceeds the size limit");
                    return Ok(ErrorResponse::from_status(StatusCode::PAYLOAD_TOO_LARGE, err.to_string()).into_response());
                }
                Err(err) => {
                    let err = Error::Body(err);
                    tracing::debug!(error = %err, "couldn't collect the request body");
                    return Ok(ErrorResponse::from_status(StatusCode::BAD_REQUEST, err.to_string()).into_response());
                }
            };

            helpers::update_req_meta_in_extensions(&mut parts.extensions, RequestMeta::with_remote_addr(remote_addr));

            let req = Request::from_parts(parts, Full::new(body));
            Ok(router.process(req).await)
        };

        Box::pin(fut)
    }
}

/// Creates a [RequestService](./struct.RequestService.html) for each connection, sharing one router.
#[derive(Debug, Clone)]
pub struct RequestServiceBuilder {
    router: Arc<Router>,
    max_body_size: Option<usize>,
}

impl RequestServiceBuilder {
    /// Wraps a built router. Request bodies are not limited in size.
    pub fn new(router: Router) -> RequestServiceBuilder {
        RequestServiceBuilder {
            router: Arc::new(router),
            max_body_size: None,
        }
    }

    /// Limits request bodies to `limit` bytes. Larger bodies are answered with `413 Payload Too Large`
    /// without reaching the router.
    pub fn max_body_size(mut self, limit: usize) -> RequestServiceBuilder {
        self.max_body_size = Some(limit);
        self
    }

    /// Creates the service for a connection from `remote_addr`.
    pub fn build(&self, remote_addr: SocketAddr) -> RequestService {
        RequestService {
            router: self.router.clone(),
            remote_addr,
            max_body_size: self.max_body_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;
    use crate::{RequestServiceBuilder, Router};
    use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
    use hyper::body::Bytes;
    use hyper::service::Service;
    use hyper::{Method, Request, Response, StatusCode};
    use std::convert::Infallible;
    use std::net::SocketAddr;
    use std::str::FromStr;

    #[tokio::test]
    async fn should_route_request() {
        const RESPONSE_TEXT: &str = "Hello world!";
        let remote_addr = SocketAddr::from_str("10.0.0.7:8080").unwrap();
        let router = Router::builder()
            .post_raw("/", |req: Request<Full<Bytes>>| async move {
                let addr = req.remote_addr().map(|a| a.to_string()).unwrap_or_default();
                let body = req.into_body().collect().await.unwrap().to_bytes();
                let text = format!("{} {}", String::from_utf8_lossy(&body), addr);
                Ok::<_, Infallible>(Response::new(Full::new(Bytes::from(text))))
            })
            .build()
            .unwrap();
        let req = Request::builder()
            .method(Method::POST)
            .uri("/")
            .body(Full::new(Bytes::from(RESPONSE_TEXT)))
            .unwrap();

        let builder = RequestServiceBuilder::new(router);
        let service = builder.build(remote_addr);

        let resp: Response<Full<Bytes>> = service.call(req).await.unwrap();
        let body_bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let body = String::from_utf8(body_bytes.to_vec()).unwrap();
        assert_eq!(format!("{} 10.0.0.7:8080", RESPONSE_TEXT), body)
    }

    #[tokio::test]
    async fn should_reject_bodies_over_the_limit() {
        let router = Router::builder()
            .post_raw("/", |req: Request<Full<Bytes>>| async move {
                let body = req.into_body().collect().await.unwrap().to_bytes();
                Ok::<_, Infallible>(Response::new(Full::new(body)))
            })
            .build()
            .unwrap();
        let service = RequestServiceBuilder::new(router)
            .max_body_size(4)
            .build(SocketAddr::from(([127, 0, 0, 1], 0)));

        let req = Request::builder()
            .method(Method::POST)
            .uri("/")
            .body(Full::new(Bytes::from("too long")))
            .unwrap();
        let resp: Response<Full<Bytes>> = service.call(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);

        let req = Request::builder()
            .method(Method::POST)
            .uri("/")
            .body(Full::new(Bytes::from("ok")))
            .unwrap();
        let resp: Response<Full<Bytes>> = service.call(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"ok");
    }
}
