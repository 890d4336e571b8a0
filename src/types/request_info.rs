use crate::helpers;
use hyper::{HeaderMap, Method, Request, Uri, Version};
use std::net::SocketAddr;

/// Represents some information for the incoming request.
///
/// It's used to access request information e.g. headers, method, uri etc for the [Post Middleware](./index.html#middleware)
/// registered with [`Middleware::post_with_info`](./enum.Middleware.html#method.post_with_info).
#[derive(Debug, Clone)]
pub struct RequestInfo {
    headers: HeaderMap,
    method: Method,
    uri: Uri,
    version: Version,
    remote_addr: Option<SocketAddr>,
}

impl RequestInfo {
    pub(crate) fn new_from_req<T>(req: &Request<T>) -> Self {
        RequestInfo {
            headers: req.headers().clone(),
            method: req.method().clone(),
            uri: req.uri().clone(),
            version: req.version(),
            remote_addr: helpers::req_meta(req.extensions()).and_then(|meta| meta.remote_addr()),
        }
    }

    /// Returns the request headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the request method type.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request uri.
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Returns the request's HTTP version.
    pub fn version(&self) -> Version {
        self.version
    }

    /// Returns the remote address of the connection, when the request came through a
    /// [`RouterService`](./struct.RouterService.html).
    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }
}
