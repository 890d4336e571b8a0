use crate::helpers;
use crate::types::RouteParams;
use hyper::{Method, Request};
use lazy_static::lazy_static;
use std::net::SocketAddr;

lazy_static! {
    static ref EMPTY_PARAMS: RouteParams = RouteParams::new();
}

/// A extension trait which extends the [`hyper::Request`](https://docs.rs/hyper/1/hyper/struct.Request.html) type
/// with the request-scoped data the router attaches for transport-convention handlers and middlewares.
///
/// # Examples
///
/// ```
/// use http_body_util::Full;
/// use hyper::body::Bytes;
/// use hyper::{Request, Response};
/// use ranger::prelude::*;
/// use ranger::Router;
/// use std::convert::Infallible;
///
/// async fn user_handler(req: Request<Full<Bytes>>) -> Result<Response<Full<Bytes>>, Infallible> {
///     let user_id = req.param("userId").cloned().unwrap_or_default();
///     Ok(Response::new(Full::new(Bytes::from(format!("Hello {}", user_id)))))
/// }
///
/// let router = Router::builder().get_raw("/users/:userId", user_handler).build().unwrap();
/// # let _ = router;
/// ```
pub trait RequestExt {
    /// It returns the route parameters as [RouteParams](../struct.RouteParams.html) type with the name of the parameter specified in the path as their respective keys.
    fn params(&self) -> &RouteParams;

    /// This method is used to access a specific route parameter value.
    fn param<P: AsRef<str>>(&self, param_name: P) -> Option<&String>;

    /// It returns the remote address of the incoming request, when the request came through a
    /// [RouterService](../struct.RouterService.html).
    fn remote_addr(&self) -> Option<SocketAddr>;

    /// The methods registered at the request path, as published by the router for the matched route.
    fn allowed_methods(&self) -> &[Method];
}

impl<T> RequestExt for Request<T> {
    fn params(&self) -> &RouteParams {
        helpers::req_meta(self.extensions())
            .and_then(|meta| meta.route_params())
            .unwrap_or(&*EMPTY_PARAMS)
    }

    fn param<P: AsRef<str>>(&self, param_name: P) -> Option<&String> {
        self.params().get(param_name)
    }

    fn remote_addr(&self) -> Option<SocketAddr> {
        helpers::req_meta(self.extensions()).and_then(|meta| meta.remote_addr())
    }

    fn allowed_methods(&self) -> &[Method] {
        helpers::req_meta(self.extensions())
            .and_then(|meta| meta.allowed_methods())
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RequestMeta;

    #[test]
    fn should_read_request_meta() {
        let mut params = RouteParams::new();
        params.set("id", "7");

        let mut req = Request::new(());
        helpers::update_req_meta_in_extensions(
            req.extensions_mut(),
            RequestMeta::with_route_params(params).with_allowed_methods(vec![Method::GET, Method::OPTIONS]),
        );
        helpers::update_req_meta_in_extensions(
            req.extensions_mut(),
            RequestMeta::with_remote_addr("127.0.0.1:9000".parse().unwrap()),
        );

        assert_eq!(req.param("id").unwrap(), "7");
        assert_eq!(req.allowed_methods(), &[Method::GET, Method::OPTIONS]);
        assert_eq!(req.remote_addr().unwrap().port(), 9000);
    }

    #[test]
    fn should_default_without_request_meta() {
        let req = Request::new(());
        assert!(req.params().is_empty());
        assert!(req.param("id").is_none());
        assert!(req.allowed_methods().is_empty());
        assert!(req.remote_addr().is_none());
    }
}
