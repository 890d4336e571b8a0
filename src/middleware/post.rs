use crate::types::RequestInfo;
use crate::RouteError;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use std::fmt::{self, Debug, Formatter};
use std::future::Future;
use std::pin::Pin;

type HandlerWithoutInfo = Box<dyn Fn(Response<Full<Bytes>>) -> HandlerReturn + Send + Sync + 'static>;
type HandlerWithInfo = Box<dyn Fn(Response<Full<Bytes>>, RequestInfo) -> HandlerReturn + Send + Sync + 'static>;
type HandlerReturn = Box<dyn Future<Output = Result<Response<Full<Bytes>>, RouteError>> + Send + 'static>;

/// The post middleware type. Refer to [Post Middleware](./index.html#middleware) for more info.
pub struct PostMiddleware {
    handler: Handler,
}

enum Handler {
    WithoutInfo(HandlerWithoutInfo),
    WithInfo(HandlerWithInfo),
}

impl PostMiddleware {
    /// Creates a post middleware with a handler.
    ///
    /// # Examples
    ///
    /// ```
    /// use ranger::{Middleware, PostMiddleware, Router};
    /// use std::convert::Infallible;
    ///
    /// let router = Router::builder()
    ///     .middleware(Middleware::Post(PostMiddleware::new(|res| async move {
    ///         /* Do some operations */
    ///         Ok::<_, Infallible>(res)
    ///     })))
    ///     .build()
    ///     .unwrap();
    /// # let _ = router;
    /// ```
    pub fn new<H, R, E>(handler: H) -> PostMiddleware
    where
        H: Fn(Response<Full<Bytes>>) -> R + Send + Sync + 'static,
        R: Future<Output = Result<Response<Full<Bytes>>, E>> + Send + 'static,
        E: Into<RouteError> + 'static,
    {
        let handler: HandlerWithoutInfo = Box::new(move |res| {
            let fut = handler(res);
            Box::new(async move { fut.await.map_err(Into::into) })
        });
        PostMiddleware {
            handler: Handler::WithoutInfo(handler),
        }
    }

    /// Creates a post middleware which can access [request info](./struct.RequestInfo.html) e.g. headers, method, uri etc.
    ///
    /// # Examples
    ///
    /// ```
    /// use http_body_util::Full;
    /// use hyper::{body::Bytes, Response};
    /// use ranger::{Middleware, PostMiddleware, RequestInfo, Router};
    /// use std::convert::Infallible;
    ///
    /// async fn post_middleware_with_info_handler(
    ///     res: Response<Full<Bytes>>,
    ///     req_info: RequestInfo,
    /// ) -> Result<Response<Full<Bytes>>, Infallible> {
    ///     let _headers = req_info.headers();
    ///
    ///     // Do some response transformation based on the request headers, method etc.
    ///
    ///     Ok(res)
    /// }
    ///
    /// let router = Router::builder()
    ///     .middleware(Middleware::Post(PostMiddleware::new_with_info(post_middleware_with_info_handler)))
    ///     .build()
    ///     .unwrap();
    /// # let _ = router;
    /// ```
    pub fn new_with_info<H, R, E>(handler: H) -> PostMiddleware
    where
        H: Fn(Response<Full<Bytes>>, RequestInfo) -> R + Send + Sync + 'static,
        R: Future<Output = Result<Response<Full<Bytes>>, E>> + Send + 'static,
        E: Into<RouteError> + 'static,
    {
        let handler: HandlerWithInfo = Box::new(move |res, req_info| {
            let fut = handler(res, req_info);
            Box::new(async move { fut.await.map_err(Into::into) })
        });
        PostMiddleware {
            handler: Handler::WithInfo(handler),
        }
    }

    pub(crate) fn should_require_req_info(&self) -> bool {
        matches!(self.handler, Handler::WithInfo(_))
    }

    pub(crate) async fn process(
        &self,
        res: Response<Full<Bytes>>,
        req_info: Option<RequestInfo>,
    ) -> Result<Response<Full<Bytes>>, RouteError> {
        match (&self.handler, req_info) {
            (Handler::WithoutInfo(handler), _) => Pin::from(handler(res)).await,
            (Handler::WithInfo(handler), Some(req_info)) => Pin::from(handler(res, req_info)).await,
            (Handler::WithInfo(_), None) => Err("No RequestInfo is provided to the post middleware".into()),
        }
    }
}

impl Debug for PostMiddleware {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "PostMiddleware {{ with_info: {} }}", self.should_require_req_info())
    }
}
