use crate::types::RequestInfo;
use crate::RouteError;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Request, Response};
use std::future::Future;

pub use self::around::{AroundMiddleware, Next};
pub use self::post::PostMiddleware;
pub use self::pre::PreMiddleware;
pub use self::trace::trace;

mod around;
mod post;
mod pre;
mod trace;

/// Enum type for all the middleware types. Please refer to the [Middleware](./index.html#middleware) for more info.
///
/// Every middleware wraps the rest of the chain: the first registered middleware is the outermost one, so
/// it sees the request first and the response last. Router-wide middleware of a parent router wraps the
/// middleware of its sub-routers, and route-level middleware is the innermost.
#[derive(Debug)]
pub enum Middleware {
    /// Variant for the pre middleware. Refer to [Pre Middleware](./index.html#middleware) for more info.
    Pre(PreMiddleware),

    /// Variant for the post middleware. Refer to [Post Middleware](./index.html#middleware) for more info.
    Post(PostMiddleware),

    /// Variant for the middleware wrapping the rest of the chain, see [`Middleware::around`](#method.around).
    Around(AroundMiddleware),
}

impl Middleware {
    /// Creates a pre middleware, which transforms the request before the rest of the chain runs.
    ///
    /// # Examples
    ///
    /// ```
    /// use ranger::{Middleware, Router};
    /// use std::convert::Infallible;
    ///
    /// let router = Router::builder()
    ///     .middleware(Middleware::pre(|req| async move {
    ///         /* Do some operations */
    ///         Ok::<_, Infallible>(req)
    ///     }))
    ///     .build()
    ///     .unwrap();
    /// # let _ = router;
    /// ```
    pub fn pre<H, R, E>(handler: H) -> Middleware
    where
        H: Fn(Request<Full<Bytes>>) -> R + Send + Sync + 'static,
        R: Future<Output = Result<Request<Full<Bytes>>, E>> + Send + 'static,
        E: Into<RouteError> + 'static,
    {
        Middleware::Pre(PreMiddleware::new(handler))
    }

    /// Creates a post middleware, which transforms the response produced by the rest of the chain.
    ///
    /// The payload of a context-convention handler is already serialized as JSON when the middleware gets
    /// the response.
    ///
    /// # Examples
    ///
    /// ```
    /// use hyper::header::HeaderValue;
    /// use ranger::{Middleware, Router};
    /// use std::convert::Infallible;
    ///
    /// let router = Router::builder()
    ///     .middleware(Middleware::post(|mut res| async move {
    ///         res.headers_mut().insert("x-powered-by", HeaderValue::from_static("ranger"));
    ///         Ok::<_, Infallible>(res)
    ///     }))
    ///     .build()
    ///     .unwrap();
    /// # let _ = router;
    /// ```
    pub fn post<H, R, E>(handler: H) -> Middleware
    where
        H: Fn(Response<Full<Bytes>>) -> R + Send + Sync + 'static,
        R: Future<Output = Result<Response<Full<Bytes>>, E>> + Send + 'static,
        E: Into<RouteError> + 'static,
    {
        Middleware::Post(PostMiddleware::new(handler))
    }

    /// Creates a post middleware which can access [request info](./struct.RequestInfo.html) e.g. headers, method, uri etc. It should be used when the post middleware transforms the response based on
    /// the request information.
    pub fn post_with_info<H, R, E>(handler: H) -> Middleware
    where
        H: Fn(Response<Full<Bytes>>, RequestInfo) -> R + Send + Sync + 'static,
        R: Future<Output = Result<Response<Full<Bytes>>, E>> + Send + 'static,
        E: Into<RouteError> + 'static,
    {
        Middleware::Post(PostMiddleware::new_with_info(handler))
    }

    /// Creates a middleware which receives the request together with the rest of the chain.
    ///
    /// It decides whether and when to call [`Next::run`], so it can act before and after the inner chain or
    /// answer the request on its own without calling it.
    ///
    /// # Examples
    ///
    /// ```
    /// use http_body_util::Full;
    /// use hyper::body::Bytes;
    /// use hyper::{Response, StatusCode};
    /// use ranger::{Middleware, RouteError, Router};
    ///
    /// let router = Router::builder()
    ///     .middleware(Middleware::around(|req, next| async move {
    ///         if req.headers().contains_key("x-api-key") {
    ///             return next.run(req).await;
    ///         }
    ///         let mut res = Response::new(Full::new(Bytes::new()));
    ///         *res.status_mut() = StatusCode::UNAUTHORIZED;
    ///         Ok::<_, RouteError>(res)
    ///     }))
    ///     .build()
    ///     .unwrap();
    /// # let _ = router;
    /// ```
    pub fn around<H, R, E>(handler: H) -> Middleware
    where
        H: Fn(Request<Full<Bytes>>, Next) -> R + Send + Sync + 'static,
        R: Future<Output = Result<Response<Full<Bytes>>, E>> + Send + 'static,
        E: Into<RouteError> + 'static,
    {
        Middleware::Around(AroundMiddleware::new(handler))
    }

    pub(crate) async fn process(
        &self,
        req: Request<Full<Bytes>>,
        next: Next,
    ) -> Result<Response<Full<Bytes>>, RouteError> {
        match self {
            Middleware::Pre(pre) => {
                let req = pre.process(req).await?;
                next.run(req).await
            }
            Middleware::Post(post) => {
                let req_info = if post.should_require_req_info() {
                    Some(RequestInfo::new_from_req(&req))
                } else {
                    None
                };

                let res = next.run(req).await?;
                post.process(res, req_info).await
            }
            Middleware::Around(around) => around.process(req, next).await,
        }
    }
}
