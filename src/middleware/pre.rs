use crate::RouteError;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Request;
use std::fmt::{self, Debug, Formatter};
use std::future::Future;
use std::pin::Pin;

type Handler = Box<dyn Fn(Request<Full<Bytes>>) -> HandlerReturn + Send + Sync + 'static>;
type HandlerReturn = Box<dyn Future<Output = Result<Request<Full<Bytes>>, RouteError>> + Send + 'static>;

/// The pre middleware type. Refer to [Pre Middleware](./index.html#middleware) for more info.
pub struct PreMiddleware {
    handler: Handler,
}

impl PreMiddleware {
    /// Creates a pre middleware with a handler.
    ///
    /// # Examples
    ///
    /// ```
    /// use ranger::{Middleware, PreMiddleware, Router};
    /// use std::convert::Infallible;
    ///
    /// let router = Router::builder()
    ///     .middleware(Middleware::Pre(PreMiddleware::new(|req| async move {
    ///         /* Do some operations */
    ///         Ok::<_, Infallible>(req)
    ///     })))
    ///     .build()
    ///     .unwrap();
    /// # let _ = router;
    /// ```
    pub fn new<H, R, E>(handler: H) -> PreMiddleware
    where
        H: Fn(Request<Full<Bytes>>) -> R + Send + Sync + 'static,
        R: Future<Output = Result<Request<Full<Bytes>>, E>> + Send + 'static,
        E: Into<RouteError> + 'static,
    {
        let handler: Handler = Box::new(move |req| {
            let fut = handler(req);
            Box::new(async move { fut.await.map_err(Into::into) })
        });
        PreMiddleware { handler }
    }

    pub(crate) async fn process(&self, req: Request<Full<Bytes>>) -> Result<Request<Full<Bytes>>, RouteError> {
        Pin::from((self.handler)(req)).await
    }
}

impl Debug for PreMiddleware {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "PreMiddleware")
    }
}
