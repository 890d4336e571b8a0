use crate::handler::Terminal;
use crate::middleware::Middleware;
use crate::router::{render_error, render_panic, ErrHandler};
use crate::RouteError;
use futures::FutureExt;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Request, Response};
use std::fmt::{self, Debug, Formatter};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;

type Handler = Box<dyn Fn(Request<Full<Bytes>>, Next) -> HandlerReturn + Send + Sync + 'static>;
type HandlerReturn = Box<dyn Future<Output = Result<Response<Full<Bytes>>, RouteError>> + Send + 'static>;

/// A middleware wrapping the rest of the chain. See [`Middleware::around`](./enum.Middleware.html#method.around).
pub struct AroundMiddleware {
    handler: Handler,
}

impl AroundMiddleware {
    /// Creates a middleware which receives the request and the rest of the chain.
    pub fn new<H, R, E>(handler: H) -> AroundMiddleware
    where
        H: Fn(Request<Full<Bytes>>, Next) -> R + Send + Sync + 'static,
        R: Future<Output = Result<Response<Full<Bytes>>, E>> + Send + 'static,
        E: Into<RouteError> + 'static,
    {
        let handler: Handler = Box::new(move |req, next| {
            let fut = handler(req, next);
            Box::new(async move { fut.await.map_err(Into::into) })
        });
        AroundMiddleware { handler }
    }

    pub(crate) async fn process(&self, req: Request<Full<Bytes>>, next: Next) -> Result<Response<Full<Bytes>>, RouteError> {
        Pin::from((self.handler)(req, next)).await
    }
}

impl Debug for AroundMiddleware {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "AroundMiddleware")
    }
}

/// The remaining part of a middleware chain, ending in the matched route handler.
///
/// An error or a panic escaping the rest of the chain is already turned into a response by the router's
/// error handler when [`Next::run`] resolves, so the calling middleware still sees a response to work on.
pub struct Next {
    chain: Arc<[Arc<Middleware>]>,
    idx: usize,
    terminal: Terminal,
    err_handler: Option<ErrHandler>,
}

impl Next {
    pub(crate) fn new(chain: Arc<[Arc<Middleware>]>, terminal: Terminal, err_handler: Option<ErrHandler>) -> Next {
        Next {
            chain,
            idx: 0,
            terminal,
            err_handler,
        }
    }

    /// Runs the rest of the chain with the request and resolves to its response.
    pub fn run(
        self,
        req: Request<Full<Bytes>>,
    ) -> Pin<Box<dyn Future<Output = Result<Response<Full<Bytes>>, RouteError>> + Send + 'static>> {
        Box::pin(async move {
            let err_handler = self.err_handler.clone();

            let res = match AssertUnwindSafe(self.step(req)).catch_unwind().await {
                Ok(Ok(res)) => res,
                Ok(Err(err)) => render_error(err_handler.as_ref(), err).await,
                Err(panic) => render_panic(&*panic),
            };
            Ok(res)
        })
    }

    async fn step(self, req: Request<Full<Bytes>>) -> Result<Response<Full<Bytes>>, RouteError> {
        match self.chain.get(self.idx).cloned() {
            Some(middleware) => {
                let next = Next {
                    chain: Arc::clone(&self.chain),
                    idx: self.idx + 1,
                    terminal: self.terminal,
                    err_handler: self.err_handler,
                };
                middleware.process(req, next).await
            }
            None => self.terminal.call(req).await,
        }
    }
}

impl Debug for Next {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Next {{ remaining: {} }}", self.chain.len().saturating_sub(self.idx))
    }
}
