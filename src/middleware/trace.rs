use crate::middleware::{Middleware, Next};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Request;
use std::time::Instant;
use tracing::Instrument;

/// Creates the request instrumentation middleware.
///
/// Each request runs inside an `info` span carrying its method and path; when the inner chain finishes the
/// status and the latency are logged, or the error if one escaped. Register it first so the span covers the
/// whole chain.
///
/// # Examples
///
/// ```
/// use ranger::{middleware, Router};
///
/// let router = Router::builder().middleware(middleware::trace()).build().unwrap();
/// # let _ = router;
/// ```
pub fn trace() -> Middleware {
    Middleware::around(|req: Request<Full<Bytes>>, next: Next| async move {
        let span = tracing::info_span!("request", method = %req.method(), path = %req.uri().path());
        let started = Instant::now();

        let result = next.run(req).instrument(span.clone()).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        span.in_scope(|| match &result {
            Ok(res) => tracing::info!(status = res.status().as_u16(), elapsed_ms, "request completed"),
            Err(err) => tracing::error!(error = %err, elapsed_ms, "request failed"),
        });

        result
    })
}
