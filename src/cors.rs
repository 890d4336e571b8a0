//! Cross-origin resource sharing.
//!
//! [`Cors`] answers preflight requests with the methods registered at the requested path, discovered
//! from the router when the request arrives, and stamps `Access-Control-Allow-Origin` on every other
//! response that doesn't carry one already.

use crate::ext::RequestExt;
use crate::handler::join_methods;
use crate::middleware::Middleware;
use crate::router::{Mount, RouterBuilder};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{self, HeaderMap, HeaderValue};
use hyper::{Method, Request, Response, StatusCode};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

/// The origin value allowing any origin.
pub const CORS_ORIGIN_ALL: &str = "*";

const DEFAULT_MAX_AGE: Duration = Duration::from_secs(24 * 60 * 60);

/// The CORS component. Register it on a router with [`RouterBuilder::register`](./struct.RouterBuilder.html#method.register).
///
/// Registering it adds an `OPTIONS /*` preflight route and a middleware setting the allowed origin. The
/// preflight route doesn't make unknown paths exist: a `GET` on a path without routes is still a `404`.
///
/// # Examples
///
/// ```
/// use hyper::StatusCode;
/// use ranger::{Context, Cors, Router};
/// use std::time::Duration;
///
/// let router = Router::builder()
///     .register(
///         Cors::new()
///             .origin("https://api.example.com")
///             .expose_headers(["X-Request-Id"])
///             .max_age(Duration::from_secs(600)),
///     )
///     .get("/foo", |_: Context| async move { Ok((StatusCode::OK, "foo")) })
///     .build()
///     .unwrap();
///
/// assert_eq!(router.methods_at("/foo"), vec![hyper::Method::OPTIONS, hyper::Method::GET]);
/// ```
#[derive(Debug, Clone)]
pub struct Cors {
    origin: String,
    credentials: bool,
    methods: Option<Vec<Method>>,
    expose_headers: Vec<String>,
    max_age: Duration,
}

impl Cors {
    /// Any origin, no credentials, methods discovered from the router, no extra headers, 24 hours max-age.
    pub fn new() -> Cors {
        Cors {
            origin: CORS_ORIGIN_ALL.to_owned(),
            credentials: false,
            methods: None,
            expose_headers: Vec::new(),
            max_age: DEFAULT_MAX_AGE,
        }
    }

    /// Sets the allowed origin.
    pub fn origin<O: Into<String>>(mut self, origin: O) -> Cors {
        self.origin = origin.into();
        self
    }

    /// Sets whether `Access-Control-Allow-Credentials: true` is sent on preflight.
    pub fn credentials(mut self, credentials: bool) -> Cors {
        self.credentials = credentials;
        self
    }

    /// Sets a fixed method list, turning off the discovery from the router.
    pub fn methods<I: IntoIterator<Item = Method>>(mut self, methods: I) -> Cors {
        self.methods = Some(methods.into_iter().collect());
        self
    }

    /// Sets the headers listed in `Access-Control-Allow-Headers`.
    pub fn expose_headers<I, S>(mut self, headers: I) -> Cors
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.expose_headers = headers.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the preflight cache duration. A zero duration omits `Access-Control-Max-Age`.
    pub fn max_age(mut self, max_age: Duration) -> Cors {
        self.max_age = max_age;
        self
    }

    fn preflight_headers(&self, discovered: &[Method]) -> HeaderMap {
        let mut headers = HeaderMap::new();

        let methods = match self.methods {
            Some(ref methods) => join_methods(methods),
            None if discovered.is_empty() => Method::OPTIONS.to_string(),
            None => join_methods(discovered),
        };

        insert_header(&mut headers, header::ACCESS_CONTROL_ALLOW_ORIGIN, &self.origin);
        insert_header(&mut headers, header::ACCESS_CONTROL_ALLOW_METHODS, &methods);

        if self.credentials {
            headers.insert(header::ACCESS_CONTROL_ALLOW_CREDENTIALS, HeaderValue::from_static("true"));
        }

        if !self.expose_headers.is_empty() {
            insert_header(
                &mut headers,
                header::ACCESS_CONTROL_ALLOW_HEADERS,
                &self.expose_headers.join(","),
            );
        }

        let max_age = self.max_age.as_secs();
        if max_age > 0 {
            headers.insert(header::ACCESS_CONTROL_MAX_AGE, HeaderValue::from(max_age));
        }

        headers
    }

    fn preflight_response(&self, discovered: &[Method]) -> Response<Full<Bytes>> {
        let mut res = Response::new(Full::new(Bytes::new()));
        *res.status_mut() = StatusCode::OK;
        *res.headers_mut() = self.preflight_headers(discovered);
        res
    }
}

impl Default for Cors {
    fn default() -> Cors {
        Cors::new()
    }
}

impl Mount for Cors {
    fn mount(self, builder: RouterBuilder) -> RouterBuilder {
        let middleware = cors_middleware(self.origin.as_str());
        let cors = Arc::new(self);

        builder
            .middleware(middleware)
            .add_implicit_raw("/*", vec![Method::OPTIONS], move |req: Request<Full<Bytes>>| {
                let cors = Arc::clone(&cors);
                async move { Ok::<_, Infallible>(cors.preflight_response(req.allowed_methods())) }
            })
    }
}

/// Creates a post middleware setting `Access-Control-Allow-Origin` to `origin` on the responses which don't
/// carry that header yet, so a value set by a handler is kept.
///
/// # Examples
///
/// ```
/// use ranger::{cors_middleware, Router};
///
/// let router = Router::builder()
///     .middleware(cors_middleware("https://api.example.com"))
///     .build()
///     .unwrap();
/// # let _ = router;
/// ```
pub fn cors_middleware<O: AsRef<str>>(origin: O) -> Middleware {
    let origin = match HeaderValue::from_str(origin.as_ref()) {
        Ok(origin) => Some(origin),
        Err(err) => {
            tracing::error!(origin = origin.as_ref(), error = %err, "invalid CORS origin, the header won't be set");
            None
        }
    };

    Middleware::post(move |mut res: Response<Full<Bytes>>| {
        let origin = origin.clone();
        async move {
            if let Some(origin) = origin {
                if !res.headers().contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN) {
                    res.headers_mut().insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
                }
            }
            Ok::<_, Infallible>(res)
        }
    })
}

fn insert_header(headers: &mut HeaderMap, name: header::HeaderName, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(value) => {
            headers.insert(name, value);
        }
        Err(err) => tracing::error!(header = %name, error = %err, "invalid CORS header value"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_build_preflight_headers_from_config() {
        let cors = Cors::new()
            .origin("https://api.example.com")
            .credentials(true)
            .methods([Method::OPTIONS, Method::GET, Method::PUT])
            .expose_headers(["X-Personal-One", "X-Personal-Two"])
            .max_age(Duration::from_secs(25 * 60));

        let headers = cors.preflight_headers(&[Method::DELETE]);
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "https://api.example.com");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "OPTIONS, GET, PUT");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_HEADERS], "X-Personal-One,X-Personal-Two");
        assert_eq!(headers[header::ACCESS_CONTROL_MAX_AGE], "1500");
    }

    #[test]
    fn should_use_discovered_methods_and_defaults() {
        let headers = Cors::new().preflight_headers(&[Method::OPTIONS, Method::GET]);

        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], CORS_ORIGIN_ALL);
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "OPTIONS, GET");
        assert_eq!(headers[header::ACCESS_CONTROL_MAX_AGE], "86400");
        assert!(!headers.contains_key(header::ACCESS_CONTROL_ALLOW_CREDENTIALS));
        assert!(!headers.contains_key(header::ACCESS_CONTROL_ALLOW_HEADERS));
    }

    #[test]
    fn should_omit_zero_max_age() {
        let headers = Cors::new().max_age(Duration::ZERO).preflight_headers(&[]);

        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "OPTIONS");
        assert!(!headers.contains_key(header::ACCESS_CONTROL_MAX_AGE));
    }
}
