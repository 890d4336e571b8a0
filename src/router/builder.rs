use crate::error::HandlerError;
use crate::handler::Endpoint;
use crate::middleware::Middleware;
use crate::pattern::PathPattern;
use crate::route::Route;
use crate::router::{ErrHandler, ErrHandlerReturn, Router};
use crate::types::Context;
use crate::{Error, RouteError};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Method, Request, Response, StatusCode};
use serde::Serialize;
use std::fmt::{self, Debug, Formatter};
use std::future::Future;
use std::sync::Arc;

/// A component which registers its own routes and middlewares on a router.
///
/// [`Cors`](./struct.Cors.html) is such a component. Any `FnOnce(RouterBuilder) -> RouterBuilder` closure is one
/// too.
///
/// # Examples
///
/// ```
/// use hyper::StatusCode;
/// use ranger::{Context, Mount, Router, RouterBuilder};
///
/// struct Health;
///
/// impl Mount for Health {
///     fn mount(self, builder: RouterBuilder) -> RouterBuilder {
///         builder.get("/health", |_: Context| async move { Ok((StatusCode::OK, "up")) })
///     }
/// }
///
/// let router = Router::builder().register(Health).build().unwrap();
/// assert_eq!(router.methods_at("/health"), vec![hyper::Method::GET]);
/// ```
pub trait Mount {
    /// Registers the component on the builder.
    fn mount(self, builder: RouterBuilder) -> RouterBuilder;
}

impl<F> Mount for F
where
    F: FnOnce(RouterBuilder) -> RouterBuilder,
{
    fn mount(self, builder: RouterBuilder) -> RouterBuilder {
        self(builder)
    }
}

/// Builder for the [Router](./struct.Router.html) type.
///
/// This `RouterBuilder` type accumulates the first registration error and `build()` reports it.
///
/// # Examples
///
/// ```
/// use hyper::StatusCode;
/// use ranger::{Context, HandlerError, Router, RouterBuilder};
///
/// async fn handler(_: Context) -> Result<(StatusCode, ()), HandlerError> {
///     Ok((StatusCode::NO_CONTENT, ()))
/// }
///
/// // Use Router::builder() method to create a new RouterBuilder instance.
/// // We will use this `router` instance to create a hyper server.
/// let router = Router::builder().get("/users", handler).build().unwrap();
/// # let _ = router;
/// ```
pub struct RouterBuilder {
    inner: crate::Result<BuilderInner>,
}

struct BuilderInner {
    routes: Vec<Route>,
    middlewares: Vec<Arc<Middleware>>,
    scopes: Vec<Router>,
    err_handler: Option<ErrHandler>,
}

impl RouterBuilder {
    /// Creates a new `RouterBuilder` instance with default options.
    pub fn new() -> RouterBuilder {
        RouterBuilder::default()
    }

    /// Creates a new [Router](./struct.Router.html) instance from the added configuration.
    ///
    /// Prefixes are joined, middleware chains are resolved and duplicate routes anywhere in the tree are
    /// rejected here.
    pub fn build(self) -> crate::Result<Router> {
        let inner = self.inner?;

        let mut router = Router {
            prefix: PathPattern::default(),
            full_prefix: PathPattern::default(),
            routes: inner.routes,
            middlewares: inner.middlewares,
            scopes: inner.scopes,
            err_handler: inner.err_handler,
            chain: Arc::from(Vec::new()),
        };
        router.init()?;

        Ok(router)
    }

    fn and_then<F: FnOnce(BuilderInner) -> crate::Result<BuilderInner>>(self, func: F) -> Self {
        RouterBuilder {
            inner: self.inner.and_then(func),
        }
    }
}

impl RouterBuilder {
    /// Adds a new route with `GET` method and the context-convention handler at the specified path.
    ///
    /// # Examples
    ///
    /// ```
    /// use hyper::StatusCode;
    /// use ranger::{Context, Router};
    ///
    /// let router = Router::builder()
    ///     .get("/users/:userId", |ctx: Context| async move {
    ///         Ok((StatusCode::OK, format!("user {}", ctx.param("userId").unwrap_or_default())))
    ///     })
    ///     .build()
    ///     .unwrap();
    /// # let _ = router;
    /// ```
    pub fn get<P, H, R, T>(self, path: P, handler: H) -> Self
    where
        P: Into<String>,
        H: Fn(Context) -> R + Send + Sync + 'static,
        R: Future<Output = Result<(StatusCode, T), HandlerError>> + Send + 'static,
        T: Serialize + Send + 'static,
    {
        self.add(path, vec![Method::GET], handler)
    }

    /// Adds a new route with `POST` method and the context-convention handler at the specified path.
    pub fn post<P, H, R, T>(self, path: P, handler: H) -> Self
    where
        P: Into<String>,
        H: Fn(Context) -> R + Send + Sync + 'static,
        R: Future<Output = Result<(StatusCode, T), HandlerError>> + Send + 'static,
        T: Serialize + Send + 'static,
    {
        self.add(path, vec![Method::POST], handler)
    }

    /// Adds a new route with `PUT` method and the context-convention handler at the specified path.
    pub fn put<P, H, R, T>(self, path: P, handler: H) -> Self
    where
        P: Into<String>,
        H: Fn(Context) -> R + Send + Sync + 'static,
        R: Future<Output = Result<(StatusCode, T), HandlerError>> + Send + 'static,
        T: Serialize + Send + 'static,
    {
        self.add(path, vec![Method::PUT], handler)
    }

    /// Adds a new route with `DELETE` method and the context-convention handler at the specified path.
    pub fn delete<P, H, R, T>(self, path: P, handler: H) -> Self
    where
        P: Into<String>,
        H: Fn(Context) -> R + Send + Sync + 'static,
        R: Future<Output = Result<(StatusCode, T), HandlerError>> + Send + 'static,
        T: Serialize + Send + 'static,
    {
        self.add(path, vec![Method::DELETE], handler)
    }

    /// Adds a new route with the specified methods and the context-convention handler at the specified path.
    ///
    /// The handler gets a [Context](./struct.Context.html) and returns the status and a payload which is
    /// serialized as JSON, or a [HandlerError](./struct.HandlerError.html) which is rendered as the JSON error
    /// body.
    ///
    /// # Examples
    ///
    /// ```
    /// use hyper::{Method, StatusCode};
    /// use ranger::{Context, HandlerError, Router};
    /// use serde::Deserialize;
    ///
    /// #[derive(Deserialize)]
    /// struct Book {
    ///     title: String,
    /// }
    ///
    /// let router = Router::builder()
    ///     .add("/books", vec![Method::POST, Method::PUT], |ctx: Context| async move {
    ///         let book: Book = ctx
    ///             .body_json()
    ///             .map_err(|e| HandlerError::new(StatusCode::BAD_REQUEST, e.to_string()))?;
    ///         Ok((StatusCode::CREATED, book.title))
    ///     })
    ///     .build()
    ///     .unwrap();
    /// # let _ = router;
    /// ```
    pub fn add<P, H, R, T>(self, path: P, methods: Vec<Method>, handler: H) -> Self
    where
        P: Into<String>,
        H: Fn(Context) -> R + Send + Sync + 'static,
        R: Future<Output = Result<(StatusCode, T), HandlerError>> + Send + 'static,
        T: Serialize + Send + 'static,
    {
        self.add_endpoint(path, methods, Endpoint::context(handler), false)
    }

    /// Adds a new route with `GET` method and the transport-convention handler at the specified path.
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
    /// let router = Router::builder()
    ///     .get_raw("/files/*path", |req: Request<Full<Bytes>>| async move {
    ///         let path = req.param("path").cloned().unwrap_or_default();
    ///         Ok::<_, Infallible>(Response::new(Full::new(Bytes::from(path))))
    ///     })
    ///     .build()
    ///     .unwrap();
    /// # let _ = router;
    /// ```
    pub fn get_raw<P, H, R, E>(self, path: P, handler: H) -> Self
    where
        P: Into<String>,
        H: Fn(Request<Full<Bytes>>) -> R + Send + Sync + 'static,
        R: Future<Output = Result<Response<Full<Bytes>>, E>> + Send + 'static,
        E: Into<RouteError> + 'static,
    {
        self.add_raw(path, vec![Method::GET], handler)
    }

    /// Adds a new route with `POST` method and the transport-convention handler at the specified path.
    pub fn post_raw<P, H, R, E>(self, path: P, handler: H) -> Self
    where
        P: Into<String>,
        H: Fn(Request<Full<Bytes>>) -> R + Send + Sync + 'static,
        R: Future<Output = Result<Response<Full<Bytes>>, E>> + Send + 'static,
        E: Into<RouteError> + 'static,
    {
        self.add_raw(path, vec![Method::POST], handler)
    }

    /// Adds a new route with `PUT` method and the transport-convention handler at the specified path.
    pub fn put_raw<P, H, R, E>(self, path: P, handler: H) -> Self
    where
        P: Into<String>,
        H: Fn(Request<Full<Bytes>>) -> R + Send + Sync + 'static,
        R: Future<Output = Result<Response<Full<Bytes>>, E>> + Send + 'static,
        E: Into<RouteError> + 'static,
    {
        self.add_raw(path, vec![Method::PUT], handler)
    }

    /// Adds a new route with `DELETE` method and the transport-convention handler at the specified path.
    pub fn delete_raw<P, H, R, E>(self, path: P, handler: H) -> Self
    where
        P: Into<String>,
        H: Fn(Request<Full<Bytes>>) -> R + Send + Sync + 'static,
        R: Future<Output = Result<Response<Full<Bytes>>, E>> + Send + 'static,
        E: Into<RouteError> + 'static,
    {
        self.add_raw(path, vec![Method::DELETE], handler)
    }

    /// Adds a new route with the specified methods and the transport-convention handler at the specified path.
    ///
    /// The handler is fully responsible for the response, nothing is added to it apart from what the
    /// middlewares do.
    pub fn add_raw<P, H, R, E>(self, path: P, methods: Vec<Method>, handler: H) -> Self
    where
        P: Into<String>,
        H: Fn(Request<Full<Bytes>>) -> R + Send + Sync + 'static,
        R: Future<Output = Result<Response<Full<Bytes>>, E>> + Send + 'static,
        E: Into<RouteError> + 'static,
    {
        self.add_endpoint(path, methods, Endpoint::transport(handler), false)
    }

    // Implicit routes answer requests but never turn a 404 into a 405.
    pub(crate) fn add_implicit_raw<P, H, R, E>(self, path: P, methods: Vec<Method>, handler: H) -> Self
    where
        P: Into<String>,
        H: Fn(Request<Full<Bytes>>) -> R + Send + Sync + 'static,
        R: Future<Output = Result<Response<Full<Bytes>>, E>> + Send + 'static,
        E: Into<RouteError> + 'static,
    {
        self.add_endpoint(path, methods, Endpoint::transport(handler), true)
    }

    fn add_endpoint<P: Into<String>>(self, path: P, methods: Vec<Method>, endpoint: Endpoint, implicit: bool) -> Self {
        self.and_then(move |mut inner| {
            let mut route = Route::new(path, methods, endpoint)?;
            route.implicit = implicit;
            inner.routes.push(route);
            Ok(inner)
        })
    }

    /// Mounts a router under the specified path prefix.
    ///
    /// The mounted router's routes are reachable at the prefix joined with their own paths, and its
    /// middlewares run inside the middlewares of this router. The prefix may contain parameters but no
    /// catch-all segment. Only the root's error handler is used, the one of a mounted router is dropped with a
    /// warning.
    ///
    /// # Examples
    ///
    /// ```
    /// use hyper::StatusCode;
    /// use ranger::{Context, Router};
    ///
    /// fn users_router() -> Router {
    ///     Router::builder()
    ///         .get("/:userId", |ctx: Context| async move {
    ///             Ok((StatusCode::OK, ctx.param("userId").unwrap_or_default().to_owned()))
    ///         })
    ///         .build()
    ///         .unwrap()
    /// }
    ///
    /// let router = Router::builder().scope("/api/users", users_router()).build().unwrap();
    /// assert_eq!(router.routes()[0].full_path(), "/api/users/:userId");
    /// ```
    pub fn scope<P: AsRef<str>>(self, prefix: P, mut router: Router) -> Self {
        self.and_then(move |mut inner| {
            let prefix = PathPattern::parse(prefix.as_ref())?;
            if prefix.has_catch_all() {
                return Err(Error::InvalidPattern {
                    pattern: prefix.to_string(),
                    reason: "a mount prefix can't contain a catch-all segment".to_owned(),
                });
            }

            router.prefix = prefix.join(&router.prefix)?;
            if router.err_handler.take().is_some() {
                tracing::warn!(prefix = %router.prefix, "the error handler of a mounted router is ignored");
            }
            inner.scopes.push(router);
            Ok(inner)
        })
    }

    /// Builds a sub-router inline and mounts it under the specified path prefix.
    ///
    /// # Examples
    ///
    /// ```
    /// use hyper::StatusCode;
    /// use ranger::{Context, Router};
    ///
    /// let router = Router::builder()
    ///     .sub_router("/foo", |r| r.post("/bar", |_: Context| async move { Ok((StatusCode::CREATED, ())) }))
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(router.methods_at("/foo/bar"), vec![hyper::Method::POST]);
    /// ```
    pub fn sub_router<P, F>(self, prefix: P, f: F) -> Self
    where
        P: AsRef<str>,
        F: FnOnce(RouterBuilder) -> RouterBuilder,
    {
        match f(RouterBuilder::new()).build() {
            Ok(router) => self.scope(prefix, router),
            Err(err) => RouterBuilder { inner: Err(err) },
        }
    }

    /// Lets a component register its routes and middlewares, see [Mount](./trait.Mount.html).
    pub fn register<M: Mount>(self, component: M) -> Self {
        component.mount(self)
    }
}

impl RouterBuilder {
    /// Adds a router-wide middleware.
    ///
    /// The middlewares wrap each other in the registration order, the first one being the outermost. They
    /// also wrap the middlewares of the mounted routers.
    ///
    /// # Examples
    ///
    /// ```
    /// use ranger::{Middleware, Router};
    /// use std::convert::Infallible;
    ///
    /// let router = Router::builder()
    ///     .middleware(Middleware::pre(|req| async move { Ok::<_, Infallible>(req) }))
    ///     .middleware(Middleware::post(|res| async move { Ok::<_, Infallible>(res) }))
    ///     .build()
    ///     .unwrap();
    /// # let _ = router;
    /// ```
    pub fn middleware(self, m: Middleware) -> Self {
        self.and_then(move |mut inner| {
            inner.middlewares.push(Arc::new(m));
            Ok(inner)
        })
    }

    /// Adds a middleware to the most recently added route only. It runs inside all the router-wide ones.
    ///
    /// # Examples
    ///
    /// ```
    /// use hyper::header::HeaderValue;
    /// use hyper::StatusCode;
    /// use ranger::{Context, Middleware, Router};
    /// use std::convert::Infallible;
    ///
    /// let router = Router::builder()
    ///     .get("/report", |_: Context| async move { Ok((StatusCode::OK, "report")) })
    ///     .with_middleware(Middleware::post(|mut res| async move {
    ///         res.headers_mut().insert("cache-control", HeaderValue::from_static("no-store"));
    ///         Ok::<_, Infallible>(res)
    ///     }))
    ///     .build()
    ///     .unwrap();
    /// # let _ = router;
    /// ```
    pub fn with_middleware(self, m: Middleware) -> Self {
        self.and_then(move |mut inner| {
            let route = inner.routes.last_mut().ok_or(Error::MissingRoute)?;
            route.middlewares.push(Arc::new(m));
            Ok(inner)
        })
    }

    /// Adds a handler for the errors of transport-convention handlers and middlewares.
    ///
    /// Without one, such errors are rendered as the JSON error body with status `500`. The response is produced
    /// where the error occurs, so the middlewares wrapping that point still run on it.
    ///
    /// # Examples
    ///
    /// ```
    /// use http_body_util::Full;
    /// use hyper::body::Bytes;
    /// use hyper::{Response, StatusCode};
    /// use ranger::{RouteError, Router};
    ///
    /// async fn error_handler(err: RouteError) -> Response<Full<Bytes>> {
    ///     let mut res = Response::new(Full::new(Bytes::from(format!("Something went wrong: {}", err))));
    ///     *res.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    ///     res
    /// }
    ///
    /// let router = Router::builder().err_handler(error_handler).build().unwrap();
    /// # let _ = router;
    /// ```
    pub fn err_handler<H, R>(self, handler: H) -> Self
    where
        H: Fn(RouteError) -> R + Send + Sync + 'static,
        R: Future<Output = Response<Full<Bytes>>> + Send + 'static,
    {
        let handler: Box<dyn Fn(RouteError) -> ErrHandlerReturn + Send + Sync> =
            Box::new(move |err: RouteError| Box::new(handler(err)));
        let handler: ErrHandler = Arc::from(handler);

        self.and_then(move |mut inner| {
            inner.err_handler = Some(handler);
            Ok(inner)
        })
    }
}

impl Default for RouterBuilder {
    fn default() -> RouterBuilder {
        RouterBuilder {
            inner: Ok(BuilderInner {
                routes: Vec::new(),
                middlewares: Vec::new(),
                scopes: Vec::new(),
                err_handler: None,
            }),
        }
    }
}

impl Debug for RouterBuilder {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.inner {
            Ok(ref inner) => write!(
                f,
                "RouterBuilder {{ routes: {:?}, middlewares: {:?}, scopes: {:?} }}",
                inner.routes, inner.middlewares, inner.scopes
            ),
            Err(ref err) => write!(f, "RouterBuilder {{ error: {} }}", err),
        }
    }
}
