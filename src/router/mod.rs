use crate::error::ErrorResponse;
use crate::handler::Terminal;
use crate::helpers;
use crate::middleware::{Middleware, Next};
use crate::pattern::PathPattern;
use crate::route::Route;
use crate::types::{RequestMeta, RouteParams};
use crate::{Error, RouteError};
use futures::FutureExt;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Method, Request, Response, StatusCode};
use std::any::Any;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt::{self, Debug, Formatter};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;

pub use self::builder::{Mount, RouterBuilder};

mod builder;

pub(crate) type ErrHandler = Arc<dyn Fn(RouteError) -> ErrHandlerReturn + Send + Sync + 'static>;
pub(crate) type ErrHandlerReturn = Box<dyn Future<Output = Response<Full<Bytes>>> + Send + 'static>;

/// Represents a modular, lightweight and mountable router type.
///
/// A router consists of some routes, some router-wide middlewares and some sub-routers mounted under a
/// path prefix. A router owns its sub-routers, so a router tree is always traversed from the root.
///
/// This `Router` type is not a hyper service, wrap it with [`RouterService`](./struct.RouterService.html) to
/// serve it.
///
/// # Examples
///
/// ```
/// use hyper::StatusCode;
/// use ranger::{Context, HandlerError, Router};
///
/// async fn home_handler(_: Context) -> Result<(StatusCode, &'static str), HandlerError> {
///     Ok((StatusCode::OK, "home"))
/// }
///
/// fn api_router() -> Router {
///     Router::builder()
///         .get("/books/:bookId", |ctx: Context| async move {
///             let book_id = ctx.param("bookId").unwrap_or_default().to_owned();
///             Ok((StatusCode::OK, book_id))
///         })
///         .build()
///         .unwrap()
/// }
///
/// let router = Router::builder()
///     .get("/", home_handler)
///     .scope("/api", api_router())
///     .build()
///     .unwrap();
///
/// assert_eq!(router.methods_at("/api/books/12"), vec![hyper::Method::GET]);
/// ```
pub struct Router {
    pub(crate) prefix: PathPattern,
    // The prefixes of all the enclosing routers joined with `prefix`; resolved by `init`.
    pub(crate) full_prefix: PathPattern,
    pub(crate) routes: Vec<Route>,
    pub(crate) middlewares: Vec<Arc<Middleware>>,
    pub(crate) scopes: Vec<Router>,
    pub(crate) err_handler: Option<ErrHandler>,
    // The router-wide middlewares of the root, wrapping the 404 and 405 responses.
    pub(crate) chain: Arc<[Arc<Middleware>]>,
}

struct Candidate<'a> {
    route: &'a Route,
    params: RouteParams,
}

impl Router {
    /// Return a [RouterBuilder](./struct.RouterBuilder.html) instance to build a `Router`.
    pub fn builder() -> RouterBuilder {
        RouterBuilder::new()
    }

    /// Returns all the routes of the router tree, sub-router routes included, in traversal order.
    pub fn routes(&self) -> Vec<&Route> {
        let mut routes = self.routes.iter().collect::<Vec<_>>();
        for scope in &self.scopes {
            routes.extend(scope.routes());
        }
        routes
    }

    /// Returns the methods registered for a concrete path anywhere in the router tree, in registration
    /// order and without duplicates.
    ///
    /// A path which can't be decoded has no methods.
    pub fn methods_at(&self, path: &str) -> Vec<Method> {
        let segments = match helpers::decode_path_segments(path) {
            Ok(segments) => segments,
            Err(_) => return Vec::new(),
        };

        let mut candidates = Vec::new();
        self.collect_candidates(&segments, &mut candidates);
        union_methods(candidates.iter())
    }

    // Resolves prefixes, middleware chains and owners of the whole tree and rejects duplicate routes.
    pub(crate) fn init(&mut self) -> crate::Result<()> {
        self.chain = Arc::from(self.middlewares.clone());

        let mut seen = HashSet::new();
        let mut owner = Vec::new();
        let root_prefix = PathPattern::default();
        Router::resolve(self, &root_prefix, &[], &mut owner, &mut seen)?;

        tracing::debug!(routes = self.routes().len(), "router initialized");
        Ok(())
    }

    fn resolve(
        router: &mut Router,
        parent_prefix: &PathPattern,
        parent_chain: &[Arc<Middleware>],
        owner: &mut Vec<usize>,
        seen: &mut HashSet<(Method, String)>,
    ) -> crate::Result<()> {
        router.full_prefix = parent_prefix.join(&router.prefix)?;

        let chain = parent_chain
            .iter()
            .chain(router.middlewares.iter())
            .cloned()
            .collect::<Vec<_>>();

        for route in router.routes.iter_mut() {
            route.full_pattern = router.full_prefix.join(&route.pattern)?;

            let key = route.full_pattern.key();
            for method in &route.methods {
                if !seen.insert((method.clone(), key.clone())) {
                    return Err(Error::DuplicateRoute {
                        method: method.clone(),
                        path: route.full_pattern.to_string(),
                    });
                }
            }

            route.chain = chain.iter().chain(route.middlewares.iter()).cloned().collect();
            route.owner = owner.clone();
        }

        let full_prefix = router.full_prefix.clone();
        for (idx, scope) in router.scopes.iter_mut().enumerate() {
            owner.push(idx);
            Router::resolve(scope, &full_prefix, &chain, owner, seen)?;
            owner.pop();
        }

        Ok(())
    }

    fn collect_candidates<'a, S: AsRef<str>>(&'a self, segments: &[S], out: &mut Vec<Candidate<'a>>) {
        if !self.full_prefix.match_prefix(segments) {
            return;
        }

        for route in &self.routes {
            if let Some(params) = route.full_pattern.match_segments(segments) {
                out.push(Candidate { route, params });
            }
        }

        for scope in &self.scopes {
            scope.collect_candidates(segments, out);
        }
    }

    pub(crate) async fn process(&self, mut req: Request<Full<Bytes>>) -> Response<Full<Bytes>> {
        let segments = match helpers::decode_path_segments(req.uri().path()) {
            Ok(segments) => segments,
            Err(err) => {
                tracing::debug!(path = req.uri().path(), error = %err, "couldn't decode the request path");
                return ErrorResponse::from_status(StatusCode::BAD_REQUEST, err.to_string()).into_response();
            }
        };

        let mut candidates = Vec::new();
        self.collect_candidates(&segments, &mut candidates);

        let mut selected: Option<&Candidate> = None;
        for candidate in candidates.iter().filter(|c| c.route.is_match_method(req.method())) {
            match selected {
                // Ties keep the route reached first.
                Some(best)
                    if candidate.route.full_pattern.cmp_specificity(&best.route.full_pattern) != Ordering::Greater => {}
                _ => selected = Some(candidate),
            }
        }

        let (chain, terminal) = match selected {
            Some(candidate) => {
                let owner = &candidate.route.owner;
                let allowed = union_methods(candidates.iter().filter(|c| c.route.owner.starts_with(owner)));

                helpers::update_req_meta_in_extensions(
                    req.extensions_mut(),
                    RequestMeta::with_route_params(candidate.params.clone()).with_allowed_methods(allowed),
                );

                (
                    Arc::clone(&candidate.route.chain),
                    Terminal::Endpoint(Arc::clone(&candidate.route.endpoint)),
                )
            }
            None if candidates.iter().any(|c| !c.route.implicit) => {
                let allowed = union_methods(candidates.iter());
                tracing::debug!(method = %req.method(), path = req.uri().path(), "method not allowed");

                helpers::update_req_meta_in_extensions(
                    req.extensions_mut(),
                    RequestMeta::default().with_allowed_methods(allowed.clone()),
                );

                (Arc::clone(&self.chain), Terminal::MethodNotAllowed(Arc::from(allowed)))
            }
            None => {
                tracing::debug!(method = %req.method(), path = req.uri().path(), "no route found");
                (Arc::clone(&self.chain), Terminal::NotFound)
            }
        };

        // Errors and panics are rendered where they escape, inside the chain. This catch only sees a
        // panicking error handler at the outermost level.
        let fut = Next::new(chain, terminal, self.err_handler.clone()).run(req);
        match AssertUnwindSafe(fut).catch_unwind().await {
            Ok(Ok(res)) => res,
            Ok(Err(err)) => render_error(self.err_handler.as_ref(), err).await,
            Err(panic) => render_panic(&*panic),
        }
    }
}

/// Turns an error escaping a handler or a middleware into a response, with the root's error handler if any.
pub(crate) async fn render_error(err_handler: Option<&ErrHandler>, err: RouteError) -> Response<Full<Bytes>> {
    tracing::error!(error = %err, "unhandled error while processing the request");

    match err_handler {
        Some(err_handler) => Pin::from(err_handler(err)).await,
        None => ErrorResponse::from_status(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response(),
    }
}

pub(crate) fn render_panic(panic: &(dyn Any + Send)) -> Response<Full<Bytes>> {
    tracing::error!(panic = panic_message(panic), "request handling panicked");
    ErrorResponse::from_status(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
}

fn union_methods<'a, 'b: 'a, I>(candidates: I) -> Vec<Method>
where
    I: Iterator<Item = &'a Candidate<'b>>,
{
    let mut methods: Vec<Method> = Vec::new();
    for candidate in candidates {
        for method in candidate.route.methods() {
            if !methods.contains(method) {
                methods.push(method.clone());
            }
        }
    }
    methods
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        msg
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "unknown panic"
    }
}

impl Debug for Router {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{ prefix: {}, routes: {:?}, middlewares: {:?}, scopes: {:?}, err_handler: {:?} }}",
            self.prefix,
            self.routes,
            self.middlewares,
            self.scopes,
            self.err_handler.is_some()
        )
    }
}
