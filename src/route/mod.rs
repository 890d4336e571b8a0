use crate::handler::Endpoint;
use crate::middleware::Middleware;
use crate::pattern::PathPattern;
use crate::Error;
use hyper::Method;
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

/// Represents a single route.
///
/// A route consists of a path, http method type(s), a handler in either convention and its route-level
/// middleware. It shouldn't be created directly, use [RouterBuilder](./struct.RouterBuilder.html) methods to
/// create a route.
pub struct Route {
    pub(crate) path: String,
    pub(crate) pattern: PathPattern,
    // The pattern with the prefixes of all the enclosing routers prepended; resolved by `Router::init`.
    pub(crate) full_pattern: PathPattern,
    pub(crate) methods: Vec<Method>,
    pub(crate) endpoint: Arc<Endpoint>,
    pub(crate) middlewares: Vec<Arc<Middleware>>,
    // Ancestor router middleware followed by `middlewares`; resolved by `Router::init`.
    pub(crate) chain: Arc<[Arc<Middleware>]>,
    // Indices of the sub-routers leading from the root to the router owning this route.
    pub(crate) owner: Vec<usize>,
    // Implicit routes answer requests but don't make an unknown path exist.
    pub(crate) implicit: bool,
}

impl Route {
    pub(crate) fn new<P: Into<String>>(path: P, methods: Vec<Method>, endpoint: Endpoint) -> crate::Result<Route> {
        let path = path.into();
        let pattern = PathPattern::parse(&path)?;

        if methods.is_empty() {
            return Err(Error::MissingMethods { path });
        }

        Ok(Route {
            path,
            full_pattern: pattern.clone(),
            pattern,
            methods,
            endpoint: Arc::new(endpoint),
            middlewares: Vec::new(),
            chain: Arc::from(Vec::new()),
            owner: Vec::new(),
            implicit: false,
        })
    }

    /// The path the route was registered with, relative to its router.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The path of the route including the prefixes of all the routers it's mounted under.
    pub fn full_path(&self) -> String {
        self.full_pattern.to_string()
    }

    /// The methods the route answers.
    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    pub(crate) fn is_match_method(&self, method: &Method) -> bool {
        self.methods.contains(method)
    }
}

impl Debug for Route {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{ path: {:?}, full_path: {:?}, methods: {:?}, endpoint: {:?}, implicit: {:?} }}",
            self.path,
            self.full_path(),
            self.methods,
            self.endpoint,
            self.implicit
        )
    }
}
