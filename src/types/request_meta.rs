use crate::types::RouteParams;
use http::Method;
use std::net::SocketAddr;

/// Per-request data the router and the service stash into the request extensions.
#[derive(Debug, Clone, Default)]
pub(crate) struct RequestMeta {
    route_params: Option<RouteParams>,
    remote_addr: Option<SocketAddr>,
    allowed_methods: Option<Vec<Method>>,
}

impl RequestMeta {
    pub fn with_route_params(route_params: RouteParams) -> RequestMeta {
        RequestMeta {
            route_params: Some(route_params),
            ..RequestMeta::default()
        }
    }

    pub fn with_remote_addr(remote_addr: SocketAddr) -> RequestMeta {
        RequestMeta {
            remote_addr: Some(remote_addr),
            ..RequestMeta::default()
        }
    }

    pub fn with_allowed_methods(mut self, allowed_methods: Vec<Method>) -> RequestMeta {
        self.allowed_methods = Some(allowed_methods);
        self
    }

    pub fn route_params(&self) -> Option<&RouteParams> {
        self.route_params.as_ref()
    }

    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }

    pub fn allowed_methods(&self) -> Option<&[Method]> {
        self.allowed_methods.as_deref()
    }

    /// Merges `other` into `self`; fields set on `other` win.
    pub fn extend(&mut self, other: RequestMeta) {
        if let Some(route_params) = other.route_params {
            match self.route_params {
                Some(ref mut existing) => existing.extend(route_params),
                None => self.route_params = Some(route_params),
            }
        }

        if other.remote_addr.is_some() {
            self.remote_addr = other.remote_addr;
        }

        if other.allowed_methods.is_some() {
            self.allowed_methods = other.allowed_methods;
        }
    }
}
