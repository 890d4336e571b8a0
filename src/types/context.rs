use crate::helpers;
use crate::types::RouteParams;
use bytes::Buf;
use http::request::Parts;
use http::Extensions;
use hyper::body::Bytes;
use hyper::header::{HeaderValue, IntoHeaderName};
use hyper::{HeaderMap, Method, Uri};
use serde::de::DeserializeOwned;
use std::io::Read;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

/// The request-scoped value handed to context-convention handlers.
///
/// It owns everything a handler usually needs: the route parameters extracted by the router, the
/// collected request body and the request head. Headers set through
/// [`set_response_header`](#method.set_response_header) are merged into the response after the handler
/// returns, overriding anything the router would set by default.
///
/// # Examples
///
/// ```
/// use hyper::StatusCode;
/// use ranger::{Context, HandlerError, Router};
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct NewBook {
///     title: String,
/// }
///
/// async fn create_book(ctx: Context) -> Result<(StatusCode, String), HandlerError> {
///     let author = ctx.param("author").unwrap_or_default().to_owned();
///     let book: NewBook = ctx.body_json()?;
///     Ok((StatusCode::CREATED, format!("{} by {}", book.title, author)))
/// }
///
/// let router = Router::builder().post("/authors/:author/books", create_book).build().unwrap();
/// # let _ = router;
/// ```
#[derive(Debug, Default)]
pub struct Context {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    extensions: Extensions,
    params: RouteParams,
    remote_addr: Option<SocketAddr>,
    body: Bytes,
    response_headers: Arc<Mutex<HeaderMap>>,
}

impl Context {
    /// Creates an empty context, mostly useful to exercise handlers in tests.
    pub fn new() -> Context {
        Context::default()
    }

    pub(crate) fn from_parts(mut parts: Parts, body: Bytes) -> Context {
        let meta = helpers::take_req_meta(&mut parts.extensions).unwrap_or_default();

        Context {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            params: meta.route_params().cloned().unwrap_or_default(),
            remote_addr: meta.remote_addr(),
            extensions: parts.extensions,
            body,
            response_headers: Arc::default(),
        }
    }

    /// Returns the request method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request uri.
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Returns the request headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the request extensions, e.g. values inserted by a pre middleware.
    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    /// Returns the remote address of the connection, if known.
    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }

    /// Returns all the route parameters extracted for the matched route.
    pub fn params(&self) -> &RouteParams {
        &self.params
    }

    /// Returns a route parameter by name.
    pub fn param<P: AsRef<str>>(&self, name: P) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Sets a route parameter.
    pub fn set_param<N: Into<String>, V: Into<String>>(&mut self, name: N, value: V) {
        self.params.set(name, value);
    }

    /// Returns the raw request body.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns a reader over the raw request body.
    pub fn body_reader(&self) -> impl Read {
        self.body.clone().reader()
    }

    /// Replaces the request body.
    pub fn set_body<B: Into<Bytes>>(&mut self, body: B) {
        self.body = body.into();
    }

    /// Decodes the request body as JSON.
    pub fn body_json<T: DeserializeOwned>(&self) -> crate::Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Sets a header on the response the handler is about to produce.
    ///
    /// Values set here win over headers added by the router itself, e.g. `content-type`.
    pub fn set_response_header<K: IntoHeaderName>(&self, name: K, value: HeaderValue) {
        self.response_headers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(name, value);
    }

    /// Returns a copy of the headers set through [`set_response_header`](#method.set_response_header).
    pub fn response_headers(&self) -> HeaderMap {
        self.response_headers.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub(crate) fn response_headers_handle(&self) -> Arc<Mutex<HeaderMap>> {
        Arc::clone(&self.response_headers)
    }
}
