//! Normalizes the two handler conventions into a single invocable endpoint.
//!
//! * Context-convention handlers receive a [`Context`] and return `(status, payload)` or a
//!   [`HandlerError`]; the adapter serializes the payload as JSON, or renders the error body. Post
//!   middlewares, route-level ones included, get the serialized response.
//! * Transport-convention handlers receive the request and produce the whole response; the adapter leaves
//!   it untouched.

use crate::error::{ErrorResponse, HandlerError};
use crate::types::Context;
use crate::RouteError;
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::header::{self, HeaderValue};
use hyper::{Method, Request, Response, StatusCode};
use serde::Serialize;
use std::fmt::{self, Debug, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

type ContextHandler = Box<dyn Fn(Context) -> ContextHandlerReturn + Send + Sync + 'static>;
type ContextHandlerReturn = Box<dyn Future<Output = Response<Full<Bytes>>> + Send + 'static>;

type TransportHandler = Box<dyn Fn(Request<Full<Bytes>>) -> TransportHandlerReturn + Send + Sync + 'static>;
type TransportHandlerReturn = Box<dyn Future<Output = Result<Response<Full<Bytes>>, RouteError>> + Send + 'static>;

/// A route handler in either convention.
pub(crate) enum Endpoint {
    Context(ContextHandler),
    Transport(TransportHandler),
}

impl Endpoint {
    pub(crate) fn context<H, R, T>(handler: H) -> Endpoint
    where
        H: Fn(Context) -> R + Send + Sync + 'static,
        R: Future<Output = Result<(StatusCode, T), HandlerError>> + Send + 'static,
        T: Serialize + Send + 'static,
    {
        let handler: ContextHandler = Box::new(move |ctx: Context| {
            let response_headers = ctx.response_headers_handle();
            let fut = handler(ctx);

            Box::new(async move {
                let mut res = match fut.await {
                    Ok((status, payload)) => payload_response(status, &payload),
                    Err(err) => err.into_response(),
                };

                {
                    let response_headers = response_headers.lock().unwrap_or_else(|e| e.into_inner());
                    for (name, value) in response_headers.iter() {
                        res.headers_mut().insert(name.clone(), value.clone());
                    }
                }

                res
            })
        });

        Endpoint::Context(handler)
    }

    pub(crate) fn transport<H, R, E>(handler: H) -> Endpoint
    where
        H: Fn(Request<Full<Bytes>>) -> R + Send + Sync + 'static,
        R: Future<Output = Result<Response<Full<Bytes>>, E>> + Send + 'static,
        E: Into<RouteError> + 'static,
    {
        let handler: TransportHandler = Box::new(move |req| {
            let fut = handler(req);
            Box::new(async move { fut.await.map_err(Into::into) })
        });

        Endpoint::Transport(handler)
    }

    pub(crate) async fn call(&self, req: Request<Full<Bytes>>) -> Result<Response<Full<Bytes>>, RouteError> {
        match self {
            Endpoint::Context(handler) => {
                let (parts, body) = req.into_parts();
                let body = match body.collect().await {
                    Ok(collected) => collected.to_bytes(),
                    Err(never) => match never {},
                };

                Ok(Pin::from(handler(Context::from_parts(parts, body))).await)
            }
            Endpoint::Transport(handler) => Pin::from(handler(req)).await,
        }
    }
}

impl Debug for Endpoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Context(_) => write!(f, "Endpoint::Context"),
            Endpoint::Transport(_) => write!(f, "Endpoint::Transport"),
        }
    }
}

/// What a middleware chain ends in.
#[derive(Debug, Clone)]
pub(crate) enum Terminal {
    Endpoint(Arc<Endpoint>),
    NotFound,
    MethodNotAllowed(Arc<[Method]>),
}

impl Terminal {
    pub(crate) async fn call(&self, req: Request<Full<Bytes>>) -> Result<Response<Full<Bytes>>, RouteError> {
        match self {
            Terminal::Endpoint(endpoint) => endpoint.call(req).await,
            Terminal::NotFound => Ok(ErrorResponse::from_status(
                StatusCode::NOT_FOUND,
                format!("No route found for {} {}", req.method(), req.uri().path()),
            )
            .into_response()),
            Terminal::MethodNotAllowed(allowed) => {
                let mut res = ErrorResponse::from_status(
                    StatusCode::METHOD_NOT_ALLOWED,
                    format!("Method {} is not allowed for {}", req.method(), req.uri().path()),
                )
                .into_response();

                let allow = join_methods(allowed);
                if let Ok(val) = HeaderValue::from_str(&allow) {
                    res.headers_mut().insert(header::ALLOW, val);
                }
                Ok(res)
            }
        }
    }
}

pub(crate) fn join_methods(methods: &[Method]) -> String {
    methods.iter().map(Method::as_str).collect::<Vec<_>>().join(", ")
}

fn payload_response<T: Serialize>(status: StatusCode, payload: &T) -> Response<Full<Bytes>> {
    let body = match serde_json::to_vec(payload) {
        Ok(body) => body,
        Err(err) => {
            tracing::error!(error = %err, "couldn't serialize the handler payload");
            return HandlerError::internal(format!("Couldn't serialize the response payload: {}", err)).into_response();
        }
    };

    // A `null` payload means the handler only has a status to report.
    if body == b"null" {
        let mut res = Response::new(Full::new(Bytes::new()));
        *res.status_mut() = status;
        return res;
    }

    let mut res = Response::new(Full::new(Bytes::from(body)));
    *res.status_mut() = status;
    res.headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    res
}
