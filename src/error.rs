use http::Method;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{self, HeaderValue};
use hyper::{Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug, Display, Formatter};

/// The error type boxed out of transport handlers and middleware.
///
/// Any error type that converts into `Box<dyn std::error::Error + Send + Sync>` can be returned from a
/// transport handler or a middleware; it is boxed into a `RouteError` and rendered by the router's error
/// handler.
pub type RouteError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised while building a router or while reading request-scoped data.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The same method and fully-resolved path were registered twice in one router tree.
    #[error("Duplicate route: {method} {path}")]
    DuplicateRoute {
        /// The method registered twice.
        method: Method,
        /// The fully-resolved path pattern.
        path: String,
    },

    /// A route path or a scope prefix could not be parsed.
    #[error("Invalid route pattern {pattern:?}: {reason}")]
    InvalidPattern {
        /// The offending pattern.
        pattern: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A route was registered without any method, so it could never be reached.
    #[error("No methods given for the route {path:?}")]
    MissingMethods {
        /// The path the route was registered with.
        path: String,
    },

    /// Route-level middleware was attached before any route was registered.
    #[error("No route registered to attach the route middleware to")]
    MissingRoute,

    /// The request path is not valid percent-encoded UTF-8.
    #[error("Couldn't percent decode request path: {0}")]
    PathDecode(#[from] std::str::Utf8Error),

    /// The request body could not be decoded as JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The request body could not be collected from the transport.
    #[error("Couldn't read request body: {0}")]
    Body(RouteError),
}

/// The error half of a context-convention handler result.
///
/// It carries the HTTP status the failure should be answered with (`500` unless declared otherwise) and
/// the texts rendered into the generic JSON error body. Any [`std::error::Error`] converts into it, so
/// `?` works inside context handlers.
///
/// # Examples
///
/// ```
/// use hyper::StatusCode;
/// use ranger::{Context, HandlerError};
///
/// async fn show_user(ctx: Context) -> Result<(StatusCode, String), HandlerError> {
///     match ctx.param("userId") {
///         Some("42") => Ok((StatusCode::OK, "Alice".to_owned())),
///         _ => Err(HandlerError::new(StatusCode::NOT_FOUND, "user not found")),
///     }
/// }
/// # let _ = show_user;
/// ```
pub struct HandlerError {
    status: StatusCode,
    exception_type: String,
    message: String,
    developer_message: String,
}

impl HandlerError {
    /// Creates an error answered with the given status.
    pub fn new<M: Into<String>>(status: StatusCode, message: M) -> HandlerError {
        HandlerError {
            status,
            exception_type: exception_type_of(status),
            message: message.into(),
            developer_message: String::new(),
        }
    }

    /// Creates an error answered with `500 Internal Server Error`.
    pub fn internal<M: Into<String>>(message: M) -> HandlerError {
        HandlerError::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// Overrides the `exception_type` rendered in the error body.
    pub fn with_exception_type<T: Into<String>>(mut self, exception_type: T) -> HandlerError {
        self.exception_type = exception_type.into();
        self
    }

    /// Sets the `developer_message` rendered in the error body.
    pub fn with_developer_message<T: Into<String>>(mut self, developer_message: T) -> HandlerError {
        self.developer_message = developer_message.into();
        self
    }

    /// The status this error is answered with.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The human readable message.
    pub fn message(&self) -> &str {
        &self.message
    }

    pub(crate) fn into_response(self) -> Response<Full<Bytes>> {
        let mut body = ErrorResponse::new(self.status, self.exception_type, self.message);
        body.data.developer_message = self.developer_message;
        body.into_response()
    }
}

impl<E: std::error::Error + Send + Sync + 'static> From<E> for HandlerError {
    fn from(err: E) -> Self {
        HandlerError::internal(err.to_string())
    }
}

impl Debug for HandlerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerError")
            .field("status", &self.status)
            .field("exception_type", &self.exception_type)
            .field("message", &self.message)
            .finish()
    }
}

impl Display for HandlerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.status, self.message)
    }
}

/// The generic JSON error body.
///
/// Serialized as `{"status": .., "data": {"exception_type": .., "message": .., "developer_message": ..,
/// "more_information": ..}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// The numeric HTTP status.
    pub status: u16,
    /// The error details.
    pub data: ErrorData,
}

/// The `data` object of an [`ErrorResponse`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorData {
    /// A short machine-friendly error name, e.g. `NotFound`.
    pub exception_type: String,
    /// The human readable message.
    pub message: String,
    /// Details aimed at the API consumer's developers.
    pub developer_message: String,
    /// A pointer to further documentation, `"null"` when there is none.
    pub more_information: String,
}

impl ErrorResponse {
    /// Creates an error body for the given status.
    pub fn new<T: Into<String>, M: Into<String>>(status: StatusCode, exception_type: T, message: M) -> ErrorResponse {
        ErrorResponse {
            status: status.as_u16(),
            data: ErrorData {
                exception_type: exception_type.into(),
                message: message.into(),
                developer_message: String::new(),
                more_information: "null".to_owned(),
            },
        }
    }

    /// Creates an error body whose exception type is derived from the status reason phrase.
    pub fn from_status<M: Into<String>>(status: StatusCode, message: M) -> ErrorResponse {
        ErrorResponse::new(status, exception_type_of(status), message)
    }

    /// Renders the body as a JSON response carrying the same status.
    pub fn into_response(self) -> Response<Full<Bytes>> {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        // Serializing plain strings and integers can't fail.
        let body = serde_json::to_vec(&self).unwrap_or_default();

        let mut res = Response::new(Full::new(Bytes::from(body)));
        *res.status_mut() = status;
        res.headers_mut()
            .insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        res
    }
}

/// "Internal Server Error" -> "InternalServerError".
fn exception_type_of(status: StatusCode) -> String {
    status
        .canonical_reason()
        .unwrap_or("Unknown")
        .split_whitespace()
        .collect::<String>()
}
