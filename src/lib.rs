//! `ranger` provides a composable router with middleware support for the Rust HTTP library [hyper](https://hyper.rs/).
//!
//! Core features:
//!
//! - Two handler conventions: context handlers returning a status and a JSON payload, and transport handlers
//!   owning the whole response
//!
//! - Sub-routers mounted under path prefixes, inheriting the middlewares of their parents
//!
//! - Route parameters, trailing catch-all segments and literal-over-parameter precedence
//!
//! - `404 Not Found` and `405 Method Not Allowed` answers with the `Allow` listing
//!
//! - A [CORS](./struct.Cors.html) component discovering the methods of a path when the preflight arrives
//!
//! - Logging through the [tracing](https://docs.rs/tracing) facade
//!
//! ## Basic Example
//!
//! ```no_run
//! use http_body_util::Full;
//! use hyper::body::Bytes;
//! use hyper::service::Service;
//! use hyper::{Request, Response, StatusCode};
//! use hyper_util::rt::{TokioExecutor, TokioIo};
//! use hyper_util::server::conn::auto::Builder;
//! // Import the prelude traits.
//! use ranger::prelude::*;
//! use ranger::{middleware, Context, Cors, HandlerError, Router, RouterService};
//! use serde::Serialize;
//! use std::convert::Infallible;
//! use std::net::SocketAddr;
//! use std::sync::Arc;
//! use tokio::net::TcpListener;
//!
//! #[derive(Serialize)]
//! struct User {
//!     id: String,
//! }
//!
//! // A context handler for "/users/:userId", the payload is serialized as JSON.
//! async fn user_handler(ctx: Context) -> Result<(StatusCode, User), HandlerError> {
//!     let id = ctx.param("userId").unwrap_or_default().to_owned();
//!     Ok((StatusCode::OK, User { id }))
//! }
//!
//! // A transport handler for "/", it writes the whole response.
//! async fn home_handler(req: Request<Full<Bytes>>) -> Result<Response<Full<Bytes>>, Infallible> {
//!     let from = req.remote_addr().map(|addr| addr.to_string()).unwrap_or_default();
//!     Ok(Response::new(Full::new(Bytes::from(format!("Home page, hello {}", from)))))
//! }
//!
//! fn router() -> Router {
//!     Router::builder()
//!         .middleware(middleware::trace())
//!         .register(Cors::new())
//!         .get_raw("/", home_handler)
//!         .get("/users/:userId", user_handler)
//!         .build()
//!         .unwrap()
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let router_service = Arc::new(RouterService::new(router()));
//!
//!     // The address on which the server will be listening.
//!     let addr = SocketAddr::from(([127, 0, 0, 1], 3001));
//!     let listener = TcpListener::bind(addr).await?;
//!
//!     loop {
//!         let (stream, _) = listener.accept().await?;
//!         let router_service = router_service.clone();
//!
//!         tokio::spawn(async move {
//!             // Get the request service for this connection
//!             let request_service = router_service.call(&stream).await.unwrap();
//!
//!             let io = TokioIo::new(stream);
//!             let builder = Builder::new(TokioExecutor::new());
//!
//!             if let Err(err) = builder.serve_connection(io, request_service).await {
//!                 eprintln!("Error serving connection: {:?}", err);
//!             }
//!         });
//!     }
//! }
//! ```
//!
//! ## Routing
//!
//! ### Route Handlers
//!
//! A context handler gets a [Context](./struct.Context.html) holding the route parameters, the collected body and the
//! request head. It returns the status with a payload, or a [HandlerError](./struct.HandlerError.html):
//!
//! ```
//! use hyper::StatusCode;
//! use ranger::{Context, HandlerError, Router};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Login {
//!     user: String,
//! }
//!
//! async fn login_handler(ctx: Context) -> Result<(StatusCode, String), HandlerError> {
//!     let login: Login = ctx.body_json()?;
//!     if login.user.is_empty() {
//!         return Err(HandlerError::new(StatusCode::UNAUTHORIZED, "Unknown user"));
//!     }
//!     Ok((StatusCode::OK, login.user))
//! }
//!
//! let router = Router::builder().post("/login", login_handler).build().unwrap();
//! # let _ = router;
//! ```
//!
//! An error is rendered as the JSON error body:
//!
//! ```json
//! {"status":401,"data":{"exception_type":"Unauthorized","message":"Unknown user","developer_message":"","more_information":"null"}}
//! ```
//!
//! A transport handler gets the request and returns the response as is; the `_raw` methods register them.
//!
//! ### Route Paths
//!
//! ```
//! use hyper::StatusCode;
//! use ranger::{Context, Router};
//!
//! let router = Router::builder()
//!     // A literal path.
//!     .get("/about", |_: Context| async move { Ok((StatusCode::OK, "about")) })
//!     // A named parameter.
//!     .get("/users/:userId", |_: Context| async move { Ok((StatusCode::OK, "user")) })
//!     // A trailing catch-all, which also matches "/files".
//!     .get("/files/*path", |_: Context| async move { Ok((StatusCode::OK, "file")) })
//!     .build()
//!     .unwrap();
//! # let _ = router;
//! ```
//!
//! When several routes match a path, a literal segment wins over a parameter, which wins over a
//! catch-all, comparing the segments from the left.
//!
//! ### Scoping
//!
//! A router can be mounted under a prefix with [`scope`](./struct.RouterBuilder.html#method.scope) or built inline with
//! [`sub_router`](./struct.RouterBuilder.html#method.sub_router). Registering the same method and path twice anywhere in the
//! tree fails the `build()`.
//!
//! ```
//! use hyper::StatusCode;
//! use ranger::{Context, Router};
//!
//! let router = Router::builder()
//!     .get("/foo", |_: Context| async move { Ok((StatusCode::OK, ())) })
//!     .sub_router("/foo", |r| {
//!         r.post("/bar", |_: Context| async move { Ok((StatusCode::CREATED, ())) })
//!     })
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(router.methods_at("/foo/bar"), vec![hyper::Method::POST]);
//! ```
//!
//! ## Middleware
//!
//! A middleware wraps the rest of the chain. The first registered one is the outermost, the middlewares of
//! a parent router wrap those of its sub-routers, and [route middlewares](./struct.RouterBuilder.html#method.with_middleware)
//! are the innermost. There are pre middlewares transforming the request, post middlewares transforming the
//! response and around middlewares getting the [rest of the chain](./struct.Next.html):
//!
//! ```
//! use http_body_util::Full;
//! use hyper::body::Bytes;
//! use hyper::{Response, StatusCode};
//! use ranger::{Middleware, RouteError, Router};
//! use std::convert::Infallible;
//!
//! let router = Router::builder()
//!     .middleware(Middleware::pre(|req| async move {
//!         tracing::info!(path = req.uri().path(), "incoming");
//!         Ok::<_, Infallible>(req)
//!     }))
//!     .middleware(Middleware::around(|req, next| async move {
//!         if req.headers().contains_key("authorization") {
//!             return next.run(req).await;
//!         }
//!         let mut res = Response::new(Full::new(Bytes::new()));
//!         *res.status_mut() = StatusCode::UNAUTHORIZED;
//!         Ok::<_, RouteError>(res)
//!     }))
//!     .build()
//!     .unwrap();
//! # let _ = router;
//! ```
//!
//! ## Error Handling
//!
//! Errors of transport handlers and middlewares are returned as [`RouteError`](./type.RouteError.html) and go to
//! the root router's [error handler](./struct.RouterBuilder.html#method.err_handler), a `500` JSON error body by
//! default. A panicking handler or middleware is answered with a `500` too. Both are turned into a response
//! where they occur, so the middlewares wrapping that point, e.g. the CORS one, still process it.

pub use self::cors::{cors_middleware, Cors, CORS_ORIGIN_ALL};
pub use self::error::{Error, ErrorData, ErrorResponse, HandlerError, RouteError};
pub use self::middleware::{AroundMiddleware, Middleware, Next, PostMiddleware, PreMiddleware};
pub use self::pattern::PathPattern;
pub use self::route::Route;
pub use self::router::{Mount, Router, RouterBuilder};
pub use self::service::{RequestService, RequestServiceBuilder, RouterService};
pub use self::types::{Context, RequestInfo, RouteParams};

mod cors;
mod error;
pub mod ext;
mod handler;
mod helpers;
pub mod middleware;
mod pattern;
pub mod prelude;
mod route;
mod router;
mod service;
mod types;

/// A Result type often returned while building a router or reading request-scoped data.
pub type Result<T> = std::result::Result<T, Error>;
