use http_body_util::Full;
use hyper::body::Bytes;
use hyper::service::Service;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder;
// Import the prelude traits.
use ranger::prelude::*;
use ranger::{middleware, Context, Cors, HandlerError, Middleware, Router, RouterService};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

const DEFAULT_ADDR: &str = "127.0.0.1:3000";
const MAX_BODY_SIZE: usize = 1024 * 1024;

#[derive(Debug, Serialize, Deserialize)]
struct Book {
    title: String,
    author: String,
}

// A context handler for "/", the payload is serialized as JSON.
async fn home_handler(_: Context) -> Result<(StatusCode, &'static str), HandlerError> {
    Ok((StatusCode::OK, "Home page"))
}

// A transport handler for "/users/:userId", it writes the whole response.
async fn user_handler(req: Request<Full<Bytes>>) -> Result<Response<Full<Bytes>>, Infallible> {
    let user_id = req.param("userId").cloned().unwrap_or_default();
    Ok(Response::new(Full::new(Bytes::from(format!("Hello {}", user_id)))))
}

async fn show_book(ctx: Context) -> Result<(StatusCode, Book), HandlerError> {
    let book_id = ctx.param("bookId").unwrap_or_default();
    if book_id != "1" {
        return Err(HandlerError::new(StatusCode::NOT_FOUND, format!("No book with id {}", book_id)));
    }

    Ok((
        StatusCode::OK,
        Book {
            title: "The Rust Programming Language".to_owned(),
            author: "Steve Klabnik".to_owned(),
        },
    ))
}

async fn create_book(ctx: Context) -> Result<(StatusCode, Book), HandlerError> {
    let book: Book = ctx
        .body_json()
        .map_err(|err| HandlerError::new(StatusCode::BAD_REQUEST, "Malformed book").with_developer_message(err.to_string()))?;
    Ok((StatusCode::CREATED, book))
}

fn books_router() -> ranger::Result<Router> {
    Router::builder().get("/:bookId", show_book).post("/", create_book).build()
}

fn router() -> ranger::Result<Router> {
    let books = books_router()?;

    Router::builder()
        .middleware(middleware::trace())
        .middleware(Middleware::pre(|req| async move {
            tracing::debug!(remote_addr = ?req.remote_addr(), "accepted request");
            Ok::<_, Infallible>(req)
        }))
        .register(Cors::new())
        .get("/", home_handler)
        .get_raw("/users/:userId", user_handler)
        .scope("/books", books)
        .build()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let addr: SocketAddr = std::env::var("RANGER_ADDR")
        .unwrap_or_else(|_| DEFAULT_ADDR.to_owned())
        .parse()?;

    let router_service = Arc::new(RouterService::new(router()?).max_body_size(MAX_BODY_SIZE));

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "app is running");

    loop {
        let (stream, _) = listener.accept().await?;
        let router_service = router_service.clone();

        tokio::spawn(async move {
            // Get the request service for this connection
            let request_service = match router_service.call(&stream).await {
                Ok(service) => service,
                Err(never) => match never {},
            };

            let io = TokioIo::new(stream);
            let builder = Builder::new(TokioExecutor::new());

            if let Err(err) = builder.serve_connection(io, request_service).await {
                tracing::error!(error = %err, "error serving connection");
            }
        });
    }
}
