use crate::router::Router;
use crate::service::request_service::{RequestService, RequestServiceBuilder};
use hyper::service::Service;
use std::convert::Infallible;
use std::future::{ready, Ready};
use std::net::SocketAddr;
use tokio::net::TcpStream;

/// A [`Service`](https://docs.rs/hyper/1/hyper/service/trait.Service.html) creating the per-connection
/// [RequestService](./struct.RequestService.html) for an accepted TCP stream.
///
/// # Examples
///
/// ```no_run
/// use hyper::service::Service;
/// use hyper::StatusCode;
/// use hyper_util::rt::{TokioExecutor, TokioIo};
/// use hyper_util::server::conn::auto::Builder;
/// use ranger::{Context, Router, RouterService};
/// use std::net::SocketAddr;
/// use std::sync::Arc;
/// use tokio::net::TcpListener;
///
/// fn router() -> Router {
///     Router::builder()
///         .get("/", |_: Context| async move { Ok((StatusCode::OK, "Home page")) })
///         .build()
///         .unwrap()
/// }
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
///     // Create a Service from the router above to handle incoming requests.
///     let service = Arc::new(RouterService::new(router()));
///
///     let addr = SocketAddr::from(([127, 0, 0, 1], 3001));
///     let listener = TcpListener::bind(addr).await?;
///
///     loop {
///         let (stream, _) = listener.accept().await?;
///         let router_service = service.clone();
///
///         tokio::spawn(async move {
///             let request_service = router_service.call(&stream).await.unwrap();
///             let io = TokioIo::new(stream);
///
///             let builder = Builder::new(TokioExecutor::new());
///             if let Err(err) = builder.serve_connection(io, request_service).await {
///                 eprintln!("Error serving connection: {:?}", err);
///             }
///         });
///     }
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RouterService {
    builder: RequestServiceBuilder,
}

impl RouterService {
    /// Creates a new service with the provided router, ready to be called for each accepted connection.
    pub fn new(router: Router) -> RouterService {
        RouterService {
            builder: RequestServiceBuilder::new(router),
        }
    }

    /// Limits request bodies to `limit` bytes, see [`RequestServiceBuilder::max_body_size`].
    pub fn max_body_size(self, limit: usize) -> RouterService {
        RouterService {
            builder: self.builder.max_body_size(limit),
        }
    }
}

impl Service<&TcpStream> for RouterService {
    type Response = RequestService;
    type Error = Infallible;
    type Future = Ready<Result<Self::Response, Self::Error>>;

    fn call(&self, conn: &TcpStream) -> Self::Future {
        let addr = match conn.peer_addr() {
            Ok(addr) => addr,
            Err(err) => {
                tracing::debug!(error = %err, "couldn't read the peer address");
                SocketAddr::from(([0, 0, 0, 0], 0))
            }
        };

        ready(Ok(self.builder.build(addr)))
    }
}
