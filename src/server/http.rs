//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo for async handling. One task per accepted
//! connection; requests are routed by `(method, path)`.

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::Args;
use crate::connection::{ConnectionManager, PersonalDb};
use crate::db::StoreConnector;
use crate::routes;
use crate::types::{Result, ViewerError};

const COLLECTIONS_PREFIX: &str = "/api/collections/";
const PERSONAL_PREFIX: &str = "/api/personal-db/collections/";
const TABLE_SUFFIX: &str = "/table";

/// Shared application state
pub struct AppState {
    pub args: Args,
    /// Shared browse connection and the personal insert target
    pub connections: Arc<ConnectionManager>,
    /// Per-process identifier reported by /health
    pub instance_id: Uuid,
    pub started_at: Instant,
}

impl AppState {
    /// Build state from configuration
    ///
    /// `browse` opens the shared connection; `insert` opens the personal
    /// db connections. They are separate instances even when both talk to
    /// the same kind of store.
    pub fn new(
        args: Args,
        browse: Arc<dyn StoreConnector>,
        insert: Arc<dyn StoreConnector>,
    ) -> Self {
        let personal = PersonalDb::new(insert, args.personal_db_uri().map(str::to_string));
        let connections = Arc::new(ConnectionManager::new(
            browse,
            args.mongodb_uri.clone(),
            personal,
        ));

        Self {
            args,
            connections,
            instance_id: Uuid::new_v4(),
            started_at: Instant::now(),
        }
    }
}

/// Accept connections until Ctrl-C, then close the shared connection
pub async fn run(state: Arc<AppState>) -> Result<()> {
    let addr = state.args.listen_addr();
    let listener = TcpListener::bind(addr).await?;

    info!("Server running at http://{}", addr);
    if !state.connections.personal_db_configured() {
        warn!("PERSONAL_DB_URI not set - inserts will fail with a configuration error");
    }

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    let state = Arc::clone(&state);
                    tokio::spawn(async move {
                        let io = TokioIo::new(stream);

                        let service = service_fn(move |req| {
                            let state = Arc::clone(&state);
                            async move { handle_request(state, peer, req).await }
                        });

                        if let Err(err) = http1::Builder::new()
                            .serve_connection(io, service)
                            .await
                        {
                            error!("Error serving connection from {}: {:?}", peer, err);
                        }
                    });
                }
                Err(e) => {
                    error!("Error accepting connection: {:?}", e);
                }
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Received shutdown signal");
                break;
            }
        }
    }

    state.connections.shutdown().await;
    Ok(())
}

/// Route incoming HTTP requests
async fn handle_request(
    state: Arc<AppState>,
    peer: SocketAddr,
    req: Request<Incoming>,
) -> std::result::Result<Response<Full<Bytes>>, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(str::to_string);

    info!("[{}] {} {}", peer, method, path);

    let response = match (&method, path.as_str()) {
        (&Method::OPTIONS, _) => preflight_response(),

        (&Method::GET, "/") => routes::server_up(),

        (&Method::GET, "/health") | (&Method::GET, "/healthz") => routes::health_check(&state),

        (&Method::POST, "/api/connect") => match read_body(req).await {
            Ok(body) => routes::handle_connect(&state, body).await,
            Err(e) => routes::error_response(e),
        },

        (&Method::GET, p) if p.starts_with(COLLECTIONS_PREFIX) => {
            let rest = &p[COLLECTIONS_PREFIX.len()..];
            match rest.strip_suffix(TABLE_SUFFIX) {
                Some(segment) if is_single_segment(segment) => {
                    routes::handle_table(&state, segment, query.as_deref()).await
                }
                _ if is_single_segment(rest) => routes::handle_fetch(&state, rest).await,
                _ => routes::not_found_response(&path),
            }
        }

        (&Method::POST, p) if p.starts_with(PERSONAL_PREFIX) => {
            let segment = &p[PERSONAL_PREFIX.len()..];
            if is_single_segment(segment) {
                match read_body(req).await {
                    Ok(body) => routes::handle_insert(&state, segment, body).await,
                    Err(e) => routes::error_response(e),
                }
            } else {
                routes::not_found_response(&path)
            }
        }

        _ => routes::not_found_response(&path),
    };

    if response.status().is_server_error() {
        warn!("[{}] {} {} -> {}", peer, method, path, response.status());
    }

    Ok(response)
}

/// A `:name` path parameter: non-empty, no further slashes
fn is_single_segment(segment: &str) -> bool {
    !segment.is_empty() && !segment.contains('/')
}

async fn read_body(req: Request<Incoming>) -> Result<Bytes> {
    req.collect()
        .await
        .map(|collected| collected.to_bytes())
        .map_err(|e| {
            warn!("Request body error: {}", e);
            ViewerError::BadRequest(format!("Failed to read request body: {}", e))
        })
}

/// CORS preflight response
fn preflight_response() -> Response<Full<Bytes>> {
    use hyper::header::{
        HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
        ACCESS_CONTROL_ALLOW_ORIGIN,
    };

    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = StatusCode::OK;
    let headers = response.headers_mut();
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static("*"));
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    response
}
