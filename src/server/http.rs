//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo for async handling. Each connection gets
//! its own task; each request runs an ordered sequence of collaborator
//! calls with no intra-handler concurrency.

use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

use crate::auth::{KeyValueStore, MemoryKv, SessionManager};
use crate::config::Args;
use crate::db::MongoClient;
use crate::files::{FileIndex, MemoryFileIndex, MongoFileIndex, UploadPipeline};
use crate::routes::{self, error_response, BoxBody};
use crate::storage::BlobStore;
use crate::types::{CabinetError, Result};
use crate::users::{MemoryUserStore, MongoUserStore, UserStore};

/// Shared application state: configuration plus the injected collaborators
/// every handler works against.
pub struct AppState {
    pub args: Args,
    /// Present when the metadata stores are MongoDB-backed
    pub mongo: Option<MongoClient>,
    pub sessions: SessionManager,
    pub users: Arc<dyn UserStore>,
    pub files: Arc<dyn FileIndex>,
    pub blobs: Arc<BlobStore>,
    pub uploads: UploadPipeline,
}

impl AppState {
    /// Production state: MongoDB-backed user store and file index
    pub async fn with_mongo(
        args: Args,
        mongo: MongoClient,
        kv: Arc<dyn KeyValueStore>,
    ) -> Result<Self> {
        let users: Arc<dyn UserStore> = Arc::new(MongoUserStore::new(&mongo).await?);
        let files: Arc<dyn FileIndex> = Arc::new(MongoFileIndex::new(&mongo).await?);
        Ok(Self::assemble(args, Some(mongo), users, files, kv))
    }

    /// Dev-mode and test state: everything in memory
    pub fn in_memory(args: Args) -> Self {
        Self::assemble(
            args,
            None,
            Arc::new(MemoryUserStore::new()),
            Arc::new(MemoryFileIndex::new()),
            Arc::new(MemoryKv::new()),
        )
    }

    fn assemble(
        args: Args,
        mongo: Option<MongoClient>,
        users: Arc<dyn UserStore>,
        files: Arc<dyn FileIndex>,
        kv: Arc<dyn KeyValueStore>,
    ) -> Self {
        let sessions = SessionManager::new(kv, args.session_ttl());
        let blobs = Arc::new(BlobStore::new(&args.folder_path));
        let uploads = UploadPipeline::new(Arc::clone(&files), Arc::clone(&blobs));

        Self {
            args,
            mongo,
            sessions,
            users,
            files,
            blobs,
            uploads,
        }
    }
}

/// Start the HTTP server
pub async fn run(state: Arc<AppState>) -> Result<()> {
    let listener = TcpListener::bind(state.args.listen)
        .await
        .map_err(|e| CabinetError::Config(format!("Failed to bind {}: {}", state.args.listen, e)))?;

    info!("Cabinet listening on {}", state.args.listen);

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

/// Route incoming HTTP requests
async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> std::result::Result<Response<BoxBody>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    debug!("[{}] {} {}", addr, method, path);

    let response = match (method, path.as_str()) {
        (Method::GET, "/status") => routes::handle_status(state).await,
        (Method::GET, "/stats") => routes::handle_stats(state).await,

        (Method::POST, "/users") => routes::handle_register(req, state).await,
        (Method::GET, "/users/me") => routes::handle_me(req, state).await,

        (Method::GET, "/connect") => routes::handle_connect(req, state).await,
        (Method::GET, "/disconnect") => routes::handle_disconnect(req, state).await,

        (Method::POST, "/files") => routes::handle_upload(req, state).await,
        (Method::GET, "/files") => routes::handle_list(req, state).await,

        (Method::GET, p) if p.starts_with("/files/") && p.ends_with("/data") => {
            match routes::files::path_file_id(p) {
                Some(id) => {
                    let id = id.to_string();
                    routes::handle_data(req, state, &id).await
                }
                None => error_response(CabinetError::NotFound),
            }
        }

        (Method::PUT, p) if p.starts_with("/files/") && p.ends_with("/publish") => {
            match routes::files::path_file_id(p) {
                Some(id) => {
                    let id = id.to_string();
                    routes::handle_publish(req, state, &id, true).await
                }
                None => error_response(CabinetError::NotFound),
            }
        }

        (Method::PUT, p) if p.starts_with("/files/") && p.ends_with("/unpublish") => {
            match routes::files::path_file_id(p) {
                Some(id) => {
                    let id = id.to_string();
                    routes::handle_publish(req, state, &id, false).await
                }
                None => error_response(CabinetError::NotFound),
            }
        }

        (Method::GET, p) if p.starts_with("/files/") => {
            match routes::files::path_exact_file_id(p) {
                Some(id) => {
                    let id = id.to_string();
                    routes::handle_show(req, state, &id).await
                }
                None => error_response(CabinetError::NotFound),
            }
        }

        _ => error_response(CabinetError::NotFound),
    };

    Ok(response)
}
