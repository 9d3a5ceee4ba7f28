//! Cabinet - file-management gateway
//!
//! Token-authenticated file hierarchy backed by MongoDB metadata and a
//! local blob store.

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cabinet::{
    auth::{spawn_sweep_task, KeyValueStore, MemoryKv},
    config::Args,
    db::MongoClient,
    server,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    // Parse command line arguments
    let args = Args::parse();

    // Initialize tracing/logging
    let log_level = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("cabinet={},info", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Validate configuration
    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    // Print startup banner
    info!("======================================");
    info!("  Cabinet - File Management Gateway");
    info!("======================================");
    info!("Listen: {}", args.listen);
    info!("Mode: {}", if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" });
    info!("MongoDB: {} (db: {})", args.mongodb_uri, args.mongodb_db);
    info!("Storage root: {}", args.folder_path.display());
    info!("Session TTL: {}s", args.session_ttl_secs);
    info!("======================================");

    // Session store with a periodic expiry sweep
    let kv = Arc::new(MemoryKv::new());
    let _sweep = spawn_sweep_task(Arc::clone(&kv), std::time::Duration::from_secs(60));
    let kv: Arc<dyn KeyValueStore> = kv;

    // Connect to MongoDB (optional in dev mode)
    let state = match MongoClient::new(&args.mongodb_uri, &args.mongodb_db).await {
        Ok(client) => {
            info!("MongoDB connected successfully");
            server::AppState::with_mongo(args.clone(), client, kv).await?
        }
        Err(e) => {
            if args.dev_mode {
                warn!("MongoDB connection failed (dev mode, using in-memory stores): {}", e);
                server::AppState::in_memory(args.clone())
            } else {
                error!("MongoDB connection failed: {}", e);
                std::process::exit(1);
            }
        }
    };

    // Run the server
    if let Err(e) = server::run(Arc::new(state)).await {
        error!("Server error: {:?}", e);
        std::process::exit(1);
    }

    Ok(())
}
