//! Mongo Viewer - schema-less MongoDB browser

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mongo_viewer::{
    config::Args,
    connection::redact_uri,
    db::MongoConnector,
    server::{self, AppState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    // Initialize tracing/logging
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("mongo_viewer={},info", args.log_level).into());
    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("======================================");
    info!("  Mongo Viewer");
    info!("======================================");
    info!("Listen: {}", args.listen_addr());
    info!("Default MongoDB: {}", redact_uri(&args.mongodb_uri));
    info!(
        "Personal DB: {}",
        args.personal_db_uri()
            .map(redact_uri)
            .unwrap_or_else(|| "(not configured)".to_string())
    );
    info!("Store timeout: {}ms", args.store_timeout_ms);
    info!("======================================");

    // Browse and insert targets get their own connector instances
    let browse = Arc::new(MongoConnector::new(
        args.mongodb_db.clone(),
        args.store_timeout_ms,
    ));
    let insert = Arc::new(MongoConnector::new(
        args.personal_db_name.clone(),
        args.store_timeout_ms,
    ));

    let state = Arc::new(AppState::new(args.clone(), browse, insert));

    if args.connect_on_start {
        match state.connections.connect(&args.mongodb_uri).await {
            Ok(collections) => info!("Startup connection ready ({} collections)", collections.len()),
            Err(e) => warn!("Startup connection failed, waiting for /api/connect: {}", e),
        }
    }

    server::run(state).await?;

    info!("Mongo Viewer stopped");
    Ok(())
}
