//! Scholarship tracker API server

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use scholarship_tracker::{
    config::Args,
    db::MongoClient,
    server::{self, mailer_from_args, AppState},
    store::{MemoryRepository, MongoRepository, Repository},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("scholarship_tracker={},info", args.log_level).into());
    let registry = tracing_subscriber::registry().with(filter);
    if args.log_format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("======================================");
    info!("  Scholarship Tracker API");
    info!("======================================");
    info!("Listen: {}", args.listen);
    info!("Mode: {}", if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" });
    info!("MongoDB database: {}", args.mongodb_db);
    info!("Invite links: {}/<token>", args.invite_base_url());
    info!("Resend after: {} days", args.invite_resend_after_days);
    info!("======================================");

    let repo = connect_repository(&args).await;
    let mailer = mailer_from_args(&args)?;
    info!("Mailer: {}", mailer.name());

    let state = Arc::new(AppState::new(args, repo, mailer)?);
    server::run(state).await?;

    Ok(())
}

/// MongoDB when reachable; dev mode falls back to memory
async fn connect_repository(args: &Args) -> Arc<dyn Repository> {
    let Some(uri) = args.mongodb_uri.as_deref() else {
        warn!("MONGODB_URI not set (dev mode) - using in-memory storage, data is lost on restart");
        return Arc::new(MemoryRepository::new());
    };

    let connected = match MongoClient::new(uri, &args.mongodb_db).await {
        Ok(client) => MongoRepository::new(&client).await,
        Err(e) => Err(e),
    };

    match connected {
        Ok(repo) => {
            info!("MongoDB connected successfully");
            Arc::new(repo)
        }
        Err(e) if args.dev_mode => {
            warn!("MongoDB connection failed (dev mode, using in-memory storage): {}", e);
            Arc::new(MemoryRepository::new())
        }
        Err(e) => {
            error!("MongoDB connection failed: {}", e);
            std::process::exit(1);
        }
    }
}
