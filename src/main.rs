use std::sync::Arc;

use tracing::{error, info, warn};

use netfs::{BlobStore, Config, Database, WebServer};

const CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() {
    // Load configuration
    let (mut config, load_error) = match Config::load(CONFIG_PATH) {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };
    config.apply_env_overrides();

    // Initialize logging
    if let Err(e) = netfs::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        // Fall back to console-only logging
        netfs::logging::init_console_only(&config.logging.level);
    }

    if let Some(e) = load_error {
        warn!("Failed to load {}: {}. Using default configuration.", CONFIG_PATH, e);
    }

    if let Err(e) = run(config).await {
        error!("NetFS stopped: {}", e);
        std::process::exit(1);
    }
}

async fn run(config: Config) -> netfs::Result<()> {
    config.validate()?;

    info!("NetFS - networked file store");

    let db = Arc::new(Database::open(&config.database.path).await?);
    let blobs = Arc::new(BlobStore::new(&config.files.storage_path)?);
    info!("Blob storage at {}", config.files.storage_path);

    let server = WebServer::new(&config, db, blobs)?;
    info!("Server configured on {}", server.addr());

    server.run().await?;
    Ok(())
}
