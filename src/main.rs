use std::sync::Arc;

use tracing::info;

use epgmux::{spawn_guide_updater, Config, GuideStore, GuideUpdater, WebServer};

#[tokio::main]
async fn main() -> epgmux::Result<()> {
    // Load configuration
    let config = match Config::load_with_env("config.toml") {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config.toml: {e}");
            eprintln!("Using default configuration.");
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        }
    };

    config.validate()?;

    // Initialize logging
    if let Err(e) = epgmux::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        // Fall back to console-only logging
        epgmux::logging::init_console_only(&config.logging.level);
    }

    info!("EPGMUX - EPG merge service");
    info!(
        "Merging {} feeds every {}s",
        config.feeds.urls.len(),
        config.feeds.update_interval_secs
    );

    let store = Arc::new(GuideStore::new());

    // The updater stops when its handle is dropped, so hold it for the
    // lifetime of the server.
    let updater = GuideUpdater::new(&config.feeds, store.clone())?;
    let _updater_handle = spawn_guide_updater(updater);

    let server = WebServer::new(&config.server, store)?;
    info!(
        "Guide will be served at http://{}:{}/{}",
        config.server.host, config.server.port, config.server.artifact_filename
    );

    server.run().await?;

    Ok(())
}
