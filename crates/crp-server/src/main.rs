//! CRP Server - Main entry point

use anyhow::Result;
use crp_common::logging::{init_logging, LogConfig};
use tracing::info;

use crp_server::{api, config::Config};

#[tokio::main]
async fn main() -> Result<()> {
    // Environment-driven logging, with server-appropriate defaults for the
    // file prefix and filter directives when the variables are unset.
    let mut log_config = LogConfig::from_env()?;
    if std::env::var("LOG_FILE_PREFIX").is_err() {
        log_config.log_file_prefix = "crp-server".to_string();
    }
    if std::env::var("LOG_FILTER").is_err() {
        log_config.filter_directives =
            Some("crp_server=debug,tower_http=debug,sqlx=info".to_string());
    }
    init_logging(&log_config)?;

    info!("Starting CRP Server");

    let config = Config::load()?;
    info!(
        "Configuration loaded - server will bind to {}:{}",
        config.server.host, config.server.port
    );

    api::serve(config).await
}
