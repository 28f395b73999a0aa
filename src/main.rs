use anyhow::Result;
use nse_option_chain::app_config::{AppConfig, Mode};
use nse_option_chain::commands::ChainCommands;
use nse_option_chain::logging;

#[tokio::main]
async fn main() -> Result<()> {
    // Logging first so configuration warnings are recorded
    logging::init_logging(&AppConfig::log_dir_from_env())?;

    // ========================================
    // CONFIGURATION - from environment
    // ========================================
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            ChainCommands::print_usage();
            std::process::exit(1);
        }
    };

    config.validate()?;

    tracing::info!(
        mode = ?config.mode,
        symbol = %config.symbol,
        log_dir = %config.log_dir.display(),
        "Starting"
    );

    match config.mode {
        Mode::Single => ChainCommands::run_single(&config).await?,
        Mode::Watch => ChainCommands::run_watch(&config).await?,
        Mode::Server => ChainCommands::run_server(&config).await?,
    }

    Ok(())
}
