use crate::api_server_axum::{self, AppState};
use crate::app_config::AppConfig;
use crate::dashboard::{self, DashboardSnapshot};
use crate::error::ChainError;
use crate::nse_client::{FixtureTransport, NSEClient};
use crate::processor::PutCallRatio;

use anyhow::{Context, Result};
use colored::Colorize;
use tracing::{error, info};

/// Command handler for the three run modes
pub struct ChainCommands;

impl ChainCommands {
    /// Live client, or a fixture-backed one when NSE_FIXTURE is set
    pub fn build_client(config: &AppConfig) -> Result<NSEClient> {
        match &config.fixture {
            Some(path) => {
                info!(path = %path.display(), "Serving option chain from fixture");
                let transport = FixtureTransport::from_file(path)?;
                Ok(NSEClient::with_transport(config.fetcher.clone(), transport))
            }
            None => NSEClient::new(config.fetcher.clone()).context("Failed to build NSE client"),
        }
    }

    /// Fetch once, print, exit non-zero on failure
    pub async fn run_single(config: &AppConfig) -> Result<()> {
        Self::print_banner("NSE Option Chain Dashboard");

        let client = Self::build_client(config)?;
        println!("{} Fetching option chain for {}...", "→".cyan(), config.symbol.yellow());
        println!();

        match dashboard::run_cycle(&client, &config.cycle_request(), &config.retry).await {
            Ok(snapshot) => {
                Self::display_snapshot(&snapshot);
                Ok(())
            }
            Err(e) => {
                Self::display_failure(&e);
                std::process::exit(1);
            }
        }
    }

    /// Refresh every `refresh_minutes` until Ctrl-C; failures never stop the loop
    pub async fn run_watch(config: &AppConfig) -> Result<()> {
        Self::print_banner("NSE Option Chain Dashboard (watch)");

        let client = Self::build_client(config)?;
        let request = config.cycle_request();
        let mut ticker = tokio::time::interval(config.refresh_interval());

        println!(
            "{} Auto-refresh every {} minute(s). Press Ctrl-C to stop.",
            "ℹ".blue(),
            config.refresh_minutes
        );
        println!();

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = tokio::signal::ctrl_c() => break,
            }

            tokio::select! {
                result = dashboard::run_cycle(&client, &request, &config.retry) => match result {
                    Ok(snapshot) => Self::display_snapshot(&snapshot),
                    Err(e) => {
                        error!(kind = e.kind(), error = %e, "Refresh cycle failed");
                        Self::display_failure(&e);
                    }
                },
                // stale cycle is dropped
                _ = tokio::signal::ctrl_c() => break,
            }
        }

        println!();
        println!("{}", "Stopped.".green().bold());
        Ok(())
    }

    /// Run API server mode
    pub async fn run_server(config: &AppConfig) -> Result<()> {
        Self::print_banner("NSE Option Chain API Server");

        let client = Self::build_client(config)?;
        let state = AppState::new(client, config.retry.clone());
        api_server_axum::start_server(config.port, state).await
    }

    fn print_banner(title: &str) {
        println!("{}", "=".repeat(60).blue());
        println!("{}", title.green().bold());
        println!("{}", "=".repeat(60).blue());
        println!();
    }

    /// Key metrics and the strike table
    pub fn display_snapshot(snapshot: &DashboardSnapshot) {
        let analysis = &snapshot.analysis;

        println!("{}", "📊 Key Metrics".cyan().bold());
        println!("{} {} Index Value: {:.2}", "✓".green(), snapshot.symbol.yellow(), snapshot.underlying_value);
        println!("{} ATM Strike Price: {:.2}", "✓".green(), snapshot.atm_strike);
        println!("{} Put Call Ratio (PCR): {}", "✓".green(), format_ratio(&analysis.ratio));
        println!(
            "{} Total OI → Calls: {:.0}  Puts: {:.0}",
            "ℹ".blue(),
            analysis.call_total,
            analysis.put_total
        );
        if let Some(expiry) = &snapshot.expiry {
            println!("{} Expiry: {}", "ℹ".blue(), expiry);
        } else if !snapshot.expiry_dates.is_empty() {
            println!("{} Expiries listed: {}", "ℹ".blue(), snapshot.expiry_dates.join(", "));
        }
        println!(
            "{} Exchange time: {}  (fetched {})",
            "⏱".yellow(),
            snapshot.timestamp.as_deref().unwrap_or("n/a"),
            snapshot.fetched_at.format("%H:%M:%S")
        );
        println!();

        println!(
            "{}",
            format!(
                "🔍 Strikes around {:.0} ({} shown of {})",
                analysis.window.reference_strike,
                analysis.window.rows.len(),
                snapshot.strikes.len()
            )
            .cyan()
            .bold()
        );
        println!(
            "{:>12} {:>14} {:>12} {:>14} {:>12}",
            "Strike", "Call OI", "Call Chg", "Put OI", "Put Chg"
        );
        println!("{}", "-".repeat(68));

        for row in &analysis.window.rows {
            let line = format!(
                "{:>12.2} {:>14.0} {:>+12.0} {:>14.0} {:>+12.0}",
                row.strike_price, row.call_oi, row.call_chg_oi, row.put_oi, row.put_chg_oi
            );
            if row.is_reference {
                let marker = if row.strike_price == snapshot.atm_strike { "◀ ATM" } else { "◀ selected" };
                println!("{} {}", line.yellow().bold(), marker.yellow());
            } else {
                println!("{}", line);
            }
        }

        println!("{}", "=".repeat(60).blue());
    }

    pub fn display_failure(err: &ChainError) {
        println!("{} {}", "✗".red(), err.user_message().red());
        println!("{} {}", "→".cyan(), err.to_string().dimmed());
        println!();
    }

    /// Print usage instructions
    pub fn print_usage() {
        eprintln!("Set NSE_MODE environment variable to control execution mode");
        eprintln!("Examples:");
        eprintln!("  NSE_MODE=single NSE_SYMBOL=NIFTY cargo run            # One-off dashboard");
        eprintln!("  NSE_MODE=watch NSE_REFRESH_MINS=5 cargo run           # Auto-refresh every 5 minutes");
        eprintln!("  NSE_MODE=server NSE_PORT=3001 cargo run               # JSON API on port 3001");
        eprintln!("  NSE_FIXTURE=chain.json cargo run                      # Offline, from a saved payload");
    }
}

pub fn format_ratio(ratio: &PutCallRatio) -> String {
    match ratio {
        PutCallRatio::Computed(v) => format!("{:.2}", v),
        PutCallRatio::Undefined => "n/a".to_string(),
    }
}
