use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;

use fabricant::config::Config;
use fabricant::workflow::{ConfigConnector, Phase, Session, SyncPolicy};

/// Create a feature branch and a matching Fabric workspace linked to it.
#[derive(Debug, Parser)]
#[command(name = "fabricant", version, about)]
struct Cli {
    /// Config file (default: ~/.fabricant/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory for log files (default: ~/.fabricant/logs)
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let log_dir = fabricant::util::init_logging(cli.log_dir);
    info!(log_dir = ?log_dir, "Starting fabricant");

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    let policy = SyncPolicy::from(&config.sync);
    let connector = Arc::new(ConfigConnector::new(config));

    let session = fabricant::tui::run(connector, policy)
        .await
        .context("Terminal error")?;

    Ok(report(&session))
}

/// Print the outcome once the terminal is restored.
fn report(session: &Session) -> ExitCode {
    let completed = session.progress();
    match session.phase() {
        Phase::Done => {
            println!("Success!");
            for entry in completed {
                println!("  ✓ {}", entry);
            }
            if let Some(summary) = session.summary() {
                println!("{}", summary);
            }
            ExitCode::SUCCESS
        }
        Phase::Error => {
            if let Some(error) = session.error() {
                eprintln!("Error: {}", error);
            }
            for entry in completed {
                eprintln!("  ✓ {}", entry);
            }
            ExitCode::FAILURE
        }
        phase => {
            info!(phase = %phase, "Aborted by user");
            if !completed.is_empty() {
                eprintln!("Aborted. Steps already applied remotely:");
                for entry in completed {
                    eprintln!("  ✓ {}", entry);
                }
            }
            ExitCode::SUCCESS
        }
    }
}
