use std::path::Path;

use anyhow::Context;
use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;

use salespipe::cli::{self, Cli};

static LOG_GUARD: std::sync::OnceLock<WorkerGuard> = std::sync::OnceLock::new();

fn main() {
    let cli = Cli::parse();

    if let Err(error) = init_tracing(&cli.db) {
        eprintln!("warning: logging disabled: {}", error);
    }

    if let Err(error) = cli::run(cli) {
        tracing::error!(error = %error, "command failed");
        eprintln!("error: {}", error);
        std::process::exit(1);
    }
}

fn init_tracing(db_path: &Path) -> anyhow::Result<()> {
    let base = db_path.parent().filter(|dir| !dir.as_os_str().is_empty());
    let log_dir = base.unwrap_or_else(|| Path::new(".")).join("logs");
    std::fs::create_dir_all(&log_dir).context("create log directory")?;
    let file_appender = tracing_appender::rolling::daily(log_dir, "salespipe.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let _ = LOG_GUARD.set(guard);

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .json()
        .with_writer(non_blocking)
        .try_init()
        .map_err(|error| anyhow::anyhow!(error))
}
