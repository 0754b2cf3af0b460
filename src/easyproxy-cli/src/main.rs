//! easyproxy CLI - Main entry point.
//!
//! Validates `host:port` addresses and bypass lists, builds proxy
//! configurations from flags, and runs interactive edit sessions whose
//! result is previewed against an in-memory platform proxy store.

use anyhow::Result;
use clap::Parser;

use easyproxy_cli::LOG_LEVEL_ENV_VAR;
use easyproxy_cli::cli::{Cli, dispatch_command};
use easyproxy_cli::config::CliConfig;
use easyproxy_cli::styled_output::print_error;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded = CliConfig::load()?;

    let env_level = std::env::var(LOG_LEVEL_ENV_VAR).ok();
    let log_level = cli.effective_log_level(env_level.as_deref(), loaded.config.log_level);

    let filter_str = if std::env::var("RUST_LOG").is_ok() {
        format!(
            "error,easyproxy_cli={},easyproxy_core={}",
            log_level.as_filter_str(),
            log_level.as_filter_str()
        )
    } else {
        log_level.as_filter_str().to_string()
    };

    tracing_subscriber::fmt()
        .with_env_filter(&filter_str)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(
        settings = ?loaded.path,
        level = log_level.as_filter_str(),
        "starting easyproxy"
    );

    if let Err(err) = dispatch_command(cli, &loaded) {
        print_error(&format!("{:#}", err));
        std::process::exit(1);
    }
    Ok(())
}
