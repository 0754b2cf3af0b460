//! easyproxy CLI library module.
//!
//! # Module Organization
//!
//! - `cli/` - CLI argument parsing and command dispatch
//! - `config` - Settings file and application directory
//! - `prompt` - Line-oriented edit session front end
//! - `styled_output` - Status messages on stderr

pub mod cli;
pub mod config;
pub mod prompt;
pub mod styled_output;

/// Environment variable selecting the log level.
pub const LOG_LEVEL_ENV_VAR: &str = "EASYPROXY_LOG_LEVEL";
