//! CLI argument structures and parsing.
//!
//! Defines all command-line argument structures using clap.

use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::styles::{AFTER_HELP, get_styles};

/// Log verbosity level for CLI output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Only show errors
    Error,
    /// Show warnings and errors (default)
    #[default]
    Warn,
    /// Show informational messages, warnings, and errors
    Info,
    /// Show debug messages and above
    Debug,
    /// Show all messages including trace-level details
    Trace,
}

impl LogLevel {
    /// Convert to tracing filter string.
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }

    /// Parse from string (case-insensitive).
    pub fn from_str_loose(s: &str) -> Option<LogLevel> {
        match s.to_lowercase().as_str() {
            "error" => Some(LogLevel::Error),
            "warn" | "warning" => Some(LogLevel::Warn),
            "info" => Some(LogLevel::Info),
            "debug" => Some(LogLevel::Debug),
            "trace" => Some(LogLevel::Trace),
            _ => None,
        }
    }
}

/// Encoding used when printing a proxy configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Toml,
}

/// easyproxy - HTTP/HTTPS proxy configuration tool
#[derive(Parser, Debug)]
#[command(name = "easyproxy")]
#[command(author, version)]
#[command(about = "Validate, build and edit HTTP/HTTPS proxy configurations", long_about = None)]
#[command(styles = get_styles(), after_help = AFTER_HELP)]
pub struct Cli {
    /// Enable verbose output (same as --log-level debug)
    #[arg(long = "verbose", short = 'v', global = true)]
    pub verbose: bool,

    /// Enable trace-level logging for debugging
    #[arg(long = "trace", global = true)]
    pub trace: bool,

    /// Log verbosity
    #[arg(long = "log-level", global = true, value_enum)]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Effective log level.
    ///
    /// `--trace` wins over `--verbose`, which wins over the environment
    /// variable, then `--log-level`, then the settings file.
    pub fn effective_log_level(
        &self,
        env_level: Option<&str>,
        file_level: Option<LogLevel>,
    ) -> LogLevel {
        if self.trace {
            LogLevel::Trace
        } else if self.verbose {
            LogLevel::Debug
        } else if let Some(level) = env_level.and_then(LogLevel::from_str_loose) {
            level
        } else {
            self.log_level.or(file_level).unwrap_or_default()
        }
    }
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse and validate a `host:port` proxy address
    #[command(display_order = 1)]
    Check(CheckCommand),

    /// Split a comma-separated bypass (non-proxy hosts) list
    #[command(display_order = 2)]
    Bypass(BypassCommand),

    /// Build a proxy configuration from flags
    #[command(display_order = 3)]
    Build(BuildCommand),

    /// Edit a proxy configuration interactively and preview the result
    #[command(display_order = 4)]
    Edit(EditCommand),

    /// Show the effective CLI settings
    #[command(display_order = 10)]
    Config(ConfigCommand),

    /// Generate shell completion scripts
    #[command(display_order = 11)]
    Completion(CompletionCommand),
}

/// Check command.
#[derive(Args, Debug)]
pub struct CheckCommand {
    /// Address to check, as `host:port`
    #[arg(value_name = "ADDRESS")]
    pub address: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Bypass command.
#[derive(Args, Debug)]
pub struct BypassCommand {
    /// Comma-separated list of hosts
    #[arg(value_name = "LIST", allow_hyphen_values = true)]
    pub list: String,

    /// Prepend 127.0.0.1 and localhost
    #[arg(long = "with-defaults")]
    pub with_defaults: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Build command.
#[derive(Args, Debug)]
pub struct BuildCommand {
    /// Proxy address as `host:port`
    #[arg(long, short = 'a', value_name = "HOST:PORT")]
    pub address: String,

    /// Label for the configuration
    #[arg(long, short = 'r')]
    pub reference: Option<String>,

    /// The proxy requires authentication
    #[arg(long)]
    pub auth: bool,

    /// User name for authentication
    #[arg(long, short = 'u', requires = "auth")]
    pub user: Option<String>,

    /// Password for authentication
    #[arg(long, short = 'p', requires = "auth")]
    pub password: Option<String>,

    /// Comma-separated bypass list
    #[arg(long, short = 'b', value_name = "LIST")]
    pub bypass: Option<String>,

    /// Seed the bypass list with 127.0.0.1 and localhost
    #[arg(long = "default-bypass")]
    pub default_bypass: bool,

    /// Reject authentication without both user and password
    #[arg(long)]
    pub strict: bool,

    /// Output format (defaults to the settings file value)
    #[arg(long, short = 'f', value_enum)]
    pub format: Option<OutputFormat>,
}

/// Edit command.
#[derive(Args, Debug)]
pub struct EditCommand {
    /// Prefill from a JSON or TOML proxy configuration file
    #[arg(long, value_name = "FILE")]
    pub from: Option<PathBuf>,

    /// Seed the bypass list with 127.0.0.1 and localhost
    #[arg(long = "default-bypass")]
    pub default_bypass: bool,

    /// Reject authentication without both user and password
    #[arg(long)]
    pub strict: bool,

    /// Output format (defaults to the settings file value)
    #[arg(long, short = 'f', value_enum)]
    pub format: Option<OutputFormat>,
}

/// Config command.
#[derive(Args, Debug)]
pub struct ConfigCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Completion command.
#[derive(Args, Debug)]
pub struct CompletionCommand {
    /// Shell to generate completions for (detected from $SHELL when omitted)
    #[arg(value_enum)]
    pub shell: Option<clap_complete::Shell>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::{CommandFactory, Parser};

    // ==========================================================================
    // LogLevel tests
    // ==========================================================================

    #[test]
    fn test_log_level_default() {
        assert_eq!(LogLevel::default(), LogLevel::Warn);
    }

    #[test]
    fn test_log_level_from_str_loose() {
        assert_eq!(LogLevel::from_str_loose("WARNING"), Some(LogLevel::Warn));
        assert_eq!(LogLevel::from_str_loose("TrAcE"), Some(LogLevel::Trace));
        assert_eq!(LogLevel::from_str_loose("verbose"), None);
        assert_eq!(LogLevel::from_str_loose(""), None);
    }

    #[test]
    fn test_effective_log_level_precedence() {
        let cli = Cli::try_parse_from(["easyproxy", "check", "h:1"]).unwrap();
        assert_eq!(cli.effective_log_level(None, None), LogLevel::Warn);
        assert_eq!(
            cli.effective_log_level(None, Some(LogLevel::Info)),
            LogLevel::Info
        );
        assert_eq!(
            cli.effective_log_level(Some("debug"), Some(LogLevel::Info)),
            LogLevel::Debug
        );
        assert_eq!(
            cli.effective_log_level(Some("nonsense"), Some(LogLevel::Info)),
            LogLevel::Info
        );

        let cli =
            Cli::try_parse_from(["easyproxy", "--log-level", "error", "check", "h:1"]).unwrap();
        assert_eq!(
            cli.effective_log_level(None, Some(LogLevel::Info)),
            LogLevel::Error
        );

        let cli = Cli::try_parse_from(["easyproxy", "check", "h:1", "-v", "--trace"]).unwrap();
        assert_eq!(
            cli.effective_log_level(Some("error"), None),
            LogLevel::Trace
        );
    }

    // ==========================================================================
    // Command parsing tests
    // ==========================================================================

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_check_command() {
        let cli = Cli::try_parse_from(["easyproxy", "check", "proxy:8080", "--json"]).unwrap();
        match cli.command {
            Commands::Check(check) => {
                assert_eq!(check.address, "proxy:8080");
                assert!(check.json);
            }
            other => panic!("expected check, got {:?}", other),
        }
    }

    #[test]
    fn test_command_is_required() {
        assert!(Cli::try_parse_from(["easyproxy"]).is_err());
    }

    #[test]
    fn test_build_command() {
        let cli = Cli::try_parse_from([
            "easyproxy",
            "build",
            "--address",
            "proxy:3128",
            "--auth",
            "--user",
            "alice",
            "--password",
            "pw",
            "--bypass",
            "a,b",
            "--default-bypass",
            "--format",
            "toml",
        ])
        .unwrap();
        let Commands::Build(build) = cli.command else {
            panic!("expected build");
        };
        assert_eq!(build.address, "proxy:3128");
        assert!(build.auth);
        assert_eq!(build.user.as_deref(), Some("alice"));
        assert_eq!(build.password.as_deref(), Some("pw"));
        assert_eq!(build.bypass.as_deref(), Some("a,b"));
        assert!(build.default_bypass);
        assert!(!build.strict);
        assert_eq!(build.format, Some(OutputFormat::Toml));
    }

    #[test]
    fn test_build_user_requires_auth() {
        let result = Cli::try_parse_from([
            "easyproxy",
            "build",
            "--address",
            "proxy:3128",
            "--user",
            "alice",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_build_requires_address() {
        assert!(Cli::try_parse_from(["easyproxy", "build"]).is_err());
    }

    #[test]
    fn test_edit_command() {
        let cli =
            Cli::try_parse_from(["easyproxy", "edit", "--from", "proxy.toml", "--strict"]).unwrap();
        let Commands::Edit(edit) = cli.command else {
            panic!("expected edit");
        };
        assert_eq!(edit.from, Some(PathBuf::from("proxy.toml")));
        assert!(edit.strict);
        assert_eq!(edit.format, None);
    }

    #[test]
    fn test_completion_command() {
        let cli = Cli::try_parse_from(["easyproxy", "completion", "zsh"]).unwrap();
        let Commands::Completion(completion) = cli.command else {
            panic!("expected completion");
        };
        assert_eq!(completion.shell, Some(clap_complete::Shell::Zsh));

        let cli = Cli::try_parse_from(["easyproxy", "completion"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Completion(CompletionCommand { shell: None })
        ));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["easyproxy", "bypass", "a,b", "--verbose"]).unwrap();
        assert!(cli.verbose);
    }
}
