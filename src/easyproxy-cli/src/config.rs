//! CLI settings and the application directory.
//!
//! Settings live in `config.toml` inside the application directory:
//! `$EASYPROXY_HOME` when set, otherwise `~/.easyproxy`. A missing file means
//! defaults; command-line flags override whatever the file says.

use anyhow::{Context, Result};
use easyproxy_core::{CredentialPolicy, ProxyConfigEditor};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::cli::{LogLevel, OutputFormat};

/// Primary home directory name.
pub const HOME_DIR_NAME: &str = ".easyproxy";

/// Environment variable overriding the application directory.
pub const HOME_ENV_VAR: &str = "EASYPROXY_HOME";

/// Settings file name inside the application directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Resolve the application directory.
///
/// A relative `EASYPROXY_HOME` is resolved against the current directory.
pub fn app_home() -> Option<PathBuf> {
    if let Ok(home) = std::env::var(HOME_ENV_VAR)
        && !home.is_empty()
    {
        let home = PathBuf::from(home);
        if home.is_relative() {
            return std::env::current_dir().ok().map(|cwd| cwd.join(home));
        }
        return Some(home);
    }
    dirs::home_dir().map(|h| h.join(HOME_DIR_NAME))
}

/// Path of the settings file.
pub fn config_file() -> Option<PathBuf> {
    app_home().map(|home| home.join(CONFIG_FILE_NAME))
}

/// Settings read from `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    /// What to do with authentication lacking a user or password.
    pub credential_policy: CredentialPolicy,

    /// Seed built configurations with 127.0.0.1 and localhost.
    pub seed_default_non_proxy_hosts: bool,

    /// Encoding of printed configurations.
    pub output_format: OutputFormat,

    /// Log verbosity when no flag or environment variable sets one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<LogLevel>,
}

impl CliConfig {
    /// Load settings from `path`. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no settings file, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Invalid settings file {}", path.display()))
    }

    /// Load settings from the application directory.
    pub fn load() -> Result<LoadedConfig> {
        let path = config_file();
        let config = match &path {
            Some(path) => Self::load_from(path)?,
            None => Self::default(),
        };
        Ok(LoadedConfig { config, path })
    }

    /// Editor for this run. `strict` and `seed_defaults` come from flags and
    /// can only tighten or add to the file settings.
    pub fn editor(&self, strict: bool, seed_defaults: bool) -> ProxyConfigEditor {
        let policy = if strict {
            CredentialPolicy::Strict
        } else {
            self.credential_policy
        };
        ProxyConfigEditor::new()
            .with_policy(policy)
            .with_default_non_proxy_hosts(seed_defaults || self.seed_default_non_proxy_hosts)
    }

    /// Output format for this run.
    pub fn output_format(&self, flag: Option<OutputFormat>) -> OutputFormat {
        flag.unwrap_or(self.output_format)
    }
}

/// Settings together with the file they were looked up in.
#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
    pub config: CliConfig,
    pub path: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = CliConfig::load_from(&dir.path().join(CONFIG_FILE_NAME)).unwrap();
        assert_eq!(config, CliConfig::default());
        assert_eq!(config.credential_policy, CredentialPolicy::Lenient);
        assert_eq!(config.output_format, OutputFormat::Json);
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(
            &path,
            r#"
credential_policy = "strict"
seed_default_non_proxy_hosts = true
output_format = "toml"
log_level = "debug"
"#,
        )
        .unwrap();

        let config = CliConfig::load_from(&path).unwrap();
        assert_eq!(
            config,
            CliConfig {
                credential_policy: CredentialPolicy::Strict,
                seed_default_non_proxy_hosts: true,
                output_format: OutputFormat::Toml,
                log_level: Some(LogLevel::Debug),
            }
        );
    }

    #[test]
    fn test_load_rejects_unknown_keys() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "credential_policy = \"sometimes\"\n").unwrap();
        let err = CliConfig::load_from(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("Invalid settings file"));

        std::fs::write(&path, "proxy_host = \"x\"\n").unwrap();
        assert!(CliConfig::load_from(&path).is_err());
    }

    #[test]
    fn test_flags_override_file() {
        let config = CliConfig {
            credential_policy: CredentialPolicy::Lenient,
            seed_default_non_proxy_hosts: false,
            output_format: OutputFormat::Toml,
            log_level: None,
        };
        let editor = config.editor(true, true);
        assert_eq!(editor.policy(), CredentialPolicy::Strict);
        assert!(editor.seeds_default_non_proxy_hosts());

        let editor = config.editor(false, false);
        assert_eq!(editor.policy(), CredentialPolicy::Lenient);
        assert!(!editor.seeds_default_non_proxy_hosts());

        assert_eq!(config.output_format(None), OutputFormat::Toml);
        assert_eq!(
            config.output_format(Some(OutputFormat::Json)),
            OutputFormat::Json
        );
    }

    #[test]
    #[serial]
    fn test_home_env_override() {
        let dir = TempDir::new().unwrap();
        // SAFETY: serialized with the other tests touching this variable
        unsafe {
            std::env::set_var(HOME_ENV_VAR, dir.path());
        }
        assert_eq!(app_home(), Some(dir.path().to_path_buf()));
        assert_eq!(config_file(), Some(dir.path().join(CONFIG_FILE_NAME)));

        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "output_format = \"toml\"\n",
        )
        .unwrap();
        let loaded = CliConfig::load().unwrap();
        assert_eq!(loaded.config.output_format, OutputFormat::Toml);
        assert_eq!(loaded.path, Some(dir.path().join(CONFIG_FILE_NAME)));

        unsafe {
            std::env::remove_var(HOME_ENV_VAR);
        }
    }

    #[test]
    #[serial]
    fn test_home_defaults_to_dot_dir() {
        // SAFETY: serialized with the other tests touching this variable
        unsafe {
            std::env::remove_var(HOME_ENV_VAR);
        }
        if let Some(home) = app_home() {
            assert!(home.ends_with(HOME_DIR_NAME));
        }
    }
}
