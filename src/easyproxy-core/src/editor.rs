//! Validation and construction of [`ProxyConfig`] values from raw input.

use serde::{Deserialize, Serialize};

use super::{
    ValidationError,
    address::{check_port, parse_host_port, parse_port},
    bypass::{parse_non_proxy_hosts, seed_default_non_proxy_hosts},
    config::ProxyConfig,
    session::EditorFields,
};

/// Port as entered by the caller: either already numeric or raw text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortInput {
    Number(i64),
    Text(String),
}

impl Default for PortInput {
    fn default() -> Self {
        PortInput::Text(String::new())
    }
}

impl From<u16> for PortInput {
    fn from(port: u16) -> Self {
        PortInput::Number(i64::from(port))
    }
}

impl From<i32> for PortInput {
    fn from(port: i32) -> Self {
        PortInput::Number(i64::from(port))
    }
}

impl From<i64> for PortInput {
    fn from(port: i64) -> Self {
        PortInput::Number(port)
    }
}

impl From<&str> for PortInput {
    fn from(port: &str) -> Self {
        PortInput::Text(port.to_string())
    }
}

impl From<String> for PortInput {
    fn from(port: String) -> Self {
        PortInput::Text(port)
    }
}

/// Raw arguments of [`build`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProxyInput {
    pub reference: Option<String>,
    pub host: String,
    pub port: PortInput,
    pub authentication_required: bool,
    pub user: Option<String>,
    pub password: Option<String>,
    /// Comma-separated bypass list.
    pub non_proxy_hosts_raw: Option<String>,
}

/// Build a validated [`ProxyConfig`].
///
/// The host is trimmed and must not be empty; the port must be an integer in
/// 1-65535. Credentials are discarded when authentication is not required.
/// Nothing is modified on failure.
pub fn build(input: ProxyInput) -> Result<ProxyConfig, ValidationError> {
    let host = input.host.trim();
    if host.is_empty() {
        return Err(ValidationError::MissingHost);
    }

    let port = match &input.port {
        PortInput::Number(value) => check_port(*value),
        PortInput::Text(text) => parse_port(text.trim()),
    }
    .map_err(ValidationError::InvalidPort)?;

    let (user, password) = if input.authentication_required {
        (input.user, input.password)
    } else {
        (None, None)
    };

    let non_proxy_hosts = input
        .non_proxy_hosts_raw
        .as_deref()
        .map(parse_non_proxy_hosts)
        .unwrap_or_default();

    let reference = input.reference.filter(|r| !r.trim().is_empty());

    tracing::debug!(
        host,
        port,
        authentication_required = input.authentication_required,
        non_proxy_hosts = non_proxy_hosts.len(),
        "built proxy configuration"
    );

    Ok(ProxyConfig {
        reference,
        host: host.to_string(),
        port,
        authentication_required: input.authentication_required,
        user,
        password,
        non_proxy_hosts,
    })
}

/// What to do when authentication is required but a credential is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialPolicy {
    /// Accept the configuration; credentials are skipped when applied.
    #[default]
    Lenient,

    /// Reject the configuration with [`ValidationError::MissingCredentials`].
    Strict,
}

impl std::fmt::Display for CredentialPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialPolicy::Lenient => write!(f, "lenient"),
            CredentialPolicy::Strict => write!(f, "strict"),
        }
    }
}

impl std::str::FromStr for CredentialPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "lenient" | "skip" => Ok(CredentialPolicy::Lenient),
            "strict" | "require" => Ok(CredentialPolicy::Strict),
            _ => Err(format!("Unknown credential policy: {}", s)),
        }
    }
}

/// Turns raw user input into validated configurations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProxyConfigEditor {
    policy: CredentialPolicy,
    seed_default_non_proxy_hosts: bool,
}

impl ProxyConfigEditor {
    /// Create an editor with the lenient policy and no bypass seeding.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the credential policy.
    pub fn with_policy(mut self, policy: CredentialPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Seed every built configuration with `127.0.0.1` and `localhost`.
    pub fn with_default_non_proxy_hosts(mut self, seed: bool) -> Self {
        self.seed_default_non_proxy_hosts = seed;
        self
    }

    pub fn policy(&self) -> CredentialPolicy {
        self.policy
    }

    pub fn seeds_default_non_proxy_hosts(&self) -> bool {
        self.seed_default_non_proxy_hosts
    }

    /// Validate the address field alone.
    pub fn validate_address(&self, text: &str) -> Result<(String, u16), super::ParseError> {
        parse_host_port(text)
    }

    /// Build a configuration, applying the credential policy and seeding.
    pub fn build(&self, input: ProxyInput) -> Result<ProxyConfig, ValidationError> {
        let mut config = build(input)?;

        if self.policy == CredentialPolicy::Strict
            && config.authentication_required
            && !config.has_usable_credentials()
        {
            return Err(ValidationError::MissingCredentials);
        }

        if self.seed_default_non_proxy_hosts {
            config.non_proxy_hosts =
                seed_default_non_proxy_hosts(std::mem::take(&mut config.non_proxy_hosts));
        }

        Ok(config)
    }

    /// Build a configuration from the text fields of an edit form.
    ///
    /// The address is parsed first; its failure takes precedence over any
    /// other problem with the form.
    pub fn build_fields(&self, fields: &EditorFields) -> super::Result<ProxyConfig> {
        let (host, port) = self.validate_address(&fields.address)?;
        let input = ProxyInput {
            reference: fields.reference.clone(),
            host,
            port: PortInput::from(port),
            authentication_required: fields.authentication_required,
            user: Some(fields.user.clone()),
            password: Some(fields.password.clone()),
            non_proxy_hosts_raw: Some(fields.non_proxy_hosts.clone()),
        };
        Ok(self.build(input)?)
    }
}
