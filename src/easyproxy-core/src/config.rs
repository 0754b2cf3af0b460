//! Proxy configuration value.

use serde::{Deserialize, Serialize};

use super::{
    ValidationError,
    bypass::{self, join_non_proxy_hosts},
    editor::{PortInput, ProxyInput, build},
};

/// One HTTP/HTTPS proxy definition.
///
/// Values are only produced by [`build`] (directly, through
/// [`ProxyConfigBuilder`], or through deserialization) and are never mutated
/// afterwards; an edit produces a new value.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawProxyConfig", into = "RawProxyConfig")]
pub struct ProxyConfig {
    pub(crate) reference: Option<String>,
    pub(crate) host: String,
    pub(crate) port: u16,
    pub(crate) authentication_required: bool,
    pub(crate) user: Option<String>,
    pub(crate) password: Option<String>,
    pub(crate) non_proxy_hosts: Vec<String>,
}

impl ProxyConfig {
    /// Create a builder for a configuration.
    pub fn builder() -> ProxyConfigBuilder {
        ProxyConfigBuilder::new()
    }

    /// Human-readable label, if any.
    pub fn reference(&self) -> Option<&str> {
        self.reference.as_deref()
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn authentication_required(&self) -> bool {
        self.authentication_required
    }

    /// User name. Always `None` when authentication is not required.
    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    /// Password. Always `None` when authentication is not required.
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    /// Bypass list, trimmed and without empty entries.
    pub fn non_proxy_hosts(&self) -> &[String] {
        &self.non_proxy_hosts
    }

    /// Whether credentials would be written when this configuration is applied.
    pub fn has_usable_credentials(&self) -> bool {
        self.authentication_required
            && self.user.as_deref().is_some_and(|u| !u.is_empty())
            && self.password.as_deref().is_some_and(|p| !p.is_empty())
    }

    /// The address rendered as `host:port`.
    pub fn address_text(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The bypass list rendered as comma-separated text.
    pub fn non_proxy_hosts_text(&self) -> String {
        join_non_proxy_hosts(&self.non_proxy_hosts)
    }

    /// Copy of this configuration with a different reference label.
    pub fn with_reference(&self, reference: impl Into<String>) -> Self {
        Self {
            reference: Some(reference.into()),
            ..self.clone()
        }
    }
}

impl std::fmt::Debug for ProxyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyConfig")
            .field("reference", &self.reference)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("authentication_required", &self.authentication_required)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("non_proxy_hosts", &self.non_proxy_hosts)
            .finish()
    }
}

impl std::fmt::Display for ProxyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(reference) = &self.reference {
            write!(f, "{} ", reference)?;
        }
        write!(f, "{}:{}", self.host, self.port)?;
        if self.authentication_required {
            match &self.user {
                Some(user) if !user.is_empty() => write!(f, " (auth as {})", user)?,
                _ => write!(f, " (auth)")?,
            }
        }
        if !self.non_proxy_hosts.is_empty() {
            write!(f, " bypass [{}]", self.non_proxy_hosts.join(", "))?;
        }
        Ok(())
    }
}

/// Wire shape of [`ProxyConfig`]; deserialized values go through [`build`].
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawProxyConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reference: Option<String>,

    host: String,

    port: i64,

    #[serde(default)]
    authentication_required: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    user: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    password: Option<String>,

    #[serde(default)]
    non_proxy_hosts: Vec<String>,
}

impl TryFrom<RawProxyConfig> for ProxyConfig {
    type Error = ValidationError;

    fn try_from(raw: RawProxyConfig) -> Result<Self, Self::Error> {
        let mut config = build(ProxyInput {
            reference: raw.reference,
            host: raw.host,
            port: PortInput::Number(raw.port),
            authentication_required: raw.authentication_required,
            user: raw.user,
            password: raw.password,
            non_proxy_hosts_raw: None,
        })?;
        config.non_proxy_hosts = bypass::normalize_non_proxy_hosts(raw.non_proxy_hosts);
        Ok(config)
    }
}

impl From<ProxyConfig> for RawProxyConfig {
    fn from(config: ProxyConfig) -> Self {
        Self {
            reference: config.reference,
            host: config.host,
            port: i64::from(config.port),
            authentication_required: config.authentication_required,
            user: config.user,
            password: config.password,
            non_proxy_hosts: config.non_proxy_hosts,
        }
    }
}

/// Builder for [`ProxyConfig`].
///
/// The builder only collects inputs; all validation happens in
/// [`build`](ProxyConfigBuilder::build).
#[derive(Debug, Default)]
pub struct ProxyConfigBuilder {
    input: ProxyInput,
    non_proxy_hosts: Vec<String>,
}

impl ProxyConfigBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the reference label.
    pub fn reference(mut self, reference: impl Into<String>) -> Self {
        self.input.reference = Some(reference.into());
        self
    }

    /// Set the host.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.input.host = host.into();
        self
    }

    /// Set the port, as a number or as text.
    pub fn port(mut self, port: impl Into<PortInput>) -> Self {
        self.input.port = port.into();
        self
    }

    /// Set whether the proxy requires authentication.
    pub fn authentication(mut self, required: bool) -> Self {
        self.input.authentication_required = required;
        self
    }

    /// Require authentication with the given credentials.
    pub fn credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.input.authentication_required = true;
        self.input.user = Some(user.into());
        self.input.password = Some(password.into());
        self
    }

    /// Add one bypass entry.
    pub fn non_proxy_host(mut self, host: impl Into<String>) -> Self {
        self.non_proxy_hosts.push(host.into());
        self
    }

    /// Add the entries of a comma-separated bypass list.
    pub fn non_proxy_hosts_raw(mut self, raw: &str) -> Self {
        self.non_proxy_hosts.extend(bypass::parse_non_proxy_hosts(raw));
        self
    }

    /// Add `127.0.0.1` and `localhost` to the bypass list.
    pub fn default_non_proxy_hosts(mut self) -> Self {
        self.non_proxy_hosts.extend(bypass::default_non_proxy_hosts());
        self
    }

    /// Validate the collected inputs and build the configuration.
    pub fn build(self) -> Result<ProxyConfig, ValidationError> {
        let mut config = build(self.input)?;
        config.non_proxy_hosts = bypass::normalize_non_proxy_hosts(self.non_proxy_hosts);
        Ok(config)
    }
}
