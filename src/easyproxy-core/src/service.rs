//! Slot-level model of a platform proxy service.
//!
//! A platform keeps one proxy entry per protocol (its "slots") plus a few
//! global switches. [`ProxyService`] is the seam a host integration
//! implements; [`MemoryProxyService`] keeps everything in memory.

use serde::{Deserialize, Serialize};

use super::PlatformError;

/// Protocol of a proxy slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProxyType {
    Http,
    Https,
    Socks,
}

impl ProxyType {
    /// Every slot a platform service exposes.
    pub const ALL: [ProxyType; 3] = [ProxyType::Http, ProxyType::Https, ProxyType::Socks];

    /// Whether a [`ProxyConfig`](crate::ProxyConfig) is written to this slot.
    pub fn is_http_family(&self) -> bool {
        matches!(self, ProxyType::Http | ProxyType::Https)
    }
}

impl std::fmt::Display for ProxyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProxyType::Http => write!(f, "HTTP"),
            ProxyType::Https => write!(f, "HTTPS"),
            ProxyType::Socks => write!(f, "SOCKS"),
        }
    }
}

/// One proxy slot. An empty host or a zero port means the slot is unset.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyData {
    pub kind: ProxyType,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub port: u16,
    #[serde(default)]
    pub requires_authentication: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl ProxyData {
    /// An unset slot.
    pub fn new(kind: ProxyType) -> Self {
        Self {
            kind,
            host: String::new(),
            port: 0,
            requires_authentication: false,
            user_id: None,
            password: None,
        }
    }

    /// Whether the slot holds an address.
    pub fn is_set(&self) -> bool {
        !self.host.is_empty() && self.port != 0
    }
}

impl std::fmt::Debug for ProxyData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyData")
            .field("kind", &self.kind)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("requires_authentication", &self.requires_authentication)
            .field("user_id", &self.user_id)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// A platform proxy service.
///
/// Each call is a single platform operation; callers must not assume any
/// transactional behaviour across calls.
pub trait ProxyService {
    /// Current slots.
    fn proxy_data(&self) -> Result<Vec<ProxyData>, PlatformError>;

    /// Replace the slots.
    fn set_proxy_data(&mut self, data: &[ProxyData]) -> Result<(), PlatformError>;

    /// Whether the operating system's proxy settings are used.
    fn set_system_proxies_enabled(&mut self, enabled: bool) -> Result<(), PlatformError>;

    /// Whether the manually configured slots are used.
    fn set_proxies_enabled(&mut self, enabled: bool) -> Result<(), PlatformError>;

    /// Current bypass list.
    fn non_proxied_hosts(&self) -> Result<Vec<String>, PlatformError>;

    /// Replace the bypass list.
    fn set_non_proxied_hosts(&mut self, hosts: &[String]) -> Result<(), PlatformError>;
}

/// Operations of [`MemoryProxyService`] that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceOperation {
    ReadProxyData,
    SetProxyData,
    SetNonProxiedHosts,
}

/// In-memory [`ProxyService`].
///
/// Starts with three unset slots, system proxies enabled and manual proxies
/// disabled. Every call is recorded so tests can check how often the
/// platform was hit.
#[derive(Debug, Clone)]
pub struct MemoryProxyService {
    slots: Vec<ProxyData>,
    system_proxies_enabled: bool,
    proxies_enabled: bool,
    non_proxied_hosts: Vec<String>,
    failures: Vec<(ServiceOperation, PlatformError)>,
    calls: Vec<ServiceOperation>,
}

impl Default for MemoryProxyService {
    fn default() -> Self {
        Self {
            slots: ProxyType::ALL.iter().map(|kind| ProxyData::new(*kind)).collect(),
            system_proxies_enabled: true,
            proxies_enabled: false,
            non_proxied_hosts: Vec::new(),
            failures: Vec::new(),
            calls: Vec::new(),
        }
    }
}

impl MemoryProxyService {
    /// Create a service with unset slots.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace one slot.
    pub fn with_slot(mut self, data: ProxyData) -> Self {
        match self.slots.iter_mut().find(|slot| slot.kind == data.kind) {
            Some(slot) => *slot = data,
            None => self.slots.push(data),
        }
        self
    }

    /// Set the bypass list.
    pub fn with_non_proxied_hosts(
        mut self,
        hosts: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.non_proxied_hosts = hosts.into_iter().map(Into::into).collect();
        self
    }

    /// Make the next call of `operation` fail with `error`.
    pub fn fail_next(&mut self, operation: ServiceOperation, error: PlatformError) {
        self.failures.push((operation, error));
    }

    /// The slot of the given protocol.
    pub fn slot(&self, kind: ProxyType) -> Option<&ProxyData> {
        self.slots.iter().find(|slot| slot.kind == kind)
    }

    /// All slots.
    pub fn slots(&self) -> &[ProxyData] {
        &self.slots
    }

    pub fn system_proxies_enabled(&self) -> bool {
        self.system_proxies_enabled
    }

    pub fn proxies_enabled(&self) -> bool {
        self.proxies_enabled
    }

    /// Bypass list as currently stored.
    pub fn stored_non_proxied_hosts(&self) -> &[String] {
        &self.non_proxied_hosts
    }

    /// How many times `operation` was called.
    pub fn call_count(&self, operation: ServiceOperation) -> usize {
        self.calls.iter().filter(|call| **call == operation).count()
    }

    fn take_failure(&mut self, operation: ServiceOperation) -> Result<(), PlatformError> {
        self.calls.push(operation);
        match self.failures.iter().position(|(op, _)| *op == operation) {
            Some(index) => Err(self.failures.remove(index).1),
            None => Ok(()),
        }
    }
}

impl ProxyService for MemoryProxyService {
    fn proxy_data(&self) -> Result<Vec<ProxyData>, PlatformError> {
        if let Some((_, error)) = self
            .failures
            .iter()
            .find(|(op, _)| *op == ServiceOperation::ReadProxyData)
        {
            return Err(error.clone());
        }
        Ok(self.slots.clone())
    }

    fn set_proxy_data(&mut self, data: &[ProxyData]) -> Result<(), PlatformError> {
        self.take_failure(ServiceOperation::SetProxyData)?;
        self.slots = data.to_vec();
        Ok(())
    }

    fn set_system_proxies_enabled(&mut self, enabled: bool) -> Result<(), PlatformError> {
        self.system_proxies_enabled = enabled;
        Ok(())
    }

    fn set_proxies_enabled(&mut self, enabled: bool) -> Result<(), PlatformError> {
        self.proxies_enabled = enabled;
        Ok(())
    }

    fn non_proxied_hosts(&self) -> Result<Vec<String>, PlatformError> {
        Ok(self.non_proxied_hosts.clone())
    }

    fn set_non_proxied_hosts(&mut self, hosts: &[String]) -> Result<(), PlatformError> {
        self.take_failure(ServiceOperation::SetNonProxiedHosts)?;
        self.non_proxied_hosts = hosts.to_vec();
        Ok(())
    }
}
