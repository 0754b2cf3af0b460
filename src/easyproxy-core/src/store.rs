//! Reconciliation of a [`ProxyConfig`] with an external proxy store.

use chrono::Utc;

use super::{
    PlatformError, ProxyConfig,
    bypass::normalize_non_proxy_hosts,
    editor::{PortInput, ProxyInput, build},
    service::{ProxyData, ProxyService, ProxyType},
};

/// An external store of proxy settings.
pub trait ProxyStore {
    /// Read the currently configured HTTP proxy.
    ///
    /// Returns `Ok(None)` when the store has no usable HTTP proxy.
    fn load_current(&self) -> Result<Option<ProxyConfig>, PlatformError>;

    /// Make `config` the active proxy.
    fn apply(&mut self, config: &ProxyConfig) -> Result<(), PlatformError>;
}

impl<T: ProxyStore + ?Sized> ProxyStore for &mut T {
    fn load_current(&self) -> Result<Option<ProxyConfig>, PlatformError> {
        (**self).load_current()
    }

    fn apply(&mut self, config: &ProxyConfig) -> Result<(), PlatformError> {
        (**self).apply(config)
    }
}

/// Reference label given to configurations read from a store.
pub fn synthesize_reference() -> String {
    format!("HTTP-{}", Utc::now().timestamp_millis())
}

/// [`ProxyStore`] on top of a slot-level [`ProxyService`].
#[derive(Debug, Clone, Default)]
pub struct ServiceProxyStore<S> {
    service: S,
}

impl<S: ProxyService> ServiceProxyStore<S> {
    pub fn new(service: S) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &S {
        &self.service
    }
}

impl<S: ProxyService> ProxyStore for ServiceProxyStore<S> {
    fn load_current(&self) -> Result<Option<ProxyConfig>, PlatformError> {
        let slots = self.service.proxy_data()?;
        let Some(http) = slots
            .into_iter()
            .find(|slot| slot.kind == ProxyType::Http && slot.is_set())
        else {
            tracing::debug!("no HTTP proxy configured");
            return Ok(None);
        };

        let non_proxy_hosts = self.service.non_proxied_hosts()?;

        let input = ProxyInput {
            reference: Some(synthesize_reference()),
            host: http.host,
            port: PortInput::from(http.port),
            authentication_required: http.requires_authentication,
            user: http.user_id,
            password: http.password,
            non_proxy_hosts_raw: None,
        };
        match build(input) {
            Ok(mut config) => {
                config.non_proxy_hosts = normalize_non_proxy_hosts(non_proxy_hosts);
                tracing::debug!(config = %config, "loaded current proxy");
                Ok(Some(config))
            }
            Err(err) => {
                tracing::warn!(error = %err, "ignoring unusable HTTP proxy slot");
                Ok(None)
            }
        }
    }

    fn apply(&mut self, config: &ProxyConfig) -> Result<(), PlatformError> {
        let write_credentials = config.has_usable_credentials();
        if config.authentication_required() && !write_credentials {
            tracing::warn!(
                host = config.host(),
                "authentication required but credentials are incomplete; skipping credentials"
            );
        }

        let mut slots = self.service.proxy_data()?;
        for kind in [ProxyType::Http, ProxyType::Https] {
            if !slots.iter().any(|slot| slot.kind == kind) {
                slots.push(ProxyData::new(kind));
            }
        }
        for slot in slots.iter_mut().filter(|slot| slot.kind.is_http_family()) {
            slot.host = config.host().to_string();
            slot.port = config.port();
            if write_credentials {
                slot.requires_authentication = true;
                slot.user_id = config.user().map(str::to_string);
                slot.password = config.password().map(str::to_string);
            }
        }

        self.service.set_system_proxies_enabled(false)?;
        self.service.set_proxies_enabled(true)?;
        self.service.set_proxy_data(&slots)?;
        if !config.non_proxy_hosts().is_empty() {
            self.service.set_non_proxied_hosts(config.non_proxy_hosts())?;
        }

        tracing::info!(
            address = %config.address_text(),
            credentials = write_credentials,
            non_proxy_hosts = config.non_proxy_hosts().len(),
            "applied proxy configuration"
        );
        Ok(())
    }
}
