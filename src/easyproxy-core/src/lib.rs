//! HTTP/HTTPS proxy configuration model for easyproxy.
//!
//! This crate holds the reusable core behind the easyproxy front ends:
//! - An immutable [`ProxyConfig`] value (host, port, credentials, bypass list)
//! - Parsing of `host:port` text and comma-separated bypass lists
//! - Validation and construction through [`ProxyConfigEditor`]
//! - An explicit edit session state machine ([`EditSession`])
//! - Reconciliation with an injected platform proxy store ([`ProxyStore`])
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         Wizard                               │
//! │  ┌────────────────────────┐      ┌─────────────────────────┐ │
//! │  │      EditSession       │      │       ProxyStore        │ │
//! │  │  Initial -> Editing    │      │  load_current / apply   │ │
//! │  │  Valid | Invalid       │─────▶│  ┌───────────────────┐  │ │
//! │  │  Committed | Cancelled │      │  │ ServiceProxyStore │  │ │
//! │  └───────────┬────────────┘      │  │  └─ ProxyService  │  │ │
//! │              │                   │  └───────────────────┘  │ │
//! │  ┌───────────▼────────────┐      └─────────────────────────┘ │
//! │  │   ProxyConfigEditor    │                                  │
//! │  │  parse_host_port       │                                  │
//! │  │  parse_non_proxy_hosts │                                  │
//! │  └────────────────────────┘                                  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use easyproxy_core::{ProxyConfig, parse_host_port};
//!
//! let (host, port) = parse_host_port("proxy.example.com:8080")?;
//! let config = ProxyConfig::builder()
//!     .host(host)
//!     .port(port)
//!     .default_non_proxy_hosts()
//!     .non_proxy_hosts_raw("intranet.local")
//!     .build()?;
//!
//! assert_eq!(config.non_proxy_hosts(), ["127.0.0.1", "localhost", "intranet.local"]);
//! ```

pub mod address;
pub mod bypass;
pub mod config;
pub mod editor;
pub mod service;
pub mod session;
pub mod store;
pub mod wizard;

pub use address::{ProxyAddress, parse_host_port};
pub use bypass::{
    DEFAULT_NON_PROXY_HOSTS, join_non_proxy_hosts, parse_non_proxy_hosts,
    seed_default_non_proxy_hosts,
};
pub use config::{ProxyConfig, ProxyConfigBuilder};
pub use editor::{CredentialPolicy, PortInput, ProxyConfigEditor, ProxyInput, build};
pub use service::{MemoryProxyService, ProxyData, ProxyService, ProxyType};
pub use session::{EditSession, EditorFields, SessionError, SessionState};
pub use store::{ProxyStore, ServiceProxyStore, synthesize_reference};
pub use wizard::{
    SessionDriver, WizardOutcome, invoke_default_wizard, invoke_empty_wizard, invoke_wizard,
};

use thiserror::Error;

/// Errors raised while building a [`ProxyConfig`] from raw values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Host field empty or absent.
    #[error("Missing proxy host")]
    MissingHost,

    /// Port missing, non-numeric, or outside 1-65535.
    #[error("Invalid proxy port: {0}")]
    InvalidPort(String),

    /// Authentication required but user or password is empty (strict policy only).
    #[error("Authentication required but user or password is empty")]
    MissingCredentials,
}

/// Errors raised while parsing `host:port` text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Text does not split into a non-empty host and a port around exactly one colon.
    #[error("Malformed proxy address `{0}` (expected host:port)")]
    MalformedAddress(String),

    /// Port segment is not a number in 1-65535.
    #[error("Invalid proxy port: {0}")]
    InvalidPort(String),
}

/// Errors reported by the platform proxy store.
///
/// These are surfaced to the caller unchanged; nothing in this crate retries
/// or rolls back after one of them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
    /// The proxy service could not be reached.
    #[error("Proxy service unavailable: {0}")]
    Unavailable(String),

    /// Reading the current settings failed.
    #[error("Failed to read proxy settings: {0}")]
    ReadFailed(String),

    /// Writing the settings failed.
    #[error("Failed to write proxy settings: {0}")]
    WriteFailed(String),
}

/// Umbrella error for the crate.
#[derive(Debug, Error)]
pub enum EasyProxyError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Platform(#[from] PlatformError),

    #[error(transparent)]
    Session(#[from] SessionError),

    /// The interactive front end driving a session failed.
    #[error("Session driver failed: {0}")]
    Driver(String),
}

pub type Result<T> = std::result::Result<T, EasyProxyError>;
