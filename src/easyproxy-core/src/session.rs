//! Edit session state machine.
//!
//! ```text
//! Initial ──edit──▶ Editing ──▶ Valid ──commit──▶ Committed
//!                      ▲   └──▶ Invalid
//!                      └─────edit──┘
//! Initial | Editing | Valid | Invalid ──cancel──▶ Cancelled
//! ```
//!
//! Every field change re-runs validation. `Editing` is only observable from
//! inside an edit; once the change has been applied the session settles on
//! `Valid` or `Invalid`.

use thiserror::Error;

use super::{EasyProxyError, ProxyConfig, ProxyConfigEditor, store::ProxyStore};

/// State of an [`EditSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Initial,
    Editing,
    Valid,
    Invalid,
    Committed,
    Cancelled,
}

impl SessionState {
    /// Whether no further transition is possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Committed | SessionState::Cancelled)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SessionState::Initial => "initial",
            SessionState::Editing => "editing",
            SessionState::Valid => "valid",
            SessionState::Invalid => "invalid",
            SessionState::Committed => "committed",
            SessionState::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// Illegal session transitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// Commit requested while the fields do not form a valid configuration.
    #[error("Cannot commit a session that is {0}")]
    NotCommittable(SessionState),

    /// The session already reached a terminal state.
    #[error("Session is already {0}")]
    Closed(SessionState),

    /// Apply requested before the session was committed.
    #[error("Cannot apply a session that is {0}; commit it first")]
    NotCommitted(SessionState),

    /// The committed configuration was already handed to a store.
    #[error("Configuration was already applied")]
    AlreadyApplied,
}

/// Raw text values of the edit form.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct EditorFields {
    pub reference: Option<String>,
    /// `host:port` text.
    pub address: String,
    pub authentication_required: bool,
    pub user: String,
    pub password: String,
    /// Comma-separated bypass list.
    pub non_proxy_hosts: String,
}

impl EditorFields {
    /// Fields prefilled from an existing configuration.
    pub fn from_config(config: &ProxyConfig) -> Self {
        Self {
            reference: config.reference().map(str::to_string),
            address: config.address_text(),
            authentication_required: config.authentication_required(),
            user: config.user().unwrap_or_default().to_string(),
            password: config.password().unwrap_or_default().to_string(),
            non_proxy_hosts: config.non_proxy_hosts_text(),
        }
    }
}

impl std::fmt::Debug for EditorFields {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorFields")
            .field("reference", &self.reference)
            .field("address", &self.address)
            .field("authentication_required", &self.authentication_required)
            .field("user", &self.user)
            .field(
                "password",
                &if self.password.is_empty() { "" } else { "[REDACTED]" },
            )
            .field("non_proxy_hosts", &self.non_proxy_hosts)
            .finish()
    }
}

/// One editing session over a proxy configuration.
#[derive(Debug)]
pub struct EditSession {
    editor: ProxyConfigEditor,
    fields: EditorFields,
    state: SessionState,
    validation: Option<Result<ProxyConfig, EasyProxyError>>,
    committed: Option<ProxyConfig>,
    applied: bool,
}

impl EditSession {
    /// Start an empty session.
    pub fn new(editor: ProxyConfigEditor) -> Self {
        Self {
            editor,
            fields: EditorFields::default(),
            state: SessionState::Initial,
            validation: None,
            committed: None,
            applied: false,
        }
    }

    /// Start a session prefilled from `defaults`. The prefill counts as an
    /// edit, so the session starts out `Valid` or `Invalid`.
    pub fn with_defaults(editor: ProxyConfigEditor, defaults: &ProxyConfig) -> Self {
        let mut session = Self::new(editor);
        session.fields = EditorFields::from_config(defaults);
        session.revalidate();
        session
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn fields(&self) -> &EditorFields {
        &self.fields
    }

    /// Whether [`commit`](Self::commit) would succeed.
    pub fn can_commit(&self) -> bool {
        self.state == SessionState::Valid
    }

    /// Why the current fields are invalid, if they are.
    pub fn validation_error(&self) -> Option<&EasyProxyError> {
        match &self.validation {
            Some(Err(err)) => Some(err),
            _ => None,
        }
    }

    /// The configuration the current fields would produce.
    pub fn preview(&self) -> Option<&ProxyConfig> {
        match &self.validation {
            Some(Ok(config)) => Some(config),
            _ => None,
        }
    }

    /// The committed configuration.
    pub fn result(&self) -> Option<&ProxyConfig> {
        self.committed.as_ref()
    }

    /// Whether the committed configuration was handed to a store.
    pub fn is_applied(&self) -> bool {
        self.applied
    }

    /// Change fields and re-validate. Returns the state the session settles on.
    pub fn edit<F>(&mut self, change: F) -> Result<SessionState, SessionError>
    where
        F: FnOnce(&mut EditorFields),
    {
        if self.state.is_terminal() {
            return Err(SessionError::Closed(self.state));
        }
        self.state = SessionState::Editing;
        change(&mut self.fields);
        self.revalidate();
        Ok(self.state)
    }

    pub fn set_reference(
        &mut self,
        reference: Option<String>,
    ) -> Result<SessionState, SessionError> {
        self.edit(|fields| fields.reference = reference)
    }

    pub fn set_address(
        &mut self,
        address: impl Into<String>,
    ) -> Result<SessionState, SessionError> {
        let address = address.into();
        self.edit(|fields| fields.address = address)
    }

    pub fn set_authentication_required(
        &mut self,
        required: bool,
    ) -> Result<SessionState, SessionError> {
        self.edit(|fields| fields.authentication_required = required)
    }

    pub fn set_user(&mut self, user: impl Into<String>) -> Result<SessionState, SessionError> {
        let user = user.into();
        self.edit(|fields| fields.user = user)
    }

    pub fn set_password(
        &mut self,
        password: impl Into<String>,
    ) -> Result<SessionState, SessionError> {
        let password = password.into();
        self.edit(|fields| fields.password = password)
    }

    pub fn set_non_proxy_hosts(
        &mut self,
        non_proxy_hosts: impl Into<String>,
    ) -> Result<SessionState, SessionError> {
        let non_proxy_hosts = non_proxy_hosts.into();
        self.edit(|fields| fields.non_proxy_hosts = non_proxy_hosts)
    }

    /// Accept the current fields. Only allowed from `Valid`.
    pub fn commit(&mut self) -> Result<ProxyConfig, SessionError> {
        if self.state.is_terminal() {
            return Err(SessionError::Closed(self.state));
        }
        let config = match (&self.state, &self.validation) {
            (SessionState::Valid, Some(Ok(config))) => config.clone(),
            _ => return Err(SessionError::NotCommittable(self.state)),
        };
        self.state = SessionState::Committed;
        self.committed = Some(config.clone());
        tracing::debug!(config = %config, "edit session committed");
        Ok(config)
    }

    /// Abandon the session. Nothing is applied afterwards.
    pub fn cancel(&mut self) -> Result<(), SessionError> {
        if self.state.is_terminal() {
            return Err(SessionError::Closed(self.state));
        }
        self.state = SessionState::Cancelled;
        tracing::debug!("edit session cancelled");
        Ok(())
    }

    /// Hand the committed configuration to `store`.
    ///
    /// Allowed once per session. The attempt counts even if the store fails,
    /// so a failed apply is never repeated through the same session.
    pub fn apply_to<S>(&mut self, store: &mut S) -> super::Result<()>
    where
        S: ProxyStore + ?Sized,
    {
        let config = match (&self.state, &self.committed) {
            (SessionState::Committed, Some(config)) => config,
            _ => return Err(SessionError::NotCommitted(self.state).into()),
        };
        if self.applied {
            return Err(SessionError::AlreadyApplied.into());
        }
        self.applied = true;
        store.apply(config)?;
        Ok(())
    }

    fn revalidate(&mut self) {
        let outcome = self.editor.build_fields(&self.fields);
        self.state = match &outcome {
            Ok(_) => SessionState::Valid,
            Err(err) => {
                tracing::trace!(error = %err, "edit session fields invalid");
                SessionState::Invalid
            }
        };
        self.validation = Some(outcome);
    }
}
