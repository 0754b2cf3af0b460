//! Wizard entry points: run an edit session and apply its result.

use super::{EditSession, ProxyConfig, ProxyConfigEditor, SessionState, store::ProxyStore};

/// Interactive front end of an [`EditSession`].
///
/// A driver changes fields until it commits or cancels the session.
/// Returning while the session is still open is treated as a cancel.
pub trait SessionDriver {
    fn drive(&mut self, session: &mut EditSession) -> crate::Result<()>;
}

impl<F> SessionDriver for F
where
    F: FnMut(&mut EditSession) -> crate::Result<()>,
{
    fn drive(&mut self, session: &mut EditSession) -> crate::Result<()> {
        self(session)
    }
}

/// How a wizard run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardOutcome {
    /// The committed configuration was applied to the store.
    Applied(ProxyConfig),
    /// Nothing was applied.
    Cancelled,
}

impl WizardOutcome {
    pub fn applied(&self) -> Option<&ProxyConfig> {
        match self {
            WizardOutcome::Applied(config) => Some(config),
            WizardOutcome::Cancelled => None,
        }
    }
}

/// Run a session without defaults.
pub fn invoke_empty_wizard<S, D>(
    store: &mut S,
    driver: &mut D,
    editor: ProxyConfigEditor,
) -> crate::Result<WizardOutcome>
where
    S: ProxyStore + ?Sized,
    D: SessionDriver + ?Sized,
{
    invoke_wizard(store, driver, editor, None)
}

/// Run a session prefilled from the store's current configuration.
pub fn invoke_default_wizard<S, D>(
    store: &mut S,
    driver: &mut D,
    editor: ProxyConfigEditor,
) -> crate::Result<WizardOutcome>
where
    S: ProxyStore + ?Sized,
    D: SessionDriver + ?Sized,
{
    let current = store.load_current()?;
    invoke_wizard(store, driver, editor, current.as_ref())
}

/// Run a session, prefilled from `defaults` when given, and apply the
/// committed configuration to `store` once.
pub fn invoke_wizard<S, D>(
    store: &mut S,
    driver: &mut D,
    editor: ProxyConfigEditor,
    defaults: Option<&ProxyConfig>,
) -> crate::Result<WizardOutcome>
where
    S: ProxyStore + ?Sized,
    D: SessionDriver + ?Sized,
{
    let mut session = match defaults {
        Some(defaults) => EditSession::with_defaults(editor, defaults),
        None => EditSession::new(editor),
    };

    driver.drive(&mut session)?;

    if !session.state().is_terminal() {
        tracing::debug!(state = %session.state(), "driver left session open; cancelling");
        session.cancel()?;
    }

    match session.state() {
        SessionState::Committed => {
            session.apply_to(store)?;
            Ok(match session.result() {
                Some(config) => WizardOutcome::Applied(config.clone()),
                None => WizardOutcome::Cancelled,
            })
        }
        _ => Ok(WizardOutcome::Cancelled),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        EasyProxyError, MemoryProxyService, PlatformError, ServiceProxyStore,
        service::{ProxyType, ServiceOperation},
    };

    fn commit_address(address: &'static str) -> impl FnMut(&mut EditSession) -> crate::Result<()> {
        move |session| {
            session.set_address(address)?;
            session.commit()?;
            Ok(())
        }
    }

    #[test]
    fn test_empty_wizard_applies() {
        let mut store = ServiceProxyStore::new(MemoryProxyService::new());
        let mut driver = commit_address("proxy:3128");
        let outcome =
            invoke_empty_wizard(&mut store, &mut driver, ProxyConfigEditor::new()).unwrap();

        assert_eq!(outcome.applied().unwrap().address_text(), "proxy:3128");
        assert_eq!(store.service().slot(ProxyType::Http).unwrap().port, 3128);
    }

    #[test]
    fn test_cancelled_wizard_applies_nothing() {
        let mut store = ServiceProxyStore::new(MemoryProxyService::new());
        let mut driver = |session: &mut EditSession| -> crate::Result<()> {
            session.set_address("proxy:3128")?;
            session.cancel()?;
            Ok(())
        };
        let outcome =
            invoke_empty_wizard(&mut store, &mut driver, ProxyConfigEditor::new()).unwrap();

        assert_eq!(outcome, WizardOutcome::Cancelled);
        assert_eq!(
            store.service().call_count(ServiceOperation::SetProxyData),
            0
        );
    }

    #[test]
    fn test_open_session_is_cancelled() {
        let mut store = ServiceProxyStore::new(MemoryProxyService::new());
        let mut driver = |session: &mut EditSession| -> crate::Result<()> {
            session.set_address("proxy:3128")?;
            Ok(())
        };
        let outcome =
            invoke_empty_wizard(&mut store, &mut driver, ProxyConfigEditor::new()).unwrap();
        assert_eq!(outcome, WizardOutcome::Cancelled);
        assert!(!store.service().slot(ProxyType::Http).unwrap().is_set());
    }

    #[test]
    fn test_default_wizard_prefills_from_store() {
        let mut store = ServiceProxyStore::new(MemoryProxyService::new());
        let mut first = commit_address("first:1");
        invoke_empty_wizard(&mut store, &mut first, ProxyConfigEditor::new()).unwrap();

        let mut seen = None;
        let mut driver = |session: &mut EditSession| -> crate::Result<()> {
            seen = Some(session.fields().address.clone());
            assert_eq!(session.state(), SessionState::Valid);
            session.set_address("second:2")?;
            session.commit()?;
            Ok(())
        };
        let outcome =
            invoke_default_wizard(&mut store, &mut driver, ProxyConfigEditor::new()).unwrap();

        assert_eq!(seen.as_deref(), Some("first:1"));
        let applied = outcome.applied().unwrap();
        assert_eq!(applied.address_text(), "second:2");
        assert!(applied.reference().unwrap().starts_with("HTTP-"));
    }

    #[test]
    fn test_wizard_surfaces_store_failure() {
        let mut service = MemoryProxyService::new();
        service.fail_next(
            ServiceOperation::SetProxyData,
            PlatformError::WriteFailed("denied".to_string()),
        );
        let mut store = ServiceProxyStore::new(service);
        let mut driver = commit_address("proxy:1");
        let err =
            invoke_empty_wizard(&mut store, &mut driver, ProxyConfigEditor::new()).unwrap_err();

        assert!(matches!(
            err,
            EasyProxyError::Platform(PlatformError::WriteFailed(_))
        ));
        assert_eq!(
            store.service().call_count(ServiceOperation::SetProxyData),
            1
        );
    }
}
