use std::sync::Mutex;

use playwright::api::{Browser, BrowserContext, Page};
use tracing::{info, warn};

use crate::config::{BrowserKind, ExecutionTarget};
use crate::errors::{HarnessError, Result};

/// One isolated browsing context plus its current page, owned by a single
/// test worker. The handles are cheap clones onto driver-side objects.
#[derive(Clone)]
pub struct Session {
    pub id: String,
    pub kind: BrowserKind,
    pub target: ExecutionTarget,
    pub browser: Browser,
    pub context: BrowserContext,
    pub page: Page,
}

impl Session {
    pub(crate) fn new(
        kind: BrowserKind,
        target: ExecutionTarget,
        browser: Browser,
        context: BrowserContext,
        page: Page,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            target,
            browser,
            context,
            page,
        }
    }
}

/// Single-slot registry for a worker's active session. Each test worker owns
/// its own registry, so no cross-worker visibility exists by construction.
/// Swaps are last-write-wins; callers that nest swaps save and restore the
/// prior handle themselves.
#[derive(Default)]
pub struct SessionRegistry {
    slot: Mutex<Option<Session>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty is a valid state before setup and after teardown.
    pub fn get(&self) -> Option<Session> {
        self.slot.lock().expect("session slot poisoned").clone()
    }

    /// The current session, or the programmer error every action raises when
    /// test code runs before setup.
    pub fn active(&self) -> Result<Session> {
        self.get().ok_or(HarnessError::SessionNotInitialized)
    }

    pub fn set(&self, session: Session) {
        *self.slot.lock().expect("session slot poisoned") = Some(session);
    }

    /// Swaps only the active page on the current session.
    pub fn set_active_page(&self, page: Page) -> Result<()> {
        let mut slot = self.slot.lock().expect("session slot poisoned");
        match slot.as_mut() {
            Some(session) => {
                session.page = page;
                Ok(())
            }
            None => Err(HarnessError::SessionNotInitialized),
        }
    }

    pub fn clear(&self) {
        *self.slot.lock().expect("session slot poisoned") = None;
    }

    /// Closes the owning context (which closes its pages) and clears the
    /// slot. Idempotent: with no active session this is a no-op.
    pub async fn terminate(&self) {
        let taken = self.slot.lock().expect("session slot poisoned").take();
        let Some(session) = taken else {
            return;
        };
        info!(session = %session.id, "terminating session");
        if let Err(e) = session.context.close().await {
            warn!(session = %session.id, "context close failed: {}", e);
        }
        // A locally launched browser process has no other owner; shut it down
        // too. Remote browsers only see the client detach.
        if session.target == ExecutionTarget::Local {
            if let Err(e) = session.browser.close().await {
                warn!(session = %session.id, "browser close failed: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_registry_reports_missing_session() {
        let registry = SessionRegistry::new();
        assert!(registry.get().is_none());
        assert!(matches!(
            registry.active(),
            Err(HarnessError::SessionNotInitialized)
        ));
    }

    #[tokio::test]
    async fn terminate_on_empty_slot_is_a_noop() {
        let registry = SessionRegistry::new();
        registry.terminate().await;
        registry.terminate().await;
        assert!(registry.get().is_none());
    }

    #[test]
    fn clear_on_empty_slot_is_a_noop() {
        let registry = SessionRegistry::new();
        registry.clear();
        assert!(registry.get().is_none());
    }
}
