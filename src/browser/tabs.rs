use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use playwright::api::{BrowserContext, Page};
use tokio::time::Instant;
use tracing::{info, warn};

use crate::errors::{HarnessError, Result};

use super::session::SessionRegistry;

const PAGE_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Detects a newly opened page within the active context, runs an action
/// against it, and restores the prior page afterward.
pub struct TabCoordinator {
    registry: Arc<SessionRegistry>,
    settle_ms: u64,
}

impl TabCoordinator {
    pub fn new(registry: Arc<SessionRegistry>, settle_ms: u64) -> Self {
        Self {
            registry,
            settle_ms,
        }
    }

    /// Waits (bounded) for a second page to exist in the context (the tab
    /// may already have materialized by the time this is called), installs
    /// it as active, runs the action, and restores the original page
    /// unconditionally before any action error propagates.
    pub async fn switch_to_new_tab<F, Fut>(&self, action: F) -> Result<()>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        let session = self.registry.active()?;
        let original = session.page.clone();

        let new_page = self.wait_for_new_page(&session.context).await?;
        info!("switching to newly opened tab");
        new_page.bring_to_front().await.ok();
        self.registry.set_active_page(new_page)?;

        let result = action().await;

        // Restoration is unconditional; only then does the error propagate.
        original.bring_to_front().await.ok();
        if let Err(e) = self.registry.set_active_page(original) {
            warn!("could not restore original page: {}", e);
        }
        result
    }

    fn pages(&self, context: &BrowserContext) -> Result<Vec<Page>> {
        context
            .pages()
            .map_err(|e| HarnessError::AnyhowError(e.to_string()))
    }

    /// The session owns one page outside a switch scope, so the first page
    /// beyond it is the new tab.
    async fn wait_for_new_page(&self, context: &BrowserContext) -> Result<Page> {
        let deadline = Instant::now() + Duration::from_millis(self.settle_ms);
        loop {
            let pages = self.pages(context)?;
            if pages.len() >= 2 {
                return pages.into_iter().nth(1).ok_or(HarnessError::NoNewTabFound);
            }
            if Instant::now() >= deadline {
                return Err(HarnessError::NoNewTabFound);
            }
            tokio::time::sleep(PAGE_POLL_INTERVAL).await;
        }
    }
}
