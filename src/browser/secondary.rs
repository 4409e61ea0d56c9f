use std::future::Future;
use std::sync::Arc;

use playwright::api::Page;
use tracing::{error, info};

use crate::config::{ExecutionTarget, HarnessConfig, SessionOptions};
use crate::errors::{HarnessError, Result};
use crate::evidence::EvidenceSink;

use super::provisioner::BrowserProvisioner;
use super::session::SessionRegistry;

/// Runs caller-supplied actions against a fully independent, ephemeral
/// browser session, then tears it down and restores the original session.
/// The secondary session never outlives the scope of one call.
pub struct SecondarySessionRunner {
    provisioner: Arc<BrowserProvisioner>,
    registry: Arc<SessionRegistry>,
    sink: Arc<dyn EvidenceSink>,
    config: HarnessConfig,
}

impl SecondarySessionRunner {
    pub fn new(
        provisioner: Arc<BrowserProvisioner>,
        registry: Arc<SessionRegistry>,
        sink: Arc<dyn EvidenceSink>,
        config: HarnessConfig,
    ) -> Self {
        Self {
            provisioner,
            registry,
            sink,
            config,
        }
    }

    /// Saves the current slot, provisions an independent local browser,
    /// installs it as active, and runs the action. In all cases the secondary
    /// session is terminated and the saved slot restored before returning;
    /// cleanup failures are logged and never mask the action's error.
    pub async fn run_in_new_session<F, Fut>(&self, headless: bool, action: F) -> Result<()>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        let saved = self.registry.get();

        let browser = self
            .provisioner
            .launch(self.config.browser, headless)
            .await?;
        let session = match self
            .provisioner
            .new_session(
                self.config.browser,
                ExecutionTarget::Local,
                browser.clone(),
                &SessionOptions::default(),
            )
            .await
        {
            Ok(session) => session,
            Err(e) => {
                // The launch succeeded but no session exists yet; reap the
                // process before surfacing the provisioning failure.
                if let Err(close_err) = browser.close().await {
                    error!("secondary browser close failed: {}", close_err);
                }
                return Err(e);
            }
        };

        info!(session = %session.id, "secondary session installed");
        let page = session.page.clone();
        self.registry.set(session);

        self.capture(&page, "secondary_before").await;
        let result = action().await;
        self.capture(&page, "secondary_after").await;

        // Strongest cleanup guarantee in the harness: terminate the secondary
        // and put the saved handle back no matter how the action ended.
        self.registry.terminate().await;
        match saved {
            Some(previous) => self.registry.set(previous),
            None => self.registry.clear(),
        }

        result.map_err(|e| HarnessError::SecondaryAction(e.to_string()))
    }

    async fn capture(&self, page: &Page, label: &str) {
        match page.screenshot_builder().screenshot().await {
            Ok(bytes) => self.sink.attach(label, &bytes).await,
            Err(e) => error!(label, "evidence capture failed: {}", e),
        }
    }
}
