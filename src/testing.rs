use std::sync::Arc;

use crate::actions::ActionExecutor;
use crate::browser::{
    BrowserProvisioner, SecondarySessionRunner, SessionRegistry, TabCoordinator,
};
use crate::config::HarnessConfig;
use crate::errors::Result;
use crate::evidence::{CaptureSink, EvidenceSink};

/// Per-test lifecycle wrapper: provisions a session at setup, exposes the
/// action surface, and tears everything down at the end. Each test worker
/// builds its own harness; nothing here is shared across workers.
pub struct TestHarness {
    provisioner: Arc<BrowserProvisioner>,
    registry: Arc<SessionRegistry>,
    executor: ActionExecutor,
    tabs: TabCoordinator,
    sink: Arc<dyn EvidenceSink>,
    config: HarnessConfig,
}

impl TestHarness {
    /// Boots the driver, provisions a session per the configuration, and
    /// installs it as the worker's active session.
    pub async fn start(config: HarnessConfig, sink: Arc<dyn EvidenceSink>) -> Result<Self> {
        let provisioner = Arc::new(BrowserProvisioner::initialize().await?);
        let registry = Arc::new(SessionRegistry::new());

        let session = provisioner.provision(&config).await?;
        registry.set(session);

        let executor = ActionExecutor::new(
            Arc::clone(&registry),
            Arc::clone(&sink),
            config.timeouts.clone(),
        );
        let tabs = TabCoordinator::new(Arc::clone(&registry), config.timeouts.tab_settle_ms);

        Ok(Self {
            provisioner,
            registry,
            executor,
            tabs,
            sink,
            config,
        })
    }

    /// Convenience: capture evidence to the configured capture directory.
    pub async fn start_with_capture(config: HarnessConfig) -> Result<Self> {
        let sink = Arc::new(CaptureSink::new(config.capture_dir.clone()));
        Self::start(config, sink).await
    }

    pub fn actions(&self) -> &ActionExecutor {
        &self.executor
    }

    pub fn tabs(&self) -> &TabCoordinator {
        &self.tabs
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    pub fn secondary(&self) -> SecondarySessionRunner {
        SecondarySessionRunner::new(
            Arc::clone(&self.provisioner),
            Arc::clone(&self.registry),
            Arc::clone(&self.sink),
            self.config.clone(),
        )
    }

    /// Teardown always runs first; the soft-failure checkpoint then raises
    /// everything accumulated under `ContinueOnFailure`.
    pub async fn finish(self) -> Result<()> {
        self.registry.terminate().await;
        self.executor.assert_all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::FailureHandlingMode;
    use crate::config::BrowserKind;
    use crate::errors::HarnessError;
    use crate::evidence::RecordingSink;

    fn test_config() -> HarnessConfig {
        HarnessConfig {
            browser: BrowserKind::Chrome,
            headless: true,
            capture_dir: std::env::temp_dir().join("testkit_integration"),
            ..HarnessConfig::default()
        }
    }

    fn sink() -> Arc<RecordingSink> {
        Arc::new(RecordingSink::new("integration"))
    }

    const GREETING_PAGE: &str = "data:text/html,<html><body>\
        <h1 id='greeting'> Welcome </h1>\
        <button id='go' onclick=\"document.getElementById('greeting').textContent='Clicked'\">Go</button>\
        </body></html>";

    const OPENER_PAGE: &str = "data:text/html,<html><body>\
        <a id='open' href='about:blank' target='_blank'>open</a>\
        </body></html>";

    #[tokio::test]
    #[ignore = "requires installed Playwright browsers"]
    async fn full_round_trip_with_trimmed_verification() {
        let harness = TestHarness::start(test_config(), sink()).await.unwrap();

        harness.actions().navigate(GREETING_PAGE).await.unwrap();
        let outcome = harness
            .actions()
            .verify_text("#greeting", "Welcome", FailureHandlingMode::StopOnFailure)
            .await
            .unwrap();
        assert!(outcome.passed);

        harness.actions().click_element("#go").await.unwrap();
        let outcome = harness
            .actions()
            .verify_text("#greeting", "Clicked", FailureHandlingMode::StopOnFailure)
            .await
            .unwrap();
        assert!(outcome.passed);

        harness.finish().await.unwrap();
    }

    #[tokio::test]
    #[ignore = "requires installed Playwright browsers"]
    async fn continue_mode_reports_every_soft_failure_at_finish() {
        let harness = TestHarness::start(test_config(), sink()).await.unwrap();
        harness.actions().navigate(GREETING_PAGE).await.unwrap();

        for wrong in ["One", "Two"] {
            let outcome = harness
                .actions()
                .verify_text("#greeting", wrong, FailureHandlingMode::ContinueOnFailure)
                .await
                .unwrap();
            assert!(!outcome.passed);
        }

        match harness.finish().await {
            Err(HarnessError::SoftFailures(all)) => assert_eq!(all.len(), 2),
            other => panic!("expected aggregate soft failure, got {:?}", other.err()),
        }
    }

    #[tokio::test]
    #[ignore = "requires installed Playwright browsers"]
    async fn terminate_twice_is_idempotent() {
        let harness = TestHarness::start(test_config(), sink()).await.unwrap();
        harness.registry().terminate().await;
        harness.registry().terminate().await;
        assert!(harness.registry().get().is_none());
    }

    #[tokio::test]
    #[ignore = "requires installed Playwright browsers"]
    async fn secondary_session_restores_prior_session_even_on_failure() {
        let harness = TestHarness::start(test_config(), sink()).await.unwrap();
        let before = harness.registry().active().unwrap().id;

        let result = harness
            .secondary()
            .run_in_new_session(true, || async {
                Err(HarnessError::VerificationFailed("boom".to_string()))
            })
            .await;
        assert!(matches!(result, Err(HarnessError::SecondaryAction(_))));

        let after = harness.registry().active().unwrap().id;
        assert_eq!(before, after);
        harness.finish().await.unwrap();
    }

    #[tokio::test]
    #[ignore = "requires installed Playwright browsers"]
    async fn tab_switch_restores_original_page_after_action_error() {
        let harness = TestHarness::start(test_config(), sink()).await.unwrap();
        harness.actions().navigate(OPENER_PAGE).await.unwrap();
        harness.actions().click_element("#open").await.unwrap();

        let result = harness
            .tabs()
            .switch_to_new_tab(|| async {
                Err(HarnessError::VerificationFailed("inside tab".to_string()))
            })
            .await;
        assert!(result.is_err());

        // Back on the opener page: its anchor is still reachable.
        assert!(harness.actions().element_text("#open").await.is_ok());
        harness.finish().await.unwrap();
    }

    #[tokio::test]
    #[ignore = "requires installed Playwright browsers"]
    async fn no_new_tab_raises_after_settle_window() {
        let harness = TestHarness::start(test_config(), sink()).await.unwrap();
        harness.actions().navigate(GREETING_PAGE).await.unwrap();

        let result = harness.tabs().switch_to_new_tab(|| async { Ok(()) }).await;
        assert!(matches!(result, Err(HarnessError::NoNewTabFound)));
        harness.finish().await.unwrap();
    }
}
