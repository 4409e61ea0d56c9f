use std::path::Path;
use std::sync::Arc;

use playwright::api::{DocumentLoadState, File, Page};
use tracing::{error, info};

use crate::browser::session::SessionRegistry;
use crate::config::TimeoutConfig;
use crate::errors::{HarnessError, Result};
use crate::evidence::{EvidenceLevel, EvidenceSink};

use super::verify::{apply_policy, FailureHandlingMode, SoftFailureLog, VerificationOutcome};
use super::wait;

/// Stateless primitives against the active session's page. Every operation
/// resolves the page, waits for readiness, performs the interaction, and
/// emits evidence; verification operations additionally dispatch their
/// outcome through the caller's failure-handling mode.
pub struct ActionExecutor {
    registry: Arc<SessionRegistry>,
    sink: Arc<dyn EvidenceSink>,
    timeouts: TimeoutConfig,
    soft: SoftFailureLog,
}

impl ActionExecutor {
    pub fn new(
        registry: Arc<SessionRegistry>,
        sink: Arc<dyn EvidenceSink>,
        timeouts: TimeoutConfig,
    ) -> Self {
        Self {
            registry,
            sink,
            timeouts,
            soft: SoftFailureLog::new(),
        }
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    pub fn soft_failures(&self) -> &SoftFailureLog {
        &self.soft
    }

    /// End-of-test checkpoint for soft failures accumulated under
    /// `ContinueOnFailure`.
    pub fn assert_all(&self) -> Result<()> {
        self.soft.checkpoint()
    }

    fn page(&self) -> Result<Page> {
        Ok(self.registry.active()?.page)
    }

    /// Best-effort screenshot tagged with the operation name. Capture
    /// failures are logged and never alter the operation's outcome.
    async fn capture(&self, operation: &str) {
        let page = match self.page() {
            Ok(page) => page,
            Err(_) => return,
        };
        match page.screenshot_builder().screenshot().await {
            Ok(bytes) => self.sink.attach(operation, &bytes).await,
            Err(e) => error!(operation, "evidence capture failed: {}", e),
        }
    }

    /// Navigates and waits for the strictest readiness condition. Callers
    /// needing faster turnaround pick a looser condition via
    /// [`navigate_with`](Self::navigate_with).
    pub async fn navigate(&self, url: &str) -> Result<()> {
        self.navigate_with(url, None, DocumentLoadState::NetworkIdle)
            .await
    }

    pub async fn navigate_with(
        &self,
        url: &str,
        timeout_ms: Option<u64>,
        wait_until: DocumentLoadState,
    ) -> Result<()> {
        let page = self.page()?;
        let timeout = timeout_ms.unwrap_or(self.timeouts.navigation_ms);
        info!(url, timeout_ms = timeout, "navigating");

        page.goto_builder(url)
            .timeout(timeout as f64)
            .wait_until(wait_until)
            .goto()
            .await
            .map_err(|e| {
                error!(url, "navigation failed: {}", e);
                HarnessError::NavigationFailed {
                    url: url.to_string(),
                    reason: e.to_string(),
                }
            })?;
        self.capture("navigate").await;
        Ok(())
    }

    /// Fills the element after it becomes visible. Raises the underlying
    /// interaction error after logging; disposition is the caller's call.
    pub async fn set_text(&self, selector: &str, text: &str) -> Result<()> {
        let page = self.page()?;
        let element = wait::wait_for_visible(&page, selector, self.timeouts.readiness_ms).await?;
        element.fill_builder(text).fill().await.map_err(|e| {
            error!(selector, operation = "set_text", "fill failed: {}", e);
            HarnessError::InteractionFailed {
                selector: selector.to_string(),
                reason: e.to_string(),
            }
        })?;
        info!(selector, "filled element");
        self.capture("set_text").await;
        Ok(())
    }

    /// Clicks the element once it is both visible and enabled.
    pub async fn click_element(&self, selector: &str) -> Result<()> {
        let page = self.page()?;
        let element = wait::wait_for_clickable(&page, selector, &self.timeouts).await?;
        element.click_builder().click().await.map_err(|e| {
            error!(selector, operation = "click", "click failed: {}", e);
            HarnessError::InteractionFailed {
                selector: selector.to_string(),
                reason: e.to_string(),
            }
        })?;
        info!(selector, "clicked element");
        self.capture("click").await;
        Ok(())
    }

    /// Visible text of the element, once visible.
    pub async fn element_text(&self, selector: &str) -> Result<String> {
        let page = self.page()?;
        let element = wait::wait_for_visible(&page, selector, self.timeouts.readiness_ms).await?;
        element.inner_text().await.map_err(|e| {
            error!(selector, operation = "read_text", "text read failed: {}", e);
            HarnessError::InteractionFailed {
                selector: selector.to_string(),
                reason: e.to_string(),
            }
        })
    }

    pub async fn element_enabled(&self, selector: &str) -> Result<bool> {
        let page = self.page()?;
        let element = wait::wait_for_visible(&page, selector, self.timeouts.readiness_ms).await?;
        element.is_enabled().await.map_err(|e| {
            error!(selector, operation = "check_enabled", "enabled probe failed: {}", e);
            HarnessError::InteractionFailed {
                selector: selector.to_string(),
                reason: e.to_string(),
            }
        })
    }

    /// Uploads a local file into the input identified by the selector.
    pub async fn upload_file(&self, selector: &str, file_path: &Path) -> Result<()> {
        let page = self.page()?;
        wait::wait_for_visible(&page, selector, self.timeouts.readiness_ms).await?;

        let bytes = tokio::fs::read(file_path).await?;
        let name = file_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "upload.bin".to_string());
        let file = File {
            name,
            mime: "application/octet-stream".to_string(),
            buffer: base64::encode(&bytes),
        };

        page.set_input_files_builder(selector, file)
            .set_input_files()
            .await
            .map_err(|e| {
                error!(selector, operation = "upload", "upload failed: {}", e);
                HarnessError::UploadFailed {
                    selector: selector.to_string(),
                    reason: e.to_string(),
                }
            })?;
        info!(selector, path = %file_path.display(), "uploaded file");
        self.capture("upload").await;
        Ok(())
    }

    /// Evidence for a verification: the screenshot plus, on a mismatch, a
    /// log line for the report trail. Runs before policy dispatch so a
    /// Stop-mode failure still leaves its artifacts behind.
    async fn record_outcome(&self, operation: &str, outcome: &VerificationOutcome) {
        self.capture(operation).await;
        if !outcome.passed {
            self.sink.log(EvidenceLevel::Warn, &outcome.message()).await;
        }
    }

    /// Verifies the element's text equals the expectation (trimmed).
    pub async fn verify_text(
        &self,
        selector: &str,
        expected: &str,
        mode: FailureHandlingMode,
    ) -> Result<VerificationOutcome> {
        let actual = self.element_text(selector).await?;
        let outcome = VerificationOutcome::text_equals(selector, &actual, expected);
        self.record_outcome("verify_text", &outcome).await;
        apply_policy(&outcome, mode, &self.soft)?;
        Ok(outcome)
    }

    pub async fn verify_contains(
        &self,
        selector: &str,
        needle: &str,
        mode: FailureHandlingMode,
    ) -> Result<VerificationOutcome> {
        let actual = self.element_text(selector).await?;
        let outcome = VerificationOutcome::text_contains(selector, &actual, needle);
        self.record_outcome("verify_contains", &outcome).await;
        apply_policy(&outcome, mode, &self.soft)?;
        Ok(outcome)
    }

    pub async fn verify_not_contains(
        &self,
        selector: &str,
        needle: &str,
        mode: FailureHandlingMode,
    ) -> Result<VerificationOutcome> {
        let actual = self.element_text(selector).await?;
        let outcome = VerificationOutcome::text_not_contains(selector, &actual, needle);
        self.record_outcome("verify_not_contains", &outcome).await;
        apply_policy(&outcome, mode, &self.soft)?;
        Ok(outcome)
    }

    pub async fn verify_enabled(
        &self,
        selector: &str,
        expected_enabled: bool,
        mode: FailureHandlingMode,
    ) -> Result<VerificationOutcome> {
        let actual = self.element_enabled(selector).await?;
        let outcome = VerificationOutcome::enabled_state(selector, actual, expected_enabled);
        self.record_outcome("verify_enabled", &outcome).await;
        apply_policy(&outcome, mode, &self.soft)?;
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::RecordingSink;

    fn bare_executor() -> ActionExecutor {
        ActionExecutor::new(
            Arc::new(SessionRegistry::new()),
            Arc::new(RecordingSink::new("executor-tests")),
            TimeoutConfig::default(),
        )
    }

    #[tokio::test]
    async fn actions_without_a_session_raise_immediately() {
        let executor = bare_executor();
        assert!(matches!(
            executor.navigate("https://example.com").await,
            Err(HarnessError::SessionNotInitialized)
        ));
        assert!(matches!(
            executor.click_element("#go").await,
            Err(HarnessError::SessionNotInitialized)
        ));
        assert!(matches!(
            executor
                .verify_text("#t", "x", FailureHandlingMode::Optional)
                .await,
            Err(HarnessError::SessionNotInitialized)
        ));
    }

    #[tokio::test]
    async fn missing_session_is_never_downgraded_by_mode() {
        let executor = bare_executor();
        for mode in [
            FailureHandlingMode::StopOnFailure,
            FailureHandlingMode::ContinueOnFailure,
            FailureHandlingMode::Optional,
        ] {
            let err = executor.verify_text("#t", "x", mode).await.unwrap_err();
            assert!(matches!(err, HarnessError::SessionNotInitialized));
        }
        assert!(executor.assert_all().is_ok());
    }

    #[tokio::test]
    async fn checkpoint_is_clean_without_soft_failures() {
        let executor = bare_executor();
        tokio_test::assert_ok!(executor.assert_all());
    }
}
