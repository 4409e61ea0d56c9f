use std::time::Duration;

use playwright::api::frame::FrameState;
use playwright::api::{ElementHandle, Page};
use tracing::warn;

use crate::config::TimeoutConfig;
use crate::errors::{HarnessError, Result};

/// Locates the element lazily and waits until it is visible, bounded by the
/// readiness ceiling. A miss is a hard failure regardless of any
/// failure-handling mode.
pub async fn wait_for_visible(
    page: &Page,
    selector: &str,
    timeout_ms: u64,
) -> Result<ElementHandle> {
    page.wait_for_selector_builder(selector)
        .state(FrameState::Visible)
        .timeout(timeout_ms as f64)
        .wait_for_selector()
        .await
        .map_err(|e| {
            warn!(selector, "visibility wait failed: {}", e);
            HarnessError::WaitTimeout {
                selector: selector.to_string(),
            }
        })?
        .ok_or_else(|| HarnessError::WaitTimeout {
            selector: selector.to_string(),
        })
}

/// Two-phase clickable wait: the state-driven visibility wait, then an
/// enabled-state poll on a fixed interval up to the configured retry count.
pub async fn wait_for_clickable(
    page: &Page,
    selector: &str,
    timeouts: &TimeoutConfig,
) -> Result<ElementHandle> {
    let element = wait_for_visible(page, selector, timeouts.readiness_ms).await?;

    let interval = Duration::from_millis(timeouts.enabled_poll_interval_ms);
    for _ in 0..timeouts.enabled_poll_retries {
        match element.is_enabled().await {
            Ok(true) => return Ok(element),
            Ok(false) => {}
            Err(e) => warn!(selector, "enabled-state probe failed: {}", e),
        }
        tokio::time::sleep(interval).await;
    }
    Err(HarnessError::ElementNotInteractable {
        selector: selector.to_string(),
    })
}
