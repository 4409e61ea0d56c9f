use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::{HarnessError, Result};

/// How a failed verification escalates. Attached per call, never per
/// session. Readiness and session errors ignore this entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureHandlingMode {
    /// Abort the test at the first failing assertion.
    StopOnFailure,
    /// Record the failure, keep going, raise everything at the checkpoint.
    ContinueOnFailure,
    /// Log only; the test proceeds as if nothing failed.
    Optional,
}

/// What a single verification observed. Produced and consumed within one
/// executor call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationOutcome {
    pub passed: bool,
    pub actual: String,
    pub expected: String,
    pub selector: String,
}

impl VerificationOutcome {
    /// Exact match after trimming surrounding whitespace on both sides.
    pub fn text_equals(selector: &str, actual: &str, expected: &str) -> Self {
        Self {
            passed: actual.trim() == expected.trim(),
            actual: actual.to_string(),
            expected: expected.to_string(),
            selector: selector.to_string(),
        }
    }

    pub fn text_contains(selector: &str, actual: &str, needle: &str) -> Self {
        Self {
            passed: actual.contains(needle),
            actual: actual.to_string(),
            expected: format!("contains '{}'", needle),
            selector: selector.to_string(),
        }
    }

    pub fn text_not_contains(selector: &str, actual: &str, needle: &str) -> Self {
        Self {
            passed: !actual.contains(needle),
            actual: actual.to_string(),
            expected: format!("does not contain '{}'", needle),
            selector: selector.to_string(),
        }
    }

    pub fn enabled_state(selector: &str, actual: bool, expected: bool) -> Self {
        Self {
            passed: actual == expected,
            actual: if actual { "enabled" } else { "disabled" }.to_string(),
            expected: if expected { "enabled" } else { "disabled" }.to_string(),
            selector: selector.to_string(),
        }
    }

    pub fn message(&self) -> String {
        format!(
            "selector '{}': expected {}, got '{}'",
            self.selector, self.expected, self.actual
        )
    }
}

/// Accumulates soft verification failures for the end-of-test checkpoint.
#[derive(Default)]
pub struct SoftFailureLog {
    entries: Mutex<Vec<String>>,
}

impl SoftFailureLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, message: String) {
        self.entries
            .lock()
            .expect("soft-failure lock poisoned")
            .push(message);
    }

    pub fn is_empty(&self) -> bool {
        self.entries
            .lock()
            .expect("soft-failure lock poisoned")
            .is_empty()
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries
            .lock()
            .expect("soft-failure lock poisoned")
            .clone()
    }

    /// The designated checkpoint: raises every recorded failure together and
    /// resets the log.
    pub fn checkpoint(&self) -> Result<()> {
        let mut entries = self.entries.lock().expect("soft-failure lock poisoned");
        if entries.is_empty() {
            return Ok(());
        }
        Err(HarnessError::SoftFailures(std::mem::take(&mut *entries)))
    }
}

/// Escalates a verification outcome according to the caller's mode. Kept
/// separate from the comparison itself so "what happened" and "how to react"
/// stay decoupled.
pub fn apply_policy(
    outcome: &VerificationOutcome,
    mode: FailureHandlingMode,
    soft: &SoftFailureLog,
) -> Result<()> {
    if outcome.passed {
        info!(selector = %outcome.selector, "verification passed");
        return Ok(());
    }
    match mode {
        FailureHandlingMode::StopOnFailure => {
            Err(HarnessError::VerificationFailed(outcome.message()))
        }
        FailureHandlingMode::ContinueOnFailure => {
            warn!(selector = %outcome.selector, "soft verification failure: {}", outcome.message());
            soft.record(outcome.message());
            Ok(())
        }
        FailureHandlingMode::Optional => {
            info!(selector = %outcome.selector, "optional verification failed: {}", outcome.message());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODES: [FailureHandlingMode; 3] = [
        FailureHandlingMode::StopOnFailure,
        FailureHandlingMode::ContinueOnFailure,
        FailureHandlingMode::Optional,
    ];

    #[test]
    fn trim_before_compare() {
        let outcome = VerificationOutcome::text_equals("#greeting", " Welcome ", "Welcome");
        assert!(outcome.passed);
    }

    #[test]
    fn containment_and_negation() {
        assert!(VerificationOutcome::text_contains("#alert", "invalid password", "invalid").passed);
        assert!(!VerificationOutcome::text_contains("#alert", "ok", "invalid").passed);
        assert!(VerificationOutcome::text_not_contains("#alert", "ok", "invalid").passed);
        assert!(!VerificationOutcome::text_not_contains("#alert", "invalid password", "invalid").passed);
    }

    #[test]
    fn enabled_state_compare() {
        assert!(VerificationOutcome::enabled_state("#submit", true, true).passed);
        let outcome = VerificationOutcome::enabled_state("#submit", false, true);
        assert!(!outcome.passed);
        assert_eq!(outcome.actual, "disabled");
    }

    #[test]
    fn passing_outcome_never_raises_for_any_mode() {
        for mode in MODES {
            let soft = SoftFailureLog::new();
            let outcome = VerificationOutcome::text_equals("#t", " Welcome ", "Welcome");
            assert!(outcome.passed);
            assert!(apply_policy(&outcome, mode, &soft).is_ok());
            assert!(soft.is_empty());
        }
    }

    #[test]
    fn stop_mode_raises_with_the_failing_message() {
        let soft = SoftFailureLog::new();
        let outcome = VerificationOutcome::text_equals("#t", "Goodbye", "Welcome");
        let err = apply_policy(&outcome, FailureHandlingMode::StopOnFailure, &soft).unwrap_err();
        match err {
            HarnessError::VerificationFailed(msg) => {
                assert!(msg.contains("#t"));
                assert!(msg.contains("Goodbye"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(soft.is_empty());
    }

    #[test]
    fn continue_mode_accumulates_and_checkpoint_raises_all() {
        let soft = SoftFailureLog::new();
        for expected in ["One", "Two", "Three"] {
            let outcome = VerificationOutcome::text_equals("#t", "actual", expected);
            assert!(apply_policy(&outcome, FailureHandlingMode::ContinueOnFailure, &soft).is_ok());
        }
        assert_eq!(soft.entries().len(), 3);

        let err = soft.checkpoint().unwrap_err();
        match err {
            HarnessError::SoftFailures(all) => {
                assert_eq!(all.len(), 3);
                assert!(all[1].contains("Two"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        // The checkpoint drains the log.
        assert!(soft.checkpoint().is_ok());
    }

    #[test]
    fn optional_mode_only_logs() {
        let soft = SoftFailureLog::new();
        let outcome = VerificationOutcome::text_equals("#t", "actual", "expected");
        assert!(apply_policy(&outcome, FailureHandlingMode::Optional, &soft).is_ok());
        assert!(soft.is_empty());
        assert!(soft.checkpoint().is_ok());
    }
}
