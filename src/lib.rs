pub mod actions;
pub mod browser;
pub mod config;
pub mod errors;
pub mod evidence;
pub mod mail;
pub mod testing;

pub use actions::{ActionExecutor, FailureHandlingMode, VerificationOutcome};
pub use browser::{
    BrowserProvisioner, SecondarySessionRunner, Session, SessionRegistry, TabCoordinator,
};
pub use config::{BrowserKind, ExecutionTarget, HarnessConfig, SessionOptions, TimeoutConfig, Viewport};
pub use errors::{HarnessError, Result};
pub use evidence::{CaptureSink, EvidenceLevel, EvidenceRecord, EvidenceSink, RecordingSink};
pub use testing::TestHarness;

// Looser navigation wait states for callers that opt out of the strict default.
pub use playwright::api::DocumentLoadState;
