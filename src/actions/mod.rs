pub mod executor;
pub mod verify;
pub mod wait;

pub use executor::ActionExecutor;
pub use verify::{FailureHandlingMode, SoftFailureLog, VerificationOutcome};
