use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("Headless mode is not supported for {0}")]
    HeadlessUnsupported(String),

    #[error("Unrecognized execution target: {0}")]
    InvalidTarget(String),

    #[error("Unrecognized browser kind: {0}")]
    InvalidBrowserKind(String),

    #[error("Remote connection is not supported for {0}")]
    RemoteUnsupported(String),

    #[error("Browser launch failed: {0}")]
    LaunchFailed(String),

    #[error("Remote connect failed: {0}")]
    ConnectFailed(String),

    #[error("Session creation failed: {0}")]
    SessionCreationFailed(String),

    #[error("No active session. Start the harness before calling page actions")]
    SessionNotInitialized,

    #[error("Timed out waiting for element: {selector}")]
    WaitTimeout { selector: String },

    #[error("Element never became enabled: {selector}")]
    ElementNotInteractable { selector: String },

    #[error("Navigation failed for {url}: {reason}")]
    NavigationFailed { url: String, reason: String },

    #[error("No new tab appeared within the settle window")]
    NoNewTabFound,

    #[error("Interaction failed on {selector}: {reason}")]
    InteractionFailed { selector: String, reason: String },

    #[error("File upload failed on {selector}: {reason}")]
    UploadFailed { selector: String, reason: String },

    #[error("Verification failed: {0}")]
    VerificationFailed(String),

    #[error("{} soft verification failure(s):\n{}", .0.len(), .0.join("\n"))]
    SoftFailures(Vec<String>),

    #[error("Secondary session action failed: {0}")]
    SecondaryAction(String),

    #[error("Screenshot failed: {0}")]
    ScreenshotFailed(String),

    #[error("Mail lookup failed: {0}")]
    MailLookupFailed(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Anyhow error: {0}")]
    AnyhowError(String),
}

pub type Result<T> = std::result::Result<T, HarnessError>;

// Convert anyhow::Error to HarnessError
impl From<anyhow::Error> for HarnessError {
    fn from(err: anyhow::Error) -> Self {
        HarnessError::AnyhowError(err.to_string())
    }
}

impl HarnessError {
    /// True for errors callers may downgrade via a failure-handling mode.
    /// Everything else is a hard failure regardless of policy.
    pub fn is_verification(&self) -> bool {
        matches!(
            self,
            HarnessError::VerificationFailed(_) | HarnessError::SoftFailures(_)
        )
    }
}
