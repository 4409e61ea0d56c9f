use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::HarnessError;

pub const DEFAULT_VIEWPORT_WIDTH: u32 = 1880;
pub const DEFAULT_VIEWPORT_HEIGHT: u32 = 1000;

/// Browser vendor the harness provisions against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserKind {
    Chrome,
    Edge,
    Firefox,
    Safari,
}

impl BrowserKind {
    pub fn name(&self) -> &'static str {
        match self {
            BrowserKind::Chrome => "Chrome",
            BrowserKind::Edge => "Edge",
            BrowserKind::Firefox => "Firefox",
            BrowserKind::Safari => "Safari (WebKit)",
        }
    }
}

impl FromStr for BrowserKind {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chrome" | "chromium" => Ok(BrowserKind::Chrome),
            "edge" | "msedge" => Ok(BrowserKind::Edge),
            "firefox" => Ok(BrowserKind::Firefox),
            "safari" | "webkit" => Ok(BrowserKind::Safari),
            other => Err(HarnessError::InvalidBrowserKind(other.to_string())),
        }
    }
}

/// Where the browser process lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionTarget {
    Local,
    Remote,
}

impl FromStr for ExecutionTarget {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(ExecutionTarget::Local),
            "remote" => Ok(ExecutionTarget::Remote),
            other => Err(HarnessError::InvalidTarget(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: DEFAULT_VIEWPORT_WIDTH,
            height: DEFAULT_VIEWPORT_HEIGHT,
        }
    }
}

/// Configuration surface consumed by the provisioner and the executor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarnessConfig {
    pub browser: BrowserKind,
    pub target: ExecutionTarget,
    pub remote_host: String,
    pub remote_port: u16,
    pub headless: bool,
    pub viewport: Viewport,
    pub ignore_tls_errors: bool,
    pub capture_dir: PathBuf,
    pub video_dir: Option<PathBuf>,
    pub timeouts: TimeoutConfig,
}

/// Every wait in the harness is bounded by one of these ceilings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    pub navigation_ms: u64,
    pub readiness_ms: u64,
    pub enabled_poll_interval_ms: u64,
    pub enabled_poll_retries: u32,
    pub tab_settle_ms: u64,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            browser: BrowserKind::Chrome,
            target: ExecutionTarget::Local,
            remote_host: "localhost".to_string(),
            remote_port: 4444,
            headless: true,
            viewport: Viewport::default(),
            ignore_tls_errors: true,
            capture_dir: std::env::temp_dir().join("testkit_captures"),
            video_dir: None,
            timeouts: TimeoutConfig::default(),
        }
    }
}

impl HarnessConfig {
    /// Loads the configuration surface from a JSON document.
    pub fn from_json(text: &str) -> crate::errors::Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| HarnessError::ConfigurationError(e.to_string()))
    }

    pub fn from_json_file(path: &std::path::Path) -> crate::errors::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            navigation_ms: 60_000,
            readiness_ms: 60_000,
            enabled_poll_interval_ms: 500,
            enabled_poll_retries: 20,
            tab_settle_ms: 1_000,
        }
    }
}

/// Per-session overrides applied at context creation. The framework default
/// favors test stability: TLS errors tolerated, fixed large viewport.
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    pub viewport: Option<Viewport>,
    pub ignore_tls_errors: Option<bool>,
    pub video_dir: Option<PathBuf>,
}

impl SessionOptions {
    pub fn effective_viewport(&self) -> Viewport {
        self.viewport.unwrap_or_default()
    }

    pub fn effective_ignore_tls(&self) -> bool {
        self.ignore_tls_errors.unwrap_or(true)
    }
}
