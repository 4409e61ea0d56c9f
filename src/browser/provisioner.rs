use playwright::api::browser_type::RecordVideo;
use playwright::api::{Browser, BrowserChannel, BrowserType, Viewport as PwViewport};
use playwright::Playwright;
use tracing::info;

use crate::config::{BrowserKind, ExecutionTarget, HarnessConfig, SessionOptions};
use crate::errors::{HarnessError, Result};

use super::session::Session;

/// Flags every Chromium-family launch carries.
const CHROMIUM_BASE_ARGS: [&str; 4] = [
    "--disable-extensions",
    "--disable-infobars",
    "--disable-notifications",
    "--remote-allow-origins=*",
];

/// Layered on top of the base set when running headless.
const CHROMIUM_HEADLESS_ARGS: [&str; 5] = [
    "--headless=new",
    "--disable-gpu",
    "--no-sandbox",
    "--disable-dev-shm-usage",
    "--window-size=1880,1000",
];

/// Per-vendor launch parameters, resolved before any process is spawned.
#[derive(Debug, Clone)]
pub struct LaunchProfile {
    pub headless: bool,
    pub args: Vec<String>,
    pub channel: Option<BrowserChannel>,
}

/// Which remote-connect signaling a vendor speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteFamily {
    Chromium,
    Firefox,
    Webkit,
}

impl BrowserKind {
    /// Pure launch-option table. The headless-unsupported check runs first so
    /// a bad combination never leaks a partially-configured launch.
    pub fn launch_profile(self, headless: bool) -> Result<LaunchProfile> {
        if headless && self == BrowserKind::Safari {
            return Err(HarnessError::HeadlessUnsupported(self.name().to_string()));
        }
        let profile = match self {
            BrowserKind::Chrome | BrowserKind::Edge => {
                let mut args: Vec<String> =
                    CHROMIUM_BASE_ARGS.iter().map(|s| s.to_string()).collect();
                if headless {
                    args.extend(CHROMIUM_HEADLESS_ARGS.iter().map(|s| s.to_string()));
                }
                LaunchProfile {
                    headless,
                    args,
                    channel: (self == BrowserKind::Edge).then_some(BrowserChannel::Msedge),
                }
            }
            // Viewport is a session-creation concern for every vendor, so
            // Firefox and WebKit launch bare.
            BrowserKind::Firefox | BrowserKind::Safari => LaunchProfile {
                headless,
                args: Vec::new(),
                channel: None,
            },
        };
        Ok(profile)
    }

    pub fn remote_family(self) -> RemoteFamily {
        match self {
            BrowserKind::Chrome | BrowserKind::Edge => RemoteFamily::Chromium,
            BrowserKind::Firefox => RemoteFamily::Firefox,
            BrowserKind::Safari => RemoteFamily::Webkit,
        }
    }

    /// Chromium-family attaches over CDP; the others dial a Playwright server.
    pub fn remote_endpoint(self, host: &str, port: u16) -> String {
        match self.remote_family() {
            RemoteFamily::Chromium => format!("http://{}:{}", host, port),
            RemoteFamily::Firefox | RemoteFamily::Webkit => format!("ws://{}:{}", host, port),
        }
    }
}

/// Starts or attaches to browser processes and carves out isolated sessions.
/// Owns the Playwright driver; keep it alive for as long as any session is.
pub struct BrowserProvisioner {
    driver: Playwright,
}

impl BrowserProvisioner {
    pub async fn initialize() -> Result<Self> {
        let driver = Playwright::initialize()
            .await
            .map_err(|e| HarnessError::LaunchFailed(e.to_string()))?;
        Ok(Self { driver })
    }

    fn browser_type(&self, kind: BrowserKind) -> BrowserType {
        match kind.remote_family() {
            RemoteFamily::Chromium => self.driver.chromium(),
            RemoteFamily::Firefox => self.driver.firefox(),
            RemoteFamily::Webkit => self.driver.webkit(),
        }
    }

    pub async fn launch(&self, kind: BrowserKind, headless: bool) -> Result<Browser> {
        let profile = kind.launch_profile(headless)?;
        info!(browser = kind.name(), headless, "launching browser");

        let browser_type = self.browser_type(kind);
        let mut launcher = browser_type.launcher().headless(profile.headless);
        if !profile.args.is_empty() {
            launcher = launcher.args(&profile.args);
        }
        if let Some(channel) = profile.channel {
            launcher = launcher.channel(channel);
        }
        launcher
            .launch()
            .await
            .map_err(|e| HarnessError::LaunchFailed(e.to_string()))
    }

    pub async fn connect_remote(&self, kind: BrowserKind, host: &str, port: u16) -> Result<Browser> {
        let endpoint = kind.remote_endpoint(host, port);
        info!(browser = kind.name(), endpoint = %endpoint, "connecting to remote browser");

        let browser_type = self.browser_type(kind);
        let connected = match kind.remote_family() {
            RemoteFamily::Chromium => {
                browser_type
                    .connect_over_cdp_builder(&endpoint)
                    .connect_over_cdp()
                    .await
            }
            RemoteFamily::Firefox | RemoteFamily::Webkit => {
                browser_type.connect_builder(&endpoint).connect().await
            }
        };
        connected.map_err(|e| HarnessError::ConnectFailed(e.to_string()))
    }

    /// Creates an isolated browsing context plus its initial page. TLS-error
    /// tolerance and the fixed large viewport are on unless overridden.
    pub async fn new_session(
        &self,
        kind: BrowserKind,
        target: ExecutionTarget,
        browser: Browser,
        options: &SessionOptions,
    ) -> Result<Session> {
        let mut builder = browser
            .context_builder()
            .ignore_https_errors(options.effective_ignore_tls());
        if let Some(dir) = &options.video_dir {
            tokio::fs::create_dir_all(dir).await.ok();
            builder = builder.record_video(RecordVideo { dir, size: None });
        }
        let context = builder
            .build()
            .await
            .map_err(|e| HarnessError::SessionCreationFailed(e.to_string()))?;

        let page = context
            .new_page()
            .await
            .map_err(|e| HarnessError::SessionCreationFailed(e.to_string()))?;

        let viewport = options.effective_viewport();
        page.set_viewport_size(PwViewport {
            width: viewport.width as i32,
            height: viewport.height as i32,
        })
        .await
        .map_err(|e| HarnessError::SessionCreationFailed(e.to_string()))?;

        Ok(Session::new(kind, target, browser, context, page))
    }

    /// Resolves the execution target once from configuration and produces a
    /// ready session.
    pub async fn provision(&self, config: &HarnessConfig) -> Result<Session> {
        let browser = match config.target {
            ExecutionTarget::Local => self.launch(config.browser, config.headless).await?,
            ExecutionTarget::Remote => {
                self.connect_remote(config.browser, &config.remote_host, config.remote_port)
                    .await?
            }
        };
        let options = SessionOptions {
            viewport: Some(config.viewport),
            ignore_tls_errors: Some(config.ignore_tls_errors),
            video_dir: config.video_dir.clone(),
        };
        self.new_session(config.browser, config.target, browser, &options).await
    }
}
