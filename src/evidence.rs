use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{error, info};

/// Severity for evidence log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvidenceLevel {
    Info,
    Warn,
    Error,
}

/// A captured artifact attached to a test step. Best-effort only.
#[derive(Debug, Clone)]
pub struct EvidenceRecord {
    pub label: String,
    pub file_name: String,
    pub path: Option<PathBuf>,
    pub image: Vec<u8>,
}

impl EvidenceRecord {
    /// Screenshot file name contract: `<operation>_<ISO-like timestamp>.png`.
    /// Collaborators index evidence by this pattern.
    pub fn timestamped_name(label: &str) -> String {
        format!("{}_{}.png", label, Utc::now().format("%Y-%m-%dT%H-%M-%S%.3f"))
    }

    /// Renders the screenshot as a `data:` URI for inline report embedding.
    pub fn data_uri(&self) -> String {
        format!("data:image/png;base64,{}", base64::encode(&self.image))
    }
}

/// Receives named screenshots and log lines. Implementations must never
/// raise back into the action layer; internal errors are logged and dropped.
#[async_trait]
pub trait EvidenceSink: Send + Sync {
    async fn attach(&self, label: &str, image: &[u8]);

    async fn log(&self, level: EvidenceLevel, message: &str);
}

/// Writes screenshots under a capture directory, creating it on demand.
pub struct CaptureSink {
    dir: PathBuf,
}

impl CaptureSink {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    async fn write(&self, label: &str, image: &[u8]) -> std::io::Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(EvidenceRecord::timestamped_name(label));
        tokio::fs::write(&path, image).await?;
        Ok(path)
    }
}

#[async_trait]
impl EvidenceSink for CaptureSink {
    async fn attach(&self, label: &str, image: &[u8]) {
        match self.write(label, image).await {
            Ok(path) => info!(label, path = %path.display(), "screenshot captured"),
            Err(e) => error!(label, "failed to persist screenshot: {}", e),
        }
    }

    async fn log(&self, level: EvidenceLevel, message: &str) {
        match level {
            EvidenceLevel::Info => info!("{}", message),
            EvidenceLevel::Warn => tracing::warn!("{}", message),
            EvidenceLevel::Error => error!("{}", message),
        }
    }
}

/// In-memory sink for tests and report aggregation. Appends are synchronized
/// and keyed by the initiating test's identity; no session state is stored.
#[derive(Default)]
pub struct RecordingSink {
    test_id: String,
    records: Mutex<Vec<EvidenceRecord>>,
    lines: Mutex<Vec<(EvidenceLevel, String)>>,
}

impl RecordingSink {
    pub fn new(test_id: impl Into<String>) -> Self {
        Self {
            test_id: test_id.into(),
            records: Mutex::new(Vec::new()),
            lines: Mutex::new(Vec::new()),
        }
    }

    pub fn test_id(&self) -> &str {
        &self.test_id
    }

    pub fn records(&self) -> Vec<EvidenceRecord> {
        self.records.lock().expect("evidence lock poisoned").clone()
    }

    pub fn lines(&self) -> Vec<(EvidenceLevel, String)> {
        self.lines.lock().expect("evidence lock poisoned").clone()
    }
}

#[async_trait]
impl EvidenceSink for RecordingSink {
    async fn attach(&self, label: &str, image: &[u8]) {
        let record = EvidenceRecord {
            label: label.to_string(),
            file_name: EvidenceRecord::timestamped_name(label),
            path: None,
            image: image.to_vec(),
        };
        self.records
            .lock()
            .expect("evidence lock poisoned")
            .push(record);
    }

    async fn log(&self, level: EvidenceLevel, message: &str) {
        self.lines
            .lock()
            .expect("evidence lock poisoned")
            .push((level, message.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_follows_capture_contract() {
        let name = EvidenceRecord::timestamped_name("click_login");
        assert!(name.starts_with("click_login_"));
        assert!(name.ends_with(".png"));
        // One underscore separates the label from the timestamp segment.
        let stem = name.strip_prefix("click_login_").unwrap();
        assert!(stem.chars().next().unwrap().is_ascii_digit());
    }

    #[test]
    fn data_uri_embeds_base64_png() {
        let record = EvidenceRecord {
            label: "verify_title".to_string(),
            file_name: "verify_title_x.png".to_string(),
            path: None,
            image: vec![1, 2, 3],
        };
        assert_eq!(record.data_uri(), format!("data:image/png;base64,{}", base64::encode([1u8, 2, 3])));
    }

    #[tokio::test]
    async fn capture_sink_writes_under_capture_dir() {
        let dir = std::env::temp_dir().join("testkit_evidence_test");
        let sink = CaptureSink::new(dir.clone());
        sink.attach("navigate", b"not-a-real-png").await;

        let mut entries = tokio::fs::read_dir(&dir).await.unwrap();
        let mut found = false;
        while let Some(entry) = entries.next_entry().await.unwrap() {
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with("navigate_") && name.ends_with(".png") {
                found = true;
            }
        }
        assert!(found, "expected a navigate_*.png capture");
        tokio::fs::remove_dir_all(&dir).await.ok();
    }

    #[tokio::test]
    async fn recording_sink_appends_in_order() {
        let sink = RecordingSink::new("T01");
        sink.attach("fill_email", &[0xAA]).await;
        sink.log(EvidenceLevel::Warn, "soft mismatch").await;

        assert_eq!(sink.records().len(), 1);
        assert_eq!(sink.records()[0].label, "fill_email");
        assert_eq!(sink.lines()[0].1, "soft mismatch");
        assert_eq!(sink.test_id(), "T01");
    }
}
