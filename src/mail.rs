use std::collections::HashMap;
use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use url::Url;

use crate::errors::Result;

fn url_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r#"https?://[^\s"'<>]+"#).expect("valid url pattern"))
}

/// One retrieved message. `links` is keyed by message id.
#[derive(Debug, Clone)]
pub struct MailMessage {
    pub id: String,
    pub subject: String,
    pub links: HashMap<String, Url>,
}

/// Mail-retrieval collaborator used by email-verification flows. Transport
/// lives behind this trait; the URL extraction below is harness logic.
#[async_trait]
pub trait MailReader: Send + Sync {
    async fn fetch_latest_message(&self, domain: &str, mailbox: &str)
        -> Result<Option<MailMessage>>;
}

/// First http(s) URL in the text, if any parses.
pub fn first_url_in(text: &str) -> Option<Url> {
    url_pattern()
        .find_iter(text)
        .find_map(|m| Url::parse(m.as_str()).ok())
}

/// Subject-line extraction first, then the links lookup keyed by message id.
pub fn latest_message_url(message: &MailMessage) -> Option<Url> {
    first_url_in(&message.subject).or_else(|| message.links.get(&message.id).cloned())
}

pub async fn fetch_latest_message_url(
    reader: &dyn MailReader,
    domain: &str,
    mailbox: &str,
) -> Result<Option<Url>> {
    let message = reader.fetch_latest_message(domain, mailbox).await?;
    Ok(message.as_ref().and_then(latest_message_url))
}
