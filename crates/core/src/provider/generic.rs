//! Fallback provider for carriers without a dedicated implementation.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use crate::carrier::Carrier;
use crate::config::ProviderConfig;

use super::{ProviderError, TrackingProvider, TrackingResult};

const BROWSER_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
];

/// Body keywords checked in order; the first hit becomes the status.
const BODY_KEYWORDS: &[(&str, &str)] = &[
    ("delivered", "Delivered"),
    ("out for delivery", "Out for Delivery"),
    ("in transit", "In Transit"),
    ("shipped", "Shipped"),
    ("label created", "Label Created"),
];

/// Script and style blocks and comments, whose text is never shown.
static HIDDEN_BLOCKS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<script\b.*?</script\s*>|<style\b.*?</style\s*>|<!--.*?-->")
        .expect("hidden block pattern must compile")
});

static TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("tag pattern must compile"));

#[derive(Serialize)]
struct PageSummary<'a> {
    url: &'a str,
    http_status: u16,
    matched: Option<&'a str>,
}

/// Fetches the tracking page and looks for well-known status phrases.
///
/// Produces no discrete events.
pub struct GenericHttpProvider {
    client: Client,
    user_agent: Option<String>,
    next_agent: AtomicUsize,
}

impl GenericHttpProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ProviderError::Unavailable(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            user_agent: config.user_agent.clone(),
            next_agent: AtomicUsize::new(0),
        })
    }

    fn user_agent(&self) -> &str {
        match &self.user_agent {
            Some(agent) => agent,
            None => {
                let idx = self.next_agent.fetch_add(1, Ordering::Relaxed);
                BROWSER_USER_AGENTS[idx % BROWSER_USER_AGENTS.len()]
            }
        }
    }
}

/// Text a browser would render: hidden blocks dropped, tags replaced by
/// spaces so words in adjacent elements stay apart.
pub(crate) fn visible_text(html: &str) -> String {
    let without_hidden = HIDDEN_BLOCKS.replace_all(html, " ");
    TAGS.replace_all(&without_hidden, " ").into_owned()
}

/// Map page text to a status phrase, if one is present.
pub(crate) fn status_from_body(body: &str) -> Option<&'static str> {
    let lower = body.to_lowercase();
    BODY_KEYWORDS
        .iter()
        .find(|(keyword, _)| lower.contains(keyword))
        .map(|(_, status)| *status)
}

#[async_trait]
impl TrackingProvider for GenericHttpProvider {
    fn name(&self) -> &str {
        "generic"
    }

    async fn track(
        &self,
        url: &str,
        _tracking_number: Option<&str>,
    ) -> Result<TrackingResult, ProviderError> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, self.user_agent())
            .header(
                reqwest::header::ACCEPT,
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.5")
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let http_status = response.status();
        if !http_status.is_success() {
            return Err(ProviderError::Network(format!("HTTP {}", http_status)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::Parse(format!("Failed to read body: {}", e)))?;

        let matched = status_from_body(&visible_text(&body));
        debug!(url = url, matched = ?matched, "Generic page check");

        let summary = PageSummary {
            url,
            http_status: http_status.as_u16(),
            matched,
        };
        let mut result = TrackingResult::from_status(Carrier::Unknown, matched);
        if let Ok(raw) = serde_json::to_vec(&summary) {
            result = result.with_raw_data(raw);
        }
        Ok(result)
    }
}
