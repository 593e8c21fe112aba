//! Remote classifier client (Ollama HTTP API).
//!
//! The classifier is treated as unreliable plumbing: every call is bounded
//! by a timeout, failures are retried a fixed number of times, and callers
//! are expected to fall back to rule-based categorization when the client
//! gives up. Errors here use `anyhow` and never cross the engine boundary.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub const PROBE_TIMEOUT: Duration = Duration::from_secs(3);
pub const CHAT_TIMEOUT: Duration = Duration::from_secs(60);

/// Classifier reachability, probed at most once per engine run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Untested,
    Available,
    Unavailable,
}

/// Bounded retry: fixed delay, no backoff.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay: Duration::from_secs(2),
        }
    }
}

/// One item of a decoded classifier response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemCategory {
    pub description: String,
    pub category: String,
}

pub struct ClassifierClient {
    base_url: String,
    model: String,
    retry: RetryPolicy,
    client: reqwest::blocking::Client,
}

impl ClassifierClient {
    pub fn new(base_url: &str, model: &str) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(CHAT_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            retry: RetryPolicy::default(),
            client,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Lightweight health check against the model listing endpoint.
    pub fn probe(&self) -> bool {
        let url = format!("{}/api/tags", self.base_url);
        match self.client.get(&url).timeout(PROBE_TIMEOUT).send() {
            Ok(resp) if resp.status().is_success() => true,
            Ok(resp) => {
                warn!("classifier probe returned status {}", resp.status());
                false
            }
            Err(e) => {
                warn!("classifier unreachable: {e}");
                false
            }
        }
    }

    /// Send a classification prompt and decode the per-item categories from
    /// the reply. Retries transport and decode failures alike.
    pub fn classify(&self, prompt: &str) -> Result<Vec<ItemCategory>> {
        let mut last_err = anyhow!("no attempts made");
        for attempt in 1..=self.retry.attempts {
            match self.chat(prompt) {
                Ok(content) => match decode_response(&content) {
                    Some(items) => return Ok(items),
                    None => {
                        let preview: String = content.chars().take(200).collect();
                        debug!("undecodable classifier reply: {preview}");
                        last_err = anyhow!("no JSON array found in classifier reply");
                    }
                },
                Err(e) => {
                    warn!("classifier call failed (attempt {attempt}/{}): {e:#}", self.retry.attempts);
                    last_err = e;
                }
            }
            if attempt < self.retry.attempts {
                std::thread::sleep(self.retry.delay);
            }
        }
        Err(last_err.context(format!("classifier failed after {} attempts", self.retry.attempts)))
    }

    fn chat(&self, prompt: &str) -> Result<String> {
        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: &'a str,
        }

        #[derive(Serialize)]
        struct Options {
            temperature: f64,
            num_predict: i32,
            top_k: i32,
            top_p: f64,
        }

        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            messages: Vec<Msg<'a>>,
            stream: bool,
            options: Options,
        }

        #[derive(Deserialize)]
        struct Resp {
            message: RespMsg,
        }

        #[derive(Deserialize)]
        struct RespMsg {
            content: String,
        }

        let req = Req {
            model: &self.model,
            messages: vec![Msg {
                role: "user",
                content: prompt,
            }],
            stream: false,
            options: Options {
                temperature: 0.1,
                num_predict: 256,
                top_k: 10,
                top_p: 0.9,
            },
        };

        let url = format!("{}/api/chat", self.base_url);
        let resp = self
            .client
            .post(&url)
            .json(&req)
            .send()
            .context("classifier request failed")?;
        if !resp.status().is_success() {
            anyhow::bail!("classifier returned status {}", resp.status());
        }
        let body: Resp = resp.json().context("malformed classifier response body")?;
        Ok(body.message.content)
    }
}

/// Pull a JSON array of `{description, category}` out of free-form model
/// output. Fallback order: fenced ```json block, outermost bracket span,
/// whole text. `None` when all three fail.
pub fn decode_response(content: &str) -> Option<Vec<ItemCategory>> {
    if let Some(block) = fenced_block(content) {
        if let Ok(items) = serde_json::from_str(block) {
            return Some(items);
        }
    }
    if let (Some(start), Some(end)) = (content.find('['), content.rfind(']')) {
        if start < end {
            if let Ok(items) = serde_json::from_str(&content[start..=end]) {
                return Some(items);
            }
        }
    }
    serde_json::from_str(content.trim()).ok()
}

fn fenced_block(content: &str) -> Option<&str> {
    let start = content.find("```json")? + "```json".len();
    let rest = &content[start..];
    let end = rest.find("```")?;
    Some(rest[..end].trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_fenced_block() {
        let content = "Here you go:\n```json\n[{\"description\": \"Amazon\", \"category\": \"Shopping\"}]\n```\nDone.";
        let items = decode_response(content).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].category, "Shopping");
    }

    #[test]
    fn test_decode_bracket_scan() {
        let content = "Sure! [{\"description\": \"Uber\", \"category\": \"Transport\"}] hope that helps";
        let items = decode_response(content).unwrap();
        assert_eq!(items[0].description, "Uber");
    }

    #[test]
    fn test_decode_whole_text() {
        let content = r#"[{"description": "BSNL", "category": "Bills"}]"#;
        assert_eq!(decode_response(content).unwrap().len(), 1);
    }

    #[test]
    fn test_decode_failure_is_none() {
        assert!(decode_response("I cannot categorize these expenses.").is_none());
        assert!(decode_response("[not json]").is_none());
        assert!(decode_response("").is_none());
    }

    #[test]
    fn test_decode_prefers_fenced_block() {
        let content = "ignore [1,2,3]\n```json\n[{\"description\": \"a\", \"category\": \"Food\"}]\n```";
        let items = decode_response(content).unwrap();
        assert_eq!(items[0].category, "Food");
    }

    #[test]
    fn test_decode_tolerates_extra_fields() {
        let content = r#"[{"description": "x", "category": "Food", "confidence": 0.9}]"#;
        assert_eq!(decode_response(content).unwrap().len(), 1);
    }

    #[test]
    fn test_probe_unreachable_is_false() {
        let client = ClassifierClient::new("http://127.0.0.1:1", "llama3");
        assert!(!client.probe());
    }

    #[test]
    fn test_classify_unreachable_errors_after_retries() {
        let client = ClassifierClient::new("http://127.0.0.1:1", "llama3").with_retry(RetryPolicy {
            attempts: 2,
            delay: Duration::from_millis(0),
        });
        assert!(client.classify("categorize this").is_err());
    }
}
