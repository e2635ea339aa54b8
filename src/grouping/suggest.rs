//! Client for the external label-suggestion service.
//!
//! The service is an optional enrichment step: it proposes a group label with
//! a 0–100 confidence for a category name. Every call carries a bounded
//! timeout, and every failure mode degrades to the deterministic pattern
//! rules — the service must never block or fail a reseed run.

use crate::error::SuggestError;

/// Configuration for the suggest-service client.
#[derive(Debug, Clone)]
pub struct SuggestConfig {
    /// Base URL for the suggest API.
    pub base_url: String,
    /// Request timeout in seconds. Bounded by design; batch runs must not
    /// stall on a slow service.
    pub timeout_secs: u64,
}

impl Default for SuggestConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8750".into(),
            timeout_secs: 8,
        }
    }
}

/// A label suggestion returned by the service.
#[derive(Debug, Clone)]
pub struct Suggestion {
    pub label: String,
    /// 0–100.
    pub confidence: u8,
}

/// Source of group-label suggestions.
///
/// The production implementation is [`HttpSuggester`]; tests substitute
/// scripted doubles.
pub trait SuggestService {
    fn suggest(&self, category_name: &str, topic_slug: &str) -> Result<Suggestion, SuggestError>;
}

/// HTTP client for the suggest service.
pub struct HttpSuggester {
    config: SuggestConfig,
}

impl HttpSuggester {
    /// Create a client with the given configuration.
    pub fn new(config: SuggestConfig) -> Self {
        Self { config }
    }

    /// Probe the service with a lightweight request.
    pub fn probe(&self) -> bool {
        let url = format!("{}/healthz", self.config.base_url);
        let agent = ureq::AgentBuilder::new()
            .timeout(std::time::Duration::from_secs(5))
            .build();
        matches!(agent.get(&url).call(), Ok(resp) if resp.status() == 200)
    }
}

impl SuggestService for HttpSuggester {
    fn suggest(&self, category_name: &str, topic_slug: &str) -> Result<Suggestion, SuggestError> {
        let url = format!("{}/v1/suggest", self.config.base_url);
        let agent = ureq::AgentBuilder::new()
            .timeout(std::time::Duration::from_secs(self.config.timeout_secs))
            .build();

        let body = serde_json::json!({
            "category": category_name,
            "topic": topic_slug,
        });
        let body_str = serde_json::to_string(&body).map_err(|e| SuggestError::RequestFailed {
            message: format!("JSON serialize error: {e}"),
        })?;

        let resp = agent
            .post(&url)
            .set("Content-Type", "application/json")
            .send_string(&body_str)
            .map_err(|e: ureq::Error| match e {
                ureq::Error::Status(code, _) => SuggestError::RequestFailed {
                    message: format!("server returned status {code}"),
                },
                // Connection refused, DNS failure, timeout: the service is
                // simply not there right now.
                ureq::Error::Transport(t) => SuggestError::Unavailable {
                    url: format!("{} ({t})", self.config.base_url),
                },
            })?;

        let resp_str = resp.into_string().map_err(|e| SuggestError::ParseError {
            message: e.to_string(),
        })?;

        let json: serde_json::Value =
            serde_json::from_str(&resp_str).map_err(|e| SuggestError::ParseError {
                message: e.to_string(),
            })?;

        // The service historically returned "group"; newer versions say "label".
        let label = json["label"]
            .as_str()
            .or_else(|| json["group"].as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| SuggestError::ParseError {
                message: "missing 'label' field".into(),
            })?;

        let confidence = json["confidence"]
            .as_u64()
            .ok_or_else(|| SuggestError::ParseError {
                message: "missing 'confidence' field".into(),
            })?
            .min(100) as u8;

        if label.trim().is_empty() {
            return Err(SuggestError::ParseError {
                message: "empty label".into(),
            });
        }

        Ok(Suggestion { label, confidence })
    }
}

impl std::fmt::Debug for HttpSuggester {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSuggester")
            .field("base_url", &self.config.base_url)
            .field("timeout_secs", &self.config.timeout_secs)
            .finish()
    }
}
