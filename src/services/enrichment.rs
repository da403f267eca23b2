// src/services/enrichment.rs

//! Marketplace lookup service.
//!
//! Asks a chat-completions model for marketplace URLs and evidence for the
//! rarity and scannability scores. The engine never depends on this: a
//! record that was never enriched is still decided from whatever it holds.

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{BookRecord, EnrichmentConfig, URL_UNKNOWN, is_valid_isbn};

/// Matches a reply wrapped in a Markdown code fence.
static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^\s*```[A-Za-z]*\s*(.*?)\s*```\s*$").expect("valid code fence pattern")
});

/// What to search for. A valid ISBN beats the title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupQuery {
    Isbn(String),
    Title(String),
}

impl LookupQuery {
    /// Build a query for a record, or `None` when there is nothing to search by.
    pub fn for_record(record: &BookRecord) -> Option<Self> {
        if is_valid_isbn(&record.isbn) {
            return Some(Self::Isbn(record.isbn.clone()));
        }
        let title = record.title.trim();
        if title.is_empty() {
            None
        } else {
            Some(Self::Title(title.to_string()))
        }
    }

    /// Search key as it appears in the prompt.
    pub fn describe(&self) -> String {
        match self {
            Self::Isbn(isbn) => format!("ISBN: {isbn}"),
            Self::Title(title) => format!("Title: {title}"),
        }
    }
}

/// Values returned by a lookup. `None` URLs leave the record unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Enrichment {
    pub primary_url: Option<String>,
    pub secondary_url: Option<String>,
    pub citation_r: Vec<String>,
    pub citation_p: Vec<String>,
}

impl Enrichment {
    pub fn is_empty(&self) -> bool {
        self.primary_url.is_none()
            && self.secondary_url.is_none()
            && self.citation_r.is_empty()
            && self.citation_p.is_empty()
    }

    /// Copy the looked-up values onto a record.
    ///
    /// Citation lists are only replaced by non-empty ones.
    pub fn apply_to(&self, record: &mut BookRecord) {
        if let Some(url) = &self.primary_url {
            record.primary_url = url.clone();
        }
        if let Some(url) = &self.secondary_url {
            record.secondary_url = url.clone();
        }
        if !self.citation_r.is_empty() {
            record.citation_r = self.citation_r.clone();
        }
        if !self.citation_p.is_empty() {
            record.citation_p = self.citation_p.clone();
        }
    }
}

/// External lookup backend.
#[async_trait]
pub trait Enricher: Send + Sync {
    /// Look up marketplace data for one book.
    async fn lookup(&self, query: &LookupQuery) -> Result<Enrichment>;
}

/// Enrich one record in place.
///
/// Returns `Ok(false)` when the record has neither a title nor a valid ISBN.
pub async fn enrich_record(enricher: &dyn Enricher, record: &mut BookRecord) -> Result<bool> {
    let Some(query) = LookupQuery::for_record(record) else {
        log::warn!(
            "No title or valid ISBN for record {}, skipping enrichment",
            record.id
        );
        return Ok(false);
    };

    log::info!("Starting enrichment for record {} ({})", record.id, query.describe());
    let enrichment = enricher.lookup(&query).await?;
    enrichment.apply_to(record);
    log::info!("Finished enrichment for record {}", record.id);
    Ok(true)
}

/// Chat-completions request body.
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// JSON object the model is asked to answer with.
#[derive(Debug, Default, Deserialize)]
struct LookupReply {
    #[serde(default)]
    amazon_co_jp_url: Option<String>,
    #[serde(default)]
    amazon_com_url: Option<String>,
    #[serde(default)]
    rarity_evidence: Vec<String>,
    #[serde(default)]
    scannability_evidence: Vec<String>,
}

/// Enricher backed by an OpenAI-compatible chat-completions API.
pub struct OpenAiEnricher {
    client: Client,
    config: EnrichmentConfig,
    api_key: String,
}

impl OpenAiEnricher {
    /// Create an enricher, reading the API key from the configured
    /// environment variable.
    pub fn new(config: &EnrichmentConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            AppError::config(format!(
                "environment variable {} is not set",
                config.api_key_env
            ))
        })?;
        Self::with_api_key(config, api_key)
    }

    /// Create an enricher with an explicit API key.
    pub fn with_api_key(config: &EnrichmentConfig, api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            config: config.clone(),
            api_key: api_key.into(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.api_base.trim_end_matches('/'))
    }
}

#[async_trait]
impl Enricher for OpenAiEnricher {
    async fn lookup(&self, query: &LookupQuery) -> Result<Enrichment> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: Some(build_prompt(query)),
            }],
            temperature: self.config.temperature,
        };

        let response: ChatResponse = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| AppError::enrichment("response contained no message"))?;

        Ok(parse_reply(&content).unwrap_or_else(|| {
            log::warn!("Failed to parse lookup response: {content}");
            Enrichment::default()
        }))
    }
}

fn build_prompt(query: &LookupQuery) -> String {
    format!(
        r#"For the book with {key}, please:
- Search Amazon.co.jp and Amazon.com for the best matching product page.
- If you cannot find a real product, return the string "unknown" for the URL.
- List short pieces of evidence about how rare the book is and how easy it is to scan.

Respond in JSON format:
{{
  "amazon_co_jp_url": "...",
  "amazon_com_url": "...",
  "rarity_evidence": ["..."],
  "scannability_evidence": ["..."]
}}"#,
        key = query.describe()
    )
}

/// Parse the model's reply, tolerating a surrounding code fence.
fn parse_reply(content: &str) -> Option<Enrichment> {
    let body = CODE_FENCE
        .captures(content)
        .and_then(|caps| caps.get(1))
        .map_or(content, |m| m.as_str());

    let reply: LookupReply = serde_json::from_str(body.trim()).ok()?;
    Some(Enrichment {
        primary_url: reply.amazon_co_jp_url.as_deref().and_then(normalize_url),
        secondary_url: reply.amazon_com_url.as_deref().and_then(normalize_url),
        citation_r: clean_evidence(reply.rarity_evidence),
        citation_p: clean_evidence(reply.scannability_evidence),
    })
}

/// Keep absolute http(s) URLs; anything else returned counts as not found.
fn normalize_url(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match Url::parse(raw) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Some(url.to_string()),
        _ => Some(URL_UNKNOWN.to_string()),
    }
}

fn clean_evidence(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}
