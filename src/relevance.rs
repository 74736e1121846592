//! Relevance judging: one prompt out, plain text back, parsed into
//! `title / price / url` triples.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

use crate::error::{ModelError, PipelineError};
use crate::listing::ListingRecord;

/// Text in, text out. The only seam to the hosted model.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, ModelError>;
    fn name(&self) -> &str;
}

const GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Gemini `generateContent` over REST.
pub struct GeminiModel {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiModel {
    pub fn new(api_key: String, model: String, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            api_key,
            model,
        })
    }
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}
#[derive(Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}
#[derive(Serialize)]
struct GenerateReq<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Deserialize)]
struct GenerateResp {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}
#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<RespContent>,
}
#[derive(Debug, Deserialize)]
struct RespContent {
    #[serde(default)]
    parts: Vec<RespPart>,
}
#[derive(Debug, Deserialize)]
struct RespPart {
    #[serde(default)]
    text: String,
}

/// Text parts of the first candidate, joined. No text at all is an error.
fn reply_text(body: GenerateResp) -> Result<String, ModelError> {
    let text: String = body
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(ModelError::EmptyReply);
    }
    Ok(text)
}

#[async_trait]
impl GenerativeModel for GeminiModel {
    async fn generate(&self, prompt: &str) -> Result<String, ModelError> {
        let url = format!("{GEMINI_ENDPOINT}/{}:generateContent", self.model);
        let req = GenerateReq {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: prompt }],
            }],
        };

        let resp = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&req)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ModelError::Status { status, body });
        }

        let body: GenerateResp = resp.json().await?;
        reply_text(body)
    }

    fn name(&self) -> &str {
        &self.model
    }
}

/// A listing the model picked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    pub title: String,
    pub price: String,
    pub url: String,
}

const INSTRUCTIONS: &str = "You are pawnBot. You read online classified listings and decide which \
ones a human should look at. Compare each listing's description with the description the user \
gives, and skip listings uploaded more than 3 months ago. The listings are a JSON array of objects \
with the keys title, price, uploadDate, url and description. Reply with the title, price and url \
of every listing that fits. If none fits exactly, reply with the 3 closest matches instead. No \
chat, no banter, no markdown, no HTML. Put each field on its own line in exactly this order: \
title, then price, then url. Keep this format without variation. Here are the listings: ";

pub fn build_prompt(
    listings: &[ListingRecord],
    requirement: &str,
) -> Result<String, serde_json::Error> {
    let dump = serde_json::to_string(listings)?;
    Ok(format!(
        "{INSTRUCTIONS}{dump}\nand this is the description provided by the user: {requirement}"
    ))
}

/// True for absolute `http`/`https` URLs. Model output is untrusted, so
/// anything else is never fetched or linked.
pub fn is_web_url(raw: &str) -> bool {
    Url::parse(raw)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
        .unwrap_or(false)
}

/// Splits the reply into lines. Trailing blank lines (the usual terminator)
/// are dropped, as are blank separators between listings; content lines are
/// never discarded.
pub fn split_reply(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Folds lines into `title / price / url` triples. A trailing incomplete
/// group is dropped and logged, as is any triple whose url is not a web url.
pub fn group_candidates(lines: Vec<String>) -> Vec<Candidate> {
    let leftover = lines.len() % 3;
    if leftover != 0 {
        warn!(
            lines = lines.len(),
            dropped = leftover,
            "model reply is not a whole number of listings"
        );
    }

    let mut out = Vec::with_capacity(lines.len() / 3);
    let mut it = lines.into_iter();
    while let (Some(title), Some(price), Some(url)) = (it.next(), it.next(), it.next()) {
        if !is_web_url(&url) {
            warn!(%title, %url, "model picked a listing without a web url, dropping it");
            continue;
        }
        out.push(Candidate { title, price, url });
    }
    out
}

pub struct RelevanceFilter {
    model: Arc<dyn GenerativeModel>,
}

impl RelevanceFilter {
    pub fn new(model: Arc<dyn GenerativeModel>) -> Self {
        Self { model }
    }

    /// One model call; the reply split into content lines.
    pub async fn filter_relevant(
        &self,
        listings: &[ListingRecord],
        requirement: &str,
    ) -> Result<Vec<String>, PipelineError> {
        let prompt = build_prompt(listings, requirement)?;
        info!(
            model = self.model.name(),
            listings = listings.len(),
            prompt_len = prompt.len(),
            "asking model for relevant listings"
        );
        let reply = match self.model.generate(&prompt).await {
            Ok(reply) => reply,
            Err(ModelError::EmptyReply) => {
                warn!(model = self.model.name(), "model sent back no text, no matches");
                String::new()
            }
            Err(e) => return Err(e.into()),
        };
        Ok(split_reply(&reply))
    }

    pub async fn judge(
        &self,
        listings: &[ListingRecord],
        requirement: &str,
    ) -> Result<Vec<Candidate>, PipelineError> {
        let lines = self.filter_relevant(listings, requirement).await?;
        let candidates = group_candidates(lines);
        info!(matches = candidates.len(), "model picked listings");
        Ok(candidates)
    }
}
