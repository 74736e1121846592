use anyhow::{Context, Result};
use std::env;
use std::time::Duration;
use url::Url;

use crate::pager::PagerSettings;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_SITE_BASE_URL: &str = "https://www.avito.ma";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
const DEFAULT_PAGE_DELAY_MS: u64 = 300;
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 25;
const DEFAULT_MODEL_TIMEOUT_SECS: u64 = 90;

#[derive(Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub bind_addr: String,
    pub site_base_url: Url,
    pub page_delay: Duration,
    pub max_pages: Option<usize>,
    pub fetch_timeout: Duration,
    pub model_timeout: Duration,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("gemini_api_key", &"<redacted>")
            .field("gemini_model", &self.gemini_model)
            .field("bind_addr", &self.bind_addr)
            .field("site_base_url", &self.site_base_url.as_str())
            .field("page_delay", &self.page_delay)
            .field("max_pages", &self.max_pages)
            .field("fetch_timeout", &self.fetch_timeout)
            .field("model_timeout", &self.model_timeout)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`Config::from_env`] over an arbitrary key lookup.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| get(key).filter(|v| !v.trim().is_empty());

        let gemini_api_key = var("GEMINI_API_KEY").context("GEMINI_API_KEY is not set")?;
        let site = var("SITE_BASE_URL").unwrap_or_else(|| DEFAULT_SITE_BASE_URL.to_string());
        let site_base_url =
            Url::parse(&site).with_context(|| format!("SITE_BASE_URL {site:?} is not a url"))?;

        let page_delay_ms = match var("PAGE_DELAY_MS") {
            Some(v) => v.parse().context("PAGE_DELAY_MS must be a whole number")?,
            None => DEFAULT_PAGE_DELAY_MS,
        };
        let fetch_timeout_secs = match var("FETCH_TIMEOUT_SECS") {
            Some(v) => v.parse().context("FETCH_TIMEOUT_SECS must be a whole number")?,
            None => DEFAULT_FETCH_TIMEOUT_SECS,
        };
        let model_timeout_secs = match var("MODEL_TIMEOUT_SECS") {
            Some(v) => v.parse().context("MODEL_TIMEOUT_SECS must be a whole number")?,
            None => DEFAULT_MODEL_TIMEOUT_SECS,
        };
        let max_pages = var("MAX_PAGES")
            .map(|v| v.parse::<usize>())
            .transpose()
            .context("MAX_PAGES must be a whole number")?;

        Ok(Self {
            gemini_api_key,
            gemini_model: var("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            bind_addr: var("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            site_base_url,
            page_delay: Duration::from_millis(page_delay_ms),
            max_pages,
            fetch_timeout: Duration::from_secs(fetch_timeout_secs),
            model_timeout: Duration::from_secs(model_timeout_secs),
        })
    }

    pub fn pager(&self) -> PagerSettings {
        PagerSettings {
            delay: self.page_delay,
            max_pages: self.max_pages,
        }
    }
}
