// Shared fakes for integration tests: an in-memory site and a canned model.
#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

use pawnbot::error::{FetchError, ModelError};
use pawnbot::pager::PagerSettings;
use pawnbot::{
    GenerativeModel, ListingParser, PageSource, Pipeline, RelevanceFilter, SiteSelectors,
};

pub const BASE: &str = "https://www.avito.ma";
pub const FIRST_PAGE: &str =
    "https://www.avito.ma/fr/rabat/canape--%C3%A0_vendre?has_price=true&has_image=true&price=1000";

#[derive(Default)]
pub struct FakeSite {
    pages: HashMap<String, String>,
    fetched: Mutex<Vec<String>>,
}

impl FakeSite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, html: impl Into<String>) -> Self {
        self.pages.insert(url.to_string(), html.into());
        self
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageSource for FakeSite {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.fetched.lock().unwrap().push(url.to_string());
        self.pages.get(url).cloned().ok_or_else(|| FetchError::Status {
            url: url.to_string(),
            status: reqwest::StatusCode::NOT_FOUND,
        })
    }
}

pub struct StubModel {
    /// `None` answers like a model that returned no text at all.
    reply: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl StubModel {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn silent() -> Self {
        Self {
            reply: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerativeModel for StubModel {
    async fn generate(&self, prompt: &str) -> Result<String, ModelError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.reply.clone().ok_or(ModelError::EmptyReply)
    }

    fn name(&self) -> &str {
        "stub"
    }
}

pub fn parser() -> ListingParser {
    ListingParser::new(&SiteSelectors::AVITO).unwrap()
}

pub fn no_delay() -> PagerSettings {
    PagerSettings {
        delay: Duration::ZERO,
        max_pages: None,
    }
}

pub fn pipeline(site: Arc<FakeSite>, model: Arc<StubModel>) -> Pipeline {
    Pipeline::new(
        site,
        parser(),
        RelevanceFilter::new(model),
        Url::parse(BASE).unwrap(),
        no_delay(),
    )
}

pub fn card(title: &str, price: &str, href: &str) -> String {
    format!(
        r#"<a class="sc-1jge648-0 eTbzNs" href="{href}">
             <div><p class="sc-1x0vz2r-0 czqClV">{title}</p></div>
             <p class="sc-1x0vz2r-0 iFQpLP">il y a 3 heures</p>
             <span class="sc-1x0vz2r-0 eCXWei sc-b57yxx-3 IneBF">{price}</span>
           </a>"#
    )
}

pub fn next_link(href: &str) -> String {
    format!(r#"<a class="sc-1cf7u6r-0 gRyZxr sc-2y0ggl-1 yRCEb" href="{href}">Suivant</a>"#)
}

pub fn search_page(cards: &[String], next: Option<&str>) -> String {
    let nav = next.map(next_link).unwrap_or_default();
    format!(
        "<html><body><section>{}</section><nav>{}</nav></body></html>",
        cards.join("\n"),
        nav
    )
}

pub fn detail_page(description: &str, image: Option<&str>) -> String {
    let img = image
        .map(|src| format!(r#"<img class="sc-1gjavk-0 fpXQoT" src="{src}">"#))
        .unwrap_or_default();
    format!(
        r#"<html><body>{img}<div class="sc-ij98yj-0 fAYGMO">{description}</div></body></html>"#
    )
}
