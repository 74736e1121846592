use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use tracing::{debug, info};
use url::Url;

use crate::error::{ExtractError, PipelineError};
use crate::fetcher::PageSource;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingRecord {
    pub title: String,
    /// As shown on the site, currency suffix included ("1,500 DH").
    pub price: String,
    pub upload_date: String,
    pub url: String,
    pub description: String,
}

pub type ListingBatch = Vec<ListingRecord>;

/// One search-result card that passed the price ceiling, before its
/// detail page is fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingCard {
    pub title: String,
    pub price: String,
    pub upload_date: String,
    pub url: String,
}

/// Every CSS selector the scraper depends on. A markup change on the site
/// should only ever touch this table.
#[derive(Debug, Clone)]
pub struct SiteSelectors {
    pub listing_card: &'static str,
    pub title: &'static str,
    pub upload_date: &'static str,
    pub price: &'static str,
    pub description: &'static str,
    pub next_page: &'static str,
    pub image: &'static str,
}

impl SiteSelectors {
    pub const AVITO: SiteSelectors = SiteSelectors {
        listing_card: "a.sc-1jge648-0.eTbzNs",
        title: ".sc-1x0vz2r-0.czqClV",
        upload_date: ".sc-1x0vz2r-0.iFQpLP",
        price: ".sc-1x0vz2r-0.eCXWei.sc-b57yxx-3.IneBF",
        description: ".sc-ij98yj-0.fAYGMO",
        next_page: ".sc-1cf7u6r-0.gRyZxr.sc-2y0ggl-1.yRCEb",
        image: ".sc-1gjavk-0.fpXQoT",
    };
}

impl Default for SiteSelectors {
    fn default() -> Self {
        Self::AVITO
    }
}

/// Compiled form of [`SiteSelectors`], built once and shared across requests.
#[derive(Debug, Clone)]
pub struct ListingParser {
    listing_card: Selector,
    title: Selector,
    upload_date: Selector,
    price: Selector,
    description: Selector,
    next_page: Selector,
    image: Selector,
}

fn compile(field: &'static str, css: &str) -> Result<Selector, ExtractError> {
    Selector::parse(css).map_err(|e| ExtractError::Selector {
        field,
        reason: e.to_string(),
    })
}

fn text_of(el: ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}

impl ListingParser {
    pub fn new(table: &SiteSelectors) -> Result<Self, ExtractError> {
        Ok(Self {
            listing_card: compile("listing_card", table.listing_card)?,
            title: compile("title", table.title)?,
            upload_date: compile("upload_date", table.upload_date)?,
            price: compile("price", table.price)?,
            description: compile("description", table.description)?,
            next_page: compile("next_page", table.next_page)?,
            image: compile("image", table.image)?,
        })
    }

    /// Reads every listing card on a search page and keeps those priced at
    /// or below `max_price`. Any card missing a field, or carrying a price
    /// that is not a whole number, fails the whole page.
    pub fn parse_cards(
        &self,
        page_url: &Url,
        markup: &str,
        max_price: u64,
    ) -> Result<Vec<ListingCard>, ExtractError> {
        let doc = Html::parse_document(markup);
        let mut kept = Vec::new();

        for (card, el) in doc.select(&self.listing_card).enumerate() {
            let field = |sel: &Selector, name: &'static str| {
                el.select(sel)
                    .next()
                    .map(text_of)
                    .ok_or(ExtractError::MissingField { field: name, card })
            };

            let title = field(&self.title, "title")?;
            let href = el
                .value()
                .attr("href")
                .ok_or(ExtractError::MissingField { field: "url", card })?;
            let url = page_url
                .join(href)
                .map_err(|_| ExtractError::InvalidHref {
                    href: href.to_string(),
                })?
                .to_string();
            let upload_date = field(&self.upload_date, "upload_date")?;
            let price = field(&self.price, "price")?;
            let price_value = parse_price(&price)?;

            if price_value > max_price {
                debug!(card, price_value, max_price, "over budget");
                continue;
            }

            kept.push(ListingCard {
                title,
                price,
                upload_date,
                url,
            });
        }

        Ok(kept)
    }

    pub fn parse_description(&self, url: &str, markup: &str) -> Result<String, ExtractError> {
        let doc = Html::parse_document(markup);
        doc.select(&self.description)
            .next()
            .map(text_of)
            .ok_or_else(|| ExtractError::MissingDetail {
                field: "description",
                url: url.to_string(),
            })
    }

    /// Target of the last "next page" link, resolved against the current page.
    pub fn next_page(&self, page_url: &Url, markup: &str) -> Option<Url> {
        let doc = Html::parse_document(markup);
        let href = doc.select(&self.next_page).last()?.value().attr("href")?;
        page_url.join(href).ok()
    }

    /// `src` of the first listing image, resolved against the detail page.
    pub fn image_src(&self, page_url: &Url, markup: &str) -> Option<String> {
        let doc = Html::parse_document(markup);
        let src = doc
            .select(&self.image)
            .next()?
            .value()
            .attr("src")
            .map(str::trim)
            .filter(|src| !src.is_empty())?;
        page_url.join(src).ok().map(String::from)
    }
}

/// "1,500 DH" -> 1500. Whitespace and the DH marker are trimmed from both
/// ends, thousands separators dropped.
pub fn parse_price(raw: &str) -> Result<u64, ExtractError> {
    let digits: String = raw
        .trim_matches(|c: char| c.is_whitespace() || c == 'D' || c == 'H')
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();
    digits.parse::<u64>().map_err(|_| ExtractError::InvalidPrice {
        raw: raw.to_string(),
    })
}

/// Parses one search page and fetches the description of every card that
/// survived the price filter.
pub async fn extract(
    source: &dyn PageSource,
    parser: &ListingParser,
    page_url: &Url,
    markup: &str,
    max_price: u64,
) -> Result<ListingBatch, PipelineError> {
    let cards = parser.parse_cards(page_url, markup, max_price)?;
    info!(page = %page_url, kept = cards.len(), "listing cards parsed");

    let mut batch = Vec::with_capacity(cards.len());
    for card in cards {
        let detail = source.fetch(&card.url).await?;
        let description = parser.parse_description(&card.url, &detail)?;
        batch.push(ListingRecord {
            title: card.title,
            price: card.price,
            upload_date: card.upload_date,
            url: card.url,
            description,
        });
    }
    Ok(batch)
}
