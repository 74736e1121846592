use std::collections::HashSet;
use std::time::Duration;
use tokio::time::sleep;
use tracing::info;
use url::Url;

use crate::error::PipelineError;
use crate::fetcher::PageSource;
use crate::listing::{ListingBatch, ListingParser, extract};

#[derive(Debug, Clone)]
pub struct PagerSettings {
    /// Pause before every page fetch after the first.
    pub delay: Duration,
    /// Optional sanity cap on pages crawled; `None` follows the site's links
    /// until they end or loop.
    pub max_pages: Option<usize>,
}

impl Default for PagerSettings {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(300),
            max_pages: None,
        }
    }
}

/// Page URLs already traversed. A revisit means the link chain looped.
#[derive(Debug, Default)]
pub struct VisitedSet(HashSet<String>);

impl VisitedSet {
    pub fn contains(&self, url: &Url) -> bool {
        self.0.contains(url.as_str())
    }

    /// Returns false when the url was already present.
    pub fn insert(&mut self, url: &Url) -> bool {
        self.0.insert(url.as_str().to_string())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct Crawl {
    pub batches: Vec<ListingBatch>,
    pub visited: VisitedSet,
}

impl Crawl {
    pub fn into_listings(self) -> ListingBatch {
        self.batches.into_iter().flatten().collect()
    }
}

/// Next page to crawl, or `None` when the chain ends or loops back.
pub fn next_unvisited(
    parser: &ListingParser,
    page_url: &Url,
    markup: &str,
    visited: &VisitedSet,
) -> Option<Url> {
    parser
        .next_page(page_url, markup)
        .filter(|next| !visited.contains(next))
}

/// Follows "next page" links from the first page, extracting one batch per
/// page. Batches are kept as they come; nothing is deduplicated.
pub async fn crawl_all(
    source: &dyn PageSource,
    parser: &ListingParser,
    first_url: Url,
    first_markup: String,
    max_price: u64,
    settings: &PagerSettings,
) -> Result<Crawl, PipelineError> {
    let mut crawl = Crawl::default();
    crawl.visited.insert(&first_url);

    let mut page_url = first_url;
    let mut markup = first_markup;

    loop {
        let batch = extract(source, parser, &page_url, &markup, max_price).await?;
        info!(
            page = crawl.batches.len() + 1,
            url = %page_url,
            count = batch.len(),
            "page extracted"
        );
        crawl.batches.push(batch);

        if let Some(cap) = settings.max_pages {
            if crawl.batches.len() >= cap {
                info!(max_pages = cap, "[pager] reached max_pages, stopping");
                break;
            }
        }

        let Some(next) = next_unvisited(parser, &page_url, &markup, &crawl.visited) else {
            info!(pages = crawl.batches.len(), "[pager] no unvisited next page, stopping");
            break;
        };

        crawl.visited.insert(&next);
        sleep(settings.delay).await;
        markup = source.fetch(next.as_str()).await?;
        page_url = next;
    }

    Ok(crawl)
}
