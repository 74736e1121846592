use std::sync::Arc;
use tracing::info;
use url::Url;

use crate::enrich::{EnrichedListing, enrich};
use crate::error::PipelineError;
use crate::fetcher::PageSource;
use crate::listing::ListingParser;
use crate::pager::{PagerSettings, crawl_all};
use crate::relevance::RelevanceFilter;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub product: String,
    pub city: String,
    pub max_price: u64,
    /// Free-text description of what the user actually wants.
    pub requirement: String,
}

#[derive(Debug, Clone, Default)]
pub struct SearchOutcome {
    pub pages: usize,
    /// Listings that passed the price ceiling and were shown to the model.
    pub scanned: usize,
    pub listings: Vec<EnrichedListing>,
}

/// `<base>/fr/<city>/<product>--à_vendre?has_price=true&has_image=true&price=<max>`
pub fn search_url(base: &Url, query: &SearchQuery) -> Result<Url, PipelineError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
        .clear()
        .push("fr")
        .push(query.city.trim())
        .push(&format!("{}--à_vendre", query.product.trim()));
    url.query_pairs_mut()
        .clear()
        .append_pair("has_price", "true")
        .append_pair("has_image", "true")
        .append_pair("price", &query.max_price.to_string());
    Ok(url)
}

/// One search, start to finish. Every stage runs sequentially.
pub struct Pipeline {
    source: Arc<dyn PageSource>,
    parser: ListingParser,
    relevance: RelevanceFilter,
    base_url: Url,
    pager: PagerSettings,
}

impl Pipeline {
    pub fn new(
        source: Arc<dyn PageSource>,
        parser: ListingParser,
        relevance: RelevanceFilter,
        base_url: Url,
        pager: PagerSettings,
    ) -> Self {
        Self {
            source,
            parser,
            relevance,
            base_url,
            pager,
        }
    }

    pub async fn run(&self, query: &SearchQuery) -> Result<SearchOutcome, PipelineError> {
        let first_url = search_url(&self.base_url, query)?;
        info!(url = %first_url, "[search] starting");

        let first = self.source.fetch(first_url.as_str()).await?;
        let crawl = crawl_all(
            self.source.as_ref(),
            &self.parser,
            first_url,
            first,
            query.max_price,
            &self.pager,
        )
        .await?;

        let pages = crawl.batches.len();
        let listings = crawl.into_listings();
        info!(pages, total = listings.len(), "[search] crawl finished");

        if listings.is_empty() {
            info!("[search] nothing within budget, skipping model call");
            return Ok(SearchOutcome {
                pages,
                ..SearchOutcome::default()
            });
        }

        let candidates = self.relevance.judge(&listings, &query.requirement).await?;
        let enriched = enrich(self.source.as_ref(), &self.parser, candidates).await;

        Ok(SearchOutcome {
            pages,
            scanned: listings.len(),
            listings: enriched,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_url_follows_site_pattern() {
        let base = Url::parse("https://www.avito.ma").unwrap();
        let q = SearchQuery {
            product: "canape".into(),
            city: "rabat".into(),
            max_price: 1000,
            requirement: "gris".into(),
        };
        assert_eq!(
            search_url(&base, &q).unwrap().as_str(),
            "https://www.avito.ma/fr/rabat/canape--%C3%A0_vendre?has_price=true&has_image=true&price=1000"
        );
    }

    #[test]
    fn search_url_encodes_spaces_in_product() {
        let base = Url::parse("https://www.avito.ma/").unwrap();
        let q = SearchQuery {
            product: "iphone 13".into(),
            city: "casablanca".into(),
            max_price: 5000,
            requirement: "bon état".into(),
        };
        let url = search_url(&base, &q).unwrap();
        assert_eq!(url.path(), "/fr/casablanca/iphone%2013--%C3%A0_vendre");
    }
}
