use serde::Serialize;
use tracing::warn;
use url::Url;

use crate::fetcher::PageSource;
use crate::listing::ListingParser;
use crate::relevance::Candidate;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnrichedListing {
    /// `None` when the detail page had no usable image or could not be fetched.
    pub image: Option<String>,
    pub title: String,
    pub price: String,
    pub url: String,
}

impl EnrichedListing {
    pub fn image_marker(&self) -> &str {
        self.image.as_deref().unwrap_or("none")
    }
}

/// Attaches one image per candidate, in input order. Image failures never
/// fail the search; they are logged and leave the image empty.
pub async fn enrich(
    source: &dyn PageSource,
    parser: &ListingParser,
    candidates: Vec<Candidate>,
) -> Vec<EnrichedListing> {
    let mut out = Vec::with_capacity(candidates.len());
    for c in candidates {
        let page_url = Url::parse(&c.url)
            .ok()
            .filter(|u| matches!(u.scheme(), "http" | "https"));
        let image = if let Some(page_url) = page_url {
            match source.fetch(&c.url).await {
                Ok(html) => {
                    let src = parser.image_src(&page_url, &html);
                    if src.is_none() {
                        warn!(url = %c.url, "[image] no image on detail page");
                    }
                    src
                }
                Err(e) => {
                    warn!(url = %c.url, error = %e, "[image] fetch failed");
                    None
                }
            }
        } else {
            warn!(url = %c.url, "[image] candidate has no web url");
            None
        };

        out.push(EnrichedListing {
            image,
            title: c.title,
            price: c.price,
            url: c.url,
        });
    }
    out
}
