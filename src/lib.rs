//! pawnBot: scrapes avito.ma search results within a price ceiling and asks
//! a generative model which listings match a free-text requirement.

pub mod config;
pub mod enrich;
pub mod error;
pub mod fetcher;
pub mod listing;
pub mod pager;
pub mod pages;
pub mod pipeline;
pub mod relevance;
pub mod web;

pub use config::Config;
pub use error::{ExtractError, FetchError, ModelError, PipelineError};
pub use fetcher::{HttpFetcher, PageSource};
pub use listing::{ListingParser, ListingRecord, SiteSelectors};
pub use pipeline::{Pipeline, SearchOutcome, SearchQuery};
pub use relevance::{GeminiModel, GenerativeModel, RelevanceFilter};
