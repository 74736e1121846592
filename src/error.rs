use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered with status {status}")]
    Status { url: String, status: StatusCode },
}

/// Markup did not have the shape the selector table expects.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("invalid selector for {field}: {reason}")]
    Selector { field: &'static str, reason: String },
    #[error("listing card #{card} has no {field}")]
    MissingField { field: &'static str, card: usize },
    #[error("detail page {url} has no {field}")]
    MissingDetail { field: &'static str, url: String },
    #[error("price {raw:?} is not a whole number")]
    InvalidPrice { raw: String },
    #[error("listing href {href:?} does not resolve to a url")]
    InvalidHref { href: String },
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("model answered with status {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("model reply carried no text")]
    EmptyReply,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("could not serialize listings for the model: {0}")]
    Prompt(#[from] serde_json::Error),
    #[error("could not build search url: {0}")]
    SearchUrl(#[from] url::ParseError),
}
