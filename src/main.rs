use actix_web::{App, HttpServer, web};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use pawnbot::{
    Config, GeminiModel, HttpFetcher, ListingParser, Pipeline, RelevanceFilter, SiteSelectors,
};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("pawnbot=info,actix_web=info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present; real environment wins.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = Config::from_env()?;

    let fetcher = HttpFetcher::new(cfg.fetch_timeout).context("building http client")?;
    let model = GeminiModel::new(
        cfg.gemini_api_key.clone(),
        cfg.gemini_model.clone(),
        cfg.model_timeout,
    )
    .context("building model client")?;
    let parser = ListingParser::new(&SiteSelectors::AVITO).context("compiling selectors")?;

    let pipeline = web::Data::new(Pipeline::new(
        Arc::new(fetcher),
        parser,
        RelevanceFilter::new(Arc::new(model)),
        cfg.site_base_url.clone(),
        cfg.pager(),
    ));

    tracing::info!(addr = %cfg.bind_addr, site = %cfg.site_base_url, "starting pawnbot");
    HttpServer::new(move || {
        App::new()
            .app_data(pipeline.clone())
            .configure(pawnbot::web::routes)
    })
    .bind(cfg.bind_addr.as_str())
    .with_context(|| format!("binding {}", cfg.bind_addr))?
    .run()
    .await?;
    Ok(())
}
