use actix_web::{HttpResponse, Responder, get, http::StatusCode, post, web};
use serde::Deserialize;
use tracing::{error, info};

use crate::pages::{error_page, index_page, listings_page};
use crate::pipeline::{Pipeline, SearchQuery};

pub const MISSING_FIELDS: &str = "Please fill all the fields out";

// -------------------------
// Form types
// -------------------------

/// Raw form post; every field optional so a missing one renders the error
/// page instead of a bare 400.
#[derive(Debug, Default, Deserialize)]
pub struct ShopForm {
    /// product name
    pub pn: Option<String>,
    /// city
    pub c: Option<String>,
    /// max price, whole dirhams
    pub mp: Option<String>,
    /// free-text requirement
    pub desc: Option<String>,
}

impl ShopForm {
    pub fn into_query(self) -> Result<SearchQuery, &'static str> {
        fn filled(v: Option<String>) -> Option<String> {
            v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
        }

        let (Some(product), Some(city), Some(mp), Some(requirement)) = (
            filled(self.pn),
            filled(self.c),
            filled(self.mp),
            filled(self.desc),
        ) else {
            return Err(MISSING_FIELDS);
        };

        let max_price = match mp.parse::<u64>() {
            Ok(0) => return Err(MISSING_FIELDS),
            Ok(n) => n,
            Err(_) => return Err("Max price must be a whole number of dirhams"),
        };

        Ok(SearchQuery {
            product,
            city,
            max_price,
            requirement,
        })
    }
}

fn html(status: StatusCode, body: String) -> HttpResponse {
    HttpResponse::build(status)
        .insert_header(("Content-Type", "text/html; charset=utf-8"))
        .body(body)
}

// -------------------------
// HTTP Handlers
// -------------------------

#[get("/")]
async fn index() -> impl Responder {
    html(StatusCode::OK, index_page())
}

#[get("/healthz")]
async fn healthz() -> impl Responder {
    HttpResponse::Ok().body("ok")
}

#[post("/shop")]
async fn shop(pipeline: web::Data<Pipeline>, form: web::Form<ShopForm>) -> impl Responder {
    let query = match form.into_inner().into_query() {
        Ok(q) => q,
        Err(msg) => return html(StatusCode::BAD_REQUEST, error_page(msg)),
    };

    info!(product = %query.product, city = %query.city, max_price = query.max_price, "[shop] search");
    match pipeline.run(&query).await {
        Ok(outcome) => html(StatusCode::OK, listings_page(&query, &outcome)),
        Err(e) => {
            error!(error = %e, "[shop] search failed");
            html(StatusCode::BAD_GATEWAY, error_page(&e.to_string()))
        }
    }
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(index).service(healthz).service(shop);
}
