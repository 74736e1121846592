mod common;

use std::sync::Arc;
use url::Url;

use common::*;
use pawnbot::enrich::enrich;
use pawnbot::listing::extract;
use pawnbot::pager::{PagerSettings, crawl_all};
use pawnbot::relevance::Candidate;
use pawnbot::{PipelineError, SearchQuery};

const SOFA: &str = "https://www.avito.ma/fr/agdal/canapes/sofa_1.htm";
const ANGLE: &str = "https://www.avito.ma/fr/agdal/canapes/angle_2.htm";
const CHAIR: &str = "https://www.avito.ma/fr/hassan/canapes/chair_3.htm";
const PAGE_TWO: &str = "https://www.avito.ma/fr/rabat/canape--%C3%A0_vendre?has_price=true&has_image=true&price=1000&o=2";

fn query() -> SearchQuery {
    SearchQuery {
        product: "canape".into(),
        city: "rabat".into(),
        max_price: 1000,
        requirement: "un canapé gris en bon état".into(),
    }
}

fn two_page_site() -> FakeSite {
    FakeSite::new()
        .page(
            FIRST_PAGE,
            search_page(
                &[card("Sofa gris", "500 DH", SOFA), card("Canapé d'angle", "1,500 DH", ANGLE)],
                Some(PAGE_TWO),
            ),
        )
        // Page two links back to page one: the chain loops and must stop.
        .page(
            PAGE_TWO,
            search_page(&[card("Fauteuil", "800 DH", CHAIR)], Some(FIRST_PAGE)),
        )
        .page(SOFA, detail_page("Sofa gris trois places", Some("https://img.avito.ma/sofa.jpg")))
        .page(CHAIR, detail_page("Fauteuil beige", None))
}

#[tokio::test]
async fn full_search_crawls_judges_and_enriches() {
    let site = Arc::new(two_page_site());
    let model = Arc::new(StubModel::replying(&format!(
        "Sofa gris\n500 DH\n{SOFA}\nFauteuil\n800 DH\n{CHAIR}\n"
    )));

    let outcome = pipeline(site.clone(), model.clone())
        .run(&query())
        .await
        .expect("search succeeds");

    assert_eq!(outcome.pages, 2);
    assert_eq!(outcome.scanned, 2);
    assert_eq!(outcome.listings.len(), 2);
    assert_eq!(outcome.listings[0].title, "Sofa gris");
    assert_eq!(outcome.listings[0].image.as_deref(), Some("https://img.avito.ma/sofa.jpg"));
    assert_eq!(outcome.listings[1].title, "Fauteuil");
    assert_eq!(outcome.listings[1].image_marker(), "none");

    // Over-budget card never had its detail page fetched; page one fetched once.
    let fetched = site.fetched();
    assert!(!fetched.iter().any(|u| u == ANGLE));
    assert_eq!(fetched.iter().filter(|u| *u == FIRST_PAGE).count(), 1);

    let prompts = model.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("Sofa gris trois places"));
    assert!(prompts[0].contains("un canapé gris en bon état"));
    assert!(!prompts[0].contains("Canapé d'angle"));
}

#[tokio::test]
async fn nothing_in_budget_skips_the_model() {
    let site = Arc::new(FakeSite::new().page(
        FIRST_PAGE,
        search_page(&[card("Canapé d'angle", "1,500 DH", ANGLE)], None),
    ));
    let model = Arc::new(StubModel::replying("unused\n"));

    let outcome = pipeline(site, model.clone()).run(&query()).await.unwrap();
    assert_eq!(outcome.pages, 1);
    assert!(outcome.listings.is_empty());
    assert!(model.prompts().is_empty());
}

#[tokio::test]
async fn missing_description_aborts_the_search() {
    let site = Arc::new(
        FakeSite::new()
            .page(FIRST_PAGE, search_page(&[card("Sofa", "500 DH", SOFA)], None))
            .page(SOFA, "<html><body><p>moved</p></body></html>"),
    );
    let model = Arc::new(StubModel::replying(""));

    let err = pipeline(site, model).run(&query()).await.unwrap_err();
    assert!(matches!(err, PipelineError::Extract(_)), "got {err:?}");
}

#[tokio::test]
async fn unreachable_search_page_is_a_fetch_error() {
    let site = Arc::new(FakeSite::new());
    let model = Arc::new(StubModel::replying(""));

    let err = pipeline(site, model).run(&query()).await.unwrap_err();
    assert!(matches!(err, PipelineError::Fetch(_)));
}

#[tokio::test]
async fn extract_keeps_boundary_price_and_reads_description() {
    let site = FakeSite::new().page(SOFA, detail_page("Comme neuf", None));
    let html = search_page(
        &[card("Sofa", "1,000 DH", SOFA), card("Angle", "1,001 DH", ANGLE)],
        None,
    );
    let url = Url::parse(FIRST_PAGE).unwrap();

    let batch = extract(&site, &parser(), &url, &html, 1000).await.unwrap();
    assert_eq!(batch.len(), 1);
    assert_eq!(batch[0].price, "1,000 DH");
    assert_eq!(batch[0].description, "Comme neuf");
    assert_eq!(batch[0].upload_date, "il y a 3 heures");
}

#[tokio::test]
async fn no_next_link_yields_a_single_batch() {
    let site = FakeSite::new().page(SOFA, detail_page("ok", None));
    let first = search_page(&[card("Sofa", "500 DH", SOFA)], None);

    let crawl = crawl_all(&site, &parser(), Url::parse(FIRST_PAGE).unwrap(), first, 1000, &no_delay())
        .await
        .unwrap();
    assert_eq!(crawl.batches.len(), 1);
    assert_eq!(site.fetched(), vec![SOFA.to_string()]);
}

#[tokio::test]
async fn self_referencing_next_link_stops_immediately() {
    let first = search_page(&[], Some(FIRST_PAGE));
    let site = FakeSite::new();

    let crawl = crawl_all(&site, &parser(), Url::parse(FIRST_PAGE).unwrap(), first, 1000, &no_delay())
        .await
        .unwrap();
    assert_eq!(crawl.batches.len(), 1);
    assert!(site.fetched().is_empty());
}

#[tokio::test]
async fn page_cap_bounds_an_endless_chain() {
    // Every page links to a fresh page: only the cap stops this.
    let mut site = FakeSite::new();
    for i in 2..=10 {
        let url = format!("{FIRST_PAGE}&o={i}");
        let next = format!("{FIRST_PAGE}&o={}", i + 1);
        site = site.page(&url, search_page(&[], Some(next.as_str())));
    }
    let second = format!("{FIRST_PAGE}&o=2");
    let first = search_page(&[], Some(second.as_str()));
    let settings = PagerSettings {
        max_pages: Some(3),
        ..no_delay()
    };

    let crawl = crawl_all(&site, &parser(), Url::parse(FIRST_PAGE).unwrap(), first, 1000, &settings)
        .await
        .unwrap();
    assert_eq!(crawl.batches.len(), 3);
    assert_eq!(site.fetched().len(), 2);
    assert_eq!(crawl.visited.len(), 3);
}

#[tokio::test]
async fn enrichment_yields_one_image_per_candidate_in_order() {
    let site = FakeSite::new()
        .page(SOFA, detail_page("x", Some("https://img.avito.ma/a.jpg")))
        .page(CHAIR, detail_page("y", Some("https://img.avito.ma/c.jpg")));
    let candidates = vec![
        Candidate { title: "Sofa".into(), price: "500 DH".into(), url: SOFA.into() },
        // Not fetchable: degrades to "none" instead of failing.
        Candidate { title: "Gone".into(), price: "10 DH".into(), url: ANGLE.into() },
        Candidate { title: "No link".into(), price: "20 DH".into(), url: "voir annonce".into() },
        Candidate { title: "Script".into(), price: "30 DH".into(), url: "javascript:alert('http')".into() },
        Candidate { title: "Chair".into(), price: "800 DH".into(), url: CHAIR.into() },
    ];

    let out = enrich(&site, &parser(), candidates).await;
    let markers: Vec<&str> = out.iter().map(|l| l.image_marker()).collect();
    assert_eq!(
        markers,
        vec!["https://img.avito.ma/a.jpg", "none", "none", "none", "https://img.avito.ma/c.jpg"]
    );
    let titles: Vec<&str> = out.iter().map(|l| l.title.as_str()).collect();
    assert_eq!(titles, vec!["Sofa", "Gone", "No link", "Script", "Chair"]);
    let fetched = site.fetched();
    assert!(!fetched.iter().any(|u| u == "voir annonce"));
    assert!(!fetched.iter().any(|u| u.starts_with("javascript:")));
}
