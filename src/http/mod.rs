//! Thin external HTTP surface (spec §6): a single `axum::Router` exposing the
//! public `/search` endpoint plus the admin crawl-control endpoints,
//! grounded in `original_source/src/controllers/{SearchController,
//! DomainController}.cpp`. CORS is supplied by `tower_http`, the way
//! `foiacquire` layers its own axum router.

pub mod admin;
pub mod search;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use crate::crawler::CrawlerManager;
use crate::scoring::ScoringConfig;
use crate::storage::ContentStorage;
use crate::templates::TemplateRegistry;

/// Shared state handed to every handler (spec §6: "Search requests go Query
/// Parser -> Index Adapter -> Scorer -> response").
pub struct AppState {
    pub storage: Arc<ContentStorage>,
    pub crawler_manager: Arc<CrawlerManager>,
    pub templates: Arc<TemplateRegistry>,
    pub scoring_config: ScoringConfig,
}

impl AppState {
    pub fn new(storage: Arc<ContentStorage>, crawler_manager: Arc<CrawlerManager>, templates: Arc<TemplateRegistry>) -> Self {
        Self { storage, crawler_manager, templates, scoring_config: ScoringConfig::create_default() }
    }
}

/// Builds the full router: `/search` is the public surface, `/crawl*` is the
/// admin surface mirroring `DomainController`'s `addSiteToCrawl`/
/// `getCrawlStatus`/stop endpoints. `Access-Control-Allow-Origin: *` applies
/// to every route (spec §6).
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/search", get(search::search))
        .route("/crawl", post(admin::add_site_to_crawl))
        .route("/crawl/:session_id", get(admin::get_crawl_status))
        .route("/crawl/:session_id/stop", post(admin::stop_crawl))
        .layer(cors)
        .with_state(state)
}
