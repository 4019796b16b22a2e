//! Admin crawl-control endpoints (SUPPLEMENT, spec §6), grounded in
//! `original_source/src/controllers/SearchController.cpp::addSiteToCrawl`
//! and `DomainController.cpp::addDomain`'s validation bounds.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::crawler::CrawlStatus;
use crate::error::CoreError;
use crate::models::CrawlConfig;
use crate::templates;

use super::AppState;

type ApiResponse = (StatusCode, Json<Value>);

#[derive(Debug, Deserialize)]
pub struct AddSiteRequest {
    url: Option<String>,
    #[serde(default)]
    max_pages: Option<usize>,
    #[serde(default)]
    max_depth: Option<u32>,
    #[serde(default)]
    webmaster_email: Option<String>,
    /// Optional named crawl template (spec §6) whose overrides are merged
    /// onto the defaults before `maxPages`/`maxDepth` are applied.
    #[serde(default)]
    template: Option<String>,
}

/// `POST /crawl` (mirrors `addSiteToCrawl`): starts one crawl session
/// through the Crawler Manager (C9) and hands back its session id.
pub async fn add_site_to_crawl(State(state): State<Arc<AppState>>, Json(body): Json<AddSiteRequest>) -> ApiResponse {
    let Some(url) = body.url.filter(|u| !u.trim().is_empty()) else {
        return bad_request("URL is required");
    };

    let max_pages = body.max_pages.unwrap_or(1000);
    if max_pages < 1 || max_pages > 10_000 {
        return bad_request("maxPages must be between 1 and 10000");
    }
    let max_depth = body.max_depth.unwrap_or(3);
    if max_depth < 1 || max_depth > 10 {
        return bad_request("maxDepth must be between 1 and 10");
    }

    let mut config = CrawlConfig::default();
    if let Some(name) = body.template.as_deref() {
        match state.templates.get(name) {
            Some(def) => templates::apply_template(&def, &mut config),
            None => return bad_request("Unknown crawl template"),
        }
    }
    config.max_pages = max_pages;
    config.max_depth = max_depth;

    match state.crawler_manager.start_crawl(&url, config).await {
        Ok(session_id) => (
            StatusCode::CREATED,
            Json(json!({
                "success": true,
                "message": "Site added to crawl queue successfully",
                "data": {
                    "sessionId": session_id,
                    "url": url,
                    "maxPages": max_pages,
                    "maxDepth": max_depth,
                    "webmasterEmail": body.webmaster_email.unwrap_or_default(),
                    "status": "queued",
                }
            })),
        ),
        Err(e) => server_error(&e.to_string()),
    }
}

/// `GET /crawl/:session_id` (mirrors `getCrawlStatus`).
pub async fn get_crawl_status(State(state): State<Arc<AppState>>, Path(session_id): Path<String>) -> ApiResponse {
    match state.crawler_manager.get_crawl_status(&session_id).await {
        Ok(status) => (
            StatusCode::OK,
            Json(json!({ "sessionId": session_id, "status": status_label(status) })),
        ),
        Err(CoreError::NotFound) => not_found(),
        Err(e) => server_error(&e.to_string()),
    }
}

/// `POST /crawl/:session_id/stop`.
pub async fn stop_crawl(State(state): State<Arc<AppState>>, Path(session_id): Path<String>) -> ApiResponse {
    match state.crawler_manager.stop_crawl(&session_id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "success": true, "message": "Crawl session stopping", "sessionId": session_id })),
        ),
        Err(CoreError::NotFound) => not_found(),
        Err(e) => server_error(&e.to_string()),
    }
}

fn status_label(status: CrawlStatus) -> &'static str {
    match status {
        CrawlStatus::Running => "running",
        CrawlStatus::Completed => "completed",
        CrawlStatus::Failed => "failed",
    }
}

fn bad_request(message: &str) -> ApiResponse {
    (StatusCode::BAD_REQUEST, Json(json!({ "success": false, "message": message })))
}

fn not_found() -> ApiResponse {
    (StatusCode::NOT_FOUND, Json(json!({ "success": false, "message": "Crawl session not found" })))
}

fn server_error(message: &str) -> ApiResponse {
    (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "success": false, "message": message })))
}
