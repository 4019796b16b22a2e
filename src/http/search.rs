//! `GET /search` (spec §6), grounded in
//! `original_source/src/controllers/SearchController.cpp::search`. The
//! pipeline is Query Parser (C10) -> Index Adapter (C13, via
//! `ContentStorage::search`) -> Scorer (C11) -> JSON response.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::query;
use crate::scoring::{self, CorpusStats, ScorableDocument, ScoringAlgorithm};
use crate::storage::{SearchHit, SearchQuery as IndexQuery};

use super::AppState;

type ApiResponse = (StatusCode, Json<Value>);

const SNIPPET_CHARS: usize = 200;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    q: Option<String>,
    page: Option<String>,
    limit: Option<String>,
    domain_filter: Option<String>,
}

pub async fn search(State(state): State<Arc<AppState>>, Query(params): Query<SearchParams>) -> ApiResponse {
    let Some(q) = params.q.filter(|v| !v.trim().is_empty()) else {
        return invalid_request("q", "Query parameter is required");
    };

    let page = match parse_bounded(params.page.as_deref(), 1, 1, 1000, "page", "Page must be between 1 and 1000") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let limit = match parse_bounded(params.limit.as_deref(), 10, 1, 100, "limit", "Limit must be between 1 and 100") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let wire_query = match query::compile(&q) {
        Ok(w) => w,
        Err(e) => return invalid_request("q", &e.to_string()),
    };

    let domain_filter: Vec<String> = params
        .domain_filter
        .map(|raw| raw.split(',').map(|d| d.trim().to_string()).filter(|d| !d.is_empty()).collect())
        .unwrap_or_default();

    let offset = (page - 1) * limit;
    let index_query = IndexQuery { wire_query, domain_filter, offset, limit, highlight: false };

    let results = match state.storage.search(index_query).await {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!(error = %e, query = %q, "search failed, returning empty result set");
            return ok_response(0, page, limit, Vec::new());
        }
    };

    let corpus = match state.storage.corpus_statistics().await {
        Ok(info) => CorpusStats { total_documents: (info.document_count as usize).max(1), ..CorpusStats::default() },
        Err(_) => CorpusStats::default(),
    };

    let by_url: HashMap<&str, &SearchHit> = results.hits.iter().map(|h| (h.doc.url.as_str(), h)).collect();

    let docs: Vec<ScorableDocument> = results
        .hits
        .iter()
        .map(|hit| ScorableDocument {
            id: hit.doc.url.clone(),
            url: hit.doc.url.clone(),
            title: hit.doc.title.clone(),
            content: hit.doc.content.clone(),
            description: hit.doc.description.clone(),
            keywords: hit.doc.keywords.clone(),
            domain: hit.doc.domain.clone(),
            base_score: hit.base_score,
            indexed_at: hit.doc.indexed_at,
        })
        .collect();

    let scored = scoring::rank_results(ScoringAlgorithm::Hybrid, &docs, &q, &state.scoring_config, &corpus, 0);

    let results_json: Vec<Value> = scored
        .iter()
        .filter_map(|score| {
            by_url.get(score.document_id.as_str()).map(|hit| {
                json!({
                    "url": hit.doc.url,
                    "title": hit.doc.title,
                    "snippet": snippet(&hit.doc.content),
                    "score": score.total_score,
                    "timestamp": hit.doc.indexed_at.to_rfc3339(),
                })
            })
        })
        .collect();

    ok_response(results.total_count, page, limit, results_json)
}

fn snippet(content: &str) -> String {
    let truncated: String = content.chars().take(SNIPPET_CHARS).collect();
    if content.chars().count() > SNIPPET_CHARS {
        format!("{truncated}...")
    } else {
        truncated
    }
}

fn parse_bounded(raw: Option<&str>, default: usize, min: usize, max: usize, field: &str, message: &str) -> Result<usize, ApiResponse> {
    let value = match raw {
        None => default,
        Some(s) => match s.parse::<usize>() {
            Ok(v) => v,
            Err(_) => return Err(invalid_request(field, &format!("Invalid {field} parameter"))),
        },
    };
    if value < min || value > max {
        return Err(invalid_request(field, message));
    }
    Ok(value)
}

fn invalid_request(field: &str, message: &str) -> ApiResponse {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "error": {
                "code": "INVALID_REQUEST",
                "message": "Invalid request parameters",
                "details": { field: message }
            }
        })),
    )
}

fn ok_response(total: usize, page: usize, limit: usize, results: Vec<Value>) -> ApiResponse {
    (
        StatusCode::OK,
        Json(json!({
            "meta": { "total": total, "page": page, "pageSize": limit },
            "results": results,
        })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snippet_truncates_long_content_with_ellipsis() {
        let content = "a".repeat(250);
        let s = snippet(&content);
        assert_eq!(s.len(), SNIPPET_CHARS + 3);
        assert!(s.ends_with("..."));
    }

    #[test]
    fn snippet_leaves_short_content_untouched() {
        assert_eq!(snippet("short"), "short");
    }

    #[test]
    fn parse_bounded_rejects_out_of_range_page() {
        assert!(parse_bounded(Some("0"), 1, 1, 1000, "page", "bad").is_err());
        assert!(parse_bounded(Some("1001"), 1, 1, 1000, "page", "bad").is_err());
        assert!(parse_bounded(Some("5"), 1, 1, 1000, "page", "bad").is_ok());
    }

    #[test]
    fn parse_bounded_falls_back_to_default_when_absent() {
        assert_eq!(parse_bounded(None, 10, 1, 100, "limit", "bad").unwrap(), 10);
    }
}
