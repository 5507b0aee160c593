//! Search API endpoints.

use axum::{
    extract::{Query, State},
    Extension,
};
use serde::{Deserialize, Serialize};

use super::{family_from_slug, success, ApiResult};
use crate::auth::Caller;
use crate::models::InspectionRecord;
use crate::search::MAX_SEARCH_LIMIT;
use crate::AppState;

/// Search query parameters.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    /// Search query string.
    #[serde(default)]
    pub q: String,
    /// Restrict to one family, by slug.
    #[serde(default)]
    pub family: Option<String>,
    /// Maximum number of results (default: 20).
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Offset for pagination (default: 0).
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    20
}

/// Search result with records and metadata.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub results: Vec<SearchResultItem>,
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}

/// Single search result item.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResultItem {
    pub record: InspectionRecord,
    pub score: f32,
}

/// GET /api/search - Search records visible to the caller.
pub async fn search_records(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Query(params): Query<SearchQuery>,
) -> ApiResult<SearchResponse> {
    let limit = params.limit.clamp(1, MAX_SEARCH_LIMIT);
    let family = params.family.as_deref().map(family_from_slug).transpose()?;
    let scope = caller.scope();

    let hits = state
        .search
        .search(&params.q, &scope, family, limit, params.offset)?;

    // Hydrate through the scoped repository; stale index entries drop out
    let mut results = Vec::new();
    for hit in hits {
        if let Some(record) = state
            .repo
            .get_record(hit.family, &scope, &hit.record_id)
            .await?
        {
            results.push(SearchResultItem {
                record,
                score: hit.score,
            });
        }
    }

    let total = results.len();

    success(SearchResponse {
        results,
        total,
        limit,
        offset: params.offset,
    })
}
