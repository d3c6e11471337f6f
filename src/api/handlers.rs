use axum::{
    Json,
    extract::{Multipart, State},
    http::StatusCode,
};
use std::sync::Arc;
use std::time::Instant;

use crate::error::ResearchError;
use crate::research::ResearchClient;
use crate::vision::ANALYSIS_FAILED;

use super::models::{
    ErrorResponse, ImageResponse, PageRequest, PageResponse, SearchRequest, SearchResponse,
};

pub const PAGE_FAILED: &str = "Could not retrieve page content";
pub const SEARCH_FAILED: &str = "Search failed";
const MAX_RESULTS_CAP: usize = 25;

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

pub async fn page_handler(
    State(research): State<Arc<ResearchClient>>,
    Json(request): Json<PageRequest>,
) -> Result<Json<PageResponse>, ApiError> {
    let start = Instant::now();

    if request.url.trim().is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "URL cannot be empty"));
    }

    let summary = research
        .summarize_page(&request.url)
        .await
        .map_err(|e| {
            tracing::warn!("page analysis of {} failed: {e}", request.url);
            match e {
                ResearchError::InvalidUrl { .. } => api_error(StatusCode::BAD_REQUEST, e.to_string()),
                _ => api_error(StatusCode::BAD_GATEWAY, PAGE_FAILED),
            }
        })?;

    Ok(Json(PageResponse {
        url: summary.url,
        title: summary.title,
        content: summary.content,
        preview: summary.preview,
        keywords: summary.keywords,
        char_count: summary.char_count,
        processing_time_ms: start.elapsed().as_millis(),
    }))
}

pub async fn search_handler(
    State(research): State<Arc<ResearchClient>>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
    let start = Instant::now();

    if request.query.trim().is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "Query cannot be empty"));
    }

    let max_results = request
        .max_results
        .unwrap_or(research.config().max_results)
        .clamp(1, MAX_RESULTS_CAP);

    let results = research
        .search(&request.query, max_results)
        .await
        .map_err(|e| {
            tracing::warn!("search for {:?} failed: {e}", request.query);
            api_error(StatusCode::BAD_GATEWAY, SEARCH_FAILED)
        })?;

    Ok(Json(SearchResponse {
        total_results: results.len(),
        query: request.query,
        results,
        processing_time_ms: start.elapsed().as_millis(),
    }))
}

pub async fn image_handler(
    State(research): State<Arc<ResearchClient>>,
    mut multipart: Multipart,
) -> Result<Json<ImageResponse>, ApiError> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.body_text()))?
    {
        if field.name() == Some("file") {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.body_text()))?;
            upload = Some(bytes);
            break;
        }
    }

    let Some(bytes) = upload else {
        return Err(api_error(StatusCode::BAD_REQUEST, "Missing file field"));
    };

    let report = research.analyze_image(&bytes).await.map_err(|e| {
        tracing::warn!("image analysis failed: {e}");
        api_error(StatusCode::UNPROCESSABLE_ENTITY, ANALYSIS_FAILED)
    })?;

    Ok(Json(ImageResponse {
        width: report.width,
        height: report.height,
        format: report.format,
        text: report.text,
        message: report.message,
    }))
}

pub async fn health_handler() -> &'static str {
    "ok"
}
