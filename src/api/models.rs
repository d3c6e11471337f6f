use serde::{Deserialize, Serialize};

use crate::data_models::SearchResult;

#[derive(Debug, Deserialize)]
pub struct PageRequest {
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PageResponse {
    pub url: String,
    pub title: String,
    pub content: String,
    pub preview: String,
    pub keywords: Vec<String>,
    pub char_count: usize,
    pub processing_time_ms: u128,
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub max_results: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<SearchResult>,
    pub total_results: usize,
    pub processing_time_ms: u128,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ImageResponse {
    pub width: u32,
    pub height: u32,
    pub format: String,
    pub text: Option<String>,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
