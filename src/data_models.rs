use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One hit from a web search. Every field may be empty.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub description: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PageContent {
    pub url: String,
    pub title: String,
    pub text: String,
    pub fetched_at: DateTime<Utc>,
}

impl PageContent {
    pub fn new(url: String, title: String, text: String) -> PageContent {
        PageContent {
            url,
            title,
            text,
            fetched_at: Utc::now(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PageSummary {
    pub url: String,
    pub title: String,
    pub content: String,
    pub preview: String,
    pub keywords: Vec<String>,
    pub char_count: usize,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ImageReport {
    pub width: u32,
    pub height: u32,
    pub format: String,
    /// Recognized text, present only when OCR ran and found something.
    pub text: Option<String>,
    pub message: String,
}
