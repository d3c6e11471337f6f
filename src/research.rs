use reqwest::{Client, Url};
use std::sync::Arc;

use crate::analyzer::{self, KeywordExtractor, TextExtractor};
use crate::config::Config;
use crate::data_models::{ImageReport, PageContent, PageSummary, SearchResult};
use crate::error::{ResearchError, Result};
use crate::search::parse_search_results;
use crate::vision::ImageAnalyzer;

/// Holds the HTTP session and performs the fetch, search and image steps.
/// Cheap to share behind an `Arc`; nothing in here is mutated after construction.
pub struct ResearchClient {
    client: Client,
    config: Arc<Config>,
    text_extractor: TextExtractor,
    keyword_extractor: KeywordExtractor,
    image_analyzer: ImageAnalyzer,
}

impl ResearchClient {
    pub fn new(config: Config) -> Result<ResearchClient> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.request_timeout)
            .build()?;
        Ok(ResearchClient {
            client,
            text_extractor: TextExtractor::for_page(config.content_chars),
            keyword_extractor: KeywordExtractor::with_limit(config.keywords),
            image_analyzer: ImageAnalyzer::from_config(&config),
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn parse_url(url: &str) -> Result<Url> {
        let parsed = Url::parse(url.trim()).map_err(|e| ResearchError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(ResearchError::InvalidUrl {
                url: url.to_string(),
                reason: format!("unsupported scheme {}", parsed.scheme()),
            });
        }
        Ok(parsed)
    }

    async fn fetch_html(&self, url: Url) -> Result<String> {
        let res = self.client.get(url.clone()).send().await?;
        let status = res.status();
        if !status.is_success() {
            return Err(ResearchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(res.text().await?)
    }

    /// Fetches `url` and extracts its visible text, capped at `content_chars`.
    pub async fn fetch_page(&self, url: &str) -> Result<PageContent> {
        let parsed = Self::parse_url(url)?;
        tracing::info!("fetching page: {parsed}");
        let html = self.fetch_html(parsed.clone()).await?;

        let extracted = self.text_extractor.extract_page(&html);
        let (title, text) = (extracted.title, extracted.body);
        tracing::debug!("extracted {} chars from {parsed}", text.chars().count());

        Ok(PageContent::new(parsed.to_string(), title, text))
    }

    /// Catch-all form of [`fetch_page`](Self::fetch_page): any failure is an empty string.
    pub async fn get_page_content(&self, url: &str) -> String {
        match self.fetch_page(url).await {
            Ok(page) => page.text,
            Err(e) => {
                tracing::warn!("error fetching page {url}, error: {e}");
                String::new()
            }
        }
    }

    pub async fn summarize_page(&self, url: &str) -> Result<PageSummary> {
        let page = self.fetch_page(url).await?;
        if page.text.is_empty() {
            return Err(ResearchError::EmptyContent(page.url));
        }
        let keywords = self.keyword_extractor.keywords(&page.text);
        let preview = analyzer::preview(&page.text, self.config.preview_chars);

        Ok(PageSummary {
            char_count: page.text.chars().count(),
            url: page.url,
            title: page.title,
            content: page.text,
            preview,
            keywords,
        })
    }

    /// Runs `query` against the configured search endpoint.
    pub async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ResearchError::EmptyQuery);
        }
        let endpoint = Self::parse_url(&self.config.search_url)?;
        tracing::info!("searching for {query:?}");

        let res = self
            .client
            .post(endpoint.clone())
            .form(&[("q", query)])
            .header(reqwest::header::ACCEPT, "text/html")
            .send()
            .await?;
        let status = res.status();
        if !status.is_success() {
            return Err(ResearchError::Status {
                url: endpoint.to_string(),
                status: status.as_u16(),
            });
        }
        let body = res.text().await?;

        // scraper's Html is !Send, keep it out of any await
        let results = parse_search_results(&body, max_results)?;
        tracing::debug!("search for {query:?} returned {} results", results.len());
        Ok(results)
    }

    pub async fn search_or_empty(&self, query: &str, max_results: usize) -> Vec<SearchResult> {
        match self.search(query, max_results).await {
            Ok(results) => results,
            Err(e) => {
                tracing::warn!("search for {query:?} failed: {e}");
                Vec::new()
            }
        }
    }

    pub async fn analyze_image(&self, bytes: &[u8]) -> Result<ImageReport> {
        self.image_analyzer.analyze(bytes).await
    }

    pub async fn extract_text_from_image(&self, bytes: &[u8]) -> String {
        self.image_analyzer.extract_text_from_image(bytes).await
    }
}
