use axum::{Form, Router, http::StatusCode, response::Html, routing::get, routing::post};
use std::collections::HashMap;
use std::time::Duration;

use glean::config::Config;
use glean::error::ResearchError;
use glean::research::ResearchClient;

mod test_helpers {
    use super::*;

    pub const ARTICLE: &str = r#"<html>
        <head><title>  Harvest
            notes </title><style>p { margin: 0 }</style></head>
        <body>
          <header>Site header</header>
          <nav><a href="/">Home</a></nav>
          <article>
            <h1>Crawling the web</h1>
            <p>A crawler fetches pages. Every crawler respects robots files.</p>
            <script>track("visit")</script>
          </article>
          <footer>Footer text</footer>
        </body>
    </html>"#;

    pub const RESULTS: &str = r#"<html><body>
        <div class="result">
          <a class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.com%2Fone&amp;rut=1">QUERY one</a>
          <a class="result__snippet">first snippet</a>
        </div>
        <div class="result">
          <a class="result__a" href="https://example.com/two">second</a>
          <a class="result__snippet">second snippet</a>
        </div>
        <div class="result">
          <a class="result__a" href="https://example.com/three">third</a>
        </div>
    </body></html>"#;

    async fn search_page(Form(form): Form<HashMap<String, String>>) -> Html<String> {
        let query = form.get("q").cloned().unwrap_or_default();
        Html(RESULTS.replace("QUERY", &query))
    }

    pub fn upstream() -> Router {
        Router::new()
            .route("/article", get(|| async { Html(ARTICLE) }))
            .route(
                "/long",
                get(|| async { Html(format!("<p>{}</p>", "word ".repeat(3000))) }),
            )
            .route(
                "/nested",
                get(|| async { Html(format!("{}deep", "<div>".repeat(20_000))) }),
            )
            .route("/empty", get(|| async { Html("<html><body><nav>only nav</nav></body></html>") }))
            .route("/missing", get(|| async { (StatusCode::NOT_FOUND, Html("<p>gone</p>")) }))
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(3)).await;
                    Html("<p>too late</p>")
                }),
            )
            .route("/html/", post(search_page))
            .route("/broken/", post(|| async { StatusCode::SERVICE_UNAVAILABLE }))
    }

    pub async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    pub fn test_config(base: &str) -> Config {
        Config {
            request_timeout: Duration::from_millis(500),
            search_url: format!("{base}/html/"),
            ocr_enabled: false,
            ..Config::default()
        }
    }

    pub async fn client() -> (ResearchClient, String) {
        let base = serve(upstream()).await;
        let client = ResearchClient::new(test_config(&base)).unwrap();
        (client, base)
    }
}

use test_helpers::*;

#[tokio::test]
async fn fetch_page_extracts_visible_text() {
    let (client, base) = client().await;
    let page = client.fetch_page(&format!("{base}/article")).await.unwrap();
    assert_eq!(page.title, "Harvest notes");
    assert_eq!(
        page.text,
        "Crawling the web A crawler fetches pages. Every crawler respects robots files."
    );
}

#[tokio::test]
async fn get_page_content_is_capped() {
    let (client, base) = client().await;
    let content = client.get_page_content(&format!("{base}/long")).await;
    // "word " repeated: the cut lands on a space, which is dropped
    assert_eq!(content.chars().count(), 1999);
    assert!(content.ends_with("word"));
}

#[tokio::test]
async fn get_page_content_survives_deep_nesting() {
    let (client, base) = client().await;
    assert_eq!(client.get_page_content(&format!("{base}/nested")).await, "deep");
}

#[tokio::test]
async fn get_page_content_is_empty_on_network_failure() {
    let (client, _) = client().await;
    // nothing listens on port 1
    assert_eq!(client.get_page_content("http://127.0.0.1:1/").await, "");
}

#[tokio::test]
async fn get_page_content_is_empty_on_timeout() {
    let (client, base) = client().await;
    assert_eq!(client.get_page_content(&format!("{base}/slow")).await, "");
}

#[tokio::test]
async fn get_page_content_is_empty_on_bad_input() {
    let (client, base) = client().await;
    assert_eq!(client.get_page_content("not a url").await, "");
    assert_eq!(client.get_page_content("ftp://example.com/file").await, "");
    assert_eq!(client.get_page_content(&format!("{base}/missing")).await, "");
}

#[tokio::test]
async fn fetch_page_reports_status() {
    let (client, base) = client().await;
    let err = client.fetch_page(&format!("{base}/missing")).await.unwrap_err();
    assert!(matches!(err, ResearchError::Status { status: 404, .. }));
}

#[tokio::test]
async fn summarize_page_builds_preview_and_keywords() {
    let (client, base) = client().await;
    let summary = client.summarize_page(&format!("{base}/article")).await.unwrap();
    assert_eq!(summary.keywords[0], "crawler");
    assert_eq!(summary.char_count, summary.content.chars().count());
    assert_eq!(summary.preview, format!("{}...", summary.content));
}

#[tokio::test]
async fn summarize_page_rejects_pages_without_text() {
    let (client, base) = client().await;
    let err = client.summarize_page(&format!("{base}/empty")).await.unwrap_err();
    assert!(matches!(err, ResearchError::EmptyContent(_)));
}

#[tokio::test]
async fn search_posts_query_and_parses_results() {
    let (client, _) = client().await;
    let results = client.search("rust  crates", 2).await.unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].title, "rust crates one");
    assert_eq!(results[0].url, "https://example.com/one");
    assert_eq!(results[0].description, "first snippet");
    assert_eq!(results[1].url, "https://example.com/two");
}

#[tokio::test]
async fn search_rejects_empty_query() {
    let (client, _) = client().await;
    assert!(matches!(client.search("   ", 5).await, Err(ResearchError::EmptyQuery)));
}

#[tokio::test]
async fn search_or_empty_swallows_failures() {
    let base = serve(upstream()).await;
    let config = Config {
        search_url: format!("{base}/broken/"),
        ..test_config(&base)
    };
    let client = ResearchClient::new(config).unwrap();
    assert!(client.search_or_empty("anything", 5).await.is_empty());
    assert!(client.search("anything", 5).await.is_err());
}
