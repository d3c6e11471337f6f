use dotenvy::dotenv;
use once_cell::sync::Lazy;
use std::env;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
pub const DEFAULT_SEARCH_URL: &str = "https://html.duckduckgo.com/html/";

pub static CONFIG: Lazy<Config> = Lazy::new(|| {
    dotenv().ok(); // Load .env file if present
    Config::from_env()
});

#[derive(Debug, Clone)]
pub struct Config {
    pub user_agent: String,
    pub request_timeout: Duration,
    /// Upper bound, in characters, of extracted page text.
    pub content_chars: usize,
    pub preview_chars: usize,
    pub search_url: String,
    pub max_results: usize,
    pub keywords: usize,
    pub ocr_enabled: bool,
    pub tesseract_bin: String,
    pub ocr_languages: String,
    pub bind_addr: String,
    pub static_dir: String,
    pub max_upload_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout: Duration::from_secs(10),
            content_chars: 2000,
            preview_chars: 1000,
            search_url: DEFAULT_SEARCH_URL.to_string(),
            max_results: 5,
            keywords: 10,
            ocr_enabled: true,
            tesseract_bin: "tesseract".to_string(),
            ocr_languages: "rus+eng".to_string(),
            bind_addr: "127.0.0.1:8080".to_string(),
            static_dir: "static".to_string(),
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

impl Config {
    /// Reads every `GLEAN_*` variable, falling back to [`Config::default`] for
    /// anything missing or unparsable.
    pub fn from_env() -> Config {
        let d = Config::default();
        Config {
            user_agent: get_env_or_default("GLEAN_USER_AGENT", &d.user_agent),
            request_timeout: Duration::from_secs(get_env_parsed(
                "GLEAN_TIMEOUT_SECS",
                d.request_timeout.as_secs(),
            )),
            content_chars: get_env_parsed("GLEAN_CONTENT_CHARS", d.content_chars),
            preview_chars: get_env_parsed("GLEAN_PREVIEW_CHARS", d.preview_chars),
            search_url: get_env_or_default("GLEAN_SEARCH_URL", &d.search_url),
            max_results: get_env_parsed("GLEAN_MAX_RESULTS", d.max_results),
            keywords: get_env_parsed("GLEAN_KEYWORDS", d.keywords),
            ocr_enabled: get_env_parsed("GLEAN_OCR_ENABLED", d.ocr_enabled),
            tesseract_bin: get_env_or_default("GLEAN_TESSERACT", &d.tesseract_bin),
            ocr_languages: get_env_or_default("GLEAN_OCR_LANGS", &d.ocr_languages),
            bind_addr: get_env_or_default("GLEAN_BIND", &d.bind_addr),
            static_dir: get_env_or_default("GLEAN_STATIC_DIR", &d.static_dir),
            max_upload_bytes: get_env_parsed("GLEAN_MAX_UPLOAD_BYTES", d.max_upload_bytes),
        }
    }
}

fn get_env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn get_env_parsed<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("ignoring unparsable value {raw:?} for {key}");
            default
        }),
        Err(_) => default,
    }
}
