use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResearchError {
    #[error("invalid url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },

    #[error("search query is empty")]
    EmptyQuery,

    #[error("no visible text found at {0}")]
    EmptyContent(String),

    #[error("bad css selector {0:?}")]
    Selector(&'static str),

    #[error("unsupported image format {0}")]
    UnsupportedImage(String),

    #[error("could not decode image: {0}")]
    Image(#[from] image::ImageError),

    #[error("ocr engine unavailable: {0}")]
    OcrUnavailable(String),

    #[error("ocr failed: {0}")]
    Ocr(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ResearchError>;
