use image::ImageFormat;
use std::io::ErrorKind;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::config::Config;
use crate::data_models::ImageReport;
use crate::error::{ResearchError, Result};

pub const ANALYSIS_FAILED: &str = "Image analysis failed";

/// The only upload formats accepted.
pub const ACCEPTED_FORMATS: &[ImageFormat] = &[ImageFormat::Png, ImageFormat::Jpeg];

pub fn dimensions_message(width: u32, height: u32) -> String {
    format!(
        "Image {width}x{height} pixels. Text recognition requires additional libraries to be installed."
    )
}

/// Runs the `tesseract` executable over stdin, printing to stdout.
#[derive(Debug, Clone)]
pub struct TesseractOcr {
    binary: String,
    languages: String,
    timeout: Duration,
}

impl TesseractOcr {
    pub fn new(binary: impl Into<String>, languages: impl Into<String>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            languages: languages.into(),
            timeout,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.tesseract_bin.clone(),
            config.ocr_languages.clone(),
            config.request_timeout,
        )
    }

    pub async fn recognize(&self, bytes: &[u8]) -> Result<String> {
        let mut child = Command::new(&self.binary)
            .args(["stdin", "stdout", "-l", self.languages.as_str()])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound | ErrorKind::PermissionDenied => {
                    ResearchError::OcrUnavailable(format!("{}: {e}", self.binary))
                }
                _ => ResearchError::Io(e),
            })?;

        // Writing stdin and collecting output share one deadline; an engine
        // that never reads its input would otherwise block the write forever.
        let stdin = child.stdin.take();
        let feed = async move {
            if let Some(mut stdin) = stdin {
                match stdin.write_all(bytes).await {
                    // the engine may exit without reading everything
                    Err(e) if e.kind() != ErrorKind::BrokenPipe => return Err(e),
                    _ => {}
                }
            }
            Ok(())
        };
        let (fed, output) = tokio::time::timeout(self.timeout, async {
            tokio::join!(feed, child.wait_with_output())
        })
        .await
        .map_err(|_| ResearchError::Ocr(format!("timed out after {:?}", self.timeout)))?;
        fed?;
        let output = output?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ResearchError::Ocr(stderr.trim().to_string()));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

/// Decodes uploads and, when an OCR engine is configured, reads their text.
#[derive(Debug, Clone, Default)]
pub struct ImageAnalyzer {
    ocr: Option<TesseractOcr>,
}

impl ImageAnalyzer {
    pub fn new(ocr: Option<TesseractOcr>) -> Self {
        Self { ocr }
    }

    pub fn from_config(config: &Config) -> Self {
        let ocr = config
            .ocr_enabled
            .then(|| TesseractOcr::from_config(config));
        Self::new(ocr)
    }

    pub async fn analyze(&self, bytes: &[u8]) -> Result<ImageReport> {
        let format = image::guess_format(bytes)?;
        if !ACCEPTED_FORMATS.contains(&format) {
            return Err(ResearchError::UnsupportedImage(format!("{format:?}")));
        }
        let decoded = image::load_from_memory_with_format(bytes, format)?;
        let (width, height) = (decoded.width(), decoded.height());
        let format = format.extensions_str().first().copied().unwrap_or("unknown").to_string();
        tracing::debug!("decoded {format} image {width}x{height}");

        let text = match &self.ocr {
            Some(ocr) => match ocr.recognize(bytes).await {
                Ok(text) if !text.is_empty() => Some(text),
                Ok(_) => None,
                Err(e) => {
                    tracing::warn!("ocr unavailable, reporting dimensions only: {e}");
                    None
                }
            },
            None => None,
        };

        let message = match &text {
            Some(text) => text.clone(),
            None => dimensions_message(width, height),
        };

        Ok(ImageReport {
            width,
            height,
            format,
            text,
            message,
        })
    }

    /// Catch-all form: the report message, or [`ANALYSIS_FAILED`].
    pub async fn extract_text_from_image(&self, bytes: &[u8]) -> String {
        match self.analyze(bytes).await {
            Ok(report) => report.message,
            Err(e) => {
                tracing::warn!("image analysis failed: {e}");
                ANALYSIS_FAILED.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, RgbImage};
    use std::io::Cursor;

    fn encode(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(RgbImage::new(width, height))
            .write_to(&mut Cursor::new(&mut buf), format)
            .unwrap();
        buf
    }

    #[tokio::test]
    async fn test_reports_dimensions_without_ocr() {
        let analyzer = ImageAnalyzer::new(None);
        let report = analyzer.analyze(&encode(37, 21, ImageFormat::Png)).await.unwrap();
        assert_eq!((report.width, report.height), (37, 21));
        assert_eq!(report.format, "png");
        assert_eq!(report.text, None);
        assert_eq!(report.message, dimensions_message(37, 21));
    }

    #[tokio::test]
    async fn test_missing_ocr_binary_falls_back_to_dimensions() {
        let ocr = TesseractOcr::new(
            "/nonexistent/glean-test-tesseract",
            "rus+eng",
            Duration::from_secs(2),
        );
        let analyzer = ImageAnalyzer::new(Some(ocr));
        let report = analyzer.analyze(&encode(8, 5, ImageFormat::Jpeg)).await.unwrap();
        assert_eq!(report.format, "jpg");
        assert_eq!(report.message, "Image 8x5 pixels. Text recognition requires additional libraries to be installed.");
    }

    #[cfg(unix)]
    fn stub_engine(script: &str) -> String {
        use std::os::unix::fs::PermissionsExt;
        use std::sync::atomic::{AtomicUsize, Ordering};

        static NEXT: AtomicUsize = AtomicUsize::new(0);
        let path = std::env::temp_dir().join(format!(
            "glean-tesseract-{}-{}",
            std::process::id(),
            NEXT.fetch_add(1, Ordering::SeqCst)
        ));
        std::fs::write(&path, format!("#!/bin/sh\n{script}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_recognized_text_becomes_the_message() {
        // $4 is the language list passed after `-l`
        let ocr = TesseractOcr::new(stub_engine("echo \"  recognized $4 \""), "rus+eng", Duration::from_secs(5));
        let analyzer = ImageAnalyzer::new(Some(ocr));
        let report = analyzer.analyze(&encode(12, 4, ImageFormat::Png)).await.unwrap();
        assert_eq!(report.text.as_deref(), Some("recognized rus+eng"));
        assert_eq!(report.message, "recognized rus+eng");
        assert_eq!((report.width, report.height), (12, 4));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_blank_recognition_reports_dimensions() {
        let ocr = TesseractOcr::new(stub_engine("exit 0"), "eng", Duration::from_secs(5));
        let analyzer = ImageAnalyzer::new(Some(ocr));
        let report = analyzer.analyze(&encode(9, 3, ImageFormat::Png)).await.unwrap();
        assert_eq!(report.text, None);
        assert_eq!(report.message, dimensions_message(9, 3));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_engine_reports_dimensions() {
        let ocr = TesseractOcr::new(stub_engine("echo bad image >&2; exit 1"), "eng", Duration::from_secs(5));
        let err = ocr.recognize(&encode(2, 2, ImageFormat::Png)).await.unwrap_err();
        assert!(matches!(err, ResearchError::Ocr(ref msg) if msg == "bad image"));
        let analyzer = ImageAnalyzer::new(Some(ocr));
        let report = analyzer.analyze(&encode(2, 2, ImageFormat::Png)).await.unwrap();
        assert_eq!(report.message, dimensions_message(2, 2));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_engine_that_never_reads_is_timed_out() {
        let ocr = TesseractOcr::new(stub_engine("exec sleep 5"), "eng", Duration::from_millis(300));
        // larger than any pipe buffer, so the write itself blocks
        let payload = vec![0u8; 4 * 1024 * 1024];
        let started = std::time::Instant::now();
        let err = ocr.recognize(&payload).await.unwrap_err();
        assert!(matches!(err, ResearchError::Ocr(ref msg) if msg.starts_with("timed out")));
        assert!(started.elapsed() < Duration::from_secs(3));

        let analyzer = ImageAnalyzer::new(Some(ocr));
        let started = std::time::Instant::now();
        let report = analyzer.analyze(&encode(6, 6, ImageFormat::Png)).await.unwrap();
        assert_eq!(report.message, dimensions_message(6, 6));
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_garbage_bytes_give_placeholder() {
        let analyzer = ImageAnalyzer::new(None);
        assert!(analyzer.analyze(b"definitely not an image").await.is_err());
        assert_eq!(
            analyzer.extract_text_from_image(b"definitely not an image").await,
            ANALYSIS_FAILED
        );
    }

    #[tokio::test]
    async fn test_rejects_formats_outside_upload_list() {
        let analyzer = ImageAnalyzer::new(None);
        // GIF header; the decoder is not even compiled in.
        let err = analyzer.analyze(b"GIF89a\x01\x00\x01\x00\x00\x00\x00;").await.unwrap_err();
        assert!(matches!(err, ResearchError::UnsupportedImage(_)));
    }
}
