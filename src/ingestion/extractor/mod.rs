
use pulldown_cmark::{Event, Parser, TagEnd};
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::{AulaError, Result};

const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// Media types the extractor knows how to handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MediaKind {
    Text,
    Html,
    Markdown,
    Pdf,
    Docx,
    Unknown,
}

/// Fetches documents by URL and reduces them to plain text
#[derive(Debug, Clone)]
pub struct TextExtractor {
    agent: ureq::Agent,
}

impl Default for TextExtractor {
    #[inline]
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_TIMEOUT_SECONDS))
    }
}

impl TextExtractor {
    #[inline]
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();

        Self { agent }
    }

    /// Fetch a document and extract its text content.
    ///
    /// Plain-text and unrecognized types are read as UTF-8 directly. HTML
    /// and Markdown are reduced to their text content. PDF and DOCX fail
    /// loudly rather than producing garbage text.
    #[inline]
    pub fn extract(&self, file_url: &str, mime_type: &str) -> Result<String> {
        debug!("Extracting text from {} ({})", file_url, mime_type);

        let kind = detect_media_kind(mime_type, file_url);
        match kind {
            MediaKind::Pdf => {
                return Err(AulaError::Extraction(format!(
                    "PDF extraction is not supported; upload a plain-text export of {}",
                    file_url
                )));
            }
            MediaKind::Docx => {
                return Err(AulaError::Extraction(format!(
                    "DOCX extraction is not supported; upload a plain-text export of {}",
                    file_url
                )));
            }
            _ => {}
        }

        let bytes = self.fetch(file_url)?;
        let text = String::from_utf8_lossy(&bytes);

        let extracted = match kind {
            MediaKind::Html => html_to_text(&text),
            MediaKind::Markdown => markdown_to_text(&text),
            _ => text.into_owned(),
        };

        debug!(
            "Extracted {} characters from {}",
            extracted.chars().count(),
            file_url
        );
        Ok(extracted)
    }

    fn fetch(&self, file_url: &str) -> Result<Vec<u8>> {
        let url = Url::parse(file_url)
            .map_err(|e| AulaError::Extraction(format!("Invalid document URL {file_url}: {e}")))?;

        if url.scheme() == "file" {
            let path = url.to_file_path().map_err(|()| {
                AulaError::Extraction(format!("Invalid file URL: {file_url}"))
            })?;
            return std::fs::read(&path).map_err(|e| {
                AulaError::Extraction(format!("Failed to read {}: {}", path.display(), e))
            });
        }

        let mut response = self
            .agent
            .get(url.as_str())
            .call()
            .map_err(|e| AulaError::Extraction(format!("Failed to fetch {url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AulaError::Extraction(format!(
                "Failed to fetch {url}: HTTP {status}"
            )));
        }

        response
            .body_mut()
            .read_to_vec()
            .map_err(|e| AulaError::Extraction(format!("Failed to read body of {url}: {e}")))
    }
}

fn detect_media_kind(mime_type: &str, file_url: &str) -> MediaKind {
    let mime = mime_type
        .split(';')
        .next()
        .unwrap_or(mime_type)
        .trim()
        .to_ascii_lowercase();
    let path = file_url.to_ascii_lowercase();

    match mime.as_str() {
        "application/pdf" => return MediaKind::Pdf,
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => {
            return MediaKind::Docx;
        }
        "text/html" | "application/xhtml+xml" => return MediaKind::Html,
        "text/markdown" => return MediaKind::Markdown,
        "text/plain" => return MediaKind::Text,
        _ => {}
    }

    if path.ends_with(".pdf") {
        MediaKind::Pdf
    } else if path.ends_with(".docx") {
        MediaKind::Docx
    } else if path.ends_with(".html") || path.ends_with(".htm") {
        MediaKind::Html
    } else if path.ends_with(".md") || path.ends_with(".markdown") {
        MediaKind::Markdown
    } else if path.ends_with(".txt") {
        MediaKind::Text
    } else {
        MediaKind::Unknown
    }
}

/// Reduce an HTML document to its visible text
fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);

    let root = match Selector::parse("body") {
        Ok(selector) => document.select(&selector).next(),
        Err(e) => {
            warn!("Failed to build body selector: {}", e);
            None
        }
    };

    let mut out = String::new();
    let texts: Vec<&str> = match root {
        Some(body) => body.text().collect(),
        None => document.root_element().text().collect(),
    };

    for piece in texts {
        let trimmed = piece.trim();
        if trimmed.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(trimmed);
    }

    out
}

/// Reduce Markdown to its text content, keeping block separation
fn markdown_to_text(markdown: &str) -> String {
    let mut out = String::new();

    for event in Parser::new(markdown) {
        match event {
            Event::Text(text) | Event::Code(text) => out.push_str(&text),
            Event::SoftBreak | Event::HardBreak => out.push('\n'),
            Event::End(
                TagEnd::Paragraph
                | TagEnd::Heading(_)
                | TagEnd::Item
                | TagEnd::CodeBlock
                | TagEnd::BlockQuote(_),
            ) => out.push('\n'),
            _ => {}
        }
    }

    out.trim().to_string()
}
