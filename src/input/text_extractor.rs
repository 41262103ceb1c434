//! Text extraction for job descriptions and imported résumés

use crate::error::{Result, TailorError};
use pulldown_cmark::{Event, Parser, Tag};
use regex::Regex;
use std::path::Path;
use tokio::fs;

pub trait TextExtractor {
    fn extract(&self, path: &Path) -> impl std::future::Future<Output = Result<String>> + Send;
}

pub struct PdfExtractor;

impl TextExtractor for PdfExtractor {
    async fn extract(&self, path: &Path) -> Result<String> {
        let bytes = fs::read(path).await?;

        let text = pdf_extract::extract_text_from_mem(&bytes).map_err(|e| {
            TailorError::PdfExtraction(format!("Failed to extract text from PDF '{}': {}", path.display(), e))
        })?;
        normalize_whitespace(&text)
    }
}

pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    async fn extract(&self, path: &Path) -> Result<String> {
        let content = fs::read_to_string(path).await?;
        normalize_whitespace(&content)
    }
}

pub struct MarkdownExtractor;

impl TextExtractor for MarkdownExtractor {
    async fn extract(&self, path: &Path) -> Result<String> {
        let content = fs::read_to_string(path).await?;
        normalize_whitespace(&markdown_to_text(&content))
    }
}

/// Flatten markdown to plain text: one line per block, list items kept as
/// "- " lines, inline markup dropped.
pub fn markdown_to_text(markdown: &str) -> String {
    let mut text = String::new();

    for event in Parser::new(markdown) {
        match event {
            Event::Text(t) | Event::Code(t) => text.push_str(&t),
            Event::SoftBreak => text.push(' '),
            Event::HardBreak => text.push('\n'),
            Event::Start(Tag::Item) => text.push_str("- "),
            Event::End(Tag::Paragraph)
            | Event::End(Tag::Heading(..))
            | Event::End(Tag::Item)
            | Event::End(Tag::CodeBlock(_)) => text.push('\n'),
            Event::End(Tag::List(_)) | Event::End(Tag::BlockQuote) => text.push('\n'),
            Event::Rule => text.push_str("\n\n"),
            _ => {}
        }
    }

    text
}

/// Trim lines, collapse runs of spaces and keep at most one blank line.
pub fn normalize_whitespace(text: &str) -> Result<String> {
    let spaces = Regex::new(r"[ \t\u{a0}]+")
        .map_err(|e| TailorError::Configuration(format!("Invalid whitespace pattern: {}", e)))?;
    let blank_runs = Regex::new(r"\n{3,}")
        .map_err(|e| TailorError::Configuration(format!("Invalid whitespace pattern: {}", e)))?;

    let lines: Vec<String> = text
        .replace("\r\n", "\n")
        .lines()
        .map(|line| spaces.replace_all(line.trim(), " ").into_owned())
        .collect();

    Ok(blank_runs.replace_all(&lines.join("\n"), "\n\n").trim().to_string())
}
