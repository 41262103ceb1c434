//! Input manager for job descriptions and résumé records

use crate::error::{Result, TailorError};
use crate::input::file_detector::FileType;
use crate::input::text_extractor::{MarkdownExtractor, PdfExtractor, PlainTextExtractor, TextExtractor};
use crate::processing::record::Record;
use log::info;
use std::collections::HashMap;
use std::path::Path;

pub struct InputManager {
    cache: HashMap<String, String>,
    enable_cache: bool,
}

impl Default for InputManager {
    fn default() -> Self {
        Self::new()
    }
}

impl InputManager {
    pub fn new() -> Self {
        Self {
            cache: HashMap::new(),
            enable_cache: true,
        }
    }

    pub fn with_cache(mut self, enable: bool) -> Self {
        self.enable_cache = enable;
        self
    }

    /// Read a job description from a `.txt` or `.md` file.
    pub async fn extract_text(&mut self, path: &Path) -> Result<String> {
        let key = path.to_string_lossy().to_string();

        if self.enable_cache {
            if let Some(cached) = self.cache.get(&key) {
                info!("Using cached text for: {}", path.display());
                return Ok(cached.clone());
            }
        }

        ensure_exists(path)?;

        let text = match FileType::from_path(path) {
            FileType::Text => {
                info!("Reading plain text file: {}", path.display());
                PlainTextExtractor.extract(path).await?
            }
            FileType::Markdown => {
                info!("Processing markdown file: {}", path.display());
                MarkdownExtractor.extract(path).await?
            }
            FileType::Pdf | FileType::Json | FileType::Unknown => {
                return Err(TailorError::UnsupportedFormat(format!(
                    "Job descriptions must be .txt or .md: {}",
                    path.display()
                )));
            }
        };

        if text.is_empty() {
            return Err(TailorError::InvalidInput(format!(
                "No text found in: {}",
                path.display()
            )));
        }

        if self.enable_cache {
            self.cache.insert(key, text.clone());
        }

        Ok(text)
    }

    /// Read an unstructured résumé from a `.pdf`, `.txt` or `.md` file for
    /// import. Not cached; a résumé is imported once.
    pub async fn extract_resume_text(&self, path: &Path) -> Result<String> {
        ensure_exists(path)?;

        let file_type = FileType::from_path(path);
        let text = match file_type {
            FileType::Pdf => {
                info!("Extracting text from PDF: {}", path.display());
                PdfExtractor.extract(path).await?
            }
            FileType::Text => PlainTextExtractor.extract(path).await?,
            FileType::Markdown => MarkdownExtractor.extract(path).await?,
            FileType::Json | FileType::Unknown => {
                return Err(TailorError::UnsupportedFormat(format!(
                    "Résumés can be imported from .pdf, .txt or .md: {}",
                    path.display()
                )));
            }
        };

        info!("Extracted {} characters of résumé text", text.chars().count());
        Ok(text)
    }

    /// Load a structured résumé record from a `.json` file.
    pub async fn load_record(&self, path: &Path) -> Result<Record> {
        ensure_exists(path)?;

        if FileType::from_path(path) != FileType::Json {
            return Err(TailorError::UnsupportedFormat(format!(
                "Résumé records must be .json: {}",
                path.display()
            )));
        }

        let content = tokio::fs::read_to_string(path).await?;
        let record = Record::from_json_str(&content).map_err(|e| {
            TailorError::InvalidInput(format!("Malformed record '{}': {}", path.display(), e))
        })?;

        info!(
            "Loaded record: {} experience entries, {} skill categories",
            record.experience.len(),
            record.skills.len()
        );
        Ok(record)
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    pub fn cache_size(&self) -> usize {
        self.cache.len()
    }
}

fn ensure_exists(path: &Path) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(TailorError::InvalidInput(format!(
            "File does not exist: {}",
            path.display()
        )))
    }
}
