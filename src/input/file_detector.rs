//! File type detection

use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Text,
    Markdown,
    Pdf,
    Json,
    Unknown,
}

impl FileType {
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "txt" | "text" => FileType::Text,
            "md" | "markdown" => FileType::Markdown,
            "json" => FileType::Json,
            "pdf" => FileType::Pdf,
            _ => FileType::Unknown,
        }
    }

    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(Self::from_extension)
            .unwrap_or(FileType::Unknown)
    }

    /// Formats a job description can be read from.
    pub fn is_text(&self) -> bool {
        matches!(self, FileType::Text | FileType::Markdown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detection() {
        assert_eq!(FileType::from_path(Path::new("jd.TXT")), FileType::Text);
        assert_eq!(FileType::from_path(Path::new("notes/jd.markdown")), FileType::Markdown);
        assert_eq!(FileType::from_path(Path::new("resume_master.json")), FileType::Json);
        assert_eq!(FileType::from_path(Path::new("resume.pdf")), FileType::Pdf);
        assert_eq!(FileType::from_path(Path::new("Makefile")), FileType::Unknown);
        assert!(!FileType::Json.is_text());
        assert!(!FileType::Pdf.is_text());
    }
}
