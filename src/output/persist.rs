//! Artifact naming and atomic file writes

use crate::config::OutputFormat;
use crate::error::{Result, TailorError};
use chrono::{DateTime, Local};
use log::debug;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    TailoredRecord,
    Document(OutputFormat),
    Report,
    Anonymized,
}

impl ArtifactKind {
    fn stem(&self) -> &'static str {
        match self {
            ArtifactKind::TailoredRecord | ArtifactKind::Document(_) => "resume_tailored",
            ArtifactKind::Report => "optimization_report",
            ArtifactKind::Anonymized => "resume_sanitized",
        }
    }

    fn extension(&self) -> &'static str {
        match self {
            ArtifactKind::Document(format) => format.extension(),
            _ => "json",
        }
    }
}

/// `resume_tailored_google-swe_20240102_153000.pdf`
pub fn suggest_filename(kind: ArtifactKind, label: &str, timestamp: Option<&DateTime<Local>>) -> String {
    let suffix = timestamp
        .map(|ts| format!("_{}", ts.format("%Y%m%d_%H%M%S")))
        .unwrap_or_default();
    format!("{}_{}{}.{}", kind.stem(), label, suffix, kind.extension())
}

/// Write `content` to `path` through a temp file in the same directory, so
/// readers never observe a partially written artifact.
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&parent)?;

    let mut temp = NamedTempFile::new_in(&parent)?;
    temp.write_all(content)?;
    temp.flush()?;
    temp.persist(path)
        .map_err(|e| TailorError::Io(e.error))?;

    debug!("Wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}

/// Output paths of one tailoring run, sharing a label and timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactPaths {
    pub record: PathBuf,
    pub document: Option<PathBuf>,
    pub report: PathBuf,
}

impl ArtifactPaths {
    pub fn new(dir: &Path, label: &str, document: Option<OutputFormat>, timestamp: &DateTime<Local>) -> Self {
        let ts = Some(timestamp);
        Self {
            record: dir.join(suggest_filename(ArtifactKind::TailoredRecord, label, ts)),
            document: document
                .filter(|format| *format != OutputFormat::Json)
                .map(|format| dir.join(suggest_filename(ArtifactKind::Document(format), label, ts))),
            report: dir.join(suggest_filename(ArtifactKind::Report, label, ts)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    #[test]
    fn test_filenames() {
        let ts = Local.with_ymd_and_hms(2024, 1, 2, 15, 30, 0).unwrap();

        assert_eq!(
            suggest_filename(ArtifactKind::Document(OutputFormat::Pdf), "google-swe", Some(&ts)),
            "resume_tailored_google-swe_20240102_153000.pdf"
        );
        assert_eq!(
            suggest_filename(ArtifactKind::Report, "acme", Some(&ts)),
            "optimization_report_acme_20240102_153000.json"
        );
        assert_eq!(suggest_filename(ArtifactKind::Anonymized, "acme", None), "resume_sanitized_acme.json");
    }

    #[test]
    fn test_json_document_is_not_duplicated() {
        let ts = Local.with_ymd_and_hms(2024, 1, 2, 15, 30, 0).unwrap();
        let paths = ArtifactPaths::new(Path::new("out"), "acme", Some(OutputFormat::Json), &ts);
        assert!(paths.document.is_none());

        let paths = ArtifactPaths::new(Path::new("out"), "acme", Some(OutputFormat::Html), &ts);
        assert_eq!(
            paths.document,
            Some(PathBuf::from("out/resume_tailored_acme_20240102_153000.html"))
        );
    }

    #[test]
    fn test_write_atomic_replaces_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("artifact.json");

        write_atomic(&path, b"{\"v\": 1}").unwrap();
        write_atomic(&path, b"{\"v\": 2}").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{\"v\": 2}");
        let leftovers = std::fs::read_dir(path.parent().unwrap()).unwrap().count();
        assert_eq!(leftovers, 1);
    }
}
