//! CLI interface for the resume tailor

use crate::config::OutputFormat;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "resume-tailor")]
#[command(about = "PII-safe résumé tailoring against a job description")]
#[command(long_about = "Tailor a structured JSON résumé to a job description. Identity fields are redacted before anything is sent to the language model and restored afterwards.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build a JSON record from a PDF, TXT or MD résumé
    Import {
        /// Path to the résumé document (PDF, TXT, MD)
        #[arg(short, long)]
        resume: PathBuf,

        /// Output path of the record (defaults to the input name with .json)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print or save the anonymized copy of a record
    Sanitize {
        /// Path to the résumé record (JSON)
        #[arg(short, long)]
        resume: PathBuf,

        /// Write the anonymized record here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Extract job requirements and score the résumé against them
    Analyze {
        /// Path to the résumé record (JSON)
        #[arg(short, long)]
        resume: PathBuf,

        /// Path to job description file (TXT, MD)
        #[arg(short, long)]
        job: PathBuf,

        /// Show every list entry
        #[arg(short, long)]
        detailed: bool,

        /// Save requirements and match analysis as JSON
        #[arg(short, long)]
        save: Option<PathBuf>,
    },

    /// Run the full tailoring pipeline
    Tailor {
        /// Path to the résumé record (JSON)
        #[arg(short, long)]
        resume: PathBuf,

        /// Path to job description file (TXT, MD)
        #[arg(short, long)]
        job: PathBuf,

        /// Company or role label used in output names, e.g. "Google SWE"
        #[arg(short, long)]
        label: Option<String>,

        /// Suggestions to apply: "all", "high", "medium", "low" or ids like "1,2,5".
        /// Prompts interactively when omitted.
        #[arg(short, long)]
        select: Option<String>,

        /// Override a suggestion value, e.g. --modify 3="Led HIPAA audit"
        #[arg(short, long, value_parser = parse_modification)]
        modify: Vec<(u32, String)>,

        /// Output directory (defaults to the configured one)
        #[arg(long)]
        out_dir: Option<PathBuf>,

        /// Rendered document format: json, markdown, html, pdf
        #[arg(short, long)]
        format: Option<String>,

        /// Skip scoring the tailored record
        #[arg(long)]
        no_rescore: bool,

        /// Fail when a placeholder appears anywhere in the final record
        #[arg(long)]
        strict: bool,

        /// Show suggestion reasons and full values
        #[arg(short, long)]
        detailed: bool,
    },

    /// Merge an edited anonymized record back onto the original
    Merge {
        /// Original record (JSON)
        #[arg(long)]
        original: PathBuf,

        /// Edited anonymized record (JSON)
        #[arg(long)]
        edited: PathBuf,

        /// Output path of the merged record
        #[arg(short, long)]
        output: PathBuf,

        /// Attach provenance with this label
        #[arg(short, long)]
        label: Option<String>,

        /// Match score before tailoring, recorded in provenance
        #[arg(long, default_value_t = 0)]
        prior_score: u32,

        /// Number of edits applied, recorded in provenance
        #[arg(long, default_value_t = 0)]
        edits: usize,
    },

    /// Render a record as a document
    Render {
        /// Record to render (JSON)
        #[arg(short, long)]
        resume: PathBuf,

        /// Output format: json, markdown, html, pdf
        #[arg(short, long, default_value = "pdf")]
        format: String,

        /// Output path (defaults to the input name with the format's extension)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Reset configuration to defaults
    Reset,

    /// Print the configuration file path
    Path,
}

/// Parse and validate output format
pub fn parse_output_format(format: &str) -> Result<OutputFormat, String> {
    format.parse::<OutputFormat>().map_err(|_| {
        format!(
            "Invalid output format: {}. Supported: json, markdown, html, pdf",
            format
        )
    })
}

/// Parse `ID=VALUE` for `--modify`.
pub fn parse_modification(arg: &str) -> Result<(u32, String), String> {
    let (id, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("Expected ID=VALUE, got '{}'", arg))?;
    let id = id
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("Invalid suggestion id: '{}'", id.trim()))?;
    let value = value.trim().trim_matches('"').to_string();
    if value.is_empty() {
        return Err(format!("Empty value for suggestion {}", id));
    }
    Ok((id, value))
}

/// Validate file extension
pub fn validate_file_extension(path: &Path, allowed_extensions: &[&str]) -> Result<(), String> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => {
            if allowed_extensions.contains(&ext.to_lowercase().as_str()) {
                Ok(())
            } else {
                Err(format!(
                    "Unsupported file extension: .{}. Allowed: {}",
                    ext,
                    allowed_extensions.join(", ")
                ))
            }
        }
        None => Err("File has no extension".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_modification() {
        assert_eq!(parse_modification("3=Led HIPAA audit").unwrap(), (3, "Led HIPAA audit".to_string()));
        assert_eq!(parse_modification(" 4 = \"a=b\" ").unwrap(), (4, "a=b".to_string()));
        assert!(parse_modification("x=1").is_err());
        assert!(parse_modification("5").is_err());
        assert!(parse_modification("5=").is_err());
    }

    #[test]
    fn test_tailor_arguments() {
        let cli = Cli::try_parse_from([
            "resume-tailor", "tailor", "-r", "resume.json", "-j", "jd.md",
            "--select", "1,2", "--modify", "2=New text", "--format", "html",
        ])
        .unwrap();

        match cli.command {
            Commands::Tailor { select, modify, format, .. } => {
                assert_eq!(select.as_deref(), Some("1,2"));
                assert_eq!(modify, vec![(2, "New text".to_string())]);
                assert_eq!(parse_output_format(&format.unwrap()).unwrap(), OutputFormat::Html);
            }
            _ => panic!("expected tailor command"),
        }
    }

    #[test]
    fn test_import_arguments() {
        let cli = Cli::try_parse_from(["resume-tailor", "import", "--resume", "cv.pdf"]).unwrap();

        match cli.command {
            Commands::Import { resume, output } => {
                assert_eq!(resume, PathBuf::from("cv.pdf"));
                assert!(output.is_none());
            }
            _ => panic!("expected import command"),
        }
    }

    #[test]
    fn test_validate_file_extension() {
        assert!(validate_file_extension(Path::new("jd.MD"), &["txt", "md"]).is_ok());
        assert!(validate_file_extension(Path::new("jd.pdf"), &["txt", "md"]).is_err());
    }
}
