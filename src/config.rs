//! Configuration management for the resume tailor

use crate::error::{Result, TailorError};
use crate::llm::OracleTask;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub oracle: OracleConfig,
    pub output: OutputConfig,
    pub tailoring: TailoringConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    /// OpenAI-compatible endpoint, without the `/chat/completions` suffix.
    pub base_url: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub max_tokens: u32,
    pub requirements: TaskSettings,
    pub match_scoring: TaskSettings,
    pub suggestions: TaskSettings,
    pub edit_application: TaskSettings,
    /// Added after the first release; older config files lack it.
    #[serde(default = "default_resume_parsing")]
    pub resume_parsing: TaskSettings,
}

fn default_resume_parsing() -> TaskSettings {
    TaskSettings::new("gpt-4o-mini", 0.05)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSettings {
    pub model: String,
    pub temperature: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub directory: PathBuf,
    pub format: OutputFormat,
    pub detailed: bool,
    pub color_output: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Json,
    Markdown,
    Html,
    Pdf,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Markdown => "md",
            OutputFormat::Html => "html",
            OutputFormat::Pdf => "pdf",
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = TailorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "md" | "markdown" => Ok(OutputFormat::Markdown),
            "html" => Ok(OutputFormat::Html),
            "pdf" => Ok(OutputFormat::Pdf),
            other => Err(TailorError::UnsupportedFormat(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TailoringConfig {
    pub default_label: String,
    /// Fail finalization when the placeholder audit finds sentinels in free text.
    pub strict_audit: bool,
    /// Score the tailored record again after finalization.
    pub rescore: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            oracle: OracleConfig {
                base_url: "https://api.openai.com/v1".to_string(),
                api_key_env: "OPENAI_API_KEY".to_string(),
                timeout_secs: 120,
                max_retries: 3,
                max_tokens: 4096,
                requirements: TaskSettings::new("gpt-4o-mini", 0.1),
                match_scoring: TaskSettings::new("gpt-4o-mini", 0.3),
                suggestions: TaskSettings::new("gpt-4o-mini", 0.6),
                edit_application: TaskSettings::new("gpt-4o-mini", 0.05),
                resume_parsing: default_resume_parsing(),
            },
            output: OutputConfig {
                directory: PathBuf::from("output"),
                format: OutputFormat::Json,
                detailed: false,
                color_output: true,
            },
            tailoring: TailoringConfig {
                default_label: "general".to_string(),
                strict_audit: false,
                rescore: true,
            },
        }
    }
}

impl TaskSettings {
    pub fn new(model: &str, temperature: f32) -> Self {
        Self {
            model: model.to_string(),
            temperature,
        }
    }
}

impl OracleConfig {
    pub fn task(&self, task: OracleTask) -> &TaskSettings {
        match task {
            OracleTask::ExtractRequirements => &self.requirements,
            OracleTask::ScoreMatch => &self.match_scoring,
            OracleTask::SuggestEdits => &self.suggestions,
            OracleTask::ApplyEdits => &self.edit_application,
            OracleTask::ParseResume => &self.resume_parsing,
        }
    }

    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load from `path`, writing defaults there on first use.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)
                .map_err(|e| TailorError::Configuration(format!("Failed to parse config: {}", e)))?;
            Ok(config)
        } else {
            let config = Self::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| TailorError::Configuration(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
            .join("resume-tailor")
            .join("config.toml")
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| TailorError::Configuration(format!("Failed to serialize config: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_first_load_writes_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::load_from(&path).unwrap();

        assert!(path.exists());
        assert_eq!(config.oracle.suggestions.model, "gpt-4o-mini");
        assert_eq!(config.output.format, OutputFormat::Json);
    }

    #[test]
    fn test_round_trip_keeps_edits() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.oracle.base_url = "http://localhost:11434/v1".to_string();
        config.oracle.edit_application.temperature = 0.0;
        config.tailoring.strict_audit = true;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.oracle.base_url, "http://localhost:11434/v1");
        assert_eq!(loaded.oracle.task(OracleTask::ApplyEdits).temperature, 0.0);
        assert!(loaded.tailoring.strict_audit);
    }

    #[test]
    fn test_missing_resume_parsing_section_uses_default() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let mut config = Config::default();
        config.oracle.resume_parsing.temperature = 0.9;
        let mut value = toml::Value::try_from(&config).unwrap();
        value["oracle"].as_table_mut().unwrap().remove("resume_parsing");
        std::fs::write(&path, toml::to_string(&value).unwrap()).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.oracle.task(OracleTask::ParseResume).temperature, 0.05);
    }

    #[test]
    fn test_invalid_toml_is_configuration_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "oracle = 3").unwrap();

        assert!(matches!(Config::load_from(&path), Err(TailorError::Configuration(_))));
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!("MD".parse::<OutputFormat>().unwrap(), OutputFormat::Markdown);
        assert_eq!("pdf".parse::<OutputFormat>().unwrap().extension(), "pdf");
        assert!("docx".parse::<OutputFormat>().is_err());
    }
}
