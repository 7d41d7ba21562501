use crate::core::artifacts::{DEFAULT_MODEL_FILE, DEFAULT_PREPROCESSOR_FILE};
use crate::core::ConfigProvider;
use crate::utils::error::{ChurnError, Result};
use crate::utils::logger::LogFormat;
use crate::utils::validation::{
    validate_file_extension, validate_non_empty_string, validate_path, validate_positive_number,
    Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_CONFIG_FILE: &str = "churn-config.toml";
pub const DEFAULT_EXPORT_FILE: &str = "customer_churn_predictions.csv";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub artifacts: ArtifactsConfig,
    pub inference: InferenceConfig,
    pub export: ExportConfig,
    pub logging: LoggingConfig,
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactsConfig {
    pub dir: String,
    pub preprocessor: String,
    pub model: String,
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            dir: ".".to_string(),
            preprocessor: DEFAULT_PREPROCESSOR_FILE.to_string(),
            model: DEFAULT_MODEL_FILE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    pub decision_threshold: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub output_path: String,
    /// May contain `{timestamp}`.
    pub file_name: String,
    pub compress: bool,
    pub preview_rows: usize,
    pub with_probability: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_path: ".".to_string(),
            file_name: DEFAULT_EXPORT_FILE.to_string(),
            compress: false,
            preview_rows: 5,
            with_probability: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "compact".to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn log_format(&self) -> LogFormat {
        LogFormat::parse(&self.format).unwrap_or(LogFormat::Compact)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    pub enabled: bool,
}

impl AppConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ChurnError::config("config", format!("cannot read '{}': {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Loads `path` when given; otherwise the default file if present, else built-in defaults.
    pub fn load(path: Option<&str>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => Self::from_file(DEFAULT_CONFIG_FILE),
            None => Ok(Self::default()),
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content)
            .map_err(|e| ChurnError::config("toml_parsing", format!("TOML parsing error: {}", e)))
    }

    /// 替換環境變數 (例如 ${ARTIFACT_DIR})
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}")
            .map_err(|e| ChurnError::config("toml_parsing", e.to_string()))?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_path("artifacts.dir", &self.artifacts.dir)?;
        validate_file_extension("artifacts.preprocessor", &self.artifacts.preprocessor, &["json"])?;
        validate_file_extension("artifacts.model", &self.artifacts.model, &["json"])?;

        if let Some(threshold) = self.inference.decision_threshold {
            if !(0.0..=1.0).contains(&threshold) {
                return Err(ChurnError::config(
                    "inference.decision_threshold",
                    format!("{} must be between 0 and 1", threshold),
                ));
            }
        }

        validate_path("export.output_path", &self.export.output_path)?;
        validate_non_empty_string("export.file_name", &self.export.file_name)?;
        validate_file_extension("export.file_name", &self.export.file_name, &["csv"])?;
        validate_positive_number("export.preview_rows", self.export.preview_rows, 1)?;

        if LogFormat::parse(&self.logging.format).is_none() {
            return Err(ChurnError::config(
                "logging.format",
                format!("'{}' is not one of: compact, json", self.logging.format),
            ));
        }

        Ok(())
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.enabled
    }
}

impl ConfigProvider for AppConfig {
    fn artifact_dir(&self) -> &str {
        &self.artifacts.dir
    }

    fn preprocessor_file(&self) -> &str {
        &self.artifacts.preprocessor
    }

    fn model_file(&self) -> &str {
        &self.artifacts.model
    }

    fn decision_threshold(&self) -> Option<f64> {
        self.inference.decision_threshold
    }

    fn output_path(&self) -> &str {
        &self.export.output_path
    }

    fn export_file_name(&self) -> &str {
        &self.export.file_name
    }

    fn compress_export(&self) -> bool {
        self.export.compress
    }

    fn preview_rows(&self) -> usize {
        self.export.preview_rows
    }

    fn with_probability(&self) -> bool {
        self.export.with_probability
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = AppConfig::from_toml_str("").unwrap();

        assert_eq!(config.artifact_dir(), ".");
        assert_eq!(config.preprocessor_file(), "preprocessing.json");
        assert_eq!(config.model_file(), "best_model_voting.json");
        assert_eq!(config.export_file_name(), "customer_churn_predictions.csv");
        assert_eq!(config.preview_rows(), 5);
        assert_eq!(config.decision_threshold(), None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[artifacts]
dir = "./models"
model = "voting.json"

[inference]
decision_threshold = 0.4

[export]
output_path = "./out"
file_name = "scored_{timestamp}.csv"
compress = true
preview_rows = 10

[logging]
format = "json"

[monitoring]
enabled = true
"#;

        let config = AppConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.artifact_dir(), "./models");
        assert_eq!(config.model_file(), "voting.json");
        assert_eq!(config.preprocessor_file(), "preprocessing.json");
        assert_eq!(config.decision_threshold(), Some(0.4));
        assert!(config.compress_export());
        assert_eq!(config.logging.log_format(), LogFormat::Json);
        assert!(config.monitoring_enabled());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("CHURN_TEST_ARTIFACT_DIR", "/srv/churn");

        let config = AppConfig::from_toml_str(
            r#"
[artifacts]
dir = "${CHURN_TEST_ARTIFACT_DIR}"
"#,
        )
        .unwrap();
        assert_eq!(config.artifact_dir(), "/srv/churn");

        std::env::remove_var("CHURN_TEST_ARTIFACT_DIR");
    }

    #[test]
    fn test_config_validation() {
        let config = AppConfig::from_toml_str("[inference]\ndecision_threshold = 1.5\n").unwrap();
        assert!(config.validate().is_err());

        let config = AppConfig::from_toml_str("[artifacts]\nmodel = \"model.pkl\"\n").unwrap();
        assert!(config.validate().is_err());

        let config = AppConfig::from_toml_str("[export]\npreview_rows = 0\n").unwrap();
        assert!(config.validate().is_err());

        let config = AppConfig::from_toml_str("[logging]\nformat = \"pretty\"\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[export]\nfile_name = \"batch.csv\"\n")
            .unwrap();

        let config = AppConfig::load(temp_file.path().to_str()).unwrap();
        assert_eq!(config.export_file_name(), "batch.csv");

        assert!(AppConfig::load(Some("/definitely/not/here.toml")).is_err());
    }
}
