use crate::core::ConfigProvider;
use crate::domain::model::{FieldMapping, OutputFormat};
use crate::utils::error::{JsonError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    pub job: JobSection,
    pub input: InputConfig,
    #[serde(default)]
    pub extract: ExtractConfig,
    #[serde(default)]
    pub transform: TransformConfig,
    pub output: OutputConfig,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSection {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    pub path: Option<String>,
    pub root: Option<String>,
    pub buffer_size: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractConfig {
    #[serde(default)]
    pub fields: Vec<String>,
    pub max_records: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransformConfig {
    pub trim_whitespace: Option<bool>,
    #[serde(default)]
    pub required_fields: Vec<String>,
    #[serde(default)]
    pub instant_fields: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub path: String,
    pub formats: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub verbose: Option<bool>,
    /// `text` 或 `json`
    pub format: Option<String>,
}

impl JobConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(JsonError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| JsonError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${DATA_DIR})，未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| JsonError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.into_owned())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        let name = validation::validate_required_field("job.name", &self.job.name)?;
        validation::validate_non_empty_string("job.name", name)?;
        let input = validation::validate_required_field("input.path", &self.input.path)?;
        validation::validate_path("input.path", input)?;
        validation::validate_path("output.path", &self.output.path)?;

        if let Some(size) = self.input.buffer_size {
            validation::validate_range("input.buffer_size", size, 1, super::MAX_BUFFER_SIZE)?;
        }
        if let Some(max) = self.extract.max_records {
            validation::validate_positive_number("extract.max_records", max, 1)?;
        }

        if self.output.formats.is_empty() {
            return Err(JsonError::ConfigValidationError {
                field: "output.formats".to_string(),
                message: "At least one output format is required".to_string(),
            });
        }
        for format in &self.output.formats {
            validation::validate_one_of(
                "output.formats",
                &format.to_ascii_lowercase(),
                &OutputFormat::NAMES,
            )?;
        }

        for field in &self.extract.fields {
            field.parse::<FieldMapping>()?;
        }

        if let Some(format) = self.logging.as_ref().and_then(|l| l.format.as_deref()) {
            validation::validate_one_of("logging.format", format, &["text", "json"])?;
        }

        Ok(())
    }

    pub fn verbose(&self) -> bool {
        self.logging.as_ref().and_then(|l| l.verbose).unwrap_or(false)
    }

    pub fn log_format(&self) -> Option<&str> {
        self.logging.as_ref().and_then(|l| l.format.as_deref())
    }
}

impl ConfigProvider for JobConfig {
    fn input_path(&self) -> &str {
        self.input.path.as_deref().unwrap_or_default()
    }

    fn root(&self) -> Option<&str> {
        self.input.root.as_deref()
    }

    fn fields(&self) -> &[String] {
        &self.extract.fields
    }

    fn buffer_size(&self) -> Option<usize> {
        self.input.buffer_size
    }

    fn output_path(&self) -> &str {
        &self.output.path
    }

    fn output_formats(&self) -> &[String] {
        &self.output.formats
    }

    fn max_records(&self) -> Option<usize> {
        self.extract.max_records
    }

    fn trim_whitespace(&self) -> bool {
        self.transform.trim_whitespace.unwrap_or(false)
    }

    fn required_fields(&self) -> &[String] {
        &self.transform.required_fields
    }

    fn instant_fields(&self) -> &[String] {
        &self.transform.instant_fields
    }

    fn job_name(&self) -> &str {
        self.job.name.as_deref().unwrap_or_default()
    }
}

impl Validate for JobConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
