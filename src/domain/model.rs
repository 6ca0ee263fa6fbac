use crate::utils::error::{JsonError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// 一筆抽出的資料，key 為輸出欄位名稱
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub data: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default)]
pub struct TransformResult {
    pub records: Vec<Record>,
    /// 輸出欄位順序
    pub columns: Vec<String>,
    /// 因缺少必要欄位或時間格式錯誤而被剔除的筆數
    pub rejected: usize,
}

/// A dotted JSON path and the column it is written to.
///
/// Parsed from `path` or `path=column`; without `=` the column is the path
/// itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    pub path: String,
    pub column: String,
}

impl FieldMapping {
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.path.split('.')
    }
}

impl FromStr for FieldMapping {
    type Err = JsonError;

    fn from_str(spec: &str) -> Result<Self> {
        let (path, column) = match spec.split_once('=') {
            Some((path, column)) => (path.trim(), column.trim()),
            None => (spec.trim(), spec.trim()),
        };
        if path.is_empty() || column.is_empty() || path.split('.').any(str::is_empty) {
            return Err(JsonError::InvalidConfigValueError {
                field: "fields".to_string(),
                value: spec.to_string(),
                reason: "Expected a dotted path, optionally followed by =column".to_string(),
            });
        }
        Ok(Self {
            path: path.to_string(),
            column: column.to_string(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Csv,
    Tsv,
    Json,
    Ndjson,
}

impl OutputFormat {
    pub const NAMES: [&'static str; 4] = ["csv", "tsv", "json", "ndjson"];

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Tsv => "tsv",
            OutputFormat::Json => "json",
            OutputFormat::Ndjson => "ndjson",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = JsonError;

    fn from_str(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "tsv" => Ok(OutputFormat::Tsv),
            "json" => Ok(OutputFormat::Json),
            "ndjson" => Ok(OutputFormat::Ndjson),
            _ => Err(JsonError::InvalidConfigValueError {
                field: "output_formats".to_string(),
                value: name.to_string(),
                reason: format!(
                    "Unsupported format. Valid formats: {}",
                    OutputFormat::NAMES.join(", ")
                ),
            }),
        }
    }
}
