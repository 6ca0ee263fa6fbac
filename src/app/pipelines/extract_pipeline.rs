use crate::app::pipelines::field_tree::FieldTree;
use crate::core::input::Input;
use crate::core::instant::parse_instant;
use crate::core::iterator::JsonIterator;
use crate::core::value_type::ValueType;
use crate::core::{ConfigProvider, Pipeline, Record, Storage, TransformResult};
use crate::domain::model::{FieldMapping, OutputFormat};
use crate::utils::error::{JsonError, Result};
use chrono::SecondsFormat;
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::path::Path;

/// Pulls records out of a JSON input and writes them as CSV, TSV or JSON.
pub struct ExtractPipeline<S: Storage, C: ConfigProvider> {
    pub(crate) storage: S,
    pub(crate) config: C,
}

impl<S: Storage, C: ConfigProvider> ExtractPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self { storage, config }
    }

    fn mappings(&self) -> Result<Vec<FieldMapping>> {
        self.config.fields().iter().map(|f| f.parse()).collect()
    }

    fn formats(&self) -> Result<Vec<OutputFormat>> {
        self.config.output_formats().iter().map(|f| f.parse()).collect()
    }

    fn root_segments(&self) -> Vec<&str> {
        self.config
            .root()
            .map(|root| root.split('.').filter(|s| !s.is_empty()).collect())
            .unwrap_or_default()
    }

    /// 逐份讀取文件 (單一 JSON 或 NDJSON) 直到輸入結束或達到筆數上限
    fn extract_from<I: Input>(&self, ji: &mut JsonIterator<I>, tree: &FieldTree) -> Result<Vec<Record>> {
        let limit = self.config.max_records().unwrap_or(usize::MAX);
        let root = self.root_segments();
        let mut records = Vec::new();
        let mut documents = 0usize;

        while records.len() < limit && !ji.at_end()? {
            documents += 1;
            let depth = enter_root(ji, &root, documents)?;
            if !read_records(ji, tree, &mut records, limit)? {
                break;
            }
            // 把 root 外層物件剩下的欄位讀完，下一份文件才能接著讀
            for _ in 0..depth {
                while ji.skip_obj_field()? {
                    ji.skip()?;
                }
            }
        }

        tracing::debug!(
            "Read {} records from {} documents ({} bytes)",
            records.len(),
            documents,
            ji.position()
        );
        Ok(records)
    }

    fn normalize_instants(&self, record: &mut Record) -> Result<()> {
        for column in self.config.instant_fields() {
            if let Some(Value::String(text)) = record.data.get_mut(column) {
                if let Some(instant) = parse_instant(text)? {
                    *text = instant.to_rfc3339_opts(SecondsFormat::AutoSi, true);
                }
            }
        }
        Ok(())
    }

    /// 有設定欄位時照設定順序，否則取所有 key 排序後的聯集
    fn columns(&self, records: &[Record]) -> Result<Vec<String>> {
        let mappings = self.mappings()?;
        if mappings.is_empty() {
            let keys: BTreeSet<&String> = records.iter().flat_map(|r| r.data.keys()).collect();
            return Ok(keys.into_iter().cloned().collect());
        }
        let mut columns: Vec<String> = Vec::with_capacity(mappings.len());
        for mapping in mappings {
            if !columns.contains(&mapping.column) {
                columns.push(mapping.column);
            }
        }
        Ok(columns)
    }

    fn output_file(&self, format: OutputFormat) -> String {
        Path::new(self.config.output_path())
            .join(format!("{}.{}", self.config.job_name(), format.extension()))
            .to_string_lossy()
            .into_owned()
    }
}

fn enter_root<I: Input>(ji: &mut JsonIterator<I>, root: &[&str], document: usize) -> Result<usize> {
    for (depth, segment) in root.iter().enumerate() {
        if ji.what_is_next()? != ValueType::Object || !ji.skip_until(segment)? {
            return Err(JsonError::ProcessingError {
                message: format!(
                    "root path '{}' not found in document {}",
                    root[..=depth].join("."),
                    document
                ),
            });
        }
    }
    Ok(root.len())
}

/// 回傳 false 表示在陣列中途達到上限
fn read_records<I: Input>(
    ji: &mut JsonIterator<I>,
    tree: &FieldTree,
    records: &mut Vec<Record>,
    limit: usize,
) -> Result<bool> {
    match ji.what_is_next()? {
        ValueType::Array => {
            while ji.read_array()? {
                if records.len() >= limit {
                    return Ok(false);
                }
                if ji.what_is_next()? == ValueType::Object {
                    records.push(tree.read_record(ji)?);
                } else {
                    tracing::debug!("Skipping non-object element at byte {}", ji.position());
                    ji.skip()?;
                }
            }
        }
        ValueType::Object => records.push(tree.read_record(ji)?),
        ValueType::Null => {
            ji.read_null()?;
        }
        other => {
            return Err(JsonError::ProcessingError {
                message: format!("expected an array or object of records but found {:?}", other),
            })
        }
    }
    Ok(true)
}

fn trim_strings(record: &mut Record) {
    for value in record.data.values_mut() {
        if let Value::String(text) = value {
            let trimmed = text.trim();
            if trimmed.len() != text.len() {
                *text = trimmed.to_string();
            }
        }
    }
}

fn rows(result: &TransformResult) -> Vec<Map<String, Value>> {
    result
        .records
        .iter()
        .map(|record| {
            result
                .columns
                .iter()
                .map(|c| (c.clone(), record.data.get(c).cloned().unwrap_or(Value::Null)))
                .collect()
        })
        .collect()
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

fn to_delimited(result: &TransformResult, delimiter: u8) -> Result<Vec<u8>> {
    if result.columns.is_empty() {
        return Ok(Vec::new());
    }
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::new());
    writer.write_record(&result.columns)?;
    for record in &result.records {
        writer.write_record(result.columns.iter().map(|c| cell(record.data.get(c))))?;
    }
    writer
        .into_inner()
        .map_err(|e| JsonError::IoError(e.into_error()))
}

fn to_ndjson(result: &TransformResult) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    for row in rows(result) {
        serde_json::to_writer(&mut out, &row)?;
        out.push(b'\n');
    }
    Ok(out)
}

impl<S: Storage, C: ConfigProvider> Pipeline for ExtractPipeline<S, C> {
    fn extract(&self) -> Result<Vec<Record>> {
        let tree = FieldTree::new(&self.mappings()?);
        let input = self.config.input_path();

        match self.config.buffer_size() {
            Some(size) => {
                tracing::debug!("📖 Streaming {} through a {} byte buffer", input, size);
                let reader = self.storage.open(input)?;
                let mut ji = JsonIterator::from_reader(reader, size);
                self.extract_from(&mut ji, &tree)
            }
            None => {
                let bytes = self.storage.read_file(input)?;
                tracing::debug!("📖 Loaded {} bytes from {}", bytes.len(), input);
                let mut ji = JsonIterator::from_slice(&bytes);
                self.extract_from(&mut ji, &tree)
            }
        }
    }

    fn transform(&self, data: Vec<Record>) -> Result<TransformResult> {
        let trim = self.config.trim_whitespace();
        let mut records = Vec::with_capacity(data.len());
        let mut rejected = 0;

        for mut record in data {
            if trim {
                trim_strings(&mut record);
            }

            if let Err(e) = self.normalize_instants(&mut record) {
                tracing::warn!("⚠️ Rejecting record: {}", e);
                rejected += 1;
                continue;
            }

            let missing = self
                .config
                .required_fields()
                .iter()
                .find(|c| record.data.get(c.as_str()).map_or(true, Value::is_null));
            if let Some(column) = missing {
                tracing::debug!("Rejecting record without required field {}", column);
                rejected += 1;
                continue;
            }

            records.push(record);
        }

        let columns = self.columns(&records)?;
        Ok(TransformResult {
            records,
            columns,
            rejected,
        })
    }

    fn load(&self, result: TransformResult) -> Result<Vec<String>> {
        let mut outputs = Vec::new();

        for format in self.formats()? {
            let data = match format {
                OutputFormat::Csv => to_delimited(&result, b',')?,
                OutputFormat::Tsv => to_delimited(&result, b'\t')?,
                OutputFormat::Json => serde_json::to_vec_pretty(&rows(&result))?,
                OutputFormat::Ndjson => to_ndjson(&result)?,
            };
            let path = self.output_file(format);
            tracing::debug!("Writing {} ({} bytes)", path, data.len());
            self.storage.write_file(&path, &data)?;
            tracing::info!("📁 {} records saved to {}", result.records.len(), path);
            outputs.push(path);
        }

        Ok(outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::io::{Cursor, Read};

    #[derive(Default)]
    struct MockStorage {
        files: RefCell<HashMap<String, Vec<u8>>>,
    }

    impl MockStorage {
        fn with_input(path: &str, json: &str) -> Self {
            let storage = Self::default();
            storage
                .files
                .borrow_mut()
                .insert(path.to_string(), json.as_bytes().to_vec());
            storage
        }

        fn file(&self, path: &str) -> String {
            String::from_utf8(self.files.borrow()[path].clone()).unwrap()
        }
    }

    impl Storage for MockStorage {
        fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            self.files.borrow().get(path).cloned().ok_or_else(|| {
                JsonError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        fn open(&self, path: &str) -> Result<Box<dyn Read>> {
            Ok(Box::new(Cursor::new(self.read_file(path)?)))
        }

        fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            self.files.borrow_mut().insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    struct MockConfig {
        root: Option<String>,
        fields: Vec<String>,
        buffer_size: Option<usize>,
        formats: Vec<String>,
        max_records: Option<usize>,
        trim: bool,
        required: Vec<String>,
        instants: Vec<String>,
    }

    impl MockConfig {
        fn new(fields: &[&str]) -> Self {
            Self {
                root: None,
                fields: fields.iter().map(|f| f.to_string()).collect(),
                buffer_size: None,
                formats: vec!["csv".to_string()],
                max_records: None,
                trim: false,
                required: vec![],
                instants: vec![],
            }
        }
    }

    impl ConfigProvider for MockConfig {
        fn input_path(&self) -> &str {
            "input.json"
        }

        fn root(&self) -> Option<&str> {
            self.root.as_deref()
        }

        fn fields(&self) -> &[String] {
            &self.fields
        }

        fn buffer_size(&self) -> Option<usize> {
            self.buffer_size
        }

        fn output_path(&self) -> &str {
            "out"
        }

        fn output_formats(&self) -> &[String] {
            &self.formats
        }

        fn max_records(&self) -> Option<usize> {
            self.max_records
        }

        fn trim_whitespace(&self) -> bool {
            self.trim
        }

        fn required_fields(&self) -> &[String] {
            &self.required
        }

        fn instant_fields(&self) -> &[String] {
            &self.instants
        }

        fn job_name(&self) -> &str {
            "job"
        }
    }

    const QUOTES: &str = r#"{"status": "ok", "data": {"quotes": [
        {"id": 1, "symbol": " BTC ", "px": {"last": 1.5}, "ts": "2019-10-04T16:06:36+08:00"},
        {"id": 2, "symbol": "ETH", "px": {"last": 2}},
        "not a record",
        {"id": 3, "px": null}
    ], "count": 3}}"#;

    fn pipeline(config: MockConfig) -> ExtractPipeline<MockStorage, MockConfig> {
        ExtractPipeline::new(MockStorage::with_input("input.json", QUOTES), config)
    }

    #[test]
    fn test_extract_under_root() {
        let mut config = MockConfig::new(&["id", "symbol", "px.last=last"]);
        config.root = Some("data.quotes".to_string());
        let records = pipeline(config).extract().unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].data["last"], serde_json::json!(1.5));
        assert_eq!(records[1].data["symbol"], serde_json::json!("ETH"));
        assert!(!records[2].data.contains_key("last"));
    }

    #[test]
    fn test_streaming_matches_slice() {
        let mut sliced = MockConfig::new(&["id", "px.last=last"]);
        sliced.root = Some("data.quotes".to_string());
        let mut streamed = MockConfig::new(&["id", "px.last=last"]);
        streamed.root = Some("data.quotes".to_string());
        streamed.buffer_size = Some(7);
        assert_eq!(
            pipeline(sliced).extract().unwrap(),
            pipeline(streamed).extract().unwrap()
        );
    }

    #[test]
    fn test_missing_root_is_error() {
        let mut config = MockConfig::new(&["id"]);
        config.root = Some("data.trades".to_string());
        let err = pipeline(config).extract().unwrap_err();
        assert!(err.to_string().contains("data.trades"));
    }

    #[test]
    fn test_max_records() {
        let mut config = MockConfig::new(&["id"]);
        config.root = Some("data.quotes".to_string());
        config.max_records = Some(2);
        assert_eq!(pipeline(config).extract().unwrap().len(), 2);
    }

    #[test]
    fn test_ndjson_documents() {
        let storage = MockStorage::with_input("input.json", "{\"a\":1}\n{\"a\":2}\n[{\"a\":3}]\n");
        let pipeline = ExtractPipeline::new(storage, MockConfig::new(&["a"]));
        let records = pipeline.extract().unwrap();
        let values: Vec<_> = records.iter().map(|r| r.data["a"].clone()).collect();
        assert_eq!(values, vec![serde_json::json!(1), serde_json::json!(2), serde_json::json!(3)]);
    }

    #[test]
    fn test_transform_trims_normalizes_and_rejects() {
        let mut config = MockConfig::new(&["id", "symbol", "ts"]);
        config.root = Some("data.quotes".to_string());
        config.trim = true;
        config.required = vec!["symbol".to_string()];
        config.instants = vec!["ts".to_string()];
        let pipeline = pipeline(config);
        let result = pipeline.transform(pipeline.extract().unwrap()).unwrap();
        assert_eq!(result.rejected, 1);
        assert_eq!(result.columns, vec!["id", "symbol", "ts"]);
        assert_eq!(result.records[0].data["symbol"], serde_json::json!("BTC"));
        assert_eq!(result.records[0].data["ts"], serde_json::json!("2019-10-04T08:06:36Z"));
    }

    #[test]
    fn test_invalid_instant_rejects_record() {
        let storage = MockStorage::with_input("input.json", r#"[{"ts": "yesterday at noon!"}, {"ts": ""}]"#);
        let mut config = MockConfig::new(&["ts"]);
        config.instants = vec!["ts".to_string()];
        let pipeline = ExtractPipeline::new(storage, config);
        let result = pipeline.transform(pipeline.extract().unwrap()).unwrap();
        assert_eq!(result.rejected, 1);
        assert_eq!(result.records.len(), 1);
    }

    #[test]
    fn test_load_writes_each_format() {
        let mut config = MockConfig::new(&["id", "px.last=last"]);
        config.root = Some("data.quotes".to_string());
        config.formats = vec!["csv".to_string(), "tsv".to_string(), "ndjson".to_string()];
        let pipeline = pipeline(config);
        let result = pipeline.transform(pipeline.extract().unwrap()).unwrap();
        let outputs = pipeline.load(result).unwrap();
        assert_eq!(outputs, vec!["out/job.csv", "out/job.tsv", "out/job.ndjson"]);
        assert_eq!(pipeline.storage.file("out/job.csv"), "id,last\n1,1.5\n2,2\n3,\n");
        assert_eq!(pipeline.storage.file("out/job.tsv"), "id\tlast\n1\t1.5\n2\t2\n3\t\n");
        assert_eq!(
            pipeline.storage.file("out/job.ndjson"),
            "{\"id\":1,\"last\":1.5}\n{\"id\":2,\"last\":2}\n{\"id\":3,\"last\":null}\n"
        );
    }

    #[test]
    fn test_unknown_format_fails_load() {
        let mut config = MockConfig::new(&["id"]);
        config.formats = vec!["xml".to_string()];
        let pipeline = pipeline(config);
        assert!(pipeline.load(TransformResult::default()).is_err());
    }
}
