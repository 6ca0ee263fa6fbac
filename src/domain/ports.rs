use crate::domain::model::{Record, TransformResult};
use crate::utils::error::Result;
use std::io::Read;

pub trait Storage {
    fn read_file(&self, path: &str) -> Result<Vec<u8>>;

    /// 串流讀取，搭配固定大小緩衝區的 iterator 使用
    fn open(&self, path: &str) -> Result<Box<dyn Read>>;

    fn write_file(&self, path: &str, data: &[u8]) -> Result<()>;
}

pub trait ConfigProvider {
    /// `-` 代表標準輸入
    fn input_path(&self) -> &str;
    /// 資料所在位置的點分隔路徑，None 表示整份文件
    fn root(&self) -> Option<&str>;
    /// `path` 或 `path=column`
    fn fields(&self) -> &[String];
    /// 有設定時以串流方式讀取輸入
    fn buffer_size(&self) -> Option<usize>;
    fn output_path(&self) -> &str;
    fn output_formats(&self) -> &[String];
    fn max_records(&self) -> Option<usize>;
    fn trim_whitespace(&self) -> bool;
    fn required_fields(&self) -> &[String];
    fn instant_fields(&self) -> &[String];
    /// 輸出檔名（不含副檔名）
    fn job_name(&self) -> &str;
}

pub trait Pipeline {
    fn extract(&self) -> Result<Vec<Record>>;
    fn transform(&self, data: Vec<Record>) -> Result<TransformResult>;
    /// 回傳寫出的檔案路徑
    fn load(&self, result: TransformResult) -> Result<Vec<String>>;
}
