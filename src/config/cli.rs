use crate::core::Storage;
use crate::utils::error::Result;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// 本機檔案系統；相對路徑以 base_path 為基準，`-` 代表標準輸入
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: String,
}

impl LocalStorage {
    pub fn new(base_path: String) -> Self {
        Self { base_path }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        Path::new(&self.base_path).join(path)
    }
}

impl Storage for LocalStorage {
    fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        if path == "-" {
            let mut data = Vec::new();
            io::stdin().lock().read_to_end(&mut data)?;
            return Ok(data);
        }
        Ok(fs::read(self.resolve(path))?)
    }

    fn open(&self, path: &str) -> Result<Box<dyn Read>> {
        if path == "-" {
            return Ok(Box::new(io::stdin()));
        }
        Ok(Box::new(fs::File::open(self.resolve(path))?))
    }

    fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = self.resolve(path);

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(full_path, data)?;
        Ok(())
    }
}
