// src/downloader/audit.rs

use crate::error::AppResult;
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

/// 只追加的下载记录，每次下载一行: `来源地址,下载文件名,最终文件名`
#[derive(Debug, Clone)]
pub struct AuditLog {
    path: PathBuf,
}

impl AuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, source_url: &str, downloaded_name: &str, final_name: &str) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        writeln!(file, "{},{},{}", source_url, downloaded_name, final_name)?;
        file.flush()?;
        Ok(())
    }
}
