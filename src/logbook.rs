// src/logbook.rs

use crate::{constants, error::AppResult, models::FlightRecord, utils};
use log::debug;
use std::{
    fs::{self, File, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

/// 单个飞行员的航班记录文件 `<pilot>.dat`。
/// 每次抓取开始时清空，之后逐条追加并立即落盘，中途停止也能保留已写入的行。
pub struct PilotLogbook {
    path: PathBuf,
    file: File,
    rows: usize,
}

impl PilotLogbook {
    pub fn path_for(output_dir: &Path, pilot: &str) -> PathBuf {
        output_dir.join(format!(
            "{}.{}",
            utils::sanitize_filename(pilot),
            constants::LOGBOOK_EXTENSION
        ))
    }

    pub fn create(output_dir: &Path, pilot: &str) -> AppResult<Self> {
        fs::create_dir_all(output_dir)?;
        let path = Self::path_for(output_dir, pilot);
        File::create(&path)?;
        let file = OpenOptions::new().append(true).open(&path)?;
        debug!("航班记录文件: {}", path.display());
        Ok(Self { path, file, rows: 0 })
    }

    pub fn append(&mut self, record: &FlightRecord) -> AppResult<()> {
        writeln!(self.file, "{}", record.to_row())?;
        self.file.flush()?;
        self.rows += 1;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rows(&self) -> usize {
        self.rows
    }
}
