// src/browser/directory.rs

use crate::error::AppResult;
use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
    time::SystemTime,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub path: PathBuf,
    pub created: SystemTime,
}

impl DirEntry {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

/// 浏览器的下载目录。列出文件、判断是否仍有未完成的传输。
#[derive(Debug, Clone)]
pub struct DownloadDir {
    path: PathBuf,
    in_progress_suffix: String,
}

impl DownloadDir {
    pub fn new(path: impl Into<PathBuf>, in_progress_suffix: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            in_progress_suffix: in_progress_suffix.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn ensure_exists(&self) -> AppResult<()> {
        fs::create_dir_all(&self.path)?;
        Ok(())
    }

    /// 目录下的所有普通文件及其创建时间 (平台不支持创建时间时退回修改时间)。
    pub fn list_files(&self) -> AppResult<Vec<DirEntry>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.path)? {
            let entry = entry?;
            let metadata = entry.metadata()?;
            if !metadata.is_file() {
                continue;
            }
            let created = metadata
                .created()
                .or_else(|_| metadata.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            entries.push(DirEntry {
                path: entry.path(),
                created,
            });
        }
        Ok(entries)
    }

    pub fn is_in_progress(&self, path: &Path) -> bool {
        path.file_name()
            .is_some_and(|n| n.to_string_lossy().ends_with(&self.in_progress_suffix))
    }

    pub fn has_in_progress(&self) -> AppResult<bool> {
        Ok(self
            .list_files()?
            .iter()
            .any(|e| self.is_in_progress(&e.path)))
    }

    /// `before` 之后新出现的未完成传输。早先遗留的标记不计入。
    pub fn has_new_in_progress(&self, before: &HashSet<PathBuf>) -> AppResult<bool> {
        Ok(self
            .list_files()?
            .iter()
            .any(|e| !before.contains(&e.path) && self.is_in_progress(&e.path)))
    }

    pub fn snapshot(&self) -> AppResult<HashSet<PathBuf>> {
        Ok(self.list_files()?.into_iter().map(|e| e.path).collect())
    }

    /// `before` 之后新出现的、已完成的文件，按创建时间从新到旧排列。
    pub fn new_complete_files(&self, before: &HashSet<PathBuf>) -> AppResult<Vec<DirEntry>> {
        let mut files: Vec<DirEntry> = self
            .list_files()?
            .into_iter()
            .filter(|e| !before.contains(&e.path) && !self.is_in_progress(&e.path))
            .collect();
        files.sort_by(|a, b| b.created.cmp(&a.created).then_with(|| b.path.cmp(&a.path)));
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_progress_marker_detection() {
        let dir = tempfile::tempdir().unwrap();
        let downloads = DownloadDir::new(dir.path(), ".part");
        assert!(!downloads.has_in_progress().unwrap());

        fs::write(dir.path().join("track.igc.part"), b"partial").unwrap();
        assert!(downloads.has_in_progress().unwrap());

        fs::remove_file(dir.path().join("track.igc.part")).unwrap();
        assert!(!downloads.has_in_progress().unwrap());
    }

    #[test]
    fn test_new_complete_files_ignores_snapshot_and_markers() {
        let dir = tempfile::tempdir().unwrap();
        let downloads = DownloadDir::new(dir.path(), ".part");
        fs::write(dir.path().join("old.igc"), b"old").unwrap();
        fs::write(dir.path().join("stale.igc.part"), b"stale").unwrap();
        let before = downloads.snapshot().unwrap();

        fs::write(dir.path().join("new.igc"), b"new").unwrap();
        fs::write(dir.path().join("other.igc.part"), b"...").unwrap();
        fs::create_dir(dir.path().join("subdir")).unwrap();

        let fresh = downloads.new_complete_files(&before).unwrap();
        assert!(downloads.has_new_in_progress(&before).unwrap());
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].file_name(), "new.igc");

        fs::remove_file(dir.path().join("other.igc.part")).unwrap();
        assert!(!downloads.has_new_in_progress(&before).unwrap());
        assert!(downloads.has_in_progress().unwrap());
    }
}
