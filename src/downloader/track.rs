// src/downloader/track.rs

use super::{
    audit::AuditLog,
    naming::{candidate_path, looks_like_track_url},
};
use crate::{
    browser::{Browser, DownloadDir, Locator},
    config::DownloadSettings,
    error::*,
    models::{DownloadPhase, PendingDownload},
};
use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
    time::Instant,
};

/// 轨迹下载管理器。
///
/// 每个航班只下载一次：点击下载链接，等待浏览器完成传输，再把新文件重命名为
/// 由起飞时间决定的名字。任何异常都直接上报，不做自动重试。
/// 调用方必须保证同一下载目录中同时只有一个下载在进行。
pub struct TrackDownloader {
    settings: DownloadSettings,
    downloads: DownloadDir,
    audit: AuditLog,
}

impl TrackDownloader {
    pub fn new(settings: DownloadSettings) -> Self {
        let downloads = DownloadDir::new(settings.dir.clone(), settings.in_progress_suffix.clone());
        let audit = AuditLog::new(settings.audit_log.clone());
        Self {
            settings,
            downloads,
            audit,
        }
    }

    pub fn download_dir(&self) -> &DownloadDir {
        &self.downloads
    }

    /// 浏览器需停留在航班详情页上。成功时返回最终文件路径。
    pub async fn download(
        &self,
        browser: &mut dyn Browser,
        start_utc: DateTime<Utc>,
    ) -> AppResult<PathBuf> {
        self.downloads.ensure_exists()?;
        let candidate = candidate_path(self.downloads.path(), start_utc);
        let source_url = browser.current_url().await?;
        let mut pending = PendingDownload::new(candidate, source_url);
        debug!(
            "准备下载 '{}' 的轨迹，目标文件: {}",
            pending.source_url,
            pending.expected_final_name.display()
        );

        let result = self.run(browser, &mut pending).await;
        match &result {
            Ok(path) => {
                pending.advance(DownloadPhase::Renamed);
                info!("轨迹已保存: {}", path.display());
            }
            Err(e) => {
                pending.advance(DownloadPhase::Escalated);
                error!("轨迹下载需要人工处理: {}", e);
            }
        }
        result
    }

    async fn run(
        &self,
        browser: &mut dyn Browser,
        pending: &mut PendingDownload,
    ) -> AppResult<PathBuf> {
        let before = self.downloads.snapshot()?;
        if self.downloads.has_in_progress()? {
            warn!(
                "下载目录 '{}' 中存在遗留的未完成文件，已忽略",
                self.downloads.path().display()
            );
        }

        browser
            .click(&Locator::link_text(&self.settings.track_link_text))
            .await?;
        pending.advance(DownloadPhase::Triggered);
        self.ensure_not_misrouted(browser, pending).await?;

        let started = Instant::now();
        loop {
            pending.advance(DownloadPhase::WaitingForCompletion);
            self.wait_for_completion(&before, pending, started).await?;

            pending.advance(DownloadPhase::Settling);
            tokio::time::sleep(self.settings.settle).await;
            if !self.downloads.has_new_in_progress(&before)? {
                break;
            }
            // 静置期间又出现了未完成文件，在同一时限内继续等待
            warn!("'{}' 的传输在静置后仍未结束，继续等待", pending.source_url);
        }

        pending.advance(DownloadPhase::Verifying);
        self.ensure_not_misrouted(browser, pending).await?;
        let artifact = self
            .downloads
            .new_complete_files(&before)?
            .into_iter()
            .map(|entry| entry.path)
            .find(|path| path.is_file())
            .ok_or_else(|| AppError::ArtifactMissing {
                url: pending.source_url.clone(),
                expected: pending.expected_final_name.clone(),
            })?;

        self.move_into_place(&artifact, pending)
    }

    /// 等待直到没有新的未完成传输且至少出现一个新文件。时限从 `started` 起算。
    async fn wait_for_completion(
        &self,
        before: &HashSet<PathBuf>,
        pending: &PendingDownload,
        started: Instant,
    ) -> AppResult<()> {
        loop {
            let in_progress = self.downloads.has_new_in_progress(before)?;
            if !in_progress && !self.downloads.new_complete_files(before)?.is_empty() {
                debug!("传输完成，用时 {:?}", started.elapsed());
                return Ok(());
            }
            if started.elapsed() >= self.settings.timeout {
                return Err(if in_progress {
                    AppError::StalledTransfer {
                        url: pending.source_url.clone(),
                        waited: self.settings.timeout,
                    }
                } else {
                    AppError::ArtifactMissing {
                        url: pending.source_url.clone(),
                        expected: pending.expected_final_name.clone(),
                    }
                });
            }
            tokio::time::sleep(self.settings.poll_interval).await;
        }
    }

    async fn ensure_not_misrouted(
        &self,
        browser: &mut dyn Browser,
        pending: &PendingDownload,
    ) -> AppResult<()> {
        let current_url = browser.current_url().await?;
        // 点击下载链接不应离开详情页
        if looks_like_track_url(&current_url) || current_url != pending.source_url {
            return Err(AppError::MisroutedDownload {
                url: pending.source_url.clone(),
                current_url,
                expected: pending.expected_final_name.clone(),
            });
        }
        Ok(())
    }

    /// 重命名是成功下载的最后一次文件系统改动；目标已存在时拒绝覆盖。
    fn move_into_place(&self, artifact: &Path, pending: &PendingDownload) -> AppResult<PathBuf> {
        let target = &pending.expected_final_name;
        if artifact != target.as_path() {
            if target.exists() {
                return Err(AppError::Collision(target.clone()));
            }
            fs::rename(artifact, target)?;
        }
        self.audit.append(
            &pending.source_url,
            &file_name(artifact),
            &file_name(target),
        )?;

        if !target.is_file() {
            return Err(AppError::RenameVerification(target.clone()));
        }
        Ok(target.clone())
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn downloader(root: &Path) -> TrackDownloader {
        TrackDownloader::new(DownloadSettings::new(
            root.join("tracks"),
            root.join("downloads.log"),
        ))
    }

    #[test]
    fn test_move_into_place_refuses_to_overwrite() {
        let root = tempfile::tempdir().unwrap();
        let downloader = downloader(root.path());
        downloader.download_dir().ensure_exists().unwrap();
        let tracks = downloader.download_dir().path().to_path_buf();

        let artifact = tracks.join("flight.igc");
        let target = tracks.join("2023_07_12_12_05.igc");
        fs::write(&artifact, b"new").unwrap();
        fs::write(&target, b"old").unwrap();

        let pending = PendingDownload::new(target.clone(), "https://a/1".into());
        let result = downloader.move_into_place(&artifact, &pending);

        assert!(matches!(result, Err(AppError::Collision(ref p)) if *p == target));
        assert_eq!(fs::read(&target).unwrap(), b"old");
        assert!(artifact.exists());
        assert!(!root.path().join("downloads.log").exists());
    }

    #[test]
    fn test_artifact_already_at_target_is_kept() {
        let root = tempfile::tempdir().unwrap();
        let downloader = downloader(root.path());
        downloader.download_dir().ensure_exists().unwrap();
        let target = downloader.download_dir().path().join("2023_07_12_12_05.igc");
        fs::write(&target, b"igc").unwrap();

        let pending = PendingDownload::new(target.clone(), "https://a/1".into());
        let path = downloader.move_into_place(&target, &pending).unwrap();

        assert_eq!(path, target);
        let audit = fs::read_to_string(root.path().join("downloads.log")).unwrap();
        assert_eq!(audit, "https://a/1,2023_07_12_12_05.igc,2023_07_12_12_05.igc\n");
    }
}
