// src/config.rs

pub mod file;

use self::file::load_or_create_external_config;
use crate::{
    cli::{Cli, PageVariant},
    constants,
    error::AppResult,
};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NetworkConfig {
    pub connect_timeout_secs: Option<u64>,
    pub timeout_secs: Option<u64>,
    pub max_retries: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SiteConfig {
    pub base_url: Option<String>,
    pub pilot_url_template: Option<String>,
    pub track_link_text: Option<String>,
    pub download_mime_types: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DownloadConfigFromFile {
    pub timeout_secs: Option<u64>,
    pub poll_interval_ms: Option<u64>,
    pub settle_ms: Option<u64>,
    pub in_progress_suffix: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ExternalConfig {
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub download: DownloadConfigFromFile,
}

impl ExternalConfig {
    pub(crate) fn default_app_config() -> Self {
        Self {
            network: NetworkConfig {
                connect_timeout_secs: Some(10),
                timeout_secs: Some(60),
                max_retries: Some(3),
            },
            site: SiteConfig {
                base_url: Some(constants::site::BASE_URL.into()),
                pilot_url_template: Some(constants::site::PILOT_URL_TEMPLATE.into()),
                track_link_text: Some(constants::site::TRACK_LINK_TEXT.into()),
                download_mime_types: Some(
                    constants::site::DOWNLOAD_MIME_TYPES.iter().map(|s| s.to_string()).collect(),
                ),
            },
            download: DownloadConfigFromFile {
                timeout_secs: Some(constants::download::DEFAULT_TIMEOUT_SECS),
                poll_interval_ms: Some(constants::download::DEFAULT_POLL_INTERVAL_MS),
                settle_ms: Some(constants::download::DEFAULT_SETTLE_MS),
                in_progress_suffix: Some(constants::download::IN_PROGRESS_SUFFIX.into()),
            },
        }
    }
}

/// 轨迹下载相关的设置，由下载管理器独占使用。
#[derive(Debug, Clone)]
pub struct DownloadSettings {
    pub dir: PathBuf,
    pub audit_log: PathBuf,
    pub timeout: Duration,
    pub poll_interval: Duration,
    pub settle: Duration,
    pub in_progress_suffix: String,
    pub track_link_text: String,
}

impl DownloadSettings {
    pub fn new(dir: PathBuf, audit_log: PathBuf) -> Self {
        Self {
            dir,
            audit_log,
            timeout: Duration::from_secs(constants::download::DEFAULT_TIMEOUT_SECS),
            poll_interval: Duration::from_millis(constants::download::DEFAULT_POLL_INTERVAL_MS),
            settle: Duration::from_millis(constants::download::DEFAULT_SETTLE_MS),
            in_progress_suffix: constants::download::IN_PROGRESS_SUFFIX.into(),
            track_link_text: constants::site::TRACK_LINK_TEXT.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub user_agent: String,
    pub connect_timeout: Duration,
    pub timeout: Duration,
    pub max_retries: u32,
    pub base_url: String,
    pub pilot_url_template: String,
    pub variant: PageVariant,
    pub output_dir: PathBuf,
    pub download_tracks: bool,
    pub download: DownloadSettings,
    pub download_mime_types: Vec<String>,
    pub element_timeout: Duration,
    pub pilot_pause: Duration,
}

impl AppConfig {
    pub fn new(args: &Cli) -> AppResult<Self> {
        let external_config = load_or_create_external_config()?;
        Ok(Self::from_parts(args, external_config))
    }

    /// 合并命令行参数与配置文件，优先级: 命令行 > 配置文件 > 默认值
    pub fn from_parts(args: &Cli, external: ExternalConfig) -> Self {
        let output_dir = args.output.clone();
        let download_dir = args
            .download_dir
            .clone()
            .unwrap_or_else(|| output_dir.join(constants::TRACKS_SUBDIR));

        let mut download = DownloadSettings::new(
            download_dir,
            output_dir.join(constants::AUDIT_FILE_NAME),
        );
        if let Some(secs) = args.download_timeout.or(external.download.timeout_secs) {
            download.timeout = Duration::from_secs(secs);
        }
        if let Some(ms) = external.download.poll_interval_ms {
            download.poll_interval = Duration::from_millis(ms);
        }
        if let Some(ms) = external.download.settle_ms {
            download.settle = Duration::from_millis(ms);
        }
        if let Some(suffix) = external.download.in_progress_suffix.filter(|s| !s.is_empty()) {
            download.in_progress_suffix = suffix;
        }
        if let Some(text) = external.site.track_link_text {
            download.track_link_text = text;
        }

        Self {
            user_agent: constants::USER_AGENT.into(),
            connect_timeout: Duration::from_secs(external.network.connect_timeout_secs.unwrap_or(10)),
            timeout: Duration::from_secs(external.network.timeout_secs.unwrap_or(60)),
            max_retries: external.network.max_retries.unwrap_or(3),
            base_url: args
                .base_url
                .clone()
                .or(external.site.base_url)
                .unwrap_or_else(|| constants::site::BASE_URL.into()),
            pilot_url_template: external
                .site
                .pilot_url_template
                .unwrap_or_else(|| constants::site::PILOT_URL_TEMPLATE.into()),
            variant: args.variant,
            output_dir,
            download_tracks: args.download,
            download,
            download_mime_types: external.site.download_mime_types.unwrap_or_else(|| {
                constants::site::DOWNLOAD_MIME_TYPES.iter().map(|s| s.to_string()).collect()
            }),
            element_timeout: Duration::from_secs(constants::DEFAULT_ELEMENT_TIMEOUT_SECS),
            pilot_pause: Duration::from_secs(args.pause),
        }
    }

    pub fn pilot_url(&self, pilot: &str) -> String {
        self.pilot_url_template
            .replace("{base}", self.base_url.trim_end_matches('/'))
            .replace("{pilot}", pilot)
    }
}

#[cfg(any(test, feature = "testing"))]
impl Default for AppConfig {
    fn default() -> Self {
        let output_dir = PathBuf::from(constants::DEFAULT_OUTPUT_DIR);
        Self {
            user_agent: "test-agent/1.0".to_string(),
            connect_timeout: Duration::from_secs(5),
            timeout: Duration::from_secs(15),
            max_retries: 0,
            base_url: constants::site::BASE_URL.to_string(),
            pilot_url_template: constants::site::PILOT_URL_TEMPLATE.to_string(),
            variant: PageVariant::Detail,
            download: DownloadSettings::new(
                output_dir.join(constants::TRACKS_SUBDIR),
                output_dir.join(constants::AUDIT_FILE_NAME),
            ),
            output_dir,
            download_tracks: false,
            download_mime_types: constants::site::DOWNLOAD_MIME_TYPES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            element_timeout: Duration::from_secs(1),
            pilot_pause: Duration::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_overrides_file_config() {
        let args = Cli::parse_from([
            "xc-logbook",
            "--pilot",
            "someone",
            "--download-timeout",
            "5",
            "--base-url",
            "http://localhost:1234/",
        ]);
        let mut external = ExternalConfig::default_app_config();
        external.download.timeout_secs = Some(300);
        external.download.settle_ms = Some(10);

        let config = AppConfig::from_parts(&args, external);

        assert_eq!(config.download.timeout, Duration::from_secs(5));
        assert_eq!(config.download.settle, Duration::from_millis(10));
        assert_eq!(config.download.dir, PathBuf::from("data").join("tracks"));
        assert_eq!(
            config.pilot_url("someone"),
            "http://localhost:1234/world/en/pilots/detail:someone"
        );
    }

    #[test]
    fn test_empty_file_config_falls_back_to_defaults() {
        let args = Cli::parse_from(["xc-logbook", "-p", "a", "--download-dir", "/tmp/igc"]);
        let config = AppConfig::from_parts(&args, ExternalConfig::default());

        assert_eq!(config.download.dir, PathBuf::from("/tmp/igc"));
        assert_eq!(config.download.in_progress_suffix, ".part");
        assert_eq!(config.download.timeout, Duration::from_secs(120));
        assert_eq!(config.base_url, "https://www.xcontest.org");
        assert_eq!(config.download_mime_types.len(), 3);
    }
}
