// src/downloader/naming.rs

use crate::constants::download;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

/// 由起飞时间得到目标文件名 `YYYY_MM_DD_HH_MM.igc`。
/// 同一分钟内已有文件时依次尝试 `_0`、`_1` ...，取第一个空闲的名字。
pub fn candidate_path(dir: &Path, start_utc: DateTime<Utc>) -> PathBuf {
    let stem = start_utc.format(download::FILENAME_TIME_FORMAT).to_string();
    let first = dir.join(format!("{}.{}", stem, download::TRACK_EXTENSION));
    if !first.exists() {
        return first;
    }
    (0u64..)
        .map(|i| dir.join(format!("{}_{}.{}", stem, i, download::TRACK_EXTENSION)))
        .find(|p| !p.exists())
        .unwrap_or(first)
}

/// 当前地址本身指向轨迹文件，说明浏览器打开了文件而不是在后台下载。
pub fn looks_like_track_url(url: &str) -> bool {
    let path = match url::Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url.split(['?', '#']).next().unwrap_or_default().to_string(),
    };
    path.to_ascii_lowercase()
        .ends_with(&format!(".{}", download::TRACK_EXTENSION))
}
