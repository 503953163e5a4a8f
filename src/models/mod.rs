// src/models/mod.rs

use crate::constants;
use chrono::{DateTime, Utc};
use std::path::PathBuf;

/// 一次已完成的飞行。构造后不再修改。
#[derive(Debug, Clone, PartialEq)]
pub struct FlightRecord {
    pub start_utc: DateTime<Utc>,
    pub airtime_hours: f64,
    pub distance_km: f64,
    pub max_climb: Option<f64>,
    pub max_sink: Option<f64>,
    pub max_altitude: Option<f64>,
    pub score_points: Option<f64>,
}

impl FlightRecord {
    /// 航班记录文件中的一行，缺失的可选字段输出为空。
    pub fn to_row(&self) -> String {
        let optional = |v: Option<f64>| v.map(|x| x.to_string()).unwrap_or_default();
        format!(
            "{},{},{},{},{},{},{}",
            self.start_utc.format(constants::format::LOGBOOK_DATETIME),
            self.airtime_hours,
            self.distance_km,
            optional(self.max_climb),
            optional(self.max_sink),
            optional(self.max_altitude),
            optional(self.score_points),
        )
    }
}

/// 单次轨迹下载的状态机:
/// `Idle -> Triggered -> WaitingForCompletion -> Settling -> Verifying -> {Renamed | Escalated}`
/// 静置后若又出现未完成文件，会从 `Settling` 回到 `WaitingForCompletion`。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadPhase {
    Idle,
    Triggered,
    WaitingForCompletion,
    Settling,
    Verifying,
    Renamed,
    Escalated,
}

impl DownloadPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, DownloadPhase::Renamed | DownloadPhase::Escalated)
    }
}

/// 正在进行中的一次下载，不会跨航班复用。
#[derive(Debug, Clone)]
pub struct PendingDownload {
    pub expected_final_name: PathBuf,
    pub source_url: String,
    pub phase: DownloadPhase,
}

impl PendingDownload {
    pub fn new(expected_final_name: PathBuf, source_url: String) -> Self {
        Self {
            expected_final_name,
            source_url,
            phase: DownloadPhase::Idle,
        }
    }

    pub fn advance(&mut self, next: DownloadPhase) {
        log::debug!(
            "下载 '{}' 状态: {:?} -> {:?}",
            self.expected_final_name.display(),
            self.phase,
            next
        );
        self.phase = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_row_leaves_missing_optionals_empty() {
        let record = FlightRecord {
            start_utc: Utc.with_ymd_and_hms(2023, 7, 12, 12, 5, 0).unwrap(),
            airtime_hours: 1.5,
            distance_km: 87.4,
            max_climb: None,
            max_sink: None,
            max_altitude: Some(2810.0),
            score_points: None,
        };
        assert_eq!(record.to_row(), "12/07/2023 12:05,1.5,87.4,,,2810,");
    }

    #[test]
    fn test_pending_download_phases() {
        let mut pending = PendingDownload::new(PathBuf::from("a.igc"), "http://x".into());
        assert_eq!(pending.phase, DownloadPhase::Idle);
        pending.advance(DownloadPhase::Triggered);
        assert!(!pending.phase.is_terminal());
        pending.advance(DownloadPhase::Escalated);
        assert!(pending.phase.is_terminal());
    }
}
