// src/extractor/timezone.rs

use crate::constants;
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use log::warn;

/// 本地时间换算为 UTC 的结果。
/// 偏移量无法解析时按零偏移处理，本地时间原样当作 UTC，并以 `Recovered` 标明。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UtcConversion {
    Exact(DateTime<Utc>),
    Recovered { utc: DateTime<Utc>, reason: String },
}

impl UtcConversion {
    pub fn utc(&self) -> DateTime<Utc> {
        match self {
            UtcConversion::Exact(utc) | UtcConversion::Recovered { utc, .. } => *utc,
        }
    }

    pub fn is_recovered(&self) -> bool {
        matches!(self, UtcConversion::Recovered { .. })
    }
}

/// 解析 `±H:MM=UTC` 形式的偏移标注，返回本地时间相对 UTC 的超前量。
/// `+02:00` 表示本地比 UTC 快两小时，返回 `+2h`。
pub fn parse_utc_offset(annotation: &str) -> Result<Duration, String> {
    let raw = annotation.trim();
    let body = raw.strip_suffix(constants::format::UTC_SUFFIX).unwrap_or(raw);
    let (sign, magnitude) = match body.chars().next() {
        Some('+') => (1, &body[1..]),
        Some('-') => (-1, &body[1..]),
        _ => return Err(format!("偏移量 '{}' 缺少符号", annotation)),
    };
    let (h, m) = magnitude
        .split_once(':')
        .ok_or_else(|| format!("偏移量 '{}' 不是 H:MM 格式", annotation))?;
    let is_digits = |s: &str| (1..=2).contains(&s.len()) && s.bytes().all(|b| b.is_ascii_digit());
    if !is_digits(h) || !is_digits(m) {
        return Err(format!("偏移量 '{}' 不是 H:MM 格式", annotation));
    }
    let hours: i64 = h
        .parse()
        .map_err(|_| format!("偏移量 '{}' 的小时部分无效", annotation))?;
    let minutes: i64 = m
        .parse()
        .map_err(|_| format!("偏移量 '{}' 的分钟部分无效", annotation))?;
    if !(0..24).contains(&hours) || !(0..60).contains(&minutes) {
        return Err(format!("偏移量 '{}' 超出范围", annotation));
    }
    Ok(Duration::minutes(sign * (hours * 60 + minutes)))
}

/// 本地显示时间 + 偏移标注 -> UTC。`+H:MM` 减去偏移，`-H:MM` 加上偏移。
pub fn normalize_start(local: NaiveDateTime, offset_annotation: &str) -> UtcConversion {
    match parse_utc_offset(offset_annotation) {
        Ok(ahead) => UtcConversion::Exact((local - ahead).and_utc()),
        Err(reason) => {
            warn!("无法解析 UTC 偏移，按零偏移处理: {}", reason);
            UtcConversion::Recovered {
                utc: local.and_utc(),
                reason,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    fn local(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 7, 12)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn test_positive_offset_is_subtracted() {
        let result = normalize_start(local(14, 5), "+02:00=UTC");
        assert_eq!(result, UtcConversion::Exact(Utc.with_ymd_and_hms(2023, 7, 12, 12, 5, 0).unwrap()));
    }

    #[test]
    fn test_negative_offset_is_added() {
        let result = normalize_start(local(22, 30), "-3:30=UTC");
        assert_eq!(result.utc(), Utc.with_ymd_and_hms(2023, 7, 13, 2, 0, 0).unwrap());
        assert!(!result.is_recovered());
    }

    #[test]
    fn test_offset_crossing_midnight_backwards() {
        let result = normalize_start(local(0, 40), "+1:00=UTC");
        assert_eq!(result.utc(), Utc.with_ymd_and_hms(2023, 7, 11, 23, 40, 0).unwrap());
    }

    #[test]
    fn test_zero_offset_is_exact() {
        let result = normalize_start(local(9, 0), "+0:00=UTC");
        assert_eq!(result, UtcConversion::Exact(local(9, 0).and_utc()));
    }

    #[test]
    fn test_malformed_offset_keeps_local_time() {
        for annotation in ["?=UTC", "", "+2=UTC", "02:00=UTC", "+xx:00=UTC", "+2:75=UTC",
            "++2:00=UTC", "-+2:00=UTC", "+2:-5=UTC", "+123:00=UTC", "+ 2:00=UTC",
        ] {
            let result = normalize_start(local(14, 5), annotation);
            assert!(result.is_recovered(), "{annotation} 应当走零偏移回退");
            assert_eq!(result.utc(), local(14, 5).and_utc());
        }
    }
}
