// src/extractor/flight.rs

use super::{
    fields::{
        TableRow, find_value, normalize_label, parse_duration_hours, parse_local_datetime,
        parse_number, table_rows,
    },
    timezone::{UtcConversion, normalize_start},
    variant::{FieldSlot, VariantConfig},
};
use crate::{
    browser::{Browser, Locator},
    constants,
    error::*,
    models::FlightRecord,
};
use log::{debug, trace, warn};
use std::{collections::HashMap, time::Duration};

/// 逐字段收集中的记录，所有字段都可能暂缺。
#[derive(Debug, Default)]
struct RecordDraft {
    start: Option<UtcConversion>,
    airtime_hours: Option<f64>,
    distance_km: Option<f64>,
    max_climb: Option<f64>,
    max_sink: Option<f64>,
    max_altitude: Option<f64>,
    score_points: Option<f64>,
}

impl RecordDraft {
    /// 写入一个字段；值无法解析时保持原值并返回 `false`。
    fn apply(&mut self, slot: FieldSlot, value: &str) -> bool {
        fn set(target: &mut Option<f64>, parsed: Option<f64>) -> bool {
            if parsed.is_some() {
                *target = parsed;
            }
            parsed.is_some()
        }

        match slot {
            FieldSlot::Start => match parse_start(value) {
                Some(start) => {
                    self.start = Some(start);
                    true
                }
                None => false,
            },
            FieldSlot::Airtime => set(&mut self.airtime_hours, parse_duration_hours(value)),
            FieldSlot::Distance => set(&mut self.distance_km, parse_number(value)),
            FieldSlot::MaxClimb => set(&mut self.max_climb, parse_number(value)),
            FieldSlot::MaxSink => set(&mut self.max_sink, parse_number(value)),
            FieldSlot::MaxAltitude => set(&mut self.max_altitude, parse_number(value)),
            FieldSlot::Score => set(&mut self.score_points, parse_number(value)),
        }
    }

    fn finish(self) -> AppResult<FlightRecord> {
        let start = self
            .start
            .ok_or(AppError::MissingField(FieldSlot::Start.name()))?;
        let airtime_hours = self
            .airtime_hours
            .ok_or(AppError::MissingField(FieldSlot::Airtime.name()))?;
        let distance_km = self
            .distance_km
            .ok_or(AppError::MissingField(FieldSlot::Distance.name()))?;

        Ok(FlightRecord {
            start_utc: start.utc(),
            airtime_hours,
            distance_km,
            max_climb: self.max_climb,
            max_sink: self.max_sink,
            max_altitude: self.max_altitude,
            score_points: self.score_points,
        })
    }
}

/// `12.07.2023 14:05 +02:00=UTC` -> UTC 时间。日期或时间无法解析时返回 `None`。
fn parse_start(value: &str) -> Option<UtcConversion> {
    let mut tokens = value.split_whitespace();
    let date = tokens.next()?;
    let time = tokens.next()?;
    let offset = tokens.collect::<Vec<_>>().join(" ");
    let local = parse_local_datetime(date, time, constants::format::DISPLAYED_DATETIME)?;
    Some(normalize_start(local, &offset))
}

pub struct FlightRecordBuilder {
    config: &'static VariantConfig,
    element_timeout: Duration,
}

impl FlightRecordBuilder {
    pub fn new(config: &'static VariantConfig) -> Self {
        Self {
            config,
            element_timeout: Duration::from_secs(constants::DEFAULT_ELEMENT_TIMEOUT_SECS),
        }
    }

    pub fn with_element_timeout(mut self, timeout: Duration) -> Self {
        self.element_timeout = timeout;
        self
    }

    /// 在已打开的航班页面上提取记录。详情版式需要先点开 "Flight" 标签页。
    pub async fn extract(&self, browser: &mut dyn Browser) -> AppResult<FlightRecord> {
        browser
            .wait_for(&Locator::class(self.config.ready_class), self.element_timeout)
            .await?;
        let summary_html = browser.page_source().await?;

        let detail_html = match self.config.detail_tab {
            Some(tab) => {
                browser.click(&Locator::link_text(tab.link_text)).await?;
                browser
                    .wait_for(&Locator::class(tab.container_class), self.element_timeout)
                    .await?;
                browser.page_source().await?
            }
            None => summary_html.clone(),
        };

        self.build(&summary_html, &detail_html)
    }

    pub fn build(&self, summary_html: &str, detail_html: &str) -> AppResult<FlightRecord> {
        let summary_rows = table_rows(summary_html, self.config.summary_table)?;
        let detail_rows = table_rows(detail_html, self.config.detail_table)?;
        debug!(
            "[{}] 概要表 {} 行，详情表 {} 行",
            self.config.name,
            summary_rows.len(),
            detail_rows.len()
        );
        self.build_from_rows(&summary_rows, &detail_rows)
    }

    pub fn build_from_rows(
        &self,
        summary_rows: &[TableRow],
        detail_rows: &[TableRow],
    ) -> AppResult<FlightRecord> {
        let mut draft = RecordDraft::default();

        // 概要表: 按标签逐个查找
        for (label, slot) in self.config.summary_fields {
            match find_value(summary_rows, label) {
                Some(value) => {
                    if !draft.apply(*slot, value) {
                        warn!("字段 '{}' 的值 '{}' 无法解析", slot.name(), value);
                    }
                }
                None => debug!("概要表中没有标签 '{}'", label),
            }
        }

        // 详情表: 逐行按标签分派，未知标签忽略
        let dispatch: HashMap<String, FieldSlot> = self
            .config
            .detail_fields
            .iter()
            .map(|(label, slot)| (normalize_label(label), *slot))
            .collect();
        for row in detail_rows {
            let Some(slot) = dispatch.get(&normalize_label(&row.label)) else {
                trace!("忽略未知标签 '{}'", row.label);
                continue;
            };
            if !draft.apply(*slot, &row.value) {
                warn!("字段 '{}' 的值 '{}' 无法解析", slot.name(), row.value);
            }
        }

        draft.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::variant::{DETAIL_PAGE, PLACE_PAGE};
    use chrono::{TimeZone, Utc};

    fn summary() -> Vec<TableRow> {
        vec![
            TableRow::new("pilot :", "Someone"),
            TableRow::new("date :", "12.07.2023 14:05 +02:00=UTC"),
            TableRow::new("points :", "112.35 p."),
        ]
    }

    fn detail() -> Vec<TableRow> {
        vec![
            TableRow::new("airtime :", "02:15:30 h"),
            TableRow::new("launch :", "Someplace"),
            TableRow::new("free distance :", "87.4 km"),
            TableRow::new("max. climb :", "+4.6 m/s"),
            TableRow::new("max. sink :", "-3.9 m/s"),
            TableRow::new("max. altitude :", "2810 m"),
        ]
    }

    #[test]
    fn test_builds_complete_record() {
        let record = FlightRecordBuilder::new(&DETAIL_PAGE)
            .build_from_rows(&summary(), &detail())
            .unwrap();
        assert_eq!(record.start_utc, Utc.with_ymd_and_hms(2023, 7, 12, 12, 5, 0).unwrap());
        assert!((record.airtime_hours - 2.2583).abs() < 1e-4);
        assert_eq!(record.distance_km, 87.4);
        assert_eq!(record.max_climb, Some(4.6));
        assert_eq!(record.max_sink, Some(-3.9));
        assert_eq!(record.max_altitude, Some(2810.0));
        assert_eq!(record.score_points, Some(112.35));
    }

    #[test]
    fn test_missing_optional_field_is_none() {
        let rows: Vec<TableRow> = detail()
            .into_iter()
            .filter(|r| r.label != "max. climb :")
            .collect();
        let record = FlightRecordBuilder::new(&DETAIL_PAGE)
            .build_from_rows(&summary(), &rows)
            .unwrap();
        assert_eq!(record.max_climb, None);
        assert_eq!(record.max_sink, Some(-3.9));
    }

    #[test]
    fn test_missing_distance_is_fatal() {
        let rows: Vec<TableRow> = detail()
            .into_iter()
            .filter(|r| r.label != "free distance :")
            .collect();
        let result = FlightRecordBuilder::new(&DETAIL_PAGE).build_from_rows(&summary(), &rows);
        assert!(matches!(result, Err(AppError::MissingField("distance_km"))));
    }

    #[test]
    fn test_unparsable_date_counts_as_missing() {
        let summary = vec![TableRow::new("date :", "yesterday afternoon")];
        let result = FlightRecordBuilder::new(&DETAIL_PAGE).build_from_rows(&summary, &detail());
        assert!(matches!(result, Err(AppError::MissingField("start_utc"))));
    }

    #[test]
    fn test_rows_in_any_order_and_label_style() {
        let detail = vec![
            TableRow::new("Free Distance:", "12 km"),
            TableRow::new("AIRTIME", "0:45:00"),
        ];
        let record = FlightRecordBuilder::new(&DETAIL_PAGE)
            .build_from_rows(&summary(), &detail)
            .unwrap();
        assert_eq!(record.airtime_hours, 0.75);
        assert_eq!(record.distance_km, 12.0);
    }

    #[test]
    fn test_place_variant_leaves_extended_stats_empty() {
        let rows = vec![
            TableRow::new("date", "03.05.2022 11:20 ?=UTC"),
            TableRow::new("airtime", "1:30:00"),
            TableRow::new("free distance", "33.1 km"),
        ];
        let record = FlightRecordBuilder::new(&PLACE_PAGE)
            .build_from_rows(&rows, &rows)
            .unwrap();
        // 偏移量缺失时按零偏移处理
        assert_eq!(record.start_utc, Utc.with_ymd_and_hms(2022, 5, 3, 11, 20, 0).unwrap());
        assert_eq!(record.airtime_hours, 1.5);
        assert_eq!(record.max_climb, None);
        assert_eq!(record.max_altitude, None);
        assert_eq!(record.score_points, None);
    }
}
