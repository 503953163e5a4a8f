// src/extractor/fields.rs

use crate::error::{AppError, AppResult};
use chrono::NaiveDateTime;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

static ROW_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").unwrap());
static TH_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("th").unwrap());
static TD_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td").unwrap());

/// 从信息表中提取出的一行 (标签, 值)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub label: String,
    pub value: String,
}

impl TableRow {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

pub fn parse_selector(selector: &str) -> AppResult<Selector> {
    Selector::parse(selector).map_err(|e| AppError::Selector {
        selector: selector.to_string(),
        reason: format!("{:?}", e),
    })
}

/// 读取页面中第一个匹配 `table_selector` 的表格的所有行。
/// 标签取行内最后一个 `th`，值取第一个 `td`；缺少任意一个的行直接跳过。
pub fn table_rows(html: &str, table_selector: &str) -> AppResult<Vec<TableRow>> {
    let selector = parse_selector(table_selector)?;
    let document = Html::parse_document(html);
    let Some(table) = document.select(&selector).next() else {
        return Ok(Vec::new());
    };
    Ok(table.select(&ROW_SELECTOR).filter_map(row_pair).collect())
}

fn row_pair(row: ElementRef<'_>) -> Option<TableRow> {
    let label = row.select(&TH_SELECTOR).last()?;
    let value = row.select(&TD_SELECTOR).next()?;
    Some(TableRow::new(
        label.text().collect::<String>().trim(),
        value.text().collect::<String>().trim(),
    ))
}

/// 标签归一化: 去首尾空白、转小写、合并连续空白、去掉结尾的冒号。
/// 两种页面一种写 `airtime :`，一种写 `Airtime`，归一化后相同。
pub fn normalize_label(label: &str) -> String {
    let collapsed = label.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed
        .trim_end_matches(':')
        .trim_end()
        .to_lowercase()
}

pub fn find_value<'a>(rows: &'a [TableRow], label: &str) -> Option<&'a str> {
    let wanted = normalize_label(label);
    rows.iter()
        .find(|row| normalize_label(&row.label) == wanted)
        .map(|row| row.value.as_str())
}

/// 取第一个能解析为浮点数的空白分隔片段，如 `"87.4 km"` -> `87.4`。
pub fn parse_number(value: &str) -> Option<f64> {
    value
        .split_whitespace()
        .find_map(|token| token.parse::<f64>().ok().filter(|n| n.is_finite()))
}

/// 将 `H:MM:SS` 转换为小时数。先累加为整数秒，最后只做一次除法。
pub fn parse_duration_hours(value: &str) -> Option<f64> {
    value
        .split_whitespace()
        .find_map(duration_seconds)
        .map(|secs| secs as f64 / 3600.0)
}

fn duration_seconds(token: &str) -> Option<u64> {
    let mut parts = token.split(':');
    let (h, m, s) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }
    let h: u64 = h.parse().ok()?;
    let m: u64 = m.parse().ok()?;
    let s: u64 = s.parse().ok()?;
    if m >= 60 || s >= 60 {
        return None;
    }
    h.checked_mul(3600)?.checked_add(m * 60 + s)
}

pub fn parse_local_datetime(date: &str, time: &str, format: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(&format!("{} {}", date, time), format).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_label_tolerates_both_styles() {
        assert_eq!(normalize_label("airtime :"), "airtime");
        assert_eq!(normalize_label("  Airtime"), "airtime");
        assert_eq!(normalize_label("Max.  Climb:"), "max. climb");
        assert_eq!(normalize_label("free distance :"), normalize_label("Free Distance"));
    }

    #[test]
    fn test_find_value_missing_label_is_none() {
        let rows = vec![
            TableRow::new("airtime :", "02:15:30 h"),
            TableRow::new("free distance :", "87.4 km"),
        ];
        assert_eq!(find_value(&rows, "Free distance"), Some("87.4 km"));
        assert_eq!(find_value(&rows, "max. climb :"), None);
    }

    #[test]
    fn test_parse_number_takes_first_numeric_token() {
        assert_eq!(parse_number("87.4 km"), Some(87.4));
        assert_eq!(parse_number("+3.6 m/s"), Some(3.6));
        assert_eq!(parse_number("-4.2 m/s"), Some(-4.2));
        assert_eq!(parse_number("approx 12 p."), Some(12.0));
        assert_eq!(parse_number("n/a"), None);
        assert_eq!(parse_number(""), None);
    }

    #[test]
    fn test_parse_duration_boundaries() {
        assert_eq!(parse_duration_hours("0:00:00"), Some(0.0));
        assert_eq!(parse_duration_hours("1:30:00"), Some(1.5));
        assert_eq!(parse_duration_hours("23:59:59"), Some(86399.0 / 3600.0));
        let airtime = parse_duration_hours("02:15:30 h").unwrap();
        assert!((airtime - 2.258333).abs() < 1e-6);
    }

    #[test]
    fn test_parse_duration_rejects_malformed() {
        assert_eq!(parse_duration_hours("1:75:00"), None);
        assert_eq!(parse_duration_hours("1:30"), None);
        assert_eq!(parse_duration_hours("a:b:c"), None);
        // 小时数过大时不溢出，按无法解析处理
        assert_eq!(parse_duration_hours("9999999999999999:00:00 h"), None);
        assert_eq!(parse_duration_hours(&format!("{}:00:00", u64::MAX)), None);
    }

    #[test]
    fn test_table_rows_skips_incomplete_rows() {
        let html = r#"
            <table class="XCinfo"><tbody>
              <tr><th>date :</th><td> 12.07.2023 14:05 +02:00=UTC </td></tr>
              <tr><td colspan="2">no header</td></tr>
              <tr><th></th><th>points :</th><td>45.3 p.</td></tr>
            </tbody></table>"#;
        let rows = table_rows(html, "table.XCinfo").unwrap();
        assert_eq!(
            rows,
            vec![
                TableRow::new("date :", "12.07.2023 14:05 +02:00=UTC"),
                TableRow::new("points :", "45.3 p."),
            ]
        );
    }

    #[test]
    fn test_table_rows_without_table_is_empty() {
        assert!(table_rows("<p>nothing</p>", "table.XCinfo").unwrap().is_empty());
        assert!(matches!(
            table_rows("<p></p>", "table[["),
            Err(AppError::Selector { .. })
        ));
    }
}
