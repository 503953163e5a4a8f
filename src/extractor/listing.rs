// src/extractor/listing.rs

use super::fields::parse_selector;
use crate::{constants::site::listing, error::*};
use itertools::Itertools;
use scraper::{Html, Selector};
use std::sync::LazyLock;

static OPTION_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("option").unwrap());

/// 年份下拉框中的一项
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearOption {
    pub year: i32,
    pub url: String,
}

/// 飞行员页面上第一个下拉框里的所有年份。
/// 年份取选项文本的最后一个词，选项值是该年份航班列表的 (相对) 地址。
pub fn year_options(html: &str) -> AppResult<Vec<YearOption>> {
    let select = parse_selector(listing::YEAR_SELECT)?;
    let document = Html::parse_document(html);
    let Some(menu) = document.select(&select).next() else {
        return Ok(Vec::new());
    };
    Ok(menu
        .select(&OPTION_SELECTOR)
        .filter_map(|option| {
            let text = option.text().collect::<String>();
            let year: i32 = text.split_whitespace().last()?.parse().ok()?;
            let url = option.value().attr("value")?.trim();
            (!url.is_empty()).then(|| YearOption {
                year,
                url: url.to_string(),
            })
        })
        .collect())
}

/// 年度航班表格中指向航班详情的链接，去重并保持页面顺序。
pub fn flight_links(html: &str, link_class: &str, link_title: &str) -> AppResult<Vec<String>> {
    let selector = parse_selector(&format!(
        "div.{} tbody a.{}[title=\"{}\"]",
        listing::CONTAINER_CLASS,
        link_class,
        link_title
    ))?;
    let document = Html::parse_document(html);
    Ok(document
        .select(&selector)
        .filter_map(|a| a.value().attr("href"))
        .map(|href| href.trim().to_string())
        .filter(|href| !href.is_empty())
        .unique()
        .collect())
}
