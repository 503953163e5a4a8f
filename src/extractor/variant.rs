// src/extractor/variant.rs

use crate::cli::PageVariant;

/// 标签对应的记录字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSlot {
    /// `日期 时间 偏移` 组合字段
    Start,
    Airtime,
    Distance,
    MaxClimb,
    MaxSink,
    MaxAltitude,
    Score,
}

impl FieldSlot {
    pub fn name(&self) -> &'static str {
        match self {
            FieldSlot::Start => "start_utc",
            FieldSlot::Airtime => "airtime_hours",
            FieldSlot::Distance => "distance_km",
            FieldSlot::MaxClimb => "max_climb",
            FieldSlot::MaxSink => "max_sink",
            FieldSlot::MaxAltitude => "max_altitude",
            FieldSlot::Score => "score_points",
        }
    }
}

/// 需要点击后才显示的详情标签页
#[derive(Debug, Clone, Copy)]
pub struct DetailTab {
    pub link_text: &'static str,
    pub container_class: &'static str,
}

/// 一种页面版式的解析配置。两种版式共用同一套解析流程，只有这里的取值不同。
#[derive(Debug, Clone, Copy)]
pub struct VariantConfig {
    pub name: &'static str,
    /// 页面加载完成的标志
    pub ready_class: &'static str,
    pub summary_table: &'static str,
    pub summary_fields: &'static [(&'static str, FieldSlot)],
    pub detail_tab: Option<DetailTab>,
    /// 没有详情标签页时，详情表格从概要页面的同一份标记中读取
    pub detail_table: &'static str,
    pub detail_fields: &'static [(&'static str, FieldSlot)],
}

pub static DETAIL_PAGE: VariantConfig = VariantConfig {
    name: "detail",
    ready_class: "XCbaseInfo",
    summary_table: "table.XCinfo",
    summary_fields: &[("date :", FieldSlot::Start), ("points :", FieldSlot::Score)],
    detail_tab: Some(DetailTab {
        link_text: "Flight",
        container_class: "XCslotFlightTabs",
    }),
    detail_table: "div.XCslotFlightTabs table.XCinfo",
    detail_fields: &[
        ("airtime :", FieldSlot::Airtime),
        ("free distance :", FieldSlot::Distance),
        ("max. climb :", FieldSlot::MaxClimb),
        ("max. sink :", FieldSlot::MaxSink),
        ("max. altitude :", FieldSlot::MaxAltitude),
    ],
};

pub static PLACE_PAGE: VariantConfig = VariantConfig {
    name: "place",
    ready_class: "XCslotPlaceFlight",
    summary_table: "div.XCslotPlaceFlight table",
    summary_fields: &[("date", FieldSlot::Start)],
    detail_tab: None,
    detail_table: "div.XCslotPlaceFlight table",
    detail_fields: &[
        ("airtime", FieldSlot::Airtime),
        ("free distance", FieldSlot::Distance),
    ],
};

impl VariantConfig {
    pub fn for_variant(variant: PageVariant) -> &'static VariantConfig {
        match variant {
            PageVariant::Detail => &DETAIL_PAGE,
            PageVariant::Place => &PLACE_PAGE,
        }
    }
}
