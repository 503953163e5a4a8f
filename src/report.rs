// src/report.rs

use crate::{symbols, ui};
use colored::*;
use log::info;
use std::collections::HashMap;

#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub struct CrawlStats {
    pub pilots: usize,
    pub recorded: usize,
    pub failed: usize,
    pub tracks: usize,
    pub aborted_pilots: usize,
}

/// 整次抓取的统计与失败明细
#[derive(Default)]
pub struct CrawlReport {
    stats: CrawlStats,
    failed_flights: Vec<(String, String)>,
    aborted_pilots: Vec<(String, String)>,
}

impl CrawlReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_pilot(&mut self, pilot: &str) {
        info!("开始抓取飞行员: {}", pilot);
        self.stats.pilots += 1;
    }

    pub fn record_flight(&mut self) {
        self.stats.recorded += 1;
    }

    pub fn record_track(&mut self) {
        self.stats.tracks += 1;
    }

    pub fn record_failure(&mut self, flight_url: &str, reason: &str) {
        log::error!("航班 '{}' 处理失败: {}", flight_url, reason);
        self.stats.failed += 1;
        self.failed_flights
            .push((flight_url.to_string(), reason.to_string()));
    }

    pub fn record_aborted_pilot(&mut self, pilot: &str, reason: &str) {
        log::error!("飞行员 '{}' 的抓取已中止: {}", pilot, reason);
        self.stats.aborted_pilots += 1;
        self.aborted_pilots
            .push((pilot.to_string(), reason.to_string()));
    }

    pub fn stats(&self) -> &CrawlStats {
        &self.stats
    }

    pub fn all_pilots_completed(&self) -> bool {
        self.stats.aborted_pilots == 0
    }

    pub fn print_report(&self) {
        let stats = &self.stats;
        info!(
            "抓取报告: Pilots={}, Recorded={}, Failed={}, Tracks={}, Aborted={}",
            stats.pilots, stats.recorded, stats.failed, stats.tracks, stats.aborted_pilots
        );

        if !self.failed_flights.is_empty() || !self.aborted_pilots.is_empty() {
            ui::print_sub_header("失败详情报告");
            if !self.failed_flights.is_empty() {
                println!("\n{} 失败的航班 ({}个):", *symbols::WARN, stats.failed);
                print_grouped_report(&self.failed_flights, |s| s.yellow());
            }
            if !self.aborted_pilots.is_empty() {
                println!("\n{} 中止的飞行员 ({}个):", *symbols::ERROR, stats.aborted_pilots);
                print_grouped_report(&self.aborted_pilots, |s| s.red());
            }
        }
        ui::print_sub_header("任务总结");
        let summary = format!(
            "{} | {} | {} | {}",
            format!("记录航班: {}", stats.recorded).green(),
            format!("下载轨迹: {}", stats.tracks).cyan(),
            format!("失败航班: {}", stats.failed).yellow(),
            format!("中止飞行员: {}", stats.aborted_pilots).red()
        );
        println!("{}", summary);
    }
}

fn print_grouped_report(
    items: &[(String, String)],
    color_fn: fn(ColoredString) -> ColoredString,
) {
    let mut grouped: HashMap<&String, Vec<&String>> = HashMap::new();
    for (name, reason) in items {
        grouped.entry(reason).or_default().push(name);
    }
    let mut sorted_reasons: Vec<_> = grouped.keys().copied().collect();
    sorted_reasons.sort();
    for reason in sorted_reasons {
        println!("  - {}", color_fn(format!("原因: {}", reason).into()));
        if let Some(names) = grouped.get(reason) {
            for name in names {
                println!("    - {}", name);
            }
        }
    }
}
