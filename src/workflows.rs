// src/workflows.rs

use crate::{
    browser::{Browser, Locator},
    config::AppConfig,
    constants::site::listing,
    downloader::TrackDownloader,
    error::{AppError, AppResult},
    extractor::{
        FlightRecordBuilder, VariantConfig,
        listing::{flight_links, year_options},
    },
    logbook::PilotLogbook,
    report::CrawlReport,
    symbols, ui, utils,
};
use itertools::Itertools;
use log::{debug, info, warn};
use std::{
    path::Path,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};
use url::Url;

/// 读取飞行员列表: 命令行参数在前，文件内容在后；忽略空行与 `#` 注释，去重并保持顺序。
pub fn collect_pilots(cli_pilots: &[String], pilots_file: Option<&Path>) -> AppResult<Vec<String>> {
    let mut pilots: Vec<String> = cli_pilots.iter().map(|p| p.trim().to_string()).collect();
    if let Some(path) = pilots_file {
        let content = std::fs::read_to_string(path).map_err(|e| {
            log::error!("读取飞行员列表文件 '{}' 失败: {}", path.display(), e);
            AppError::from(e)
        })?;
        pilots.extend(
            content
                .lines()
                .map(str::trim)
                .filter(|line| !line.starts_with('#'))
                .map(String::from),
        );
    }
    Ok(pilots.into_iter().filter(|p| !p.is_empty()).unique().collect())
}

/// 单个航班的处理结果。记录提取类的失败只跳过该航班。
#[derive(Debug)]
enum FlightOutcome {
    Recorded { track_saved: bool },
    Skipped(String),
}

/// 顺序抓取：一次只处理一个飞行员、一个年份、一个航班。
pub struct PilotCrawler {
    config: Arc<AppConfig>,
    builder: FlightRecordBuilder,
    downloader: Option<TrackDownloader>,
    cancellation_token: Arc<AtomicBool>,
}

impl PilotCrawler {
    pub fn new(config: Arc<AppConfig>, cancellation_token: Arc<AtomicBool>) -> Self {
        let builder = FlightRecordBuilder::new(VariantConfig::for_variant(config.variant))
            .with_element_timeout(config.element_timeout);
        let downloader = config
            .download_tracks
            .then(|| TrackDownloader::new(config.download.clone()));
        Self {
            config,
            builder,
            downloader,
            cancellation_token,
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancellation_token.load(Ordering::Relaxed)
    }

    /// 依次抓取所有飞行员。单个飞行员中止不影响后续飞行员；
    /// 用户中断时立即停止并返回已有的统计。
    pub async fn crawl_all(&self, browser: &mut dyn Browser, pilots: &[String]) -> CrawlReport {
        let mut report = CrawlReport::new();
        ui::print_header(&format!(
            "开始抓取 {} 位飞行员的航班 (按 {} 可随时停止)",
            pilots.len(),
            *symbols::CTRL_C
        ));

        for (i, pilot) in pilots.iter().enumerate() {
            if self.is_cancelled() {
                break;
            }
            if i > 0 {
                utils::jittered_pause(self.config.pilot_pause).await;
            }
            ui::print_sub_header(&format!("飞行员 {}/{} - {}", i + 1, pilots.len(), pilot));
            report.start_pilot(pilot);

            match self.crawl_pilot(browser, pilot, &mut report).await {
                Ok(()) => {}
                Err(AppError::UserInterrupt) => {
                    warn!("飞行员 '{}' 的抓取被用户中断", pilot);
                    break;
                }
                Err(e) => {
                    ui::error(&format!("飞行员 '{}' 的抓取已中止: {}", pilot, e));
                    report.record_aborted_pilot(pilot, &e.to_string());
                }
            }
        }
        report
    }

    /// 抓取一个飞行员的全部年份。返回错误表示该飞行员被中止，已写入的行保留。
    pub async fn crawl_pilot(
        &self,
        browser: &mut dyn Browser,
        pilot: &str,
        report: &mut CrawlReport,
    ) -> AppResult<()> {
        let mut logbook = PilotLogbook::create(&self.config.output_dir, pilot)?;
        let pilot_url = self.config.pilot_url(pilot);
        browser.goto(&pilot_url).await?;

        let pilot_page_url = browser.current_url().await?;
        let years = year_options(&browser.page_source().await?)?;
        debug!("飞行员 '{}' 共有 {} 个年份", pilot, years.len());

        if years.is_empty() {
            warn!("飞行员页面 '{}' 没有年份列表，直接读取当前页面的航班", pilot_url);
            self.crawl_listing(browser, pilot, &mut logbook, report).await?;
        }
        for year in &years {
            let year_url = Url::parse(&pilot_page_url)?.join(&year.url)?;
            info!("飞行员 '{}' 年份 {}: {}", pilot, year.year, year_url);
            browser.goto(year_url.as_str()).await?;
            self.crawl_listing(browser, &year.year.to_string(), &mut logbook, report)
                .await?;
        }

        ui::success(&format!(
            "'{}' 共写入 {} 条记录 -> {}",
            pilot,
            logbook.rows(),
            logbook.path().display()
        ));
        Ok(())
    }

    /// 处理当前已打开的航班列表页。
    async fn crawl_listing(
        &self,
        browser: &mut dyn Browser,
        label: &str,
        logbook: &mut PilotLogbook,
        report: &mut CrawlReport,
    ) -> AppResult<()> {
        if let Err(e) = browser
            .wait_for(&Locator::class(listing::CONTAINER_CLASS), self.config.element_timeout)
            .await
        {
            warn!("航班列表 '{}' 不可用，跳过: {}", label, e);
            return Ok(());
        }
        let listing_url = Url::parse(&browser.current_url().await?)?;
        let links = flight_links(
            &browser.page_source().await?,
            listing::LINK_CLASS,
            listing::LINK_TITLE,
        )?
        .into_iter()
        .map(|href| listing_url.join(&href).map(|u| u.to_string()))
        .collect::<Result<Vec<_>, _>>()?;
        if links.is_empty() {
            debug!("航班列表 '{}' 为空", label);
            return Ok(());
        }

        let pbar = ui::new_tasks_progress_bar(links.len() as u64, label);
        let result: AppResult<()> = async {
            for link in &links {
                if self.is_cancelled() {
                    return Err(AppError::UserInterrupt);
                }
                pbar.set_message(utils::truncate_text(link, 40));
                match self.crawl_flight(browser, link, logbook).await? {
                    FlightOutcome::Recorded { track_saved } => {
                        report.record_flight();
                        if track_saved {
                            report.record_track();
                        }
                    }
                    FlightOutcome::Skipped(reason) => {
                        pbar.suspend(|| {
                            ui::warn(&format!("跳过航班 {}: {}", link, reason));
                        });
                        report.record_failure(link, &reason);
                    }
                }
                pbar.inc(1);
            }
            Ok::<(), AppError>(())
        }
        .await;
        pbar.finish_and_clear();
        result
    }

    /// 返回 `Err` 仅限于必须中止当前飞行员的情况。
    async fn crawl_flight(
        &self,
        browser: &mut dyn Browser,
        flight_url: &str,
        logbook: &mut PilotLogbook,
    ) -> AppResult<FlightOutcome> {
        if let Err(e) = browser.goto(flight_url).await {
            return Ok(FlightOutcome::Skipped(e.to_string()));
        }
        let record = match self.builder.extract(browser).await {
            Ok(record) => record,
            Err(e) => return Ok(FlightOutcome::Skipped(e.to_string())),
        };

        let mut track_saved = false;
        if let Some(downloader) = &self.downloader {
            match downloader.download(browser, record.start_utc).await {
                Ok(path) => {
                    debug!("{} {}", *symbols::TRACK, path.display());
                    track_saved = true;
                }
                Err(e) if e.is_pilot_fatal() => return Err(e),
                Err(e) => return Ok(FlightOutcome::Skipped(e.to_string())),
            }
        }

        logbook.append(&record)?;
        debug!("已记录航班 {}: {}", flight_url, record.to_row());
        Ok(FlightOutcome::Recorded { track_saved })
    }
}
