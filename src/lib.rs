// src/lib.rs

pub mod browser;
pub mod cli;
pub mod client;
pub mod config;
pub mod constants;
pub mod downloader;
pub mod error;
pub mod extractor;
pub mod logbook;
pub mod logger;
pub mod models;
pub mod report;
pub mod symbols;
pub mod ui;
pub mod utils;
pub mod workflows;

use crate::{
    browser::HttpBrowser,
    cli::Cli,
    client::RobustClient,
    config::AppConfig,
    error::{AppError, AppResult},
    workflows::PilotCrawler,
};
use anyhow::anyhow;
use log::{debug, info};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

/// 一次抓取运行所需的共享状态
#[derive(Clone)]
pub struct CrawlContext {
    pub config: Arc<AppConfig>,
    pub http_client: Arc<RobustClient>,
    pub args: Arc<Cli>,
    pub cancellation_token: Arc<AtomicBool>,
}

impl CrawlContext {
    pub fn new(
        config: Arc<AppConfig>,
        args: Arc<Cli>,
        cancellation_token: Arc<AtomicBool>,
    ) -> AppResult<Self> {
        let http_client = Arc::new(RobustClient::new(config.clone())?);
        Ok(Self {
            config,
            http_client,
            args,
            cancellation_token,
        })
    }
}

/// 库的公共入口点，由 `main.rs` 调用
pub async fn run_from_cli(args: Arc<Cli>, cancellation_token: Arc<AtomicBool>) -> AppResult<()> {
    debug!("CLI 参数: {:?}", args);
    let config = Arc::new(AppConfig::new(&args)?);
    debug!("加载的应用配置: {:?}", config);

    let pilots = workflows::collect_pilots(&args.pilot, args.pilots_file.as_deref())?;
    if pilots.is_empty() {
        return Err(AppError::UserInputError("飞行员列表为空。".to_string()));
    }
    info!("待抓取飞行员 {} 位，版式: {:?}", pilots.len(), config.variant);

    let context = CrawlContext::new(config, args, cancellation_token)?;
    run_crawl(&context, &pilots).await
}

/// 使用 HTTP 浏览器会话抓取给定的飞行员并打印报告。
pub async fn run_crawl(context: &CrawlContext, pilots: &[String]) -> AppResult<()> {
    std::fs::create_dir_all(&context.config.output_dir)?;
    let absolute_path = dunce::canonicalize(&context.config.output_dir)?;
    info!("航班记录将保存到目录: \"{}\"", absolute_path.display());
    ui::info(&format!("航班记录将保存到目录: \"{}\"", absolute_path.display()));
    if context.config.download_tracks {
        ui::info(&format!(
            "轨迹文件将下载到目录: \"{}\"",
            context.config.download.dir.display()
        ));
    }

    let mut browser = HttpBrowser::from_config(context.http_client.clone(), &context.config);
    let crawler = PilotCrawler::new(context.config.clone(), context.cancellation_token.clone());

    let report = crawler.crawl_all(&mut browser, pilots).await;
    report.print_report();

    if context.cancellation_token.load(Ordering::Relaxed) {
        return Err(AppError::UserInterrupt);
    }
    if !report.all_pilots_completed() {
        return Err(AppError::Other(anyhow!(
            "{} 位飞行员的抓取已中止，需要人工处理。",
            report.stats().aborted_pilots
        )));
    }
    Ok(())
}
