// src/cli.rs

use crate::constants;
use clap::{Parser, ValueEnum, command, crate_version};
use std::path::PathBuf;

/// 定义日志输出级别
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// 航班详情页的版式
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum PageVariant {
    /// 标准航班详情页 (带 "Flight" 标签页)
    #[default]
    Detail,
    /// 场地航班页 (无爬升/下沉/高度/积分)
    Place,
}

#[derive(Parser, Debug, Clone)]
#[command(
    version = crate_version!(),
    about,
    long_about = None,
    arg_required_else_help = true,
    disable_help_flag = true,
    disable_version_flag = true,
)]
#[command(group(
    clap::ArgGroup::new("mode")
        .required(true)
        .multiple(true)
        .args(&["pilot", "pilots_file"]),
))]
pub struct Cli {
    // --- 运行模式 (Mode) ---
    /// 要抓取的飞行员用户名 (可重复指定)
    #[arg(short, long, value_name = "NAME", help_heading = "Mode")]
    pub pilot: Vec<String>,
    /// 从文本文件读取飞行员列表 (每行一个)
    #[arg(short = 'f', long, value_name = "FILE", help_heading = "Mode")]
    pub pilots_file: Option<PathBuf>,

    // --- 抓取选项 (Options) ---
    /// 同时下载每个航班的 IGC 轨迹文件
    #[arg(short, long, action = clap::ArgAction::SetTrue, help_heading = "Options")]
    pub download: bool,
    /// 设置航班记录 (.dat) 的保存目录
    #[arg(short, long, value_name = "DIR", default_value_os_t = PathBuf::from(constants::DEFAULT_OUTPUT_DIR), help_heading = "Options")]
    pub output: PathBuf,
    /// 设置轨迹文件的下载目录 (默认: <OUTPUT>/tracks)
    #[arg(long, value_name = "DIR", help_heading = "Options")]
    pub download_dir: Option<PathBuf>,
    /// 等待单个下载完成的最长时间 (秒)
    #[arg(long, value_name = "SECS", help_heading = "Options")]
    pub download_timeout: Option<u64>,
    /// 航班详情页的版式
    #[arg(long, value_enum, default_value_t = PageVariant::Detail, help_heading = "Options")]
    pub variant: PageVariant,
    /// 两个飞行员之间随机暂停的最长时间 (秒)
    #[arg(long, value_name = "SECS", default_value_t = constants::DEFAULT_PILOT_PAUSE_SECS, help_heading = "Options")]
    pub pause: u64,
    /// 覆盖站点根地址
    #[arg(long, value_name = "URL", help_heading = "Options")]
    pub base_url: Option<String>,

    // --- 通用选项 (General) ---
    /// 显示此帮助信息并退出
    #[arg(short = 'h', long, action = clap::ArgAction::Help, global = true, help_heading = "General")]
    _help: Option<bool>,
    /// 显示版本信息并退出
    #[arg(short = 'V', long, action = clap::ArgAction::Version, global = true, help_heading = "General")]
    _version: Option<bool>,
    /// (隐藏参数) 设置日志文件的输出级别，用于调试
    #[arg(long, value_enum, default_value_t = LogLevel::Info, global = true, hide = true)]
    pub log_level: LogLevel,
}
