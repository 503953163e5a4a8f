// src/error.rs

use std::{path::PathBuf, time::Duration};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("页面缺少必填字段 '{0}'")]
    MissingField(&'static str),
    #[error("页面元素未出现: {0}")]
    ElementNotFound(String),
    #[error("无效的选择器 '{selector}': {reason}")]
    Selector { selector: String, reason: String },
    #[error("下载停滞: 等待 {waited:?} 后仍存在未完成的传输 (来源: {url})，需要人工处理")]
    StalledTransfer { url: String, waited: Duration },
    #[error("浏览器直接打开了轨迹文件 '{current_url}' 而不是下载 (来源: {url})，请手动将文件保存为 '{}'", .expected.display())]
    MisroutedDownload {
        url: String,
        current_url: String,
        expected: PathBuf,
    },
    #[error("未在下载目录中找到新下载的文件 (来源: {url})，请手动将文件保存为 '{}'", .expected.display())]
    ArtifactMissing { url: String, expected: PathBuf },
    #[error("目标文件 '{}' 已存在，拒绝覆盖", .0.display())]
    Collision(PathBuf),
    #[error("重命名后目标文件 '{}' 不存在", .0.display())]
    RenameVerification(PathBuf),
    #[error("网络请求失败: {0}")]
    Network(#[from] reqwest::Error),
    #[error("网络中间件错误: {0}")]
    NetworkMiddleware(#[from] reqwest_middleware::Error),
    #[error("I/O 错误: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON 解析错误: {0}")]
    Json(#[from] serde_json::Error),
    #[error("URL 解析错误: {0}")]
    Url(#[from] url::ParseError),
    #[error("用户中断")]
    UserInterrupt,
    #[error("{0}")] // 只打印内部信息，不加任何前缀
    UserInputError(String),
    #[error("未知错误: {0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// 下载环节的异常都需要人工介入，遇到后必须停止处理当前飞行员。
    pub fn is_pilot_fatal(&self) -> bool {
        matches!(
            self,
            AppError::StalledTransfer { .. }
                | AppError::MisroutedDownload { .. }
                | AppError::ArtifactMissing { .. }
                | AppError::Collision(_)
                | AppError::RenameVerification(_)
                | AppError::UserInterrupt
        )
    }
}

pub type AppResult<T> = Result<T, AppError>;
