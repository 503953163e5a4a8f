// src/browser/mod.rs

mod directory;
mod http;

pub use directory::{DirEntry, DownloadDir};
pub use http::HttpBrowser;

use crate::error::*;
use async_trait::async_trait;
use std::{fmt, time::Duration};

/// 页面元素的定位方式
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// 文本完全匹配的链接
    LinkText(String),
    /// 带有指定 class 的元素
    Class(String),
}

impl Locator {
    pub fn link_text(text: impl Into<String>) -> Self {
        Locator::LinkText(text.into())
    }

    pub fn class(name: impl Into<String>) -> Self {
        Locator::Class(name.into())
    }

    /// 转换为 CSS 选择器；链接文本无法用 CSS 表达，需要逐个比较文本。
    pub fn css(&self) -> String {
        match self {
            Locator::LinkText(_) => "a".to_string(),
            Locator::Class(name) => format!(".{}", name),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::LinkText(text) => write!(f, "link_text={}", text),
            Locator::Class(name) => write!(f, "class={}", name),
        }
    }
}

/// 已打开的浏览器会话。核心逻辑只通过此接口读取页面和触发点击。
#[async_trait]
pub trait Browser: Send + Sync {
    async fn goto(&mut self, url: &str) -> AppResult<()>;
    async fn page_source(&self) -> AppResult<String>;
    async fn current_url(&self) -> AppResult<String>;
    async fn click(&mut self, locator: &Locator) -> AppResult<()>;
    /// 等待元素出现；超时返回 `AppError::ElementNotFound`。
    async fn wait_for(&mut self, locator: &Locator, timeout: Duration) -> AppResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locator_selector_and_display() {
        assert_eq!(Locator::link_text("IGC").css(), "a");
        assert_eq!(Locator::class("XCbaseInfo").css(), ".XCbaseInfo");
        assert_eq!(Locator::link_text("IGC").to_string(), "link_text=IGC");
        assert_eq!(Locator::class("XCbaseInfo").to_string(), "class=XCbaseInfo");
    }
}
