// tests/common/mod.rs

#![allow(dead_code)]

use async_trait::async_trait;
use std::{path::PathBuf, time::Duration};
use xc_logbook::{
    browser::{Browser, Locator},
    error::{AppError, AppResult},
};

pub fn fixture(name: &str) -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("无法读取测试夹具 {}: {}", path.display(), e))
}

/// 点击下载链接时模拟浏览器的行为
#[derive(Debug, Clone)]
pub enum ClickEffect {
    /// 不产生任何文件
    Nothing,
    /// 立即写入完整文件
    Complete { name: String },
    /// 先写 `<name>.part`，延迟后重命名为 `<name>`
    Delayed { name: String, delay: Duration },
    /// 只留下永不完成的 `<name>.part`
    Stalled { name: String },
    /// 浏览器直接打开了文件
    Navigate { url: String },
    /// 先出现一个空的完成文件，随后开始真正的传输，`delay` 后写入内容
    Restarted { name: String, delay: Duration },
}

/// 基于固定页面标记的浏览器替身
pub struct MockBrowser {
    pub url: String,
    pub page: String,
    pub download_dir: PathBuf,
    pub effect: ClickEffect,
    pub clicks: Vec<Locator>,
}

impl MockBrowser {
    pub fn new(url: &str, page: String, download_dir: PathBuf) -> Self {
        Self {
            url: url.to_string(),
            page,
            download_dir,
            effect: ClickEffect::Nothing,
            clicks: Vec::new(),
        }
    }

    pub fn with_effect(mut self, effect: ClickEffect) -> Self {
        self.effect = effect;
        self
    }

    fn contains(&self, locator: &Locator) -> bool {
        match locator {
            Locator::LinkText(text) => self.page.contains(&format!(">{}<", text)),
            Locator::Class(name) => self.page.contains(&format!("class=\"{}\"", name)),
        }
    }
}

#[async_trait]
impl Browser for MockBrowser {
    async fn goto(&mut self, url: &str) -> AppResult<()> {
        self.url = url.to_string();
        Ok(())
    }

    async fn page_source(&self) -> AppResult<String> {
        Ok(self.page.clone())
    }

    async fn current_url(&self) -> AppResult<String> {
        Ok(self.url.clone())
    }

    async fn click(&mut self, locator: &Locator) -> AppResult<()> {
        if !self.contains(locator) {
            return Err(AppError::ElementNotFound(locator.to_string()));
        }
        self.clicks.push(locator.clone());
        if !matches!(locator, Locator::LinkText(text) if text == "IGC") {
            return Ok(());
        }

        std::fs::create_dir_all(&self.download_dir)?;
        match self.effect.clone() {
            ClickEffect::Nothing => {}
            ClickEffect::Complete { name } => {
                std::fs::write(self.download_dir.join(name), b"AXXX igc\n")?;
            }
            ClickEffect::Delayed { name, delay } => {
                let part = self.download_dir.join(format!("{}.part", name));
                let done = self.download_dir.join(name);
                std::fs::write(&part, b"AXXX igc\n")?;
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    std::fs::rename(part, done).unwrap();
                });
            }
            ClickEffect::Stalled { name } => {
                std::fs::write(self.download_dir.join(format!("{}.part", name)), b"AX")?;
            }
            ClickEffect::Restarted { name, delay } => {
                let part = self.download_dir.join(format!("{}.part", name));
                let done = self.download_dir.join(name);
                std::fs::write(&done, b"")?;
                tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_millis(30)).await;
                    std::fs::write(&part, b"AX").unwrap();
                    tokio::time::sleep(delay).await;
                    std::fs::write(&done, b"AXXX igc\n").unwrap();
                    std::fs::remove_file(part).unwrap();
                });
            }
            ClickEffect::Navigate { url } => {
                self.url = url;
            }
        }
        Ok(())
    }

    async fn wait_for(&mut self, locator: &Locator, _timeout: Duration) -> AppResult<()> {
        if self.contains(locator) {
            Ok(())
        } else {
            Err(AppError::ElementNotFound(locator.to_string()))
        }
    }
}
