// src/browser/http.rs

use super::{Browser, Locator};
use crate::{
    client::RobustClient,
    config::AppConfig,
    error::*,
    extractor::fields::parse_selector,
    utils,
};
use async_trait::async_trait;
use futures::StreamExt;
use log::{debug, error, info};
use percent_encoding::percent_decode_str;
use regex::Regex;
use reqwest::{
    Response,
    header::{CONTENT_DISPOSITION, CONTENT_TYPE, HeaderName},
};
use scraper::{ElementRef, Html};
use std::{
    path::{Path, PathBuf},
    sync::{Arc, LazyLock},
    time::Duration,
};
use tokio::{io::AsyncWriteExt, task::JoinHandle};
use url::Url;

static FILENAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)filename\*?\s*=\s*(?:UTF-8'[^']*')?"?([^";]+)"?"#).unwrap()
});

/// 基于 HTTP 请求的浏览器会话。
///
/// 页面一次性抓取完整标记，标签页切换等客户端操作不需要额外请求。
/// 点击会返回附件的链接时，与真实浏览器一样在后台写入下载目录:
/// 先写 `<name><suffix>`，完成后重命名为 `<name>`。
pub struct HttpBrowser {
    client: Arc<RobustClient>,
    current_url: Option<Url>,
    page: String,
    download_dir: PathBuf,
    in_progress_suffix: String,
    download_mime_types: Vec<String>,
    downloads: Vec<JoinHandle<()>>,
}

impl HttpBrowser {
    pub fn new(
        client: Arc<RobustClient>,
        download_dir: PathBuf,
        in_progress_suffix: String,
        download_mime_types: Vec<String>,
    ) -> Self {
        Self {
            client,
            current_url: None,
            page: String::new(),
            download_dir,
            in_progress_suffix,
            download_mime_types,
            downloads: Vec::new(),
        }
    }

    pub fn from_config(client: Arc<RobustClient>, config: &AppConfig) -> Self {
        Self::new(
            client,
            config.download.dir.clone(),
            config.download.in_progress_suffix.clone(),
            config.download_mime_types.clone(),
        )
    }

    fn resolve(&self, url: &str) -> AppResult<Url> {
        Ok(match &self.current_url {
            Some(current) => current.join(url)?,
            None => Url::parse(url)?,
        })
    }

    /// 附件 (`Content-Disposition: attachment`) 或 "直接保存" 列表中的 MIME 类型会被当作下载处理。
    fn is_download(&self, res: &Response) -> bool {
        let header = |name: HeaderName| {
            res.headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("")
                .to_ascii_lowercase()
        };
        if header(CONTENT_DISPOSITION).trim_start().starts_with("attachment") {
            return true;
        }
        let content_type = header(CONTENT_TYPE);
        let mime = content_type.split(';').next().unwrap_or("").trim();
        self.download_mime_types
            .iter()
            .any(|m| m.eq_ignore_ascii_case(mime))
    }

    fn start_background_download(&mut self, res: Response, source: Url) {
        let file_name = attachment_name(&res);
        let dir = self.download_dir.clone();
        let suffix = self.in_progress_suffix.clone();
        info!("开始后台下载 '{}' -> {}", source, file_name);

        let handle = tokio::spawn(async move {
            match save_attachment(res, &dir, &file_name, &suffix).await {
                Ok(path) => info!("后台下载完成: {}", path.display()),
                Err(e) => error!("后台下载 '{}' 失败: {}", source, e),
            }
        });
        self.downloads.retain(|h| !h.is_finished());
        self.downloads.push(handle);
    }
}

impl Drop for HttpBrowser {
    fn drop(&mut self) {
        for handle in &self.downloads {
            handle.abort();
        }
    }
}

#[async_trait]
impl Browser for HttpBrowser {
    async fn goto(&mut self, url: &str) -> AppResult<()> {
        let target = self.resolve(url)?;
        debug!("打开页面: {}", target);
        let (final_url, body) = self.client.fetch_text(target).await?;
        self.current_url = Some(Url::parse(&final_url)?);
        self.page = body;
        Ok(())
    }

    async fn page_source(&self) -> AppResult<String> {
        Ok(self.page.clone())
    }

    async fn current_url(&self) -> AppResult<String> {
        Ok(self
            .current_url
            .as_ref()
            .map(Url::to_string)
            .unwrap_or_else(|| "about:blank".to_string()))
    }

    async fn click(&mut self, locator: &Locator) -> AppResult<()> {
        let href = locate_href(&self.page, locator)?;
        let Some(href) = href.filter(|h| !is_client_side(h)) else {
            debug!("点击 {} 为页面内操作，无需请求", locator);
            return Ok(());
        };

        let target = self.resolve(&href)?;
        let res = self.client.get(target.clone()).await?;
        if self.is_download(&res) {
            self.start_background_download(res, target);
        } else {
            debug!("点击 {} 导航至 {}", locator, res.url());
            self.current_url = Some(res.url().clone());
            self.page = res.text().await?;
        }
        Ok(())
    }

    async fn wait_for(&mut self, locator: &Locator, timeout: Duration) -> AppResult<()> {
        // 页面标记是一次性取回的，元素不在其中就不会再出现
        if page_contains(&self.page, locator)? {
            Ok(())
        } else {
            Err(AppError::ElementNotFound(format!(
                "{} (等待上限 {:?})",
                locator, timeout
            )))
        }
    }
}

fn first_match<'a>(document: &'a Html, locator: &Locator) -> AppResult<Option<ElementRef<'a>>> {
    let selector = parse_selector(&locator.css())?;
    let mut matches = document.select(&selector);
    Ok(match locator {
        Locator::LinkText(text) => {
            matches.find(|el| el.text().collect::<String>().trim() == text.trim())
        }
        _ => matches.next(),
    })
}

fn page_contains(page: &str, locator: &Locator) -> AppResult<bool> {
    let document = Html::parse_document(page);
    Ok(first_match(&document, locator)?.is_some())
}

fn locate_href(page: &str, locator: &Locator) -> AppResult<Option<String>> {
    let document = Html::parse_document(page);
    let element = first_match(&document, locator)?
        .ok_or_else(|| AppError::ElementNotFound(locator.to_string()))?;
    Ok(element.value().attr("href").map(|h| h.trim().to_string()))
}

fn is_client_side(href: &str) -> bool {
    href.is_empty() || href.starts_with('#') || href.to_ascii_lowercase().starts_with("javascript:")
}

/// 依次尝试 `Content-Disposition` 中的文件名、URL 最后一段路径。
fn attachment_name(res: &Response) -> String {
    let from_header = res
        .headers()
        .get(CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| FILENAME_RE.captures(v))
        .and_then(|caps| caps.get(1))
        .map(|m| percent_decode_str(m.as_str().trim()).decode_utf8_lossy().to_string());
    let from_url = || {
        res.url()
            .path_segments()
            .and_then(|mut segments| segments.rfind(|s| !s.is_empty()))
            .map(|s| percent_decode_str(s).decode_utf8_lossy().to_string())
    };
    let name = from_header
        .or_else(from_url)
        .unwrap_or_else(|| "download".to_string());
    utils::sanitize_filename(&name)
}

/// 浏览器式的文件命名: 同名已存在时使用 `name(1).ext`、`name(2).ext` ...
fn browser_target(dir: &Path, file_name: &str, suffix: &str) -> PathBuf {
    let taken = |p: &Path| p.exists() || utils::with_suffix(p, suffix).exists();
    let first = dir.join(file_name);
    if !taken(&first) {
        return first;
    }
    let (stem, ext) = utils::split_extension(file_name);
    (1..)
        .map(|i| dir.join(format!("{}({}){}", stem, i, ext)))
        .find(|p| !taken(p))
        .unwrap_or(first)
}

async fn save_attachment(
    res: Response,
    dir: &Path,
    file_name: &str,
    suffix: &str,
) -> AppResult<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;
    let final_path = browser_target(dir, file_name, suffix);
    let part_path = utils::with_suffix(&final_path, suffix);

    let mut file = tokio::fs::File::create(&part_path).await?;
    let mut stream = res.bytes_stream();
    while let Some(chunk_result) = stream.next().await {
        match chunk_result {
            Ok(chunk) => file.write_all(&chunk).await?,
            Err(e) => {
                drop(file);
                tokio::fs::remove_file(&part_path).await.ok();
                return Err(e.into());
            }
        }
    }
    file.flush().await?;
    drop(file);

    tokio::fs::rename(&part_path, &final_path).await?;
    Ok(final_path)
}
