//! Chromium-based renderer using chromiumoxide.

use super::{CookieSpec, Locator, NavigationResult, RenderContext, Renderer};
use crate::config::BrowserOptions;
use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::input::InsertTextParams;
use chromiumoxide::cdp::browser_protocol::network::{ClearBrowserCookiesParams, CookieParam};
use chromiumoxide::element::Element;
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Find the Chromium binary path.
pub fn find_chromium(explicit: Option<&Path>) -> Option<PathBuf> {
    // 1. Explicit path from configuration
    if let Some(path) = explicit {
        if path.exists() {
            return Some(path.to_path_buf());
        }
    }

    // 2. GROWTH_CHROMIUM_PATH env
    if let Ok(p) = std::env::var("GROWTH_CHROMIUM_PATH") {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
    }

    // 3. ~/.cache/reciprocity/chromium/
    if let Some(cache) = dirs::cache_dir() {
        let base = cache.join("reciprocity/chromium");
        let candidates = if cfg!(target_os = "macos") {
            vec![
                base.join("chrome-mac-arm64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
                base.join("chrome-mac-x64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
                base.join("chrome"),
            ]
        } else {
            vec![base.join("chrome-linux64/chrome"), base.join("chrome")]
        };
        for c in candidates {
            if c.exists() {
                return Some(c);
            }
        }
    }

    // 4. System PATH
    for name in ["google-chrome", "chromium", "chromium-browser"] {
        if let Ok(path) = which::which(name) {
            return Some(path);
        }
    }

    // 5. Common macOS location
    if cfg!(target_os = "macos") {
        let common =
            PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome");
        if common.exists() {
            return Some(common);
        }
    }

    None
}

/// Chromium-based renderer.
pub struct ChromiumRenderer {
    browser: Mutex<Browser>,
    handler: JoinHandle<()>,
}

impl ChromiumRenderer {
    /// Launch a Chromium instance with the given options.
    pub async fn launch(options: &BrowserOptions) -> Result<Self> {
        let chrome_path = find_chromium(options.chromium_path.as_deref()).context(
            "Chromium not found. Set GROWTH_CHROMIUM_PATH or install google-chrome/chromium.",
        )?;

        let mut builder = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .window_size(1920, 1080)
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-gpu")
            .arg("--disable-extensions");
        builder = if options.headless {
            builder.arg("--headless=new")
        } else {
            builder.with_head()
        };
        let config = builder
            .build()
            .map_err(|e| anyhow!("failed to build browser config: {e}"))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("failed to launch Chromium")?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
        });

        Ok(Self {
            browser: Mutex::new(browser),
            handler,
        })
    }
}

#[async_trait]
impl Renderer for ChromiumRenderer {
    async fn new_context(&self) -> Result<Box<dyn RenderContext>> {
        let page = self
            .browser
            .lock()
            .await
            .new_page("about:blank")
            .await
            .context("failed to create new page")?;

        Ok(Box::new(ChromiumContext { page }))
    }

    async fn shutdown(&self) -> Result<()> {
        let mut browser = self.browser.lock().await;
        let closed = browser.close().await;
        let _ = browser.wait().await;
        self.handler.abort();
        closed.context("failed to close Chromium")?;
        Ok(())
    }
}

/// A single Chromium page context.
pub struct ChromiumContext {
    page: Page,
}

impl ChromiumContext {
    async fn resolve(&self, target: &Locator) -> Result<Element> {
        let element = match target {
            Locator::Css(sel) => self.page.find_element(sel.as_str()).await?,
            Locator::Item { list, index } => self
                .page
                .find_elements(list.as_str())
                .await?
                .into_iter()
                .nth(*index)
                .ok_or_else(|| anyhow!("no element at index {index} for '{list}'"))?,
            Locator::Nested { list, index, inner } => self
                .page
                .find_elements(list.as_str())
                .await?
                .into_iter()
                .nth(*index)
                .ok_or_else(|| anyhow!("no element at index {index} for '{list}'"))?
                .find_element(inner.as_str())
                .await?,
        };
        Ok(element)
    }
}

#[async_trait]
impl RenderContext for ChromiumContext {
    async fn navigate(&mut self, url: &str, timeout_ms: u64) -> Result<NavigationResult> {
        let start = Instant::now();

        let result = tokio::time::timeout(
            std::time::Duration::from_millis(timeout_ms),
            self.page.goto(url),
        )
        .await;

        let load_time_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(Ok(_)) => {
                let _ = self.page.wait_for_navigation().await;

                let final_url = self
                    .page
                    .url()
                    .await
                    .unwrap_or_default()
                    .unwrap_or_else(|| url.to_string());

                Ok(NavigationResult {
                    final_url,
                    load_time_ms,
                })
            }
            Ok(Err(e)) => bail!("navigation to {url} failed: {e}"),
            Err(_) => bail!("navigation to {url} timed out after {timeout_ms}ms"),
        }
    }

    async fn reload(&mut self) -> Result<()> {
        self.page.reload().await.context("reload failed")?;
        Ok(())
    }

    async fn execute_js(&self, script: &str) -> Result<serde_json::Value> {
        let result = self
            .page
            .evaluate(script)
            .await
            .context("JS execution failed")?;

        result
            .into_value()
            .map_err(|e| anyhow!("failed to convert JS result: {e:?}"))
    }

    async fn get_html(&self) -> Result<String> {
        self.page.content().await.context("failed to get HTML")
    }

    async fn get_url(&self) -> Result<String> {
        let url = self
            .page
            .url()
            .await
            .context("failed to get URL")?
            .unwrap_or_default();
        Ok(url)
    }

    async fn click(&mut self, target: &Locator) -> Result<()> {
        let element = self
            .resolve(target)
            .await
            .with_context(|| format!("element not found: {target}"))?;
        element
            .click()
            .await
            .with_context(|| format!("click failed: {target}"))?;
        Ok(())
    }

    async fn type_into(&mut self, target: &Locator, text: &str) -> Result<()> {
        let element = self
            .resolve(target)
            .await
            .with_context(|| format!("element not found: {target}"))?;
        element
            .click()
            .await
            .with_context(|| format!("failed to focus {target}"))?;
        // insertText handles Hangul, which per-key dispatch does not.
        self.page
            .execute(InsertTextParams::new(text))
            .await
            .with_context(|| format!("failed to type into {target}"))?;
        Ok(())
    }

    async fn clear_cookies(&mut self) -> Result<()> {
        self.page
            .execute(ClearBrowserCookiesParams::default())
            .await
            .context("failed to clear cookies")?;
        Ok(())
    }

    async fn set_cookies(&mut self, cookies: &[CookieSpec]) -> Result<()> {
        let params = cookies
            .iter()
            .map(|c| {
                CookieParam::builder()
                    .name(c.name.clone())
                    .value(c.value.clone())
                    .domain(c.domain.clone())
                    .path(c.path.clone())
                    .build()
                    .map_err(|e| anyhow!("invalid cookie {}: {e}", c.name))
            })
            .collect::<Result<Vec<_>>>()?;
        self.page
            .set_cookies(params)
            .await
            .context("failed to set cookies")?;
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        let _ = self.page.close().await;
        Ok(())
    }
}
