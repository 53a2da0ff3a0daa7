//! Renderer abstraction for browser-based page automation.
//!
//! Defines the `Renderer` and `RenderContext` traits that abstract over
//! the browser engine (currently Chromium via chromiumoxide).

pub mod chromium;
pub mod locator;

pub use locator::Locator;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Result of navigating to a URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationResult {
    /// The final URL after any redirects.
    pub final_url: String,
    /// Time taken to load the page in milliseconds.
    pub load_time_ms: u64,
}

/// A cookie to install before loading a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieSpec {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
}

/// A browser engine that can create rendering contexts.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Create a new browser context (tab).
    async fn new_context(&self) -> Result<Box<dyn RenderContext>>;
    /// Shut down the browser engine.
    async fn shutdown(&self) -> Result<()>;
}

/// A single browser context (tab).
#[async_trait]
pub trait RenderContext: Send + Sync {
    /// Navigate to a URL with a timeout.
    async fn navigate(&mut self, url: &str, timeout_ms: u64) -> Result<NavigationResult>;
    /// Reload the current page.
    async fn reload(&mut self) -> Result<()>;
    /// Execute JavaScript in the page context and return the result.
    async fn execute_js(&self, script: &str) -> Result<serde_json::Value>;
    /// Get the full page HTML.
    async fn get_html(&self) -> Result<String>;
    /// Get the current URL.
    async fn get_url(&self) -> Result<String>;
    /// Click an element with a native mouse event.
    async fn click(&mut self, target: &Locator) -> Result<()>;
    /// Focus an element and insert text as if typed.
    async fn type_into(&mut self, target: &Locator, text: &str) -> Result<()>;
    /// Remove every cookie from the browser.
    async fn clear_cookies(&mut self) -> Result<()>;
    /// Install cookies.
    async fn set_cookies(&mut self, cookies: &[CookieSpec]) -> Result<()>;
    /// Close this context.
    async fn close(self: Box<Self>) -> Result<()>;
}
