pub mod loader;
pub mod relevance;

pub use loader::{AutoLoadOutcome, AutoLoader, LoadedPage};
pub use relevance::{score_page, PageRelevance, Recommendation};

use anyhow::{Context, Result};

/// Selectors that look like individual comments or reviews across the
/// target site's layouts. Shared by the relevance scorer (element floor)
/// and the auto-loader (final count).
pub const COMMENT_SELECTORS: &[&str] = &[
    ".comment",
    ".comment-item",
    "[class*='comment-']",
    "[data-comment-id]",
    ".review",
    "[class*='review-item']",
];

/// Fetch a page's raw HTML over plain HTTP. Pages that render their
/// comments with JavaScript need the auto-loader instead.
pub async fn fetch_html(url: &str) -> Result<String> {
    let client = reqwest::Client::new();
    let response = client
        .get(url)
        .send()
        .await
        .context("Page request failed")?;

    let status = response.status();
    if !status.is_success() {
        anyhow::bail!("Page fetch returned {}", status);
    }

    response.text().await.context("Failed to read page body")
}
