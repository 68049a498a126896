use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use serde::Serialize;
use thirtyfour::prelude::*;
use tokio::time::sleep;
use tracing::{debug, warn};

use super::COMMENT_SELECTORS;

/// Internal time budget for a whole auto-load run. The CLI additionally
/// races the run against its own 30 s timeout; a run that loses that race
/// keeps going in the browser until this budget expires.
pub const TOTAL_BUDGET: Duration = Duration::from_secs(25);

const RENDER_WAIT: Duration = Duration::from_secs(2);
const CLICK_WAIT: Duration = Duration::from_millis(1800);
const SCROLL_WAIT: Duration = Duration::from_millis(900);
const MAX_SCROLLS: u32 = 40;
const STABLE_ITERATIONS: u32 = 3;

const LOAD_MORE_SELECTORS: &[&str] = &[
    "button[class*='load-more']",
    "button[class*='show-more']",
    "[class*='comments'] button[class*='more']",
    "button[data-test='load-more']",
    "a[class*='load-more']",
];

const LOAD_MORE_PHRASES: &[&str] = &[
    "load more",
    "show more",
    "view more",
    "more comments",
    "more replies",
];

const END_PHRASES: &[&str] = &[
    "no more comments",
    "end of comments",
    "you've reached the end",
    "be the first to comment",
];

const SCROLL_SCRIPT: &str = r#"
const el = document.querySelector('.comments, #comments, [class*="comments"]');
if (el && el.scrollHeight > el.clientHeight) {
    el.scrollTop = el.scrollHeight;
    return el.scrollHeight;
}
window.scrollTo(0, document.body.scrollHeight);
return document.body.scrollHeight;
"#;

#[derive(Debug, Clone, Serialize)]
pub struct AutoLoadOutcome {
    pub success: bool,
    pub comments_found: u32,
    pub message: String,
    pub scrolls_performed: u32,
}

pub struct LoadedPage {
    pub outcome: AutoLoadOutcome,
    /// Page source after loading, so extraction can run on the revealed
    /// comments. None when the browser session never got off the ground.
    pub html: Option<String>,
}

/// Tracks scroll progress. Done once the page height has been unchanged
/// for three consecutive scroll attempts or the attempt budget runs out.
pub struct ScrollTracker {
    last_height: Option<u64>,
    unchanged: u32,
    pub scrolls: u32,
}

impl ScrollTracker {
    pub fn new() -> Self {
        Self {
            last_height: None,
            unchanged: 0,
            scrolls: 0,
        }
    }

    /// Record one scroll attempt and the height observed after it.
    /// Returns true once scrolling should stop.
    pub fn record(&mut self, height: u64) -> bool {
        self.scrolls += 1;
        if self.last_height == Some(height) {
            self.unchanged += 1;
        } else {
            self.unchanged = 0;
            self.last_height = Some(height);
        }
        self.unchanged >= STABLE_ITERATIONS || self.scrolls >= MAX_SCROLLS
    }

    pub fn height_stable(&self) -> bool {
        self.unchanged >= STABLE_ITERATIONS
    }
}

impl Default for ScrollTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Best-effort comment revealer: clicks "load more" controls and scrolls
/// the comment container until the page stops growing.
pub struct AutoLoader {
    webdriver_url: String,
}

impl AutoLoader {
    pub fn new(webdriver_url: &str) -> Self {
        Self {
            webdriver_url: webdriver_url.to_string(),
        }
    }

    /// Never fails: every internal error is folded into a failure-shaped
    /// outcome so the caller always receives a well-formed result.
    pub async fn run(&self, url: &str) -> LoadedPage {
        match self.drive(url).await {
            Ok(page) => page,
            Err(e) => LoadedPage {
                outcome: AutoLoadOutcome {
                    success: false,
                    comments_found: 0,
                    message: format!("Auto-load failed: {:#}", e),
                    scrolls_performed: 0,
                },
                html: None,
            },
        }
    }

    async fn drive(&self, url: &str) -> Result<LoadedPage> {
        let mut caps = DesiredCapabilities::chrome();
        for arg in [
            "--headless=new",
            "--no-sandbox",
            "--disable-dev-shm-usage",
            "--disable-gpu",
            "--window-size=1920,1080",
        ] {
            caps.add_arg(arg)?;
        }

        let driver = WebDriver::new(&self.webdriver_url, caps)
            .await
            .context("Failed to connect to WebDriver")?;

        let result = self.load_all(&driver, url).await;

        if let Err(e) = driver.quit().await {
            warn!("Failed to quit browser: {}", e);
        }

        result
    }

    async fn load_all(&self, driver: &WebDriver, url: &str) -> Result<LoadedPage> {
        let deadline = Instant::now() + TOTAL_BUDGET;

        driver.goto(url).await.context("Failed to navigate to URL")?;
        driver
            .query(By::Tag("body"))
            .first()
            .await
            .context("Page has no body element")?;
        sleep(RENDER_WAIT).await;

        self.open_comments_tab(driver).await;

        // Reveal buttons often come in series; keep clicking until none
        // is left before falling back to scrolling.
        while Instant::now() < deadline {
            if !self.click_load_more(driver).await {
                break;
            }
            sleep(CLICK_WAIT).await;
        }

        let mut tracker = ScrollTracker::new();
        let message;
        loop {
            if Instant::now() >= deadline {
                message = "Time budget exhausted".to_string();
                break;
            }

            let height = self.scroll_to_bottom(driver).await.unwrap_or(0);
            if tracker.record(height) {
                message = if tracker.height_stable() {
                    "Page height stabilized".to_string()
                } else {
                    "Scroll attempt budget exhausted".to_string()
                };
                break;
            }

            if self.end_marker_visible(driver).await {
                message = "End-of-comments marker visible".to_string();
                break;
            }

            // Scrolling can reveal fresh load-more buttons.
            if self.click_load_more(driver).await {
                sleep(CLICK_WAIT).await;
            }

            sleep(SCROLL_WAIT).await;
        }

        let comments_found = self.count_comments(driver).await;
        let html = driver.source().await.ok();

        Ok(LoadedPage {
            outcome: AutoLoadOutcome {
                success: comments_found > 0,
                comments_found,
                message,
                scrolls_performed: tracker.scrolls,
            },
            html,
        })
    }

    /// Some layouts hide comments behind a tab. Best effort, errors are
    /// swallowed.
    async fn open_comments_tab(&self, driver: &WebDriver) {
        let candidates = match driver.find_all(By::Css("button, a, [role='tab']")).await {
            Ok(els) => els,
            Err(_) => return,
        };

        for element in candidates.into_iter().take(40) {
            let text = element.text().await.unwrap_or_default().to_lowercase();
            if text.trim() == "comments" {
                if element.click().await.is_ok() {
                    debug!("Opened comments tab");
                    sleep(CLICK_WAIT).await;
                }
                return;
            }
        }
    }

    /// Find and click one "load more" control. Selector hits first, then
    /// text matching over buttons and links. Returns whether a click
    /// landed; all DOM errors are treated as "nothing to click".
    async fn click_load_more(&self, driver: &WebDriver) -> bool {
        for selector in LOAD_MORE_SELECTORS {
            let elements = match driver.find_all(By::Css(*selector)).await {
                Ok(els) => els,
                Err(e) => {
                    debug!("Selector {} failed: {}", selector, e);
                    continue;
                }
            };
            for element in elements {
                if element.is_displayed().await.unwrap_or(false)
                    && element.click().await.is_ok()
                {
                    debug!("Clicked load-more via selector {}", selector);
                    return true;
                }
            }
        }

        let candidates = match driver.find_all(By::Css("button, a")).await {
            Ok(els) => els,
            Err(_) => return false,
        };
        for element in candidates.into_iter().take(60) {
            let text = element.text().await.unwrap_or_default().to_lowercase();
            if LOAD_MORE_PHRASES.iter().any(|p| text.contains(p))
                && element.click().await.is_ok()
            {
                debug!("Clicked load-more via text match: {}", text.trim());
                return true;
            }
        }

        false
    }

    async fn scroll_to_bottom(&self, driver: &WebDriver) -> Option<u64> {
        let ret = driver.execute(SCROLL_SCRIPT, vec![]).await.ok()?;
        let value = ret.json();
        value
            .as_u64()
            .or_else(|| value.as_f64().map(|f| f as u64))
    }

    async fn end_marker_visible(&self, driver: &WebDriver) -> bool {
        let body = match driver.find(By::Tag("body")).await {
            Ok(b) => b,
            Err(_) => return false,
        };
        let text = body.text().await.unwrap_or_default().to_lowercase();
        END_PHRASES.iter().any(|p| text.contains(p))
    }

    /// Count visible comment-like elements through several selectors,
    /// taking the maximum.
    async fn count_comments(&self, driver: &WebDriver) -> u32 {
        let mut best = 0u32;
        for selector in COMMENT_SELECTORS {
            if let Ok(elements) = driver.find_all(By::Css(*selector)).await {
                best = best.max(elements.len() as u32);
            }
        }
        best
    }
}
