use regex::Regex;
use scraper::{Html, Selector};
use serde::Serialize;
use std::fmt;

use super::COMMENT_SELECTORS;

/// Terms that mark a page as being about the product niche.
const DOMAIN_KEYWORDS: &[&str] = &[
    "pegboard",
    "skadis",
    "skådis",
    "wall organizer",
    "tool wall",
    "workshop storage",
    "ikea",
];

const TITLE_BONUS: i32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    High,
    Medium,
    Low,
    NotRelevant,
}

impl Recommendation {
    pub fn label(&self) -> &'static str {
        match self {
            Recommendation::High => "HIGH PRIORITY",
            Recommendation::Medium => "MEDIUM PRIORITY",
            Recommendation::Low => "LOW PRIORITY",
            Recommendation::NotRelevant => "NOT RELEVANT",
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct Engagement {
    pub comments: u32,
    pub likes: u32,
    pub makes: u32,
    pub downloads: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct PageRelevance {
    pub relevance_score: i32,
    pub engagement: Engagement,
    pub total_engagement: u32,
    pub recommendation: Recommendation,
}

/// Score a fetched page. A page with nothing matching simply comes back
/// as NOT RELEVANT with score 0; that is a result, not an error.
pub fn score_page(html: &str) -> PageRelevance {
    let document = Html::parse_document(html);

    let title = Selector::parse("title")
        .ok()
        .and_then(|sel| document.select(&sel).next())
        .map(|t| t.text().collect::<String>())
        .unwrap_or_default();

    let text = Selector::parse("body")
        .ok()
        .and_then(|sel| document.select(&sel).next())
        .map(|b| b.text().collect::<Vec<_>>().join(" "))
        .unwrap_or_default();

    // Counting comment-like elements gives a floor for pages that don't
    // print a "N comments" figure anywhere.
    let comment_floor = COMMENT_SELECTORS
        .iter()
        .filter_map(|s| Selector::parse(s).ok())
        .map(|sel| document.select(&sel).count() as u32)
        .max()
        .unwrap_or(0);

    assess(&text, &title, comment_floor)
}

/// Pure scoring over extracted page text and title.
pub fn assess(text: &str, title: &str, comment_floor: u32) -> PageRelevance {
    let text_lower = text.to_lowercase();
    let title_lower = title.to_lowercase();

    let mut relevance_score = 0i32;
    for keyword in DOMAIN_KEYWORDS {
        relevance_score += text_lower.matches(keyword).count() as i32;
    }
    if DOMAIN_KEYWORDS.iter().any(|k| title_lower.contains(k)) {
        relevance_score += TITLE_BONUS;
    }

    let engagement = Engagement {
        comments: max_count(&text_lower, "comments?").max(comment_floor),
        likes: max_count(&text_lower, "likes?"),
        makes: max_count(&text_lower, "makes?"),
        downloads: max_count(&text_lower, "downloads?"),
    };
    let total_engagement =
        engagement.comments + engagement.likes + engagement.makes + engagement.downloads;

    let recommendation = if relevance_score >= 5 && total_engagement >= 10 {
        Recommendation::High
    } else if relevance_score >= 3 && total_engagement >= 5 {
        Recommendation::Medium
    } else if relevance_score >= 1 {
        Recommendation::Low
    } else {
        Recommendation::NotRelevant
    };

    PageRelevance {
        relevance_score,
        engagement,
        total_engagement,
        recommendation,
    }
}

/// Highest figure observed for patterns like "12 comments" / "340 likes".
fn max_count(text: &str, noun_pattern: &str) -> u32 {
    let re = Regex::new(&format!(r"(\d+)\s*{}", noun_pattern)).expect("static regex");
    re.captures_iter(text)
        .filter_map(|caps| caps[1].parse::<u32>().ok())
        .max()
        .unwrap_or(0)
}
