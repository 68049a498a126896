use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How promising a prospect looks, derived from the keyword score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quality {
    Low,
    Medium,
    High,
}

impl Quality {
    /// Score-to-quality mapping is fixed: >= 6 High, >= 3 Medium, else Low.
    pub fn from_score(score: i32) -> Self {
        if score >= 6 {
            Quality::High
        } else if score >= 3 {
            Quality::Medium
        } else {
            Quality::Low
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Quality::Low => "low",
            Quality::Medium => "medium",
            Quality::High => "high",
        }
    }

    pub fn all() -> &'static [Quality] {
        &[Quality::High, Quality::Medium, Quality::Low]
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A candidate contact extracted from a product page's comments.
///
/// Never constructed with text outside 20..=300 chars or a score of zero;
/// the extractor filters those out before building the record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prospect {
    pub username: String,
    pub text: String,
    pub quality: Quality,
    pub score: i32,
    /// URL of the page the comment was found on.
    pub source: String,
    pub profile_link: String,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_thresholds() {
        assert_eq!(Quality::from_score(1), Quality::Low);
        assert_eq!(Quality::from_score(2), Quality::Low);
        assert_eq!(Quality::from_score(3), Quality::Medium);
        assert_eq!(Quality::from_score(5), Quality::Medium);
        assert_eq!(Quality::from_score(6), Quality::High);
        assert_eq!(Quality::from_score(42), Quality::High);
    }
}
