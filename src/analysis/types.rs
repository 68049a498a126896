use serde::{Deserialize, Serialize};
use std::fmt;

use crate::extract::Quality;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TechnicalLevel {
    Low,
    Medium,
    High,
}

impl TechnicalLevel {
    pub fn label(&self) -> &'static str {
        match self {
            TechnicalLevel::Low => "low",
            TechnicalLevel::Medium => "medium",
            TechnicalLevel::High => "high",
        }
    }
}

impl fmt::Display for TechnicalLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngagementStyle {
    Brief,
    Standard,
    Detailed,
}

impl EngagementStyle {
    pub fn label(&self) -> &'static str {
        match self {
            EngagementStyle::Brief => "brief",
            EngagementStyle::Standard => "standard",
            EngagementStyle::Detailed => "detailed",
        }
    }
}

impl fmt::Display for EngagementStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What a prospect's comment tells us about them. Pure function of the
/// prospect's text and quality; computed fresh whenever a message is
/// composed, never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Analysis {
    pub technical_level: TechnicalLevel,
    pub problem_areas: Vec<String>,
    pub interests: Vec<String>,
    pub engagement_style: EngagementStyle,
    /// Raw rule sum; deliberately not clamped to [0, 1].
    pub confidence: f32,
    pub quality: Quality,
}

impl Analysis {
    /// How many distinct signals personalization can lean on. Recorded
    /// with each AI-assisted generation for the dashboard.
    pub fn personalization_elements(&self) -> usize {
        let mut elements = self.problem_areas.len() + self.interests.len();
        if self.technical_level != TechnicalLevel::Low {
            elements += 1;
        }
        if self.engagement_style == EngagementStyle::Detailed {
            elements += 1;
        }
        elements
    }
}
