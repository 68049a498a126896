use crate::extract::{Prospect, Quality};

use super::types::{Analysis, EngagementStyle, TechnicalLevel};

/// Vocabulary that separates people who tune their printers from people
/// who just clicked download.
const TECHNICAL_VOCABULARY: &[&str] = &[
    "filament",
    "layer",
    "infill",
    "tolerance",
    "calibration",
    "firmware",
    "nozzle",
    "stl",
];

/// Substring triggers for problem-area tags. Checks are independent;
/// one comment can collect several tags.
const PROBLEM_TRIGGERS: &[(&str, &[&str])] = &[
    ("stability", &["fall", "fell", "loose", "wobbl", "slip"]),
    ("organization", &["mess", "clutter", "disorganiz", "chaos"]),
    ("cable_management", &["cable", "cord", "wire"]),
    ("tool_storage", &["tool"]),
];

const INTEREST_TRIGGERS: &[(&str, &[&str])] = &[
    ("mounting_solutions", &["mount", "holder", "hook", "bracket"]),
    ("workshop_organization", &["workshop", "garage", "bench", "shelf"]),
    ("diy_projects", &["diy", "project", "build", "made my own"]),
];

const BASE_CONFIDENCE: f32 = 0.7;

/// Classify a prospect from their extracted comment text.
pub fn analyze(prospect: &Prospect) -> Analysis {
    let text = prospect.text.to_lowercase();

    let technical_hits = TECHNICAL_VOCABULARY
        .iter()
        .filter(|word| text.contains(*word))
        .count();
    let technical_level = if technical_hits >= 3 {
        TechnicalLevel::High
    } else if technical_hits >= 1 {
        TechnicalLevel::Medium
    } else {
        TechnicalLevel::Low
    };

    let problem_areas = matched_tags(&text, PROBLEM_TRIGGERS);
    let interests = matched_tags(&text, INTEREST_TRIGGERS);

    let len = prospect.text.chars().count();
    let engagement_style = if len > 100 {
        EngagementStyle::Detailed
    } else if len < 30 {
        EngagementStyle::Brief
    } else {
        EngagementStyle::Standard
    };

    let mut confidence = BASE_CONFIDENCE;
    match prospect.quality {
        Quality::High => confidence += 0.2,
        Quality::Low => confidence -= 0.1,
        Quality::Medium => {}
    }
    if engagement_style == EngagementStyle::Detailed {
        confidence += 0.1;
    }

    Analysis {
        technical_level,
        problem_areas,
        interests,
        engagement_style,
        confidence,
        quality: prospect.quality,
    }
}

fn matched_tags(text: &str, triggers: &[(&str, &[&str])]) -> Vec<String> {
    triggers
        .iter()
        .filter(|(_, needles)| needles.iter().any(|n| text.contains(n)))
        .map(|(tag, _)| tag.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn prospect(text: &str, quality: Quality) -> Prospect {
        Prospect {
            username: "maker".to_string(),
            text: text.to_string(),
            quality,
            score: 7,
            source: "https://example.com/model/1".to_string(),
            profile_link: "https://example.com/@maker".to_string(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn technical_level_counts_distinct_vocabulary_words() {
        let a = analyze(&prospect(
            "printed at 0.2 layer height with 15% infill, had to tweak the tolerance",
            Quality::Medium,
        ));
        assert_eq!(a.technical_level, TechnicalLevel::High);

        let b = analyze(&prospect("changed filament mid print, came out fine", Quality::Medium));
        assert_eq!(b.technical_level, TechnicalLevel::Medium);

        let c = analyze(&prospect("love this, looks super clean", Quality::Medium));
        assert_eq!(c.technical_level, TechnicalLevel::Low);
    }

    #[test]
    fn tags_are_independent_and_cumulative() {
        let a = analyze(&prospect(
            "my tools kept falling off and the cables were a mess in the workshop",
            Quality::Medium,
        ));
        assert!(a.problem_areas.contains(&"stability".to_string()));
        assert!(a.problem_areas.contains(&"cable_management".to_string()));
        assert!(a.problem_areas.contains(&"organization".to_string()));
        assert!(a.problem_areas.contains(&"tool_storage".to_string()));
        assert!(a.interests.contains(&"workshop_organization".to_string()));
    }

    #[test]
    fn engagement_style_follows_length() {
        let detailed = "x".repeat(120);
        assert_eq!(
            analyze(&prospect(&detailed, Quality::Medium)).engagement_style,
            EngagementStyle::Detailed
        );
        assert_eq!(
            analyze(&prospect("nice holder thanks a lot", Quality::Medium)).engagement_style,
            EngagementStyle::Brief
        );
        assert_eq!(
            analyze(&prospect("nice holder, thanks a lot, printed two", Quality::Medium))
                .engagement_style,
            EngagementStyle::Standard
        );
    }

    #[test]
    fn confidence_is_an_unclamped_rule_sum() {
        // High quality + detailed text reaches exactly the 1.0 ceiling-less sum.
        let detailed = "a ".repeat(60);
        let a = analyze(&prospect(&detailed, Quality::High));
        assert!((a.confidence - 1.0).abs() < 1e-6);

        let b = analyze(&prospect("short note here thanks folks", Quality::Low));
        assert!((b.confidence - 0.6).abs() < 1e-6);
    }
}
