use anyhow::Result;
use chrono::Utc;
use std::collections::HashSet;

use crate::analysis::Analysis;
use crate::extract::Prospect;
use crate::storage::Store;

use super::types::{AiAnalyticsEntry, OutreachLogEntry, ResponseStats, ResponseStatus};

const PREVIEW_CHARS: usize = 120;

/// Lowercased usernames of everyone who has already been messaged. The
/// log is the only place this is tracked; prospects carry no contacted
/// flag.
pub fn contacted_set(log: &[OutreachLogEntry]) -> HashSet<String> {
    log.iter().map(|e| e.username.to_lowercase()).collect()
}

/// Prospects that are still eligible for outreach. Pure; calling it
/// twice over the same inputs gives the same answer.
pub fn uncontacted<'a>(
    prospects: &'a [Prospect],
    log: &[OutreachLogEntry],
) -> Vec<&'a Prospect> {
    let contacted = contacted_set(log);
    prospects
        .iter()
        .filter(|p| !contacted.contains(&p.username.to_lowercase()))
        .collect()
}

/// Append one log entry and bump the aggregate counters, in a single
/// read-modify-write of the store.
pub fn log_message(
    store: &Store,
    prospect: &Prospect,
    message: &str,
    template_used: &str,
) -> Result<OutreachLogEntry> {
    let now = Utc::now();
    let entry = OutreachLogEntry {
        username: prospect.username.clone(),
        profile_url: prospect.profile_link.clone(),
        message_url: None,
        source_project: prospect.source.clone(),
        prospect_quality: prospect.quality,
        template_used: template_used.to_string(),
        message_preview: truncate_preview(message),
        response_status: ResponseStatus::Sent,
        response_date: None,
        timestamp: now,
    };

    let mut log = store.load_log()?;
    log.push(entry.clone());
    store.save_log(&log)?;

    let mut stats = store.load_stats()?;
    stats.total_messages += 1;
    *stats
        .by_month
        .entry(now.format("%Y-%m").to_string())
        .or_insert(0) += 1;
    *stats
        .by_template
        .entry(template_used.to_string())
        .or_insert(0) += 1;
    *stats
        .by_quality
        .entry(prospect.quality.label().to_string())
        .or_insert(0) += 1;
    *stats
        .by_source
        .entry(prospect.source.clone())
        .or_insert(0) += 1;
    store.save_stats(&stats)?;

    Ok(entry)
}

/// `log_message` for AI-generated sends: additionally records the
/// generation for the dashboard's AI analytics. Dry runs never reach
/// this, so the analytics only count messages that were actually logged.
pub fn log_ai_message(
    store: &Store,
    prospect: &Prospect,
    analysis: &Analysis,
    message: &str,
) -> Result<OutreachLogEntry> {
    store.append_analytics(AiAnalyticsEntry {
        username: prospect.username.clone(),
        confidence: analysis.confidence,
        personalization_elements: analysis.personalization_elements(),
        timestamp: Utc::now(),
    })?;
    log_message(store, prospect, message, "ai")
}

/// Record a reply on the most recent log entry for a username, then
/// recompute the response-rate figures from the whole log.
pub fn record_response(store: &Store, username: &str, response: ResponseStatus) -> Result<()> {
    let needle = username.to_lowercase();
    let mut log = store.load_log()?;

    let entry = log
        .iter_mut()
        .rev()
        .find(|e| e.username.to_lowercase() == needle);
    let entry = match entry {
        Some(e) => e,
        None => anyhow::bail!("No outreach log entry for @{}", username),
    };

    entry.response_status = response;
    entry.response_date = Some(Utc::now());

    let responses = response_stats(&log);
    store.save_log(&log)?;

    let mut stats = store.load_stats()?;
    stats.responses = responses;
    store.save_stats(&stats)
}

/// Response aggregates derived from the full log.
pub fn response_stats(log: &[OutreachLogEntry]) -> ResponseStats {
    let mut stats = ResponseStats::default();
    for entry in log {
        match entry.response_status {
            ResponseStatus::Sent => {}
            ResponseStatus::Positive => {
                stats.total_responses += 1;
                stats.positive += 1;
            }
            ResponseStatus::Neutral => {
                stats.total_responses += 1;
                stats.neutral += 1;
            }
            ResponseStatus::NotInterested => {
                stats.total_responses += 1;
                stats.negative += 1;
            }
        }
    }

    if !log.is_empty() {
        stats.response_rate = stats.total_responses as f32 / log.len() as f32 * 100.0;
    }
    if stats.total_responses > 0 {
        stats.positive_rate = stats.positive as f32 / stats.total_responses as f32 * 100.0;
    }

    stats
}

fn truncate_preview(message: &str) -> String {
    if message.chars().count() <= PREVIEW_CHARS {
        message.to_string()
    } else {
        let truncated: String = message.chars().take(PREVIEW_CHARS).collect();
        format!("{}...", truncated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::Quality;
    use std::fs;

    fn temp_store(tag: &str) -> Store {
        let dir = std::env::temp_dir().join(format!(
            "alcance-outreach-{}-{}",
            tag,
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        Store::open(&dir).unwrap()
    }

    fn prospect(username: &str) -> Prospect {
        Prospect {
            username: username.to_string(),
            text: "Great pegboard holder, organized my whole workshop wall.".to_string(),
            quality: Quality::High,
            score: 9,
            source: "https://example.com/model/1".to_string(),
            profile_link: format!("https://example.com/@{}", username),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn logging_is_append_only_with_matching_counters() {
        let store = temp_store("append");
        for i in 0..3 {
            let before = store.load_log().unwrap().len();
            log_message(&store, &prospect(&format!("user{}", i)), "Hi there!", "community")
                .unwrap();
            let log = store.load_log().unwrap();
            assert_eq!(log.len(), before + 1);
            assert_eq!(store.load_stats().unwrap().total_messages, (i + 1) as u32);
        }
        let stats = store.load_stats().unwrap();
        assert_eq!(stats.by_template.get("community"), Some(&3));
        assert_eq!(stats.by_quality.get("high"), Some(&3));
    }

    #[test]
    fn uncontacted_is_the_set_difference_and_idempotent() {
        let store = temp_store("uncontacted");
        let prospects = vec![prospect("Dan"), prospect("tina"), prospect("sam")];
        log_message(&store, &prospect("DAN"), "Hi!", "brief").unwrap();

        let log = store.load_log().unwrap();
        let open = uncontacted(&prospects, &log);
        assert_eq!(
            open.iter().map(|p| p.username.as_str()).collect::<Vec<_>>(),
            vec!["tina", "sam"]
        );
        // No mutation: asking again gives the same answer.
        let again = uncontacted(&prospects, &log);
        assert_eq!(open.len(), again.len());
    }

    #[test]
    fn responses_update_the_latest_entry_and_rates() {
        let store = temp_store("responses");
        log_message(&store, &prospect("dan"), "first", "brief").unwrap();
        log_message(&store, &prospect("tina"), "second", "brief").unwrap();
        log_message(&store, &prospect("dan"), "third", "brief").unwrap();

        record_response(&store, "Dan", ResponseStatus::Positive).unwrap();

        let log = store.load_log().unwrap();
        // Most recent dan entry got the response, the earlier one did not.
        assert_eq!(log[2].response_status, ResponseStatus::Positive);
        assert!(log[2].response_date.is_some());
        assert_eq!(log[0].response_status, ResponseStatus::Sent);

        let stats = store.load_stats().unwrap();
        assert_eq!(stats.responses.total_responses, 1);
        assert_eq!(stats.responses.positive, 1);
        assert!((stats.responses.response_rate - 100.0 / 3.0).abs() < 0.01);
        assert!((stats.responses.positive_rate - 100.0).abs() < f32::EPSILON);
    }

    #[test]
    fn ai_analytics_track_logged_sends_only() {
        let store = temp_store("ai");
        let dan = prospect("dan");
        let analysis = crate::analysis::analyze(&dan);

        log_ai_message(&store, &dan, &analysis, "Hi dan!").unwrap();
        assert_eq!(store.load_analytics().unwrap().len(), 1);
        let log = store.load_log().unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].template_used, "ai");
        assert_eq!(store.load_stats().unwrap().by_template.get("ai"), Some(&1));

        // Template sends never touch the analytics file.
        log_message(&store, &prospect("tina"), "Hi!", "brief").unwrap();
        assert_eq!(store.load_analytics().unwrap().len(), 1);
    }

    #[test]
    fn unknown_username_is_an_error() {
        let store = temp_store("unknown");
        assert!(record_response(&store, "nobody", ResponseStatus::Neutral).is_err());
    }

    #[test]
    fn previews_are_truncated() {
        let long = "word ".repeat(60);
        let preview = truncate_preview(&long);
        assert!(preview.chars().count() <= PREVIEW_CHARS + 3);
        assert!(preview.ends_with("..."));
    }
}
