use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::extract::Quality;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    Sent,
    Positive,
    Neutral,
    NotInterested,
}

impl ResponseStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ResponseStatus::Sent => "sent",
            ResponseStatus::Positive => "positive",
            ResponseStatus::Neutral => "neutral",
            ResponseStatus::NotInterested => "not_interested",
        }
    }

    /// Parse an operator-supplied response type. `sent` is the initial
    /// state, not something an operator records.
    pub fn parse_response(s: &str) -> Option<Self> {
        match s {
            "positive" => Some(ResponseStatus::Positive),
            "neutral" => Some(ResponseStatus::Neutral),
            "not_interested" => Some(ResponseStatus::NotInterested),
            _ => None,
        }
    }
}

impl fmt::Display for ResponseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One record per message actually sent. The set of usernames in the log
/// (compared case-insensitively) is the sole source of truth for
/// duplicate-contact prevention.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutreachLogEntry {
    pub username: String,
    pub profile_url: String,
    /// Link to the sent message, when the platform exposes one.
    pub message_url: Option<String>,
    pub source_project: String,
    pub prospect_quality: Quality,
    pub template_used: String,
    pub message_preview: String,
    pub response_status: ResponseStatus,
    pub response_date: Option<DateTime<Utc>>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResponseStats {
    pub total_responses: u32,
    pub positive: u32,
    pub neutral: u32,
    pub negative: u32,
    /// Percentage of sent messages that got any response.
    pub response_rate: f32,
    /// Percentage of responses that were positive.
    pub positive_rate: f32,
}

/// Derived aggregate over the outreach log. Incrementally updated on
/// every send and response; has no identity of its own and can always be
/// rebuilt from the log.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CampaignStats {
    pub total_messages: u32,
    pub by_month: HashMap<String, u32>,
    pub by_template: HashMap<String, u32>,
    pub by_quality: HashMap<String, u32>,
    pub by_source: HashMap<String, u32>,
    pub responses: ResponseStats,
}

/// One record per AI-assisted generation; dashboard display only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiAnalyticsEntry {
    pub username: String,
    pub confidence: f32,
    pub personalization_elements: usize,
    pub timestamp: DateTime<Utc>,
}
