pub mod log;
pub mod types;

pub use log::{
    contacted_set, log_ai_message, log_message, record_response, response_stats, uncontacted,
};
pub use types::{AiAnalyticsEntry, CampaignStats, OutreachLogEntry, ResponseStats, ResponseStatus};
