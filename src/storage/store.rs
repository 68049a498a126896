use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::extract::Prospect;
use crate::outreach::{AiAnalyticsEntry, CampaignStats, OutreachLogEntry};

const PROSPECTS_FILE: &str = "prospects.json";
const OUTREACH_LOG_FILE: &str = "outreach_log.json";
const CAMPAIGN_STATS_FILE: &str = "campaign_stats.json";
const AI_ANALYTICS_FILE: &str = "ai_analytics.json";
const CSV_EXPORT_FILE: &str = "outreach_log.csv";

/// JSON file store, one file per record kind. Read-modify-write with no
/// locking; the tool is driven by one operator running one command at a
/// time.
pub struct Store {
    data_dir: PathBuf,
}

impl Store {
    pub fn open(data_dir: &Path) -> Result<Self> {
        fs::create_dir_all(data_dir).context("Failed to create data directory")?;
        Ok(Self {
            data_dir: data_dir.to_path_buf(),
        })
    }

    pub fn load_prospects(&self) -> Result<Vec<Prospect>> {
        self.load_json(PROSPECTS_FILE)
    }

    /// Prospects are append-only; repeated extraction runs may add
    /// duplicates for the same username and that is left as-is.
    pub fn append_prospects(&self, new: &[Prospect]) -> Result<usize> {
        let mut prospects = self.load_prospects()?;
        prospects.extend_from_slice(new);
        self.save_json(PROSPECTS_FILE, &prospects)?;
        Ok(new.len())
    }

    pub fn load_log(&self) -> Result<Vec<OutreachLogEntry>> {
        self.load_json(OUTREACH_LOG_FILE)
    }

    pub fn save_log(&self, log: &[OutreachLogEntry]) -> Result<()> {
        self.save_json(OUTREACH_LOG_FILE, &log)
    }

    pub fn load_stats(&self) -> Result<CampaignStats> {
        self.load_json(CAMPAIGN_STATS_FILE)
    }

    pub fn save_stats(&self, stats: &CampaignStats) -> Result<()> {
        self.save_json(CAMPAIGN_STATS_FILE, stats)
    }

    pub fn load_analytics(&self) -> Result<Vec<AiAnalyticsEntry>> {
        self.load_json(AI_ANALYTICS_FILE)
    }

    pub fn append_analytics(&self, entry: AiAnalyticsEntry) -> Result<()> {
        let mut analytics = self.load_analytics()?;
        analytics.push(entry);
        self.save_json(AI_ANALYTICS_FILE, &analytics)
    }

    /// Flatten the outreach log into a CSV file next to the JSON store.
    pub fn export_csv(&self) -> Result<PathBuf> {
        let log = self.load_log()?;
        let path = self.data_dir.join(CSV_EXPORT_FILE);

        let mut out = String::from(
            "username,profile_url,source_project,quality,template,response_status,response_date,sent_at,message_preview\n",
        );
        for entry in &log {
            out.push_str(&format!(
                "{},{},{},{},{},{},{},{},\"{}\"\n",
                csv_field(&entry.username),
                csv_field(&entry.profile_url),
                csv_field(&entry.source_project),
                entry.prospect_quality,
                entry.template_used,
                entry.response_status,
                entry
                    .response_date
                    .map(|d| d.to_rfc3339())
                    .unwrap_or_default(),
                entry.timestamp.to_rfc3339(),
                entry.message_preview.replace('"', "\"\""),
            ));
        }

        fs::write(&path, out).context("Failed to write CSV export")?;
        Ok(path)
    }

    fn load_json<T>(&self, file: &str) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        let path = self.data_dir.join(file);
        if !path.exists() {
            return Ok(T::default());
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {:?}", path))?;
        serde_json::from_str(&content).with_context(|| format!("Failed to parse {:?}", path))
    }

    fn save_json<T: Serialize>(&self, file: &str, value: &T) -> Result<()> {
        let path = self.data_dir.join(file);
        let json = serde_json::to_string_pretty(value).context("Failed to serialize")?;
        fs::write(&path, json).with_context(|| format!("Failed to write {:?}", path))
    }
}

fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::Quality;
    use chrono::Utc;

    fn temp_store(tag: &str) -> Store {
        let dir = std::env::temp_dir().join(format!(
            "alcance-store-{}-{}",
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
    fn missing_files_load_as_empty_defaults() {
        let store = temp_store("empty");
        assert!(store.load_prospects().unwrap().is_empty());
        assert!(store.load_log().unwrap().is_empty());
        assert_eq!(store.load_stats().unwrap().total_messages, 0);
    }

    #[test]
    fn prospects_round_trip_and_append_without_merging() {
        let store = temp_store("append");
        store.append_prospects(&[prospect("dan")]).unwrap();
        store.append_prospects(&[prospect("dan"), prospect("tina")]).unwrap();
        // Duplicates across runs are kept; merging is explicitly out.
        let loaded = store.load_prospects().unwrap();
        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded[0].username, "dan");
    }

    #[test]
    fn csv_export_mirrors_the_log() {
        let store = temp_store("csv");
        let entry = OutreachLogEntry {
            username: "dan, the maker".to_string(),
            profile_url: "https://example.com/@dan".to_string(),
            message_url: None,
            source_project: "https://example.com/model/1".to_string(),
            prospect_quality: Quality::High,
            template_used: "technical".to_string(),
            message_preview: "Hi! I noticed your \"comment\"".to_string(),
            response_status: crate::outreach::ResponseStatus::Sent,
            response_date: None,
            timestamp: Utc::now(),
        };
        store.save_log(&[entry]).unwrap();
        let path = store.export_csv().unwrap();
        let content = fs::read_to_string(path).unwrap();
        assert!(content.starts_with("username,"));
        assert!(content.contains("\"dan, the maker\""));
        assert!(content.contains("\"\"comment\"\""));
    }
}
