use askama::Template;
use axum::extract::State;
use axum::response::Html;
use std::collections::HashMap;

use crate::extract::Quality;
use crate::message::TemplateName;
use crate::outreach::{contacted_set, ResponseStatus};

use super::state::AppState;

#[derive(Template)]
#[template(path = "dashboard.html")]
struct DashboardTemplate {
    total_messages: u32,
    total_prospects: usize,
    uncontacted_count: usize,
    response_rate: String,
    positive_rate: String,
    by_template: Vec<(String, u32)>,
    by_quality: Vec<(String, u32)>,
    by_source: Vec<(String, u32)>,
    ai_generations: usize,
    ai_avg_confidence: String,
    prospects: Vec<ProspectView>,
    recent: Vec<LogView>,
}

struct ProspectView {
    username: String,
    quality: String,
    quality_css: String,
    score: i32,
    text: String,
    contacted: bool,
    profile_link: String,
}

struct LogView {
    username: String,
    template_used: String,
    status: String,
    status_css: String,
    quality: String,
    date: String,
}

pub async fn dashboard(State(state): State<AppState>) -> Html<String> {
    let snapshot = match build_template(&state) {
        Ok(t) => t,
        Err(e) => return Html(format!("Store error: {:#}", e)),
    };

    Html(
        snapshot
            .render()
            .unwrap_or_else(|e| format!("Template error: {}", e)),
    )
}

fn build_template(state: &AppState) -> anyhow::Result<DashboardTemplate> {
    let prospects = state.store.load_prospects()?;
    let log = state.store.load_log()?;
    let stats = state.store.load_stats()?;
    let analytics = state.store.load_analytics()?;

    let contacted = contacted_set(&log);

    let prospect_views: Vec<ProspectView> = prospects
        .iter()
        .map(|p| ProspectView {
            username: format!("@{}", p.username),
            quality: p.quality.label().to_string(),
            quality_css: format!("quality-{}", p.quality.label()),
            score: p.score,
            text: p.text.clone(),
            contacted: contacted.contains(&p.username.to_lowercase()),
            profile_link: p.profile_link.clone(),
        })
        .collect();

    // Newest sends first.
    let recent: Vec<LogView> = log
        .iter()
        .rev()
        .take(25)
        .map(|e| LogView {
            username: format!("@{}", e.username),
            template_used: e.template_used.clone(),
            status: e.response_status.label().to_string(),
            status_css: match e.response_status {
                ResponseStatus::Sent => "status-sent",
                ResponseStatus::Positive => "status-positive",
                ResponseStatus::Neutral => "status-neutral",
                ResponseStatus::NotInterested => "status-negative",
            }
            .to_string(),
            quality: e.prospect_quality.label().to_string(),
            date: e.timestamp.format("%Y-%m-%d %H:%M").to_string(),
        })
        .collect();

    let by_template = template_breakdown(&stats.by_template);
    let by_quality: Vec<(String, u32)> = Quality::all()
        .iter()
        .filter_map(|q| {
            let count = stats.by_quality.get(q.label()).copied().unwrap_or(0);
            (count > 0).then(|| (q.label().to_string(), count))
        })
        .collect();
    let mut by_source: Vec<(String, u32)> =
        stats.by_source.iter().map(|(k, v)| (k.clone(), *v)).collect();
    by_source.sort_by(|a, b| b.1.cmp(&a.1));

    let response_rate = if stats.total_messages > 0 {
        format!("{:.0}%", stats.responses.response_rate)
    } else {
        "—".to_string()
    };
    let positive_rate = if stats.responses.total_responses > 0 {
        format!("{:.0}%", stats.responses.positive_rate)
    } else {
        "—".to_string()
    };

    let ai_avg_confidence = if analytics.is_empty() {
        "—".to_string()
    } else {
        let sum: f32 = analytics.iter().map(|a| a.confidence).sum();
        format!("{:.2}", sum / analytics.len() as f32)
    };

    let uncontacted_count = prospect_views.iter().filter(|p| !p.contacted).count();

    Ok(DashboardTemplate {
        total_messages: stats.total_messages,
        total_prospects: prospect_views.len(),
        uncontacted_count,
        response_rate,
        positive_rate,
        by_template,
        by_quality,
        by_source,
        ai_generations: analytics.len(),
        ai_avg_confidence,
        prospects: prospect_views,
        recent,
    })
}

fn template_breakdown(counts: &HashMap<String, u32>) -> Vec<(String, u32)> {
    // Known templates in a fixed order, then anything else ("ai").
    let mut rows: Vec<(String, u32)> = TemplateName::all()
        .iter()
        .filter_map(|t| {
            let count = counts.get(t.label()).copied().unwrap_or(0);
            (count > 0).then(|| (t.label().to_string(), count))
        })
        .collect();

    let known: Vec<&str> = TemplateName::all().iter().map(|t| t.label()).collect();
    let mut extra: Vec<(String, u32)> = counts
        .iter()
        .filter(|(k, _)| !known.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), *v))
        .collect();
    extra.sort_by(|a, b| b.1.cmp(&a.1));
    rows.extend(extra);
    rows
}
