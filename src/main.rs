use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use alcance::analysis::analyze;
use alcance::config::AppConfig;
use alcance::extract::{extract_prospects, Prospect};
use alcance::message::{build_prompt, compose, AiClient, AiResult};
use alcance::outreach::{self, contacted_set, ResponseStatus};
use alcance::page::{self, AutoLoadOutcome, AutoLoader};
use alcance::storage::Store;
use alcance::web;

/// How long the CLI waits for an auto-load run before giving up on it.
/// The browser-side budget is shorter; this is the outer safety net.
const AUTOLOAD_RACE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Parser)]
#[command(name = "alcance", about = "Prospect extraction and outreach for pegboard accessory pages")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a page's topical relevance and engagement
    Relevance {
        /// Page URL (fetched over HTTP)
        #[arg(long, conflicts_with = "file")]
        url: Option<String>,
        /// Saved HTML file instead of a live fetch
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Extract commenters as prospects and store them
    Extract {
        #[arg(long, conflicts_with = "file")]
        url: Option<String>,
        #[arg(long)]
        file: Option<PathBuf>,
        /// Source URL to record when extracting from a file
        #[arg(long)]
        source: Option<String>,
    },
    /// Reveal all comments via a headless browser (clicks + scrolling)
    Autoload {
        url: String,
        /// Also run prospect extraction on the revealed page
        #[arg(long)]
        extract: bool,
    },
    /// List stored prospects
    Prospects {
        /// Only prospects not yet contacted
        #[arg(long)]
        uncontacted: bool,
    },
    /// Compose a message for a prospect and log the send
    Send {
        username: String,
        /// Print the message without logging it
        #[arg(long)]
        dry_run: bool,
    },
    /// Record a prospect's reply (positive, neutral, not_interested)
    Respond {
        username: String,
        response: String,
    },
    /// Serve the campaign dashboard
    Dashboard,
    /// Export the outreach log as CSV
    Export,
    /// Print campaign statistics
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "alcance=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load()?;
    let store = Store::open(&config.storage.data_dir)?;

    match cli.command {
        Commands::Relevance { url, file } => {
            let html = load_page(url.as_deref(), file.as_deref()).await?;
            let result = page::score_page(&html);
            println!("Relevance score: {}", result.relevance_score);
            println!(
                "Engagement:      {} comments, {} likes, {} makes, {} downloads (total {})",
                result.engagement.comments,
                result.engagement.likes,
                result.engagement.makes,
                result.engagement.downloads,
                result.total_engagement
            );
            println!("Recommendation:  {}", result.recommendation);
            Ok(())
        }
        Commands::Extract { url, file, source } => {
            let html = load_page(url.as_deref(), file.as_deref()).await?;
            let source_url = url
                .or(source)
                .unwrap_or_else(|| "file://local".to_string());
            extract_and_store(&store, &html, &source_url)
        }
        Commands::Autoload { url, extract } => {
            let loader = AutoLoader::new(&config.loader.webdriver_url);

            let loaded =
                match tokio::time::timeout(AUTOLOAD_RACE_TIMEOUT, loader.run(&url)).await {
                    Ok(loaded) => loaded,
                    Err(_) => {
                        // The page-side run keeps going; we just stop waiting.
                        println!("Auto-load did not finish within 30s, gave up waiting.");
                        return Ok(());
                    }
                };

            print_autoload(&loaded.outcome);

            if extract {
                match loaded.html {
                    Some(html) => extract_and_store(&store, &html, &url)?,
                    None => println!("No page source captured, skipping extraction."),
                }
            }
            Ok(())
        }
        Commands::Prospects { uncontacted } => {
            let prospects = store.load_prospects()?;
            if prospects.is_empty() {
                println!("No prospects stored. Run 'extract' first.");
                return Ok(());
            }
            let log = store.load_log()?;
            let contacted = contacted_set(&log);

            let mut shown = 0usize;
            for p in &prospects {
                let is_contacted = contacted.contains(&p.username.to_lowercase());
                if uncontacted && is_contacted {
                    continue;
                }
                shown += 1;
                println!(
                    "{:>3} | @{:<20} | {:<6} | {:>3} | {} | {}",
                    shown,
                    truncate(&p.username, 20),
                    p.quality,
                    p.score,
                    if is_contacted { "contacted" } else { "open" },
                    truncate(&p.text, 70),
                );
            }
            println!("\n{} prospects shown ({} stored)", shown, prospects.len());
            Ok(())
        }
        Commands::Send { username, dry_run } => {
            send_message(&store, &config, &username, dry_run).await
        }
        Commands::Respond { username, response } => {
            let status = ResponseStatus::parse_response(&response).context(
                "Response must be one of: positive, neutral, not_interested",
            )?;
            outreach::record_response(&store, &username, status)?;
            println!("Recorded {} response from @{}", status, username);
            Ok(())
        }
        Commands::Dashboard => {
            let state = web::state::AppState::new(store);
            let router = web::create_router(state);
            let addr = format!("{}:{}", config.web.host, config.web.port);
            info!("Dashboard at http://{}", addr);
            let listener = tokio::net::TcpListener::bind(&addr)
                .await
                .context("Failed to bind dashboard address")?;
            axum::serve(listener, router)
                .await
                .context("Dashboard server error")?;
            Ok(())
        }
        Commands::Export => {
            let path = store.export_csv()?;
            println!("Exported outreach log to {}", path.display());
            Ok(())
        }
        Commands::Stats => {
            let stats = store.load_stats()?;
            println!("Messages sent:  {}", stats.total_messages);
            println!("Responses:      {} ({:.0}% response rate)",
                stats.responses.total_responses, stats.responses.response_rate);
            println!(
                "                {} positive, {} neutral, {} not interested",
                stats.responses.positive, stats.responses.neutral, stats.responses.negative
            );
            print_breakdown("By month", &stats.by_month);
            print_breakdown("By template", &stats.by_template);
            print_breakdown("By quality", &stats.by_quality);
            print_breakdown("By source", &stats.by_source);
            Ok(())
        }
    }
}

async fn load_page(url: Option<&str>, file: Option<&std::path::Path>) -> Result<String> {
    match (url, file) {
        (Some(url), None) => page::fetch_html(url).await,
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {:?}", path)),
        _ => anyhow::bail!("Provide exactly one of --url or --file"),
    }
}

fn extract_and_store(store: &Store, html: &str, source_url: &str) -> Result<()> {
    let prospects = extract_prospects(html, source_url);
    if prospects.is_empty() {
        println!("No prospects found on this page.");
        return Ok(());
    }

    for p in &prospects {
        info!("@{} ({}, score {}): {}", p.username, p.quality, p.score, truncate(&p.text, 60));
    }

    let added = store.append_prospects(&prospects)?;
    println!("Stored {} prospects from {}", added, source_url);
    Ok(())
}

async fn send_message(
    store: &Store,
    config: &AppConfig,
    username: &str,
    dry_run: bool,
) -> Result<()> {
    let prospects = store.load_prospects()?;
    // Latest extraction wins when a username appears more than once.
    let prospect: &Prospect = prospects
        .iter()
        .rev()
        .find(|p| p.username.eq_ignore_ascii_case(username))
        .with_context(|| format!("No prospect named @{}", username))?;

    let log = store.load_log()?;
    if contacted_set(&log).contains(&prospect.username.to_lowercase()) {
        anyhow::bail!(
            "@{} is already in the outreach log; not messaging twice",
            prospect.username
        );
    }

    let analysis = analyze(prospect);
    let ai = AiClient::from_config(&config.ai);

    let (message, template_used, ai_generated) =
        match ai.generate(&build_prompt(prospect, &analysis)).await {
            AiResult::Generated(text) => (text, "ai".to_string(), true),
            AiResult::NotConfigured => {
                let (template, text) = compose(&analysis);
                (text, template.label().to_string(), false)
            }
            AiResult::Failed(e) => {
                warn!("AI generation failed, falling back to template: {}", e);
                let (template, text) = compose(&analysis);
                (text, template.label().to_string(), false)
            }
        };

    println!("--- message for @{} ({} template) ---", prospect.username, template_used);
    println!("{}", message);
    println!("---");

    if dry_run {
        println!("Dry run: nothing logged.");
        return Ok(());
    }

    if ai_generated {
        outreach::log_ai_message(store, prospect, &analysis, &message)?;
    } else {
        outreach::log_message(store, prospect, &message, &template_used)?;
    }
    println!(
        "Logged outreach to @{}. Paste the message into their profile: {}",
        prospect.username, prospect.profile_link
    );
    Ok(())
}

fn print_autoload(outcome: &AutoLoadOutcome) {
    println!(
        "Auto-load {}: {} comments visible after {} scrolls ({})",
        if outcome.success { "succeeded" } else { "failed" },
        outcome.comments_found,
        outcome.scrolls_performed,
        outcome.message
    );
}

fn print_breakdown(title: &str, counts: &std::collections::HashMap<String, u32>) {
    if counts.is_empty() {
        return;
    }
    let mut rows: Vec<_> = counts.iter().collect();
    rows.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    println!("\n{}:", title);
    for (name, count) in rows {
        println!("  {:<40} {:>4}", truncate(name, 40), count);
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}
