//! nudge - CLI front end for the pattern detection and suggestion engine
//!
//! Reads a JSONL tracking-event export, detects behavioral patterns, and
//! optionally runs a suggestion pass over them.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use nudge_core::engine::SuggestionSession;
use nudge_core::types::{Pattern, Suggestion};
use nudge_core::{analyzer, ingest, Config};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "nudge")]
#[command(about = "Detect behavioral patterns and rank suggestions")]
#[command(version)]
struct Args {
    /// Path to config file (defaults to ~/.config/nudge/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Detect patterns in an event export and print them
    Analyze {
        /// JSONL event export to analyze (defaults to events.jsonl in the
        /// data directory)
        events: Option<PathBuf>,

        /// Only consider events for this user
        #[arg(short, long)]
        user: Option<String>,

        /// Output format: text (default) or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },
    /// Run a full suggestion pass over an event export
    Suggest {
        /// JSONL event export to analyze (defaults to events.jsonl in the
        /// data directory)
        events: Option<PathBuf>,

        /// Only consider events for this user
        #[arg(short, long)]
        user: Option<String>,

        /// Output format: text (default) or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    Config::ensure_xdg_env();

    let config = match &args.config {
        Some(path) => Config::load_from(path).context("failed to load configuration")?,
        None => Config::load().context("failed to load configuration")?,
    };

    let _log_guard =
        nudge_core::logging::init(&config.logging).context("failed to initialize logging")?;

    match args.command {
        Command::Analyze {
            events,
            user,
            format,
        } => analyze(&resolve_events_path(events), user.as_deref(), &format),
        Command::Suggest {
            events,
            user,
            format,
        } => suggest(&config, &resolve_events_path(events), user.as_deref(), &format),
    }
}

fn resolve_events_path(events: Option<PathBuf>) -> PathBuf {
    events.unwrap_or_else(|| Config::data_dir().join("events.jsonl"))
}

fn load_events(
    path: &PathBuf,
    user: Option<&str>,
) -> Result<Vec<nudge_core::types::TrackingEvent>> {
    let export = ingest::read_events(path)
        .with_context(|| format!("failed to read event export {}", path.display()))?;

    for warning in &export.warnings {
        eprintln!("warning: {}", warning);
    }

    let events = match user {
        Some(user_id) => export
            .events
            .into_iter()
            .filter(|e| e.user_id == user_id)
            .collect(),
        None => export.events,
    };
    Ok(events)
}

fn analyze(path: &PathBuf, user: Option<&str>, format: &str) -> Result<()> {
    let events = load_events(path, user)?;
    tracing::info!(events = events.len(), "Running pattern detection");

    let patterns = analyzer::detect_patterns(&events);

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&patterns)?),
        _ => print_patterns(&patterns, events.len()),
    }
    Ok(())
}

fn suggest(config: &Config, path: &PathBuf, user: Option<&str>, format: &str) -> Result<()> {
    let events = load_events(path, user)?;
    let patterns = analyzer::detect_patterns(&events);

    let user_id = user.unwrap_or("default");
    let mut session = SuggestionSession::new(user_id, config.engine.default_preferences());
    let visible = session.run(&patterns, Utc::now());

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&visible)?),
        _ => print_suggestions(&visible, patterns.len()),
    }
    Ok(())
}

fn print_patterns(patterns: &[Pattern], event_count: usize) {
    if patterns.is_empty() {
        println!("No patterns found in {} event(s).", event_count);
        return;
    }
    println!(
        "Found {} pattern(s) in {} event(s):\n",
        patterns.len(),
        event_count
    );
    for p in patterns {
        println!(
            "  [{}] {} (confidence {:.2})",
            p.kind.pattern_type(),
            p.event_type,
            p.confidence
        );
    }
}

fn print_suggestions(suggestions: &[Suggestion], pattern_count: usize) {
    if suggestions.is_empty() {
        println!("No suggestions surfaced from {} pattern(s).", pattern_count);
        return;
    }
    println!("{} suggestion(s):\n", suggestions.len());
    for s in suggestions {
        println!("  {} (score {:.2})", s.title, s.relevance_score);
        println!("    {}", s.description);
        println!("    id: {}  category: {}", s.id, s.category);
        println!();
    }
}
