//! CareFeed - notification feed for the home-care CRM
//!
//! A CLI companion that scans the CRM's locally synced JSON stores and
//! derives a prioritized notification feed, with read/dismiss state
//! persisted alongside the stores.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (bad arguments, unreadable store directory, etc.)

mod cli;
mod config;
mod feed;
mod models;
mod report;
mod scan;
mod service;
mod sources;
mod store;

use anyhow::{Context, Result};
use chrono::Local;
use cli::{Args, Command, OutputFormat};
use config::Config;
use feed::FeedAggregator;
use indicatif::{ProgressBar, ProgressStyle};
use models::NotificationDraft;
use service::NotificationService;
use std::time::Duration;
use store::FileStore;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle init-config early (no logging needed)
    if matches!(args.command, Command::InitConfig) {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    debug!("Arguments: {:?}", args);

    match run(args).await {
        Ok(()) => Ok(()),
        Err(e) => {
            error!("carefeed failed: {}", e);
            eprintln!("\n❌ Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Handle init-config: generate a default .carefeed.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(".carefeed.toml");

    if path.exists() {
        eprintln!("⚠️  .carefeed.toml already exists. Remove it first or edit it manually.");
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).context("Failed to write .carefeed.toml")?;

    println!("✅ Created .carefeed.toml with default settings.");
    println!("   Edit it to point store_dir at your CRM sync directory.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Dispatch the selected subcommand.
async fn run(args: Args) -> Result<()> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    let format = effective_format(&args, &config);

    let store = FileStore::open(&config.general.store_dir)
        .with_context(|| format!("Failed to open store at {}", config.general.store_dir))?;
    info!("store: {}", store.dir().display());

    let mut aggregator = FeedAggregator::new(store);

    match args.command {
        Command::Show => {
            aggregator.recompute();
            print!("{}", render_feed(&aggregator, format)?);
        }
        Command::Read { ref id } => {
            aggregator.recompute();
            aggregator.mark_read(id)?;
            println!("✅ Marked read: {}", id);
            println!("   {} unread remaining", aggregator.unread_count());
        }
        Command::ReadAll => {
            aggregator.recompute();
            let count = aggregator.notifications().len();
            aggregator.mark_all_read()?;
            println!("✅ Marked {} notifications read", count);
        }
        Command::Dismiss { ref id } => {
            aggregator.recompute();
            aggregator.dismiss(id)?;
            println!("✅ Dismissed: {}", id);
        }
        Command::Clear => {
            aggregator.recompute();
            let count = aggregator.notifications().len();
            aggregator.clear_all()?;
            println!("✅ Dismissed {} notifications", count);
        }
        Command::Add {
            title,
            message,
            category,
            priority,
            link,
        } => {
            let draft = NotificationDraft {
                category: category.as_str().into(),
                title,
                message,
                priority: priority.map(Into::into),
                link,
            };
            let n = aggregator.add_notification(draft);
            println!("✅ Added notification: {}", n.id);
            println!("   (session-only: it disappears when this process exits)");
        }
        Command::Watch => {
            let poll = Duration::from_secs(config.feed.poll_interval_secs);
            run_watch(aggregator, poll, format).await?;
        }
        Command::InitConfig => unreachable!("handled before logging"),
    }

    Ok(())
}

/// Watch mode: reprint the digest whenever a recompute changes the feed.
async fn run_watch(
    aggregator: FeedAggregator<FileStore>,
    poll: Duration,
    format: OutputFormat,
) -> Result<()> {
    let mut service = NotificationService::new(aggregator, poll);
    let mut rx = service.subscribe();
    service.start();

    println!("👀 Watching (recompute every {}s, Ctrl-C to stop)...\n", poll.as_secs());

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.enable_steady_tick(Duration::from_millis(120));

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                break;
            }
            changed = rx.changed() => {
                if changed.is_err() {
                    warn!("snapshot channel closed");
                    break;
                }
                let snapshot = rx.borrow_and_update().clone();
                let generated_at = snapshot
                    .generated_at
                    .unwrap_or_else(|| Local::now().naive_local());
                let output = match format {
                    OutputFormat::Markdown => report::generate_markdown_digest(
                        &snapshot.notifications,
                        &snapshot.summary,
                        generated_at,
                    ),
                    OutputFormat::Json => report::generate_json_digest(
                        &snapshot.notifications,
                        &snapshot.summary,
                        generated_at,
                    )?,
                };
                spinner.suspend(|| print!("{}", output));
                spinner.set_message(format!(
                    "{} notifications, {} unread",
                    snapshot.summary.total, snapshot.summary.unread
                ));
            }
        }
    }

    spinner.finish_and_clear();
    service.stop();
    println!("\n✅ Stopped watching.");
    Ok(())
}

/// Render the aggregator's current feed in the chosen format.
fn render_feed(aggregator: &FeedAggregator<FileStore>, format: OutputFormat) -> Result<String> {
    let now = Local::now().naive_local();
    let summary = aggregator.summary();
    match format {
        OutputFormat::Markdown => Ok(report::generate_markdown_digest(
            aggregator.notifications(),
            &summary,
            now,
        )),
        OutputFormat::Json => {
            report::generate_json_digest(aggregator.notifications(), &summary, now)
        }
    }
}

/// Resolve the output format: CLI first, then config, then markdown.
fn effective_format(args: &Args, config: &Config) -> OutputFormat {
    if let Some(format) = args.format {
        return format;
    }
    match config.digest.format.to_lowercase().as_str() {
        "json" => OutputFormat::Json,
        _ => OutputFormat::Markdown,
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from .carefeed.toml");
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_effective_format_cli_wins() {
        let args = Args::parse_from(["carefeed", "show", "--format", "json"]);
        let mut config = Config::default();
        config.digest.format = "markdown".to_string();
        assert_eq!(effective_format(&args, &config), OutputFormat::Json);
    }

    #[test]
    fn test_effective_format_falls_back_to_config() {
        let args = Args::parse_from(["carefeed", "show"]);
        let mut config = Config::default();
        config.digest.format = "json".to_string();
        assert_eq!(effective_format(&args, &config), OutputFormat::Json);

        config.digest.format = "nonsense".to_string();
        assert_eq!(effective_format(&args, &config), OutputFormat::Markdown);
    }
}
