//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::{Parser, Subcommand};
use std::fmt;
use std::path::PathBuf;

/// CareFeed - notification feed for the home-care CRM
///
/// Scans the CRM's locally synced stores (appointments, tasks, messages,
/// team chat, email) and produces a prioritized notification feed.
///
/// Examples:
///   carefeed show
///   carefeed show --format json
///   carefeed watch --poll-interval 15
///   carefeed dismiss appt-a1-starting-soon
///   carefeed add --title "Backup done" --message "Nightly export finished"
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Directory holding the CRM's synced JSON store
    ///
    /// Can also be set via CAREFEED_STORE_DIR or .carefeed.toml.
    #[arg(long, value_name = "DIR", env = "CAREFEED_STORE_DIR", global = true)]
    pub store_dir: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .carefeed.toml in the current directory
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Output format for feed digests (markdown, json)
    #[arg(long, value_name = "FORMAT", global = true)]
    pub format: Option<OutputFormat>,

    /// Seconds between recomputes in watch mode
    #[arg(long, value_name = "SECS", global = true)]
    pub poll_interval: Option<u64>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Print the current notification feed and exit
    Show,

    /// Keep scanning and reprint the feed whenever it changes
    Watch,

    /// Mark one notification read
    Read {
        /// Notification id (shown in the digest)
        id: String,
    },

    /// Mark every visible notification read
    ReadAll,

    /// Dismiss one notification
    Dismiss {
        /// Notification id (shown in the digest)
        id: String,
    },

    /// Dismiss every visible notification
    Clear,

    /// Inject a manual notification for this session
    Add {
        /// Short display title
        #[arg(long)]
        title: String,

        /// One-line display message
        #[arg(long)]
        message: String,

        /// Category (schedule, task, message, email, follow_up, system)
        #[arg(long, default_value = "system")]
        category: String,

        /// Priority (low, medium, high)
        #[arg(long)]
        priority: Option<PriorityArg>,

        /// Optional navigation link
        #[arg(long)]
        link: Option<String>,
    },

    /// Generate a default .carefeed.toml configuration file
    InitConfig,
}

/// Output format for feed digests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Markdown => write!(f, "markdown"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Priority for `add`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum PriorityArg {
    Low,
    Medium,
    High,
}

impl From<PriorityArg> for crate::models::Priority {
    fn from(p: PriorityArg) -> Self {
        match p {
            PriorityArg::Low => crate::models::Priority::Low,
            PriorityArg::Medium => crate::models::Priority::Medium,
            PriorityArg::High => crate::models::Priority::High,
        }
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(interval) = self.poll_interval {
            if interval == 0 {
                return Err("Poll interval must be at least 1 second".to_string());
            }
        }

        if let Some(ref store_dir) = self.store_dir {
            if store_dir.exists() && !store_dir.is_dir() {
                return Err(format!(
                    "Store path is not a directory: {}",
                    store_dir.display()
                ));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
