//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};

/// Stat cards for public developer profiles, with a stale-while-revalidate cache.
#[derive(Parser, Debug)]
#[command(name = "statcard")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    // === Global flags ===
    /// Output format
    #[arg(long, value_enum, global = true)]
    pub format: Option<OutputFormat>,

    /// Shorthand for --format json
    #[arg(long, global = true)]
    pub json: bool,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Log level
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Emit JSONL logs to stderr
    #[arg(long, global = true)]
    pub json_output: bool,

    /// Verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl Cli {
    /// Resolve the effective output format.
    #[must_use]
    pub fn effective_format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            self.format.unwrap_or_default()
        }
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch stat-card data for one or more sources (default command)
    Fetch(FetchArgs),

    /// Inspect or clear cached records
    #[command(subcommand)]
    Cache(CacheCommand),

    /// Show resolved configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

/// Arguments for the `fetch` command.
#[derive(Parser, Debug, Default)]
pub struct FetchArgs {
    /// Sources to fetch (wakatime, codechef, leetcode, or "all")
    #[arg(value_name = "SOURCE")]
    pub sources: Vec<String>,

    /// Identity (username or share URL); only valid with a single source
    #[arg(long, value_name = "ID")]
    pub identity: Option<String>,

    /// Ignore fresh cache entries and hit the network
    #[arg(long)]
    pub refresh: bool,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,
}

impl FetchArgs {
    /// Validate argument combinations.
    ///
    /// # Errors
    ///
    /// Returns a config error for `--identity` with several sources or a
    /// zero timeout.
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::StatError;

        let named = self
            .sources
            .iter()
            .filter(|s| !s.eq_ignore_ascii_case("all"))
            .count();
        if self.identity.is_some() && (named != 1 || self.sources.len() != 1) {
            return Err(StatError::Config(
                "--identity requires exactly one source".to_string(),
            ));
        }

        if self.timeout == Some(0) {
            return Err(StatError::Config(
                "Timeout must be greater than 0 seconds".to_string(),
            ));
        }

        Ok(())
    }
}

/// Cache subcommands.
#[derive(Subcommand, Debug)]
pub enum CacheCommand {
    /// List cached entries with their age
    List,

    /// Print the cached record for a source
    Show {
        /// Source name
        source: String,

        /// Identity (defaults to the configured one)
        #[arg(long, value_name = "ID")]
        identity: Option<String>,
    },

    /// Remove cached entries (all, or one source)
    Clear {
        /// Source name; omit to clear everything
        source: Option<String>,
    },
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the effective configuration and where each value came from
    Show,

    /// Print the config file path
    Path,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable colored output
    #[default]
    Human,
    /// JSON output
    Json,
    /// Markdown output
    Md,
}

impl OutputFormat {
    /// Lowercase name as used on the command line.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Human => "human",
            Self::Json => "json",
            Self::Md => "md",
        }
    }
}
