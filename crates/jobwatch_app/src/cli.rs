use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use jobwatch_core::{JobId, JobKind, OriginFilter, SearchOptions, SummaryProvider};

use crate::logging::LogDestination;

#[derive(Debug, Parser)]
#[command(
    name = "jobwatch",
    about = "Start and follow crawl and indexing jobs, and stream search answers",
    version
)]
pub struct Cli {
    /// Preferences file (default: ~/.jobwatch.ron).
    #[arg(long, global = true, env = "JOBWATCH_PREFS")]
    pub prefs: Option<PathBuf>,

    /// Service base URL; overrides the stored preference.
    #[arg(long = "base-url", global = true, env = "JOBWATCH_BASE_URL")]
    pub base_url: Option<String>,

    #[arg(long, global = true, value_enum, default_value_t = LogDestination::File)]
    pub log: LogDestination,

    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start a forum crawl and follow it until it ends.
    Crawl(FollowArgs),
    /// Start document indexing and follow it until it ends.
    Index(FollowArgs),
    /// Ask the service to stop a running job.
    Stop {
        #[arg(value_enum)]
        kind: KindArg,
        job_id: JobId,
    },
    /// Stream results and an answer for a query.
    Search {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
        #[command(flatten)]
        options: SearchArgs,
    },
    /// Show stored preferences; any option given is saved.
    Prefs(SearchArgs),
}

#[derive(Debug, Args)]
pub struct FollowArgs {
    pub job_id: JobId,

    /// Print console lines as they arrive.
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub console: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    Crawl,
    Index,
}

impl From<KindArg> for JobKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Crawl => JobKind::Crawl,
            KindArg::Index => JobKind::Index,
        }
    }
}

#[derive(Debug, Clone, Default, Args)]
pub struct SearchArgs {
    /// Number of results (1-50).
    #[arg(long)]
    pub limit: Option<u32>,

    /// Answer provider: none, local, cloud, deepseek.
    #[arg(long)]
    pub provider: Option<SummaryProvider>,

    /// Restrict results: all, documents (pdf), forum.
    #[arg(long)]
    pub filter: Option<OriginFilter>,
}

impl SearchArgs {
    pub fn is_empty(&self) -> bool {
        self.limit.is_none() && self.provider.is_none() && self.filter.is_none()
    }

    pub fn apply(&self, mut options: SearchOptions) -> SearchOptions {
        if let Some(limit) = self.limit {
            options = options.with_limit(limit);
        }
        if let Some(provider) = self.provider {
            options = options.with_provider(provider);
        }
        if let Some(filter) = self.filter {
            options = options.with_origin_filter(filter);
        }
        options
    }
}
