mod app;
mod cli;
mod effects;
mod logging;
mod preferences;
mod render;

use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use jobwatch_core::{JobKind, JobStatus};
use jobwatch_engine::EngineConfig;
use watch_logging::watch_info;

use crate::app::App;
use crate::cli::{Cli, Command, SearchArgs};
use crate::effects::EffectRunner;
use crate::preferences::Preferences;

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::initialize(cli.log, cli.verbose);

    let prefs_path = cli.prefs.clone().unwrap_or_else(preferences::default_path);
    let prefs = preferences::load(&prefs_path);

    if let Command::Prefs(args) = &cli.command {
        return update_preferences(&prefs_path, prefs, cli.base_url.clone(), args);
    }

    let config = EngineConfig {
        base_url: cli.base_url.clone().unwrap_or_else(|| prefs.base_url.clone()),
        ..EngineConfig::default()
    };
    watch_info!("jobwatch using {}", config.base_url);
    let runner = EffectRunner::new(&config).context("failed to start the engine")?;
    let mut app = App::new(runner, io::stdout());

    match cli.command {
        Command::Crawl(args) => report(app.follow(JobKind::Crawl, args.job_id, args.console)?),
        Command::Index(args) => report(app.follow(JobKind::Index, args.job_id, args.console)?),
        Command::Stop { kind, job_id } => app.stop(
            kind.into(),
            job_id,
            config.control_timeout + config.connect_timeout,
        ),
        Command::Search { query, options } => {
            app.search(&query.join(" "), options.apply(prefs.search))
        }
        Command::Prefs(_) => Ok(()),
    }
}

fn report(status: JobStatus) -> Result<()> {
    if status == JobStatus::Cancelled {
        eprintln!("job was cancelled");
    }
    Ok(())
}

fn update_preferences(
    path: &Path,
    mut prefs: Preferences,
    base_url: Option<String>,
    args: &SearchArgs,
) -> Result<()> {
    if base_url.is_some() || !args.is_empty() {
        if let Some(base_url) = base_url {
            prefs.base_url = base_url;
        }
        prefs.search = args.apply(prefs.search);
        preferences::save(path, &prefs)
            .with_context(|| format!("failed to save preferences to {}", path.display()))?;
    }

    println!("preferences: {}", path.display());
    println!("  base_url: {}", prefs.base_url);
    println!("  limit:    {}", prefs.search.effective_limit());
    println!("  provider: {}", prefs.search.provider);
    println!("  filter:   {}", prefs.search.origin_filter);
    Ok(())
}
