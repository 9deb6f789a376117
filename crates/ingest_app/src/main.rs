mod app;
mod cli;
mod config;
mod effects;
mod logging;
mod render;

use anyhow::Context;
use clap::Parser;
use ingest_logging::ingest_info;

use crate::cli::Cli;
use crate::config::AppConfig;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => config::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => AppConfig::default(),
    }
    .apply_cli(&cli);

    if cli.print_config {
        println!("{}", config.to_ron().context("failed to serialize config")?);
        return Ok(());
    }
    logging::initialize(cli.log, &config.log_file);

    if config.jobs.is_empty() {
        ingest_info!("no jobs configured; waiting for `add <id>` on stdin");
    }
    app::run(config)
}
