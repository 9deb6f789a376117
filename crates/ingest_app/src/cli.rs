use std::path::PathBuf;

use clap::Parser;

use crate::logging::LogDestination;

/// Watch embedding ingestion jobs and render their progress.
#[derive(Debug, Parser)]
#[command(name = "ingest-watch", version)]
pub struct Cli {
    /// RON configuration file; flags below override its values.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Status endpoint queried for job progress.
    #[arg(long)]
    pub status_url: Option<String>,

    /// Job identifier to watch (repeatable).
    #[arg(long = "job")]
    pub jobs: Vec<String>,

    #[arg(long, conflicts_with = "legacy_poll")]
    pub poll_interval_ms: Option<u64>,

    /// Poll every 10 seconds instead of every 5.
    #[arg(long)]
    pub legacy_poll: bool,

    #[arg(long)]
    pub animation_interval_ms: Option<u64>,

    /// Units per second assumed before a job's real rate is known.
    #[arg(long)]
    pub default_velocity: Option<f64>,

    /// Exit once every job has completed or failed.
    #[arg(long)]
    pub exit_when_idle: bool,

    /// Print the effective configuration as RON and exit.
    #[arg(long)]
    pub print_config: bool,

    #[arg(long, value_enum, default_value_t = LogDestination::File)]
    pub log: LogDestination,

    /// Log file path; overrides `log_file` from the config file.
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_job_flags_accumulate() {
        let cli = Cli::parse_from([
            "ingest-watch",
            "--job",
            "http://a",
            "--job",
            "http://b",
            "--log",
            "terminal",
        ]);
        assert_eq!(cli.jobs, vec!["http://a", "http://b"]);
        assert_eq!(cli.log, LogDestination::Terminal);
        assert!(!cli.exit_when_idle);
    }

    #[test]
    fn legacy_poll_conflicts_with_explicit_interval() {
        let result = Cli::try_parse_from([
            "ingest-watch",
            "--legacy-poll",
            "--poll-interval-ms",
            "1000",
        ]);
        assert!(result.is_err());
    }
}
