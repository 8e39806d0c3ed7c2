//! CLI argument parsing for Adalyze

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::drift::BaselinePolicy;

/// Verbosity floor for the log output
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    /// Errors only
    Error,
    /// Warnings and errors
    Warn,
    /// Stage progress (default)
    Info,
    /// Per-attempt retry detail
    Debug,
    /// Everything
    Trace,
}

impl LogLevel {
    pub fn as_directive(self) -> tracing::Level {
        match self {
            Self::Error => tracing::Level::ERROR,
            Self::Warn => tracing::Level::WARN,
            Self::Info => tracing::Level::INFO,
            Self::Debug => tracing::Level::DEBUG,
            Self::Trace => tracing::Level::TRACE,
        }
    }
}

/// Baseline update policy, mirrored for clap
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum BaselineMode {
    /// Every completed run updates the baseline (default)
    Always,
    /// Only schema-valid runs update the baseline
    OnValid,
    /// Compare against the baseline but never update it
    Never,
}

impl From<BaselineMode> for BaselinePolicy {
    fn from(mode: BaselineMode) -> Self {
        match mode {
            BaselineMode::Always => BaselinePolicy::Always,
            BaselineMode::OnValid => BaselinePolicy::OnValidRun,
            BaselineMode::Never => BaselinePolicy::Never,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "adalyze")]
#[command(version)]
#[command(about = "Resilient ad-performance diagnosis pipeline", long_about = None)]
pub struct Cli {
    /// Analysis question, e.g. "Why did ROAS drop last week?"
    #[arg(value_name = "QUERY", default_value = "Diagnose recent performance changes")]
    pub query: String,

    /// Path to the campaign performance CSV
    #[arg(short, long, value_name = "FILE", default_value = "data/ads.csv")]
    pub input: PathBuf,

    /// Directory for insights.json, creatives.json and report.md
    #[arg(short, long = "output-dir", value_name = "DIR", default_value = "outputs")]
    pub output_dir: PathBuf,

    /// Baseline statistics file (defaults to <output-dir>/baseline_stats.json)
    #[arg(long, value_name = "FILE")]
    pub baseline: Option<PathBuf>,

    /// When a run's statistics replace the stored baseline
    #[arg(long = "baseline-mode", value_enum, default_value = "always")]
    pub baseline_mode: BaselineMode,

    /// Skip drift detection and baseline updates entirely
    #[arg(long = "no-drift")]
    pub no_drift: bool,

    /// Size of the recent comparison window, in days
    #[arg(long = "recent-days", value_name = "DAYS", default_value = "14")]
    pub recent_days: i64,

    /// Total attempts per stage before falling back
    #[arg(long = "max-retries", value_name = "N", default_value = "3")]
    pub max_retries: u32,

    /// Log verbosity
    #[arg(long = "log-level", value_enum, default_value = "info")]
    pub log_level: LogLevel,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let cli = Cli::parse_from(["adalyze"]);
        assert_eq!(cli.input, PathBuf::from("data/ads.csv"));
        assert_eq!(cli.output_dir, PathBuf::from("outputs"));
        assert!(!cli.no_drift);
        assert_eq!(cli.recent_days, 14);
        assert_eq!(cli.max_retries, 3);
        assert!(cli.baseline.is_none());
    }

    #[test]
    fn query_is_positional() {
        let cli = Cli::parse_from(["adalyze", "Why did CTR drop?"]);
        assert_eq!(cli.query, "Why did CTR drop?");
    }

    #[test]
    fn baseline_mode_maps_to_policy() {
        let cli = Cli::parse_from(["adalyze", "--baseline-mode", "never"]);
        assert_eq!(BaselinePolicy::from(cli.baseline_mode), BaselinePolicy::Never);
    }

    #[test]
    fn no_drift_flag_parses() {
        let cli = Cli::parse_from(["adalyze", "--no-drift", "--max-retries", "1"]);
        assert!(cli.no_drift);
        assert_eq!(cli.max_retries, 1);
    }
}
