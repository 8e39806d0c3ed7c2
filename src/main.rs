use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use adalyze::cli::{Cli, LogLevel};
use adalyze::pipeline::{self, PipelineConfig};
use adalyze::resilience::RetryPolicy;

/// Initialize the tracing subscriber with the CLI verbosity floor
fn init_tracing(level: LogLevel) {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.as_directive().into()))
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level);

    let mut config = PipelineConfig::new(cli.query.clone(), cli.input.clone(), cli.output_dir.clone());
    if let Some(baseline) = cli.baseline {
        config.baseline_path = baseline;
    }
    config.baseline_policy = cli.baseline_mode.into();
    config.drift_enabled = !cli.no_drift;
    config.recent_days = cli.recent_days;
    config.retry = RetryPolicy {
        max_retries: cli.max_retries,
        ..RetryPolicy::default()
    };

    let outcome = pipeline::run(&config)?;

    println!("Analysis complete: {}", config.query);
    println!("  plan: {}", outcome.plan.steps.join(" -> "));
    println!(
        "  insights: {} generated, {} flagged for review",
        outcome.insights.len(),
        outcome.validated.iter().filter(|v| v.needs_review).count()
    );
    println!("  creatives: {}", outcome.creatives.len());
    if let Some(drift) = &outcome.drift {
        if drift.has_drift {
            println!("  drift: detected ({:?})", drift.severity);
        } else {
            println!("  drift: none");
        }
    }
    println!("  report: {}", outcome.report_path.display());

    Ok(())
}
