use std::panic;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, ProfilerConfig};
use crate::core::pipeline::benchmark::run_all;
use crate::core::traits::builder::Builder;
use crate::native::builder::GccBuilder;
use crate::native::prerequisites::{SetupError, resolve_tools};
use crate::native::process_tree::SysinfoProcessTree;
use crate::native::supervisor::TimedSupervisor;
use crate::report::table::render_summary_table;

mod cli;
mod constants;
mod core;
mod native;
mod report;
#[cfg(test)]
mod stubs;

#[tokio::main]
#[tracing::instrument]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    set_panic_hook();

    let cli = Cli::parse();
    match cli.command {
        Some(Command::PlotCpu(args)) => {
            report::plot_cpu_logs(&args.dir, Duration::from_secs(args.sample_interval)).await?;
        }
        Some(Command::Profile(args)) => profile(args.into()).await?,
        None => profile(cli.profile.into()).await?,
    }

    Ok(())
}

async fn profile(mut config: ProfilerConfig) -> Result<(), Box<dyn std::error::Error>> {
    resolve_tools(&mut config)?;
    tracing::info!(
        "All required tools found: harness={}, sampler={}",
        config.harness.program.display(),
        config.sampler.program.display()
    );

    let executable = match &config.prebuilt_executable {
        Some(path) => path.clone(),
        None => GccBuilder::new()
            .build(&config.build)
            .await
            .map_err(SetupError::from)?,
    };

    let supervisor = TimedSupervisor::new(
        config.harness.clone(),
        config.sampler.clone(),
        config.discovery,
        Arc::new(SysinfoProcessTree::new()),
    );
    let outcome = run_all(
        &supervisor,
        executable,
        config.timeout,
        config.parameters.iter().copied(),
    )
    .await;

    for log in &outcome.sampler_logs {
        let path = report::write_sampler_log(&config.output_dir, log).await?;
        tracing::debug!("Sampler log saved to {}", path.display());
    }

    if let Some((parameter, failure)) = &outcome.failure {
        if !config.report_partial {
            tracing::warn!(
                "Skipping report generation due to benchmark failure at parameter {}: {}",
                parameter,
                failure
            );
            return Ok(());
        }
        tracing::warn!(
            "Reporting {} completed run(s) before the failure at parameter {}",
            outcome.results.len(),
            parameter
        );
    }

    if outcome.results.is_empty() {
        tracing::warn!("No completed runs to report");
        return Ok(());
    }

    println!("{}", render_summary_table(&outcome.results));
    report::generate_reports(&outcome.results, &config.output_dir).await?;
    for log in &outcome.sampler_logs {
        report::plot_cpu_series(&config.output_dir, log.parameter, &log.series, config.sampler.interval)
            .await?;
    }
    tracing::info!("Report generation complete");

    Ok(())
}

fn set_panic_hook() {
    panic::set_hook(Box::new(|panic_info| {
        tracing::error!(
            message = "panic occurred",
            panic = %panic_info
        );
    }));
}
