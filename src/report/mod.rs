//! Turns a finished benchmark into files: the CSV summary, scaling plots,
//! raw sampler logs and per-run CPU plots.

pub mod csv;
pub mod plot;
pub mod table;

use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use tokio::fs;

use crate::constants::{RAM_PLOT_FILE, SUMMARY_FILE, TIME_PLOT_FILE};
use crate::core::domain::{RunResult, SampleSeries, SamplerLog};
use crate::core::extractor::parse_sampler_series;
use crate::report::plot::{Chart, Marker, YScale, render_line_chart};

static SAMPLER_LOG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^cpu_usage_(\d+)\.log$").expect("valid regex"));

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed summary at line {line}: {detail}")]
    MalformedCsv { line: usize, detail: String },
}

#[derive(Clone, Debug, PartialEq)]
pub struct ReportPaths {
    pub summary: PathBuf,
    pub time_plot: PathBuf,
    pub ram_plot: PathBuf,
}

async fn write_file(path: PathBuf, contents: String) -> Result<PathBuf, ReportError> {
    match fs::write(&path, contents).await {
        Ok(()) => Ok(path),
        Err(source) => Err(ReportError::Io { path, source }),
    }
}

async fn ensure_dir(dir: &Path) -> Result<(), ReportError> {
    fs::create_dir_all(dir)
        .await
        .map_err(|source| ReportError::Io {
            path: dir.to_path_buf(),
            source,
        })
}

/// Writes the summary CSV plus execution-time and peak-RAM plots.
#[tracing::instrument(skip(results))]
pub async fn generate_reports(
    results: &[RunResult],
    output_dir: &Path,
) -> Result<ReportPaths, ReportError> {
    ensure_dir(output_dir).await?;

    let summary = write_file(output_dir.join(SUMMARY_FILE), csv::render_summary_csv(results)).await?;
    tracing::info!("Saved summary data to {}", summary.display());

    let time_chart = Chart {
        title: "Execution Time vs. Parameter".to_string(),
        x_label: "Parameter (N)",
        y_label: "Execution Time (seconds)",
        points: results
            .iter()
            .map(|r| (f64::from(r.parameter), r.execution_time_sec))
            .collect(),
        y_scale: YScale::Log,
        color: "blue",
        marker: Marker::Circle,
        dashed: false,
        x_ticks_at_points: true,
    };
    let time_plot = write_file(output_dir.join(TIME_PLOT_FILE), render_line_chart(&time_chart)).await?;
    tracing::info!("Saved time scaling plot to {}", time_plot.display());

    let ram_chart = Chart {
        title: "Peak RAM Usage vs. Parameter".to_string(),
        x_label: "Parameter (N)",
        y_label: "Peak RAM Usage (MB)",
        points: results
            .iter()
            .map(|r| (f64::from(r.parameter), r.peak_memory_mb))
            .collect(),
        y_scale: YScale::Log,
        color: "red",
        marker: Marker::Square,
        dashed: true,
        x_ticks_at_points: true,
    };
    let ram_plot = write_file(output_dir.join(RAM_PLOT_FILE), render_line_chart(&ram_chart)).await?;
    tracing::info!("Saved RAM scaling plot to {}", ram_plot.display());

    Ok(ReportPaths {
        summary,
        time_plot,
        ram_plot,
    })
}

pub fn sampler_log_path(output_dir: &Path, parameter: u32) -> PathBuf {
    output_dir.join(format!("cpu_usage_{}.log", parameter))
}

/// Stores the sampler output of one run exactly as it was captured.
pub async fn write_sampler_log(output_dir: &Path, log: &SamplerLog) -> Result<PathBuf, ReportError> {
    ensure_dir(output_dir).await?;
    write_file(sampler_log_path(output_dir, log.parameter), log.raw.clone()).await
}

fn cpu_chart(parameter: u32, points: Vec<(f64, f64)>) -> Chart<'static> {
    Chart {
        title: format!("CPU Usage Over Time (N = {})", parameter),
        x_label: "Time (seconds)",
        y_label: "CPU Usage (%)",
        points,
        y_scale: YScale::Linear {
            min: 0.0,
            max: 105.0,
        },
        color: "green",
        marker: Marker::None,
        dashed: false,
        x_ticks_at_points: false,
    }
}

pub fn cpu_plot_path(output_dir: &Path, parameter: u32) -> PathBuf {
    output_dir.join(format!("plot_cpu_usage_{}.svg", parameter))
}

/// Plots one run's CPU samples against elapsed time. Returns `None` without
/// writing anything when the series is empty.
pub async fn plot_cpu_series(
    output_dir: &Path,
    parameter: u32,
    series: &SampleSeries,
    interval: Duration,
) -> Result<Option<PathBuf>, ReportError> {
    if series.is_empty() {
        tracing::warn!("No CPU samples for parameter {}, skipping plot", parameter);
        return Ok(None);
    }

    let seconds_per_sample = interval.as_secs_f64();
    let points = series
        .samples
        .iter()
        .map(|s| (s.sample_index as f64 * seconds_per_sample, s.cpu_percent))
        .collect();
    ensure_dir(output_dir).await?;
    let plot = write_file(
        cpu_plot_path(output_dir, parameter),
        render_line_chart(&cpu_chart(parameter, points)),
    )
    .await?;
    tracing::info!("CPU plot saved to {}", plot.display());
    Ok(Some(plot))
}

/// Plots every `cpu_usage_<N>.log` in `dir`. Logs without samples are
/// skipped with a warning. Returns the plots written, ordered by parameter.
#[tracing::instrument]
pub async fn plot_cpu_logs(dir: &Path, interval: Duration) -> Result<Vec<PathBuf>, ReportError> {
    let io_err = |source| ReportError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut entries = fs::read_dir(dir).await.map_err(io_err)?;

    let mut logs = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(io_err)? {
        let name = entry.file_name().to_string_lossy().into_owned();
        let parameter = SAMPLER_LOG_RE
            .captures(&name)
            .and_then(|caps| caps[1].parse::<u32>().ok());
        if let Some(parameter) = parameter {
            logs.push((parameter, entry.path()));
        }
    }
    logs.sort();

    if logs.is_empty() {
        tracing::info!("No CPU log files found in {}", dir.display());
        return Ok(Vec::new());
    }
    tracing::info!("Found {} CPU log file(s)", logs.len());

    let mut plots = Vec::with_capacity(logs.len());
    for (parameter, path) in logs {
        let text = fs::read_to_string(&path)
            .await
            .map_err(|source| ReportError::Io {
                path: path.clone(),
                source,
            })?;
        let (series, warning) = parse_sampler_series(&text);
        if let Some(warning) = warning {
            tracing::warn!("{}: {}", path.display(), warning);
        }
        if let Some(plot) = plot_cpu_series(dir, parameter, &series, interval).await? {
            plots.push(plot);
        }
    }

    Ok(plots)
}
