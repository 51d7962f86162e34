//! Text-to-number parsing for harness diagnostics, workload stdout and
//! sampler output. Nothing here touches processes or files.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::core::domain::{RawCapture, RunResult, SampleSeries};
use crate::core::traits::supervisor::RunFailure;

const KIB_PER_MIB: f64 = 1024.0;

static PEAK_MEMORY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Maximum resident set size \(kbytes\): (\d+)").expect("valid regex")
});
static USER_TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"User time \(seconds\): (\d+\.\d+)").expect("valid regex"));
static EXECUTION_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Execution time: ([\d.]+) seconds").expect("valid regex"));

const SAMPLER_HEADER_TOKENS: [&str; 2] = ["PID", "%usr"];
const SAMPLER_CPU_COLUMN: &str = "%usr";
const SAMPLER_SUMMARY_PREFIX: &str = "Average";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SummaryField {
    PeakMemory,
    UserTime,
}

impl fmt::Display for SummaryField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SummaryField::PeakMemory => f.write_str("maximum resident set size"),
            SummaryField::UserTime => f.write_str("user time"),
        }
    }
}

/// Recoverable extraction problems. The run still counts as successful.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseWarning {
    #[error("harness summary has no {0} field, defaulting to 0")]
    MissingField(SummaryField),
    #[error("workload printed no execution time, using harness user time instead")]
    ExecutionMarkerMissing,
    #[error("sampler output has no header row")]
    SamplerHeaderMissing,
    #[error("sampler recorded no data, the run may have finished before the first tick")]
    SamplerNoData,
}

#[derive(Clone, Debug, PartialEq)]
pub struct HarnessSummary {
    pub peak_memory_mb: f64,
    pub user_time_sec: f64,
    pub missing: Vec<SummaryField>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Extraction {
    pub result: RunResult,
    pub series: SampleSeries,
    pub warnings: Vec<ParseWarning>,
}

fn capture_f64(re: &Regex, text: &str) -> Option<f64> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

pub fn parse_harness_summary(text: &str) -> HarnessSummary {
    let mut missing = Vec::new();

    let peak_memory_mb = match capture_f64(&PEAK_MEMORY_RE, text) {
        Some(kib) => kib / KIB_PER_MIB,
        None => {
            missing.push(SummaryField::PeakMemory);
            0.0
        }
    };
    let user_time_sec = capture_f64(&USER_TIME_RE, text).unwrap_or_else(|| {
        missing.push(SummaryField::UserTime);
        0.0
    });

    HarnessSummary {
        peak_memory_mb,
        user_time_sec,
        missing,
    }
}

pub fn parse_execution_marker(text: &str) -> Option<f64> {
    capture_f64(&EXECUTION_MARKER_RE, text)
}

/// Reads the CPU column of a pidstat-style table.
///
/// The header row is the first line carrying both `PID` and `%usr`; its
/// token offset for `%usr` is reused for every later row. Rows that are
/// shorter than the header, carry a non-numeric value in that column or are
/// `Average:` summaries are dropped. Lines before the header are ignored.
pub fn parse_sampler_series(text: &str) -> (SampleSeries, Option<ParseWarning>) {
    let mut series = SampleSeries::default();
    let mut lines = text.lines();

    let header = lines.by_ref().find_map(|line| {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let is_header = SAMPLER_HEADER_TOKENS
            .iter()
            .all(|wanted| tokens.contains(wanted));
        if !is_header {
            return None;
        }
        tokens
            .iter()
            .position(|token| *token == SAMPLER_CPU_COLUMN)
            .map(|column| (column, tokens.len()))
    });

    let Some((column, width)) = header else {
        return (series, Some(ParseWarning::SamplerHeaderMissing));
    };

    for line in lines {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() < width {
            continue;
        }
        if tokens[0].starts_with(SAMPLER_SUMMARY_PREFIX) {
            continue;
        }
        match tokens[column].parse::<f64>() {
            Ok(value) if value.is_finite() && value >= 0.0 => series.push(value),
            _ => tracing::trace!("Skipping sampler row: {:?}", line),
        }
    }

    let warning = series.is_empty().then_some(ParseWarning::SamplerNoData);
    (series, warning)
}

/// Turns one captured run into a `RunResult`.
///
/// A capture with a non-zero exit code is rejected, so a failed run can
/// never produce a record. Missing diagnostic fields only produce warnings.
pub fn extract_run_result(parameter: u32, raw: &RawCapture) -> Result<Extraction, RunFailure> {
    if raw.harness_exit_code != 0 {
        return Err(RunFailure::NonZeroExit {
            code: raw.harness_exit_code,
            stderr: raw.harness_stderr.clone(),
        });
    }

    let summary = parse_harness_summary(&raw.harness_stderr);
    let mut warnings: Vec<ParseWarning> = summary
        .missing
        .iter()
        .map(|field| ParseWarning::MissingField(*field))
        .collect();

    let execution_time_sec = match parse_execution_marker(&raw.harness_stdout) {
        Some(seconds) => seconds,
        None => {
            warnings.push(ParseWarning::ExecutionMarkerMissing);
            summary.user_time_sec
        }
    };

    let (series, series_warning) = parse_sampler_series(&raw.sampler_output);
    warnings.extend(series_warning);

    Ok(Extraction {
        result: RunResult {
            parameter,
            peak_memory_mb: summary.peak_memory_mb,
            user_time_sec: summary.user_time_sec,
            execution_time_sec,
        },
        series,
        warnings,
    })
}
