use std::fmt::Write;

use crate::core::domain::{ResultSequence, RunResult};
use crate::report::ReportError;

pub const SUMMARY_HEADER: &str = "parameter,peak_memory_mb,user_time_sec,execution_time_sec";

/// One row per run in sequence order. Floats use the shortest representation
/// that parses back to the same value.
pub fn render_summary_csv(results: &[RunResult]) -> String {
    let mut out = String::from(SUMMARY_HEADER);
    out.push('\n');
    for r in results {
        let _ = writeln!(
            out,
            "{},{},{},{}",
            r.parameter, r.peak_memory_mb, r.user_time_sec, r.execution_time_sec
        );
    }
    out
}

pub fn parse_summary_csv(text: &str) -> Result<ResultSequence, ReportError> {
    let mut lines = text.lines().enumerate();

    match lines.next() {
        Some((_, header)) if header.trim() == SUMMARY_HEADER => {}
        Some((_, header)) => {
            return Err(ReportError::MalformedCsv {
                line: 1,
                detail: format!("unexpected header {:?}", header),
            });
        }
        None => {
            return Err(ReportError::MalformedCsv {
                line: 1,
                detail: "missing header".to_string(),
            });
        }
    }

    lines
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| parse_row(idx + 1, line))
        .collect()
}

fn parse_row(line_no: usize, line: &str) -> Result<RunResult, ReportError> {
    let malformed = |detail: String| ReportError::MalformedCsv {
        line: line_no,
        detail,
    };

    let fields: Vec<&str> = line.trim().split(',').collect();
    let [parameter, peak_memory_mb, user_time_sec, execution_time_sec] = fields[..] else {
        return Err(malformed(format!("expected 4 fields, got {}", fields.len())));
    };
    let float = |name: &str, value: &str| {
        value
            .parse::<f64>()
            .map_err(|e| malformed(format!("{} {:?}: {}", name, value, e)))
    };

    Ok(RunResult {
        parameter: parameter
            .parse()
            .map_err(|e| malformed(format!("parameter {:?}: {}", parameter, e)))?,
        peak_memory_mb: float("peak_memory_mb", peak_memory_mb)?,
        user_time_sec: float("user_time_sec", user_time_sec)?,
        execution_time_sec: float("execution_time_sec", execution_time_sec)?,
    })
}
