use tabled::Table;
use tabled::Tabled;
use tabled::settings::Style;

use crate::core::domain::RunResult;

#[derive(Tabled)]
struct SummaryRow {
    parameter: u32,
    #[tabled(display = "float2")]
    peak_memory_mb: f64,
    #[tabled(display = "float2")]
    user_time_sec: f64,
    #[tabled(display = "float2")]
    execution_time_sec: f64,
}

fn float2(n: &f64) -> String {
    format!("{:.2}", n)
}

impl From<&RunResult> for SummaryRow {
    fn from(result: &RunResult) -> Self {
        SummaryRow {
            parameter: result.parameter,
            peak_memory_mb: result.peak_memory_mb,
            user_time_sec: result.user_time_sec,
            execution_time_sec: result.execution_time_sec,
        }
    }
}

pub fn render_summary_table(results: &[RunResult]) -> String {
    let rows: Vec<SummaryRow> = results.iter().map(SummaryRow::from).collect();
    let mut table = Table::new(&rows);
    table.with(Style::modern());
    table.to_string()
}
