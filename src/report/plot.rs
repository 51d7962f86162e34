//! Standalone SVG line charts.

use std::fmt::Write;

use itertools::Itertools;

const WIDTH: f64 = 1000.0;
const HEIGHT: f64 = 600.0;
const MARGIN_LEFT: f64 = 100.0;
const MARGIN_RIGHT: f64 = 40.0;
const MARGIN_TOP: f64 = 70.0;
const MARGIN_BOTTOM: f64 = 80.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum YScale {
    /// Decade ticks, bounds taken from the data.
    Log,
    Linear { min: f64, max: f64 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Marker {
    None,
    Circle,
    Square,
}

#[derive(Clone, Debug)]
pub struct Chart<'a> {
    pub title: String,
    pub x_label: &'a str,
    pub y_label: &'a str,
    pub points: Vec<(f64, f64)>,
    pub y_scale: YScale,
    pub color: &'a str,
    pub marker: Marker,
    pub dashed: bool,
    /// Put an x tick under every point instead of evenly spaced ticks.
    pub x_ticks_at_points: bool,
}

struct Frame {
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
    log: bool,
}

impl Frame {
    fn new(chart: &Chart) -> Self {
        let (x_min, x_max) = padded_bounds(chart.points.iter().map(|p| p.0));
        match chart.y_scale {
            YScale::Linear { min, max } => Frame {
                x_min,
                x_max,
                y_min: min,
                y_max: max,
                log: false,
            },
            YScale::Log => {
                let floor = log_floor(&chart.points);
                let (lo, hi) = chart
                    .points
                    .iter()
                    .map(|p| p.1.max(floor).log10())
                    .minmax()
                    .into_option()
                    .unwrap_or((0.0, 1.0));
                let lo = lo.floor();
                let hi = if hi.ceil() > lo { hi.ceil() } else { lo + 1.0 };
                Frame {
                    x_min,
                    x_max,
                    y_min: lo,
                    y_max: hi,
                    log: true,
                }
            }
        }
    }

    fn x(&self, value: f64) -> f64 {
        let span = WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
        MARGIN_LEFT + (value - self.x_min) / (self.x_max - self.x_min) * span
    }

    /// Maps a data value (not its logarithm) to a pixel row.
    fn y(&self, value: f64) -> f64 {
        let value = if self.log { value.log10() } else { value };
        let span = HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
        HEIGHT - MARGIN_BOTTOM - (value - self.y_min) / (self.y_max - self.y_min) * span
    }

    fn y_ticks(&self) -> Vec<f64> {
        if self.log {
            (self.y_min as i32..=self.y_max as i32)
                .map(|exp| 10f64.powi(exp))
                .collect()
        } else {
            linear_ticks(self.y_min, self.y_max)
        }
    }
}

/// Smallest positive y value, used in place of zeros on a log axis.
fn log_floor(points: &[(f64, f64)]) -> f64 {
    let smallest = points
        .iter()
        .map(|p| p.1)
        .filter(|y| *y > 0.0)
        .fold(f64::INFINITY, f64::min);
    if smallest.is_finite() { smallest } else { 1.0 }
}

fn padded_bounds<I: Iterator<Item = f64>>(values: I) -> (f64, f64) {
    match values.minmax().into_option() {
        Some((min, max)) if max > min => {
            let pad = (max - min) * 0.05;
            (min - pad, max + pad)
        }
        Some((value, _)) => (value - 1.0, value + 1.0),
        None => (0.0, 1.0),
    }
}

fn nice_step(raw: f64) -> f64 {
    let magnitude = 10f64.powf(raw.log10().floor());
    let normalized = raw / magnitude;
    let step = if normalized <= 1.0 {
        1.0
    } else if normalized <= 2.0 {
        2.0
    } else if normalized <= 5.0 {
        5.0
    } else {
        10.0
    };
    step * magnitude
}

fn linear_ticks(min: f64, max: f64) -> Vec<f64> {
    if max <= min {
        return vec![min];
    }
    let step = nice_step((max - min) / 6.0);
    let first = (min / step).ceil() as i64;
    let last = (max / step).floor() as i64;
    (first..=last).map(|i| i as f64 * step).collect()
}

fn format_tick(value: f64) -> String {
    if value == value.trunc() && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        let text = format!("{:.6}", value);
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

pub fn render_line_chart(chart: &Chart) -> String {
    let frame = Frame::new(chart);
    let mut out = String::new();
    let plot_left = MARGIN_LEFT;
    let plot_right = WIDTH - MARGIN_RIGHT;
    let plot_top = MARGIN_TOP;
    let plot_bottom = HEIGHT - MARGIN_BOTTOM;

    let _ = writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="sans-serif">"#,
        w = WIDTH,
        h = HEIGHT
    );
    let _ = writeln!(out, r#"<rect width="100%" height="100%" fill="white"/>"#);
    let _ = writeln!(
        out,
        r#"<text x="{}" y="40" text-anchor="middle" font-size="22" font-weight="bold">{}</text>"#,
        WIDTH / 2.0,
        escape(&chart.title)
    );

    for tick in frame.y_ticks() {
        let y = frame.y(tick);
        let _ = writeln!(
            out,
            r##"<line x1="{plot_left}" y1="{y:.1}" x2="{plot_right}" y2="{y:.1}" stroke="#dddddd" stroke-dasharray="4 4"/>"##
        );
        let _ = writeln!(
            out,
            r#"<text x="{:.1}" y="{:.1}" text-anchor="end" font-size="13">{}</text>"#,
            plot_left - 8.0,
            y + 4.0,
            format_tick(tick)
        );
    }

    let x_ticks = if chart.x_ticks_at_points {
        chart.points.iter().map(|p| p.0).dedup().collect()
    } else {
        linear_ticks(frame.x_min, frame.x_max)
    };
    for tick in x_ticks {
        let x = frame.x(tick);
        let _ = writeln!(
            out,
            r##"<line x1="{x:.1}" y1="{plot_top}" x2="{x:.1}" y2="{plot_bottom}" stroke="#dddddd" stroke-dasharray="4 4"/>"##
        );
        let _ = writeln!(
            out,
            r#"<text x="{:.1}" y="{:.1}" text-anchor="middle" font-size="13">{}</text>"#,
            x,
            plot_bottom + 20.0,
            format_tick(tick)
        );
    }

    let _ = writeln!(
        out,
        r#"<rect x="{plot_left}" y="{plot_top}" width="{}" height="{}" fill="none" stroke="black"/>"#,
        plot_right - plot_left,
        plot_bottom - plot_top
    );
    let _ = writeln!(
        out,
        r#"<text x="{:.1}" y="{:.1}" text-anchor="middle" font-size="16">{}</text>"#,
        (plot_left + plot_right) / 2.0,
        HEIGHT - 25.0,
        escape(chart.x_label)
    );
    let _ = writeln!(
        out,
        r#"<text x="30" y="{y:.1}" text-anchor="middle" font-size="16" transform="rotate(-90 30 {y:.1})">{}</text>"#,
        escape(chart.y_label),
        y = (plot_top + plot_bottom) / 2.0
    );

    let floor = log_floor(&chart.points);
    let coords: Vec<(f64, f64)> = chart
        .points
        .iter()
        .map(|&(x, y)| {
            let y = if frame.log { y.max(floor) } else { y };
            (frame.x(x), frame.y(y))
        })
        .collect();

    if coords.is_empty() {
        let _ = writeln!(
            out,
            r##"<text x="{:.1}" y="{:.1}" text-anchor="middle" font-size="16" fill="#888888">no data</text>"##,
            (plot_left + plot_right) / 2.0,
            (plot_top + plot_bottom) / 2.0
        );
    } else {
        let dash = if chart.dashed { r#" stroke-dasharray="10 6""# } else { "" };
        let _ = writeln!(
            out,
            r#"<polyline fill="none" stroke="{}" stroke-width="2"{} points="{}"/>"#,
            chart.color,
            dash,
            coords.iter().map(|(x, y)| format!("{:.1},{:.1}", x, y)).join(" ")
        );
    }

    for (x, y) in &coords {
        match chart.marker {
            Marker::None => {}
            Marker::Circle => {
                let _ = writeln!(
                    out,
                    r#"<circle cx="{:.1}" cy="{:.1}" r="5" fill="{}"/>"#,
                    x, y, chart.color
                );
            }
            Marker::Square => {
                let _ = writeln!(
                    out,
                    r#"<rect x="{:.1}" y="{:.1}" width="10" height="10" fill="{}"/>"#,
                    x - 5.0,
                    y - 5.0,
                    chart.color
                );
            }
        }
    }

    out.push_str("</svg>\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chart(points: Vec<(f64, f64)>, y_scale: YScale) -> Chart<'static> {
        Chart {
            title: "Execution Time vs. Parameter".to_string(),
            x_label: "Parameter (N)",
            y_label: "Execution Time (seconds)",
            points,
            y_scale,
            color: "blue",
            marker: Marker::Circle,
            dashed: false,
            x_ticks_at_points: true,
        }
    }

    #[test]
    fn test_chart_contains_title_labels_and_points() {
        let svg = render_line_chart(&chart(
            vec![(18.0, 0.4), (20.0, 1.7), (22.0, 7.1), (24.0, 30.2)],
            YScale::Log,
        ));

        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert!(svg.contains("Execution Time vs. Parameter"));
        assert!(svg.contains("Parameter (N)"));
        assert_eq!(svg.matches("<circle").count(), 4);
        assert_eq!(svg.matches("<polyline").count(), 1);
    }

    #[test]
    fn test_log_axis_orders_values_and_uses_decades() {
        let c = chart(vec![(18.0, 0.4), (24.0, 30.2)], YScale::Log);
        let frame = Frame::new(&c);

        assert!(frame.log);
        assert_eq!((frame.y_min, frame.y_max), (-1.0, 2.0));
        assert_eq!(frame.y_ticks(), vec![0.1, 1.0, 10.0, 100.0]);
        assert!(frame.y(30.2) < frame.y(0.4));
        assert!((frame.y(100.0) - MARGIN_TOP).abs() < 1e-9);
    }

    #[test]
    fn test_log_axis_tolerates_zero_values() {
        let svg = render_line_chart(&chart(vec![(18.0, 0.0), (20.0, 2.5)], YScale::Log));
        assert!(!svg.contains("NaN"));
        assert!(!svg.contains("inf"));
    }

    #[test]
    fn test_linear_axis_ticks() {
        assert_eq!(linear_ticks(0.0, 105.0), vec![0.0, 20.0, 40.0, 60.0, 80.0, 100.0]);
    }

    #[test]
    fn test_empty_chart_says_no_data() {
        let svg = render_line_chart(&chart(Vec::new(), YScale::Linear { min: 0.0, max: 105.0 }));
        assert!(svg.contains("no data"));
        assert!(!svg.contains("<polyline"));
    }

    #[test]
    fn test_labels_are_escaped() {
        let mut c = chart(vec![(1.0, 1.0)], YScale::Log);
        c.title = "CPU <usage> & more".to_string();
        let svg = render_line_chart(&c);
        assert!(svg.contains("CPU &lt;usage&gt; &amp; more"));
    }

    #[test]
    fn test_tick_formatting() {
        assert_eq!(format_tick(100.0), "100");
        assert_eq!(format_tick(0.1), "0.1");
        assert_eq!(format_tick(0.001), "0.001");
    }
}
