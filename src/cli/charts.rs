//! Text charts: grouped bars for capital utilisation and a sparkline
//! for IV skew across strikes.

use crate::domain::{ChainRow, StrategyRisk};

const BARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// One band of a grouped bar chart.
#[derive(Debug, Clone, PartialEq)]
pub struct BarGroup {
    pub label: String,
    pub primary: f64,
    pub secondary: f64,
}

/// Capital used against cap limit per strategy.
pub fn capital_groups(summary: &[StrategyRisk]) -> Vec<BarGroup> {
    summary
        .iter()
        .map(|r| BarGroup {
            label: r.strategy.clone(),
            primary: r.capital_used.unwrap_or(0.0),
            secondary: r.cap_limit.unwrap_or(0.0),
        })
        .collect()
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn bar(value: f64, max: f64, width: usize, fill: char) -> String {
    if max <= 0.0 || !value.is_finite() || value <= 0.0 {
        return String::new();
    }
    let cells = ((value / max) * width as f64).round().max(1.0) as usize;
    std::iter::repeat_n(fill, cells.min(width)).collect()
}

/// Render groups as two bars each (`█` primary, `░` secondary) scaled to
/// the largest value.
pub fn grouped_bars(
    groups: &[BarGroup],
    primary: &str,
    secondary: &str,
    width: usize,
) -> Vec<String> {
    let max = groups
        .iter()
        .flat_map(|g| [g.primary, g.secondary])
        .filter(|v| v.is_finite())
        .fold(0.0_f64, f64::max);
    let label_width = groups
        .iter()
        .map(|g| g.label.chars().count())
        .chain([primary.len(), secondary.len()])
        .max()
        .unwrap_or(0);

    let mut lines = Vec::with_capacity(groups.len() * 2);
    for g in groups {
        lines.push(format!(
            "{:<label_width$}  {:<9} {:<width$} ₹{:.2}",
            g.label,
            primary,
            bar(g.primary, max, width, '█'),
            g.primary,
        ));
        lines.push(format!(
            "{:<label_width$}  {:<9} {:<width$} ₹{:.2}",
            "",
            secondary,
            bar(g.secondary, max, width, '░'),
            g.secondary,
        ));
    }
    lines
}

/// Eight-level sparkline. A flat series renders at mid height.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn sparkline(values: &[f64]) -> String {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    let Some(min) = finite.iter().copied().reduce(f64::min) else {
        return String::new();
    };
    let max = finite.iter().copied().fold(min, f64::max);
    let span = max - min;

    finite
        .iter()
        .map(|v| {
            if span == 0.0 {
                BARS[3]
            } else {
                let idx = ((v - min) / span * (BARS.len() - 1) as f64).round() as usize;
                BARS[idx.min(BARS.len() - 1)]
            }
        })
        .collect()
}

/// `(strike, skew)` points sorted by strike, rows missing either skipped.
pub fn skew_points(rows: &[ChainRow]) -> Vec<(f64, f64)> {
    let mut points: Vec<(f64, f64)> = rows
        .iter()
        .filter_map(|r| Some((r.strike?, r.iv_skew?)))
        .filter(|(s, k)| s.is_finite() && k.is_finite())
        .collect();
    points.sort_by(|a, b| a.0.total_cmp(&b.0));
    points
}

/// IV skew line across strikes with its range, `None` without data.
pub fn skew_line(rows: &[ChainRow]) -> Option<String> {
    let points = skew_points(rows);
    let (first, last) = (points.first()?, points.last()?);
    let skews: Vec<f64> = points.iter().map(|p| p.1).collect();
    let lo = skews.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = skews.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    Some(format!(
        "{:.0} {} {:.0}   (skew {lo:.4} .. {hi:.4})",
        first.0,
        sparkline(&skews),
        last.0,
    ))
}
