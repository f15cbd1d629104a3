//! Recruiter-only bias comparison tables: one table per column of the
//! summary, rows in the order the server sent them.

use shared::protocol::{BiasColumn, BiasRow, BiasSummary};

use crate::render::{format_percent, Html};

/// Absolute difference, in percentage points, above which a row is flagged.
pub const ALERT_THRESHOLD: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DifferenceTone {
    Alert,
    Ok,
}

impl DifferenceTone {
    pub fn of(difference: f64) -> Self {
        if difference.abs() > ALERT_THRESHOLD {
            Self::Alert
        } else {
            Self::Ok
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Self::Alert => "#ff4d4d",
            Self::Ok => "#4dff4d",
        }
    }
}

/// Positive values get an explicit `+`; negative values keep their `-`.
pub fn format_difference(difference: f64) -> String {
    if difference > 0.0 {
        format!("+{}", format_percent(difference))
    } else {
        format_percent(difference)
    }
}

pub(crate) fn push_bias_section(w: &mut Html, summary: &BiasSummary) {
    w.push("<h3>Bias Mitigation Summary (Top 10 vs Total)</h3>");
    w.push("<p style=\"font-size: 0.9em; color: var(--text-muted)\">");
    w.push("Percentage distribution comparison to detect anomalies.</p>");

    for column in summary.columns() {
        push_column(w, column);
    }
}

fn push_column(w: &mut Html, column: &BiasColumn) {
    w.push("<h4>");
    w.push_text(&column.name);
    w.push("</h4>");
    w.push("<table class=\"bias-table\"><thead><tr>");
    w.push("<th>Category</th>");
    w.push("<th>Total Population (%)</th>");
    w.push("<th>Top 10 (%)</th>");
    w.push("<th>Difference (%)</th>");
    w.push("</tr></thead><tbody>");
    for row in &column.rows {
        push_row(w, row);
    }
    w.push("</tbody></table>");
}

fn push_row(w: &mut Html, row: &BiasRow) {
    w.push("<tr><td>");
    w.push_text(&row.category);
    w.push("</td><td>");
    w.push(format_percent(row.population));
    w.push("</td><td>");
    w.push(format_percent(row.top_selected));
    w.push(format!(
        "</td><td style=\"color:{}\">",
        DifferenceTone::of(row.difference).color()
    ));
    w.push(format_difference(row.difference));
    w.push("</td></tr>");
}
