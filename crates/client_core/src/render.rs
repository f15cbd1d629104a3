//! Results view markup.
//!
//! Rendering is a pure function of a [`ResultSet`] and a [`ViewerRole`]: the
//! same inputs always produce byte-identical markup, and every render builds
//! the whole view from scratch.

use shared::{domain::ViewerRole, protocol::ResultSet};

use crate::bias_table::push_bias_section;

pub const WINNER_MARKER: &str = "WINNER-ID";
pub const HIDDEN_ID: &str = "...";

const WINNER_PANEL_STYLE: &str =
    "background: rgba(0,255,100,0.2); padding: 20px; border-radius: 12px; margin-bottom: 20px;";
const CONSOLATION_PANEL_STYLE: &str =
    "background: rgba(255,100,100,0.2); padding: 20px; border-radius: 12px; margin-bottom: 20px;";

pub(crate) struct Html {
    buf: String,
}

impl Html {
    pub(crate) fn new() -> Self {
        Self {
            buf: String::with_capacity(4 * 1024),
        }
    }

    pub(crate) fn push<S: AsRef<str>>(&mut self, s: S) {
        self.buf.push_str(s.as_ref());
    }

    pub(crate) fn push_text(&mut self, s: &str) {
        self.buf.push_str(&escape(s));
    }

    pub(crate) fn finish(self) -> String {
        self.buf
    }
}

pub(crate) fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Fixed-point with four decimals. Negative zero prints unsigned.
pub fn format_score(score: f64) -> String {
    let score = if score == 0.0 { 0.0 } else { score };
    format!("{score:.4}")
}

/// Shortest decimal form that round-trips, e.g. `12.5` or `3`.
pub fn format_percent(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    format!("{value}")
}

/// Holds the live result set. Only [`ResultsRenderer::display`] replaces it.
#[derive(Debug, Default)]
pub struct ResultsRenderer {
    current: Option<ResultSet>,
}

impl ResultsRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn display(&mut self, results: ResultSet, role: ViewerRole) -> String {
        let results = self.current.insert(results);
        render_results(results, role)
    }

    /// `None` until a result set has been displayed.
    pub fn render(&self, role: ViewerRole) -> Option<String> {
        self.current
            .as_ref()
            .map(|results| render_results(results, role))
    }

    pub fn current(&self) -> Option<&ResultSet> {
        self.current.as_ref()
    }

    pub fn has_results(&self) -> bool {
        self.current.is_some()
    }
}

pub fn render_results(results: &ResultSet, role: ViewerRole) -> String {
    let current = &results.current_candidate;
    let best = &results.best_candidate;
    let mut w = Html::new();

    w.push("<div class=\"score-card\"><h3>Your Final Result</h3><div class=\"score-display\">");
    w.push(format_score(current.score));
    w.push("</div>");
    w.push("<p>Assigned ID: <strong>");
    w.push_text(&identifier_label(results));
    w.push("</strong> (Internal Use)</p></div>");

    if current.is_best {
        w.push(format!("<div class=\"result-panel winner\" style=\"{WINNER_PANEL_STYLE}\">"));
        w.push("<h2>Congratulations!</h2>");
        w.push("<p>You achieved the <strong>Best Score</strong> among all candidates.</p>");
        w.push("</div>");
    } else {
        w.push(format!(
            "<div class=\"result-panel consolation\" style=\"{CONSOLATION_PANEL_STYLE}\">"
        ));
        w.push("<h2>Thanks for Participating</h2>");
        w.push("<p>You did not get the best score this time.</p>");
        if role.is_recruiter() {
            w.push("<p class=\"best-score\">Current Best Score: <strong>");
            w.push(format_score(best.score));
            w.push("</strong> (");
            w.push_text(&best.name);
            w.push(")</p>");
        }
        w.push("</div>");
    }

    if role.is_recruiter() {
        push_bias_section(&mut w, &results.bias_summary);
    }

    w.finish()
}

/// The winner's real id is only shown when it is also the viewer's own id.
fn identifier_label(results: &ResultSet) -> String {
    let current = &results.current_candidate;
    let best = &results.best_candidate;
    let shown = match &current.id {
        Some(id) if id == &best.id => best.id.as_str(),
        _ => HIDDEN_ID,
    };

    if current.is_best {
        format!("{WINNER_MARKER} {shown}")
    } else {
        shown.to_string()
    }
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
