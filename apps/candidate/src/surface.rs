use std::{fs, io::Write, path::PathBuf};

use anyhow::Context;
use client_core::ResultsSurface;
use tracing::{debug, error, info};

/// Terminal stand-in for the results page. Markup goes to a file (rewritten
/// on every render) or to stdout; notifications go to stderr.
pub struct TerminalSurface {
    output: Option<PathBuf>,
}

impl TerminalSurface {
    pub fn new(output: Option<PathBuf>) -> Self {
        Self { output }
    }
}

impl ResultsSurface for TerminalSurface {
    fn set_loading(&self, visible: bool) {
        if visible {
            info!("submitting profile");
        } else {
            debug!("loading indicator hidden");
        }
    }

    fn set_results_visible(&self, visible: bool) {
        debug!(visible, "results visibility changed");
    }

    fn scroll_into_view(&self) {
        if let Some(path) = &self.output {
            info!(path = %path.display(), "results written");
        }
    }

    fn render_markup(&self, html: &str) {
        match &self.output {
            Some(path) => {
                if let Err(err) = fs::write(path, html) {
                    error!(path = %path.display(), error = %err, "failed to write results markup");
                }
            }
            None => println!("{html}"),
        }
    }

    fn notify(&self, message: &str) -> anyhow::Result<()> {
        let mut stderr = std::io::stderr().lock();
        writeln!(stderr, "{message}").context("failed to write notification")?;
        stderr.flush().context("failed to flush notification")?;
        Ok(())
    }
}
