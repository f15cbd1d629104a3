use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use shared::{
    domain::{CandidateId, ViewerRole},
    error::ProtocolError,
    protocol::{ResultSet, SubmissionPayload, SubmitEnvelope, SubmitReply},
};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use url::Url;

mod bias_table;
pub mod form;
pub mod render;

pub use bias_table::{format_difference, DifferenceTone, ALERT_THRESHOLD};
pub use form::{assemble_payload, FormInput};
pub use render::{format_percent, format_score, render_results, ResultsRenderer};

/// Shown for every transport-level failure; the cause only goes to the log.
pub const CONNECTION_ERROR_MESSAGE: &str = "Connection error.";

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid submission endpoint: {0}")]
    Endpoint(#[from] url::ParseError),
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("response body is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("malformed response: {0}")]
    Malformed(#[from] ProtocolError),
}

#[async_trait]
pub trait SubmissionTransport: Send + Sync {
    async fn submit(&self, payload: &SubmissionPayload) -> Result<SubmitReply, TransportError>;
}

pub struct HttpSubmissionTransport {
    http: Client,
    endpoint: Url,
}

impl HttpSubmissionTransport {
    pub fn new(endpoint: Url) -> Self {
        Self {
            http: Client::new(),
            endpoint,
        }
    }

    pub fn from_server_url(
        server_url: &str,
        submit_path: &str,
    ) -> Result<Self, TransportError> {
        let endpoint = Url::parse(server_url)?.join(submit_path)?;
        Ok(Self::new(endpoint))
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl SubmissionTransport for HttpSubmissionTransport {
    async fn submit(&self, payload: &SubmissionPayload) -> Result<SubmitReply, TransportError> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(payload)
            .send()
            .await?;

        // Rejections arrive as 500s with a JSON body, so the body decides.
        let status = response.status();
        let body = response.bytes().await?;
        if !status.is_success() {
            debug!(%status, endpoint = %self.endpoint, "submission endpoint returned error status");
        }

        let envelope: SubmitEnvelope = serde_json::from_slice(&body)?;
        Ok(envelope.into_reply()?)
    }
}

/// Capability handles onto whatever is showing the results. The controller
/// never touches a concrete UI toolkit.
pub trait ResultsSurface: Send + Sync {
    fn set_loading(&self, visible: bool);
    fn set_results_visible(&self, visible: bool);
    fn scroll_into_view(&self);
    /// Replaces the entire results content.
    fn render_markup(&self, html: &str);
    /// Blocking, user-facing message.
    fn notify(&self, message: &str) -> Result<()>;
}

/// One in-flight submit. The loading indicator stays up until the last
/// outstanding guard is dropped.
struct LoadingGuard {
    surface: Arc<dyn ResultsSurface>,
    in_flight: Arc<AtomicUsize>,
}

impl LoadingGuard {
    fn show(surface: Arc<dyn ResultsSurface>, in_flight: Arc<AtomicUsize>) -> Self {
        in_flight.fetch_add(1, Ordering::AcqRel);
        surface.set_loading(true);
        surface.set_results_visible(false);
        Self { surface, in_flight }
    }
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        if self.in_flight.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.surface.set_loading(false);
        }
    }
}

/// What happened to one submission. Every variant has already been surfaced
/// to the user by the time it is returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Displayed { id: CandidateId },
    Rejected { message: String },
    TransportFailed { reason: String },
    /// A newer submission was issued before this one resolved.
    Superseded { ticket: u64 },
}

impl SubmissionOutcome {
    pub fn is_displayed(&self) -> bool {
        matches!(self, Self::Displayed { .. })
    }
}

struct PresentationState {
    renderer: ResultsRenderer,
    role: ViewerRole,
    latest_ticket: u64,
}

pub struct SubmissionController {
    transport: Arc<dyn SubmissionTransport>,
    surface: Arc<dyn ResultsSurface>,
    in_flight: Arc<AtomicUsize>,
    state: Mutex<PresentationState>,
}

impl SubmissionController {
    pub fn new(
        transport: Arc<dyn SubmissionTransport>,
        surface: Arc<dyn ResultsSurface>,
        role: ViewerRole,
    ) -> Self {
        Self {
            transport,
            surface,
            in_flight: Arc::new(AtomicUsize::new(0)),
            state: Mutex::new(PresentationState {
                renderer: ResultsRenderer::new(),
                role,
                latest_ticket: 0,
            }),
        }
    }

    pub async fn submit_form(&self, form: &FormInput) -> SubmissionOutcome {
        self.submit(assemble_payload(form)).await
    }

    /// Only the most recently issued submission may replace the live results.
    pub async fn submit(&self, payload: SubmissionPayload) -> SubmissionOutcome {
        let ticket = {
            let mut state = self.state.lock().await;
            state.latest_ticket += 1;
            state.latest_ticket
        };
        let _loading = LoadingGuard::show(
            Arc::clone(&self.surface),
            Arc::clone(&self.in_flight),
        );
        info!(ticket, "submitting candidate profile");

        let reply = self.transport.submit(&payload).await;

        let mut state = self.state.lock().await;
        if state.latest_ticket != ticket {
            warn!(
                ticket,
                latest = state.latest_ticket,
                "ignoring response for superseded submission"
            );
            return SubmissionOutcome::Superseded { ticket };
        }

        match reply {
            Ok(SubmitReply::Accepted {
                id,
                results,
                is_best,
            }) => {
                check_winner_flags(&id, &results, is_best);
                let role = state.role;
                let html = state.renderer.display(results, role);
                self.surface.render_markup(&html);
                self.surface.set_results_visible(true);
                self.surface.scroll_into_view();
                info!(ticket, candidate_id = %id, ?role, "displayed submission results");
                SubmissionOutcome::Displayed { id }
            }
            Ok(SubmitReply::Rejected { message }) => {
                drop(state);
                warn!(ticket, %message, "server rejected submission");
                self.notify(&format!("Error: {message}"));
                SubmissionOutcome::Rejected { message }
            }
            Err(err) => {
                drop(state);
                error!(ticket, error = %err, "submission transport failure");
                self.notify(CONNECTION_ERROR_MESSAGE);
                SubmissionOutcome::TransportFailed {
                    reason: err.to_string(),
                }
            }
        }
    }

    /// Records the new role and re-renders the live results, if any. Returns
    /// whether anything was rendered.
    pub async fn set_role(&self, role: ViewerRole) -> bool {
        let mut state = self.state.lock().await;
        self.apply_role(&mut state, role)
    }

    /// Flips the role under a single lock so concurrent toggles never read
    /// the same starting value.
    pub async fn toggle_role(&self) -> ViewerRole {
        let mut state = self.state.lock().await;
        let role = state.role.toggled();
        self.apply_role(&mut state, role);
        role
    }

    fn apply_role(&self, state: &mut PresentationState, role: ViewerRole) -> bool {
        state.role = role;
        match state.renderer.render(role) {
            Some(html) => {
                self.surface.render_markup(&html);
                debug!(?role, "re-rendered results for role change");
                true
            }
            None => false,
        }
    }

    pub async fn role(&self) -> ViewerRole {
        self.state.lock().await.role
    }

    pub async fn current_results(&self) -> Option<ResultSet> {
        self.state.lock().await.renderer.current().cloned()
    }

    fn notify(&self, message: &str) {
        if let Err(err) = self.surface.notify(message) {
            warn!(error = %err, "failed to show notification");
        }
    }
}

fn check_winner_flags(id: &CandidateId, results: &ResultSet, envelope_is_best: Option<bool>) {
    if let Some(flag) = envelope_is_best {
        if flag != results.current_candidate.is_best {
            warn!(candidate_id = %id, "envelope is_best disagrees with current_candidate.is_best");
        }
    }
    if results.winner_flag_consistent() == Some(false) {
        warn!(
            candidate_id = %id,
            best_id = %results.best_candidate.id,
            "is_best flag disagrees with candidate id comparison"
        );
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
