use thiserror::Error;

/// A response body that parsed as JSON but does not match either recognized
/// envelope shape.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("response envelope has no status")]
    MissingStatus,
    #[error("{status:?} envelope is missing field `{field}`")]
    MissingField {
        status: String,
        field: &'static str,
    },
    #[error("invalid results payload: {0}")]
    InvalidResults(#[source] serde_json::Error),
}

impl ProtocolError {
    pub fn missing(status: impl Into<String>, field: &'static str) -> Self {
        Self::MissingField {
            status: status.into(),
            field,
        }
    }
}
