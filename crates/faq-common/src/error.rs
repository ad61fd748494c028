/// Error types shared by the outbound collaborators.
///
/// These represent failures talking to the geolocation service and the audit
/// webhook. Neither is ever surfaced to a caller of the answer endpoint; the
/// collaborator wrappers log them and degrade to a sentinel. The server crate
/// wraps `CommonError` via `#[from]` for startup failures (client construction).

#[derive(Debug, thiserror::Error)]
pub enum CommonError {
    #[error("http request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("upstream returned status {status}: {body}")]
    Upstream {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("upstream rejected lookup: {0}")]
    Rejected(String),
}
