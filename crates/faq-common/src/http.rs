use std::time::Duration;

use crate::error::CommonError;

const USER_AGENT: &str = "faq-bot";
const MAX_ERROR_BODY_BYTES: usize = 2 * 1024;

/// Build the HTTP client used by every collaborator.
///
/// The timeout covers the whole request (connect + body), so a slow upstream can
/// hold a background task for at most `timeout`.
pub fn client(timeout: Duration) -> Result<reqwest::Client, CommonError> {
    let http = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()?;
    Ok(http)
}

/// Turn a non-success response into `CommonError::Upstream`, keeping at most a
/// couple of KiB of the body for the log line.
pub(crate) async fn upstream_error(resp: reqwest::Response) -> CommonError {
    let status = resp.status();
    let body = match resp.bytes().await {
        Ok(mut b) => {
            if b.len() > MAX_ERROR_BODY_BYTES {
                b.truncate(MAX_ERROR_BODY_BYTES);
            }
            String::from_utf8_lossy(&b).to_string()
        }
        Err(_) => "<failed to read error body>".to_string(),
    };
    CommonError::Upstream { status, body }
}
