/// Best-effort audit log sink.
///
/// Posts one flat JSON record per answered question to a spreadsheet webhook
/// (for example a Google Apps Script web app). Delivery is fire-and-forget from
/// the caller's point of view: `record` returns `false` and logs a warning on any
/// failure, and a sink built without a URL is a no-op.
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::CommonError;
use crate::geolocation::Location;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub timestamp: String,
    pub name: String,
    pub contact: String,
    pub email: String,
    pub question: String,
    pub answer: String,
    pub ip: String,
    pub city: String,
    pub region: String,
    pub country: String,
}

impl AuditRecord {
    /// Copy the location fields into the flat record layout the sheet expects.
    pub fn with_location(mut self, location: Location) -> Self {
        self.city = location.city;
        self.region = location.region;
        self.country = location.country;
        self
    }
}

pub struct AuditLog {
    webhook_url: Option<String>,
    http: reqwest::Client,
}

impl AuditLog {
    /// A `None` webhook URL disables audit logging.
    pub fn new(webhook_url: Option<&str>, timeout: Duration) -> Result<Self, CommonError> {
        Ok(Self {
            webhook_url: webhook_url.map(str::to_string),
            http: crate::http::client(timeout)?,
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.webhook_url.is_some()
    }

    /// Deliver `record`. Returns `true` if the webhook accepted it.
    pub async fn record(&self, record: &AuditRecord) -> bool {
        let Some(url) = &self.webhook_url else {
            return false;
        };
        match self.post(url, record).await {
            Ok(()) => {
                debug!(question = %record.question, "audit record delivered");
                true
            }
            Err(e) => {
                warn!(error = %e, "audit webhook delivery failed");
                false
            }
        }
    }

    async fn post(&self, url: &str, record: &AuditRecord) -> Result<(), CommonError> {
        let resp = self.http.post(url).json(record).send().await?;
        if !resp.status().is_success() {
            return Err(crate::http::upstream_error(resp).await);
        }
        Ok(())
    }
}
