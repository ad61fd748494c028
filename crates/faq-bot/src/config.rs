use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::AppError;
use crate::resolver::DEFAULT_CUTOFF;

const DEFAULT_FAQ_PATH: &str = "faq.json";
const DEFAULT_HOST: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);
const DEFAULT_PORT: u16 = 5000;
const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Application configuration loaded from environment variables.
///
/// The webhook and geolocation URLs are optional; leaving one unset disables
/// that collaborator and the answer endpoint keeps working without it.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the JSON array of `{question, answer}` records.
    pub faq_path: String,
    pub host: IpAddr,
    pub port: u16,
    /// Minimum similarity ratio for a corpus question to count as a match.
    pub match_cutoff: f64,
    /// Spreadsheet webhook receiving one audit record per question.
    pub audit_webhook_url: Option<String>,
    /// ip-api compatible base URL, e.g. "http://ip-api.com/json".
    pub geolocation_url: Option<String>,
    /// Timeout applied to every outbound collaborator request.
    pub collaborator_timeout: Duration,
}

impl Config {
    /// Optional:
    /// - `FAQ_PATH` (default: "faq.json"; the file must exist)
    /// - `HOST` (default: "0.0.0.0")
    /// - `PORT` (default: 5000)
    /// - `MATCH_CUTOFF` (default: 0.5, within [0, 1])
    /// - `AUDIT_WEBHOOK_URL`
    /// - `GEOLOCATION_URL`
    /// - `COLLABORATOR_TIMEOUT_SECS` (default: 5)
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let faq_path = var("FAQ_PATH").unwrap_or_else(|| DEFAULT_FAQ_PATH.to_string());
        if !Path::new(&faq_path).is_file() {
            return Err(AppError::Config(format!("FAQ file not found at {faq_path}")));
        }

        let host = parse_var(&var, "HOST")?.unwrap_or(DEFAULT_HOST);
        let port = parse_var(&var, "PORT")?.unwrap_or(DEFAULT_PORT);

        let match_cutoff: f64 = parse_var(&var, "MATCH_CUTOFF")?.unwrap_or(DEFAULT_CUTOFF);
        if !(0.0..=1.0).contains(&match_cutoff) {
            return Err(AppError::Config(format!(
                "MATCH_CUTOFF must be within [0, 1], got {match_cutoff}"
            )));
        }

        let collaborator_timeout = parse_var(&var, "COLLABORATOR_TIMEOUT_SECS")?
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(DEFAULT_TIMEOUT_SECS));

        Ok(Self {
            faq_path,
            host,
            port,
            match_cutoff,
            audit_webhook_url: non_empty(var("AUDIT_WEBHOOK_URL")),
            geolocation_url: non_empty(var("GEOLOCATION_URL")),
            collaborator_timeout,
        })
    }

    pub fn faq_path(&self) -> PathBuf {
        PathBuf::from(&self.faq_path)
    }
}

fn parse_var<T>(var: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let Some(raw) = non_empty(var(key)) else {
        return Ok(None);
    };
    raw.parse::<T>()
        .map(Some)
        .map_err(|e| AppError::Config(format!("invalid {key} value {raw:?}: {e}")))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
