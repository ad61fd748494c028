//! HTTP surface: `POST /get_answer` and a health check.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, State},
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use faq_common::audit::{AuditLog, AuditRecord};
use faq_common::geolocation::GeoLocator;
use tokio_util::task::TaskTracker;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::model::{AnswerResponse, AskRequest};
use crate::resolver::AnswerResolver;

const UNKNOWN: &str = "Unknown";

#[derive(Clone)]
pub struct AppState {
    resolver: Arc<AnswerResolver>,
    geo: Arc<GeoLocator>,
    audit: Arc<AuditLog>,
    background: TaskTracker,
}

impl AppState {
    pub fn new(resolver: AnswerResolver, geo: GeoLocator, audit: AuditLog) -> Self {
        Self {
            resolver: Arc::new(resolver),
            geo: Arc::new(geo),
            audit: Arc::new(audit),
            background: TaskTracker::new(),
        }
    }

    /// Wait for in-flight audit deliveries. Call once the server has stopped
    /// accepting requests; each delivery is bounded by the collaborator timeouts.
    pub async fn drain_background(&self) {
        self.background.close();
        self.background.wait().await;
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/get_answer", post(get_answer))
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

async fn get_answer(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(request): Json<AskRequest>,
) -> Json<AnswerResponse> {
    let question = request.question.clone().unwrap_or_default();
    let resolution = state.resolver.resolve(&question);
    if resolution.is_match() {
        info!(question = %question, score = resolution.score(), "answered question");
    } else {
        info!(question = %question, "no match, sent fallback");
    }
    let answer = resolution.answer().to_string();

    if state.audit.is_enabled() {
        let ip = client_ip(&headers, peer);
        let record = audit_record(&request, &answer, ip);
        state
            .background
            .spawn(log_interaction(state.clone(), ip, record));
    }

    Json(AnswerResponse { answer })
}

/// Enrich the record with a location and hand it to the audit sink. Runs off the
/// response path; both collaborators swallow their own failures.
async fn log_interaction(state: AppState, ip: IpAddr, record: AuditRecord) {
    let location = state.geo.locate(ip).await;
    state.audit.record(&record.with_location(location)).await;
}

fn audit_record(request: &AskRequest, answer: &str, ip: IpAddr) -> AuditRecord {
    let or_unknown = |field: &Option<String>| {
        field
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(UNKNOWN)
            .to_string()
    };
    AuditRecord {
        timestamp: chrono::Utc::now().to_rfc3339(),
        name: or_unknown(&request.name),
        contact: or_unknown(&request.contact),
        email: or_unknown(&request.email),
        question: request.question.clone().unwrap_or_default(),
        answer: answer.to_string(),
        ip: ip.to_string(),
        city: UNKNOWN.to_string(),
        region: UNKNOWN.to_string(),
        country: UNKNOWN.to_string(),
    }
}

/// First `X-Forwarded-For` hop when it parses as an address, else the TCP peer.
fn client_ip(headers: &HeaderMap, peer: SocketAddr) -> IpAddr {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|v| v.trim().parse::<IpAddr>().ok())
        .unwrap_or_else(|| peer.ip())
}
