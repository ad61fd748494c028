/// IP geolocation lookup with graceful degradation.
///
/// Talks to an ip-api.com compatible endpoint (`GET {base_url}/{ip}` returning
/// `{"status":"success","city":..,"regionName":..,"country":..}`). Every failure,
/// including a disabled lookup, yields `Location::unknown()`; `locate` never errors.
use std::net::IpAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::CommonError;

const UNKNOWN: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub city: String,
    pub region: String,
    pub country: String,
}

impl Location {
    pub fn unknown() -> Self {
        Self {
            city: UNKNOWN.to_string(),
            region: UNKNOWN.to_string(),
            country: UNKNOWN.to_string(),
        }
    }

    pub fn is_unknown(&self) -> bool {
        *self == Self::unknown()
    }
}

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    status: Option<String>,
    message: Option<String>,
    city: Option<String>,
    #[serde(rename = "regionName")]
    region_name: Option<String>,
    country: Option<String>,
}

pub struct GeoLocator {
    base_url: Option<String>,
    http: reqwest::Client,
}

impl GeoLocator {
    /// A `None` base URL disables lookups entirely.
    pub fn new(base_url: Option<&str>, timeout: Duration) -> Result<Self, CommonError> {
        Ok(Self {
            base_url: base_url.map(|u| u.trim_end_matches('/').to_string()),
            http: crate::http::client(timeout)?,
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.base_url.is_some()
    }

    /// Resolve `ip` to a location, or the "Unknown" sentinel.
    pub async fn locate(&self, ip: IpAddr) -> Location {
        let Some(base_url) = &self.base_url else {
            return Location::unknown();
        };
        if !is_routable(ip) {
            debug!(%ip, "skipping geolocation for non-routable address");
            return Location::unknown();
        }
        self.lookup(base_url, ip)
            .await
            .inspect_err(|e| warn!(error = %e, %ip, "geolocation lookup failed"))
            .unwrap_or_else(|_| Location::unknown())
    }

    async fn lookup(&self, base_url: &str, ip: IpAddr) -> Result<Location, CommonError> {
        let url = format!("{base_url}/{ip}");
        let resp = self.http.get(&url).send().await?;
        if !resp.status().is_success() {
            return Err(crate::http::upstream_error(resp).await);
        }
        let body: IpApiResponse = resp.json().await?;
        if let Some(status) = body.status.as_deref() {
            if status != "success" {
                return Err(CommonError::Rejected(
                    body.message.unwrap_or_else(|| status.to_string()),
                ));
            }
        }
        Ok(Location {
            city: field_or_unknown(body.city),
            region: field_or_unknown(body.region_name),
            country: field_or_unknown(body.country),
        })
    }
}

fn field_or_unknown(value: Option<String>) -> String {
    value
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

/// Addresses that a public geolocation service can say nothing about.
pub fn is_routable(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            !(v4.is_private()
                || v4.is_loopback()
                || v4.is_link_local()
                || v4.is_unspecified()
                || v4.is_broadcast())
        }
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => is_routable(IpAddr::V4(v4)),
            None => !(v6.is_loopback() || v6.is_unspecified()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use axum::{extract::Path, routing::get, Json, Router};
    use serde_json::json;

    async fn spawn_upstream(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/json")
    }

    #[test]
    fn test_is_routable() {
        assert!(is_routable("8.8.8.8".parse().unwrap()));
        assert!(is_routable("2001:4860:4860::8888".parse().unwrap()));
        assert!(!is_routable("127.0.0.1".parse().unwrap()));
        assert!(!is_routable("10.1.2.3".parse().unwrap()));
        assert!(!is_routable("192.168.0.10".parse().unwrap()));
        assert!(!is_routable("169.254.1.1".parse().unwrap()));
        assert!(!is_routable("::1".parse().unwrap()));
        assert!(!is_routable("::ffff:127.0.0.1".parse().unwrap()));
    }

    #[tokio::test]
    async fn test_disabled_locator_returns_unknown() {
        let geo = GeoLocator::new(None, Duration::from_secs(1)).unwrap();
        assert!(!geo.is_enabled());
        assert!(geo.locate("8.8.8.8".parse().unwrap()).await.is_unknown());
    }

    #[tokio::test]
    async fn test_successful_lookup() {
        let router = Router::new().route(
            "/json/{ip}",
            get(|Path(ip): Path<String>| async move {
                assert_eq!(ip, "8.8.8.8");
                Json(json!({
                    "status": "success",
                    "city": "Mountain View",
                    "regionName": "California",
                    "country": "United States"
                }))
            }),
        );
        let base = spawn_upstream(router).await;
        let geo = GeoLocator::new(Some(&base), Duration::from_secs(2)).unwrap();

        let location = geo.locate("8.8.8.8".parse().unwrap()).await;
        assert_eq!(location.city, "Mountain View");
        assert_eq!(location.region, "California");
        assert_eq!(location.country, "United States");
    }

    #[tokio::test]
    async fn test_failed_status_degrades_to_unknown() {
        let router = Router::new().route(
            "/json/{ip}",
            get(|| async { Json(json!({ "status": "fail", "message": "reserved range" })) }),
        );
        let base = spawn_upstream(router).await;
        let geo = GeoLocator::new(Some(&base), Duration::from_secs(2)).unwrap();

        assert!(geo.locate("8.8.4.4".parse().unwrap()).await.is_unknown());
    }

    #[tokio::test]
    async fn test_missing_fields_are_unknown() {
        let router = Router::new().route(
            "/json/{ip}",
            get(|| async { Json(json!({ "status": "success", "country": "Canada", "city": "" })) }),
        );
        let base = spawn_upstream(router).await;
        let geo = GeoLocator::new(Some(&base), Duration::from_secs(2)).unwrap();

        let location = geo.locate("1.1.1.1".parse().unwrap()).await;
        assert_eq!(location.city, "Unknown");
        assert_eq!(location.region, "Unknown");
        assert_eq!(location.country, "Canada");
    }

    #[tokio::test]
    async fn test_unreachable_upstream_degrades_to_unknown() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let geo = GeoLocator::new(Some(&format!("http://{addr}/json")), Duration::from_secs(2))
            .unwrap();
        assert!(geo.locate("8.8.8.8".parse().unwrap()).await.is_unknown());
    }

    #[tokio::test]
    async fn test_private_address_skips_lookup() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let router = Router::new().route(
            "/json/{ip}",
            get(move || {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Json(json!({ "status": "success", "city": "Nowhere" }))
                }
            }),
        );
        let base = spawn_upstream(router).await;
        let geo = GeoLocator::new(Some(&base), Duration::from_secs(2)).unwrap();

        assert!(geo.locate("192.168.1.20".parse().unwrap()).await.is_unknown());
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }
}
