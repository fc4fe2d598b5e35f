//! Liveness endpoint.

/// `GET /api/healthz` — plain-text liveness probe.
pub async fn healthz() -> &'static str {
    "OK"
}
