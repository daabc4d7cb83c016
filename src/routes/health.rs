//! Liveness probe.

use axum::Json;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct Health {
    status: &'static str,
    package: &'static str,
    version: &'static str,
}

/// `GET /health` — answers as long as the router is up, independent of the
/// host app's stores. Takeover state is not reflected here.
pub async fn health_check() -> Json<Health> {
    Json(Health {
        status: "ok",
        package: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    })
}
