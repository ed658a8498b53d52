//! Liveness and readiness.
//!
//! `/readyz` answers 503 unless the clients table can be read and both image
//! directories (uploads and published client images) accept writes.

use crate::state::AppState;
use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;
use std::{collections::BTreeMap, io, path::Path};
use tokio::fs;
use tracing::warn;
use uuid::Uuid;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
}

#[derive(Serialize)]
pub struct ReadyResponse {
    status: &'static str,
    checks: BTreeMap<&'static str, CheckStatus>,
}

#[derive(Serialize)]
pub struct CheckStatus {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<E: ToString> From<Result<(), E>> for CheckStatus {
    fn from(result: Result<(), E>) -> Self {
        match result {
            Ok(()) => Self { ok: true, error: None },
            Err(err) => Self {
                ok: false,
                error: Some(err.to_string()),
            },
        }
    }
}

/// `GET /healthz`. No I/O.
pub async fn healthz() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// `GET /readyz`
pub async fn readyz(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    let mut checks: BTreeMap<&'static str, CheckStatus> = BTreeMap::new();
    checks.insert("database", state.clients.count().await.map(drop).into());
    checks.insert("uploads", check_writable(state.images.upload_dir()).await.into());
    checks.insert("images", check_writable(&state.resolver.image_dir()).await.into());

    let ready = checks.values().all(|check| check.ok);
    if !ready {
        warn!("not ready: {:?}", failed(&checks));
    }

    let (status, label) = if ready {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
    };
    (
        status,
        Json(ReadyResponse {
            status: label,
            checks,
        }),
    )
}

/// Create `dir` if needed, then write and remove a marker file in it.
async fn check_writable(dir: &Path) -> io::Result<()> {
    fs::create_dir_all(dir).await?;
    let marker = dir.join(format!(".ready-{}", Uuid::new_v4()));
    fs::write(&marker, b"ready").await?;
    fs::remove_file(&marker).await
}

fn failed(checks: &BTreeMap<&'static str, CheckStatus>) -> Vec<&'static str> {
    checks
        .iter()
        .filter(|(_, check)| !check.ok)
        .map(|(name, _)| *name)
        .collect()
}
