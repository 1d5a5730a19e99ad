//! Record-set collection server.
//!
//! `POST /upload` accepts one JSON payload and writes it to
//! `{save_dir}/{scenario}_{MMDD_HHMMSS}.json`. The scenario is stripped to
//! `[A-Za-z0-9_-]` so the file always lands inside `save_dir`.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde::Serialize;
use serde_json::Value;

use parallax_record_model::payload::UploadReceipt;
use parallax_record_model::record_set::record_set_file_name;

#[derive(Debug, Clone)]
pub struct CollectorState {
    save_dir: Arc<PathBuf>,
}

impl CollectorState {
    pub fn new(save_dir: PathBuf) -> Self {
        Self {
            save_dir: Arc::new(save_dir),
        }
    }
}

/// Build the collector router.
pub fn router(state: CollectorState) -> Router {
    Router::new()
        .route("/upload", post(upload))
        .with_state(state)
}

pub async fn run(bind: String, save_dir: PathBuf) -> anyhow::Result<()> {
    std::fs::create_dir_all(&save_dir)?;
    let addr: SocketAddr = bind
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid bind address {bind}: {e}"))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(addr = %listener.local_addr()?, dir = %save_dir.display(), "Collector listening");
    println!("Collecting record sets into {}", save_dir.display());
    println!("POST http://{}/upload", listener.local_addr()?);

    axum::serve(listener, router(CollectorState::new(save_dir)))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    tracing::info!("Collector stopped");
    Ok(())
}

async fn upload(
    State(state): State<CollectorState>,
    body: Bytes,
) -> (StatusCode, Json<UploadReceipt>) {
    let data: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(_) if body.iter().all(u8::is_ascii_whitespace) => Value::Null,
        Err(e) => {
            return reply(StatusCode::BAD_REQUEST, UploadReceipt::error(format!("Invalid JSON: {e}")));
        }
    };
    if is_empty_payload(&data) {
        return reply(StatusCode::BAD_REQUEST, UploadReceipt::error("No data received"));
    }

    match save_payload(&state.save_dir, &data).await {
        Ok(path) => {
            let filename = path.display().to_string();
            tracing::info!(%filename, "Saved record set");
            reply(StatusCode::OK, UploadReceipt::success(filename))
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to save record set");
            reply(StatusCode::INTERNAL_SERVER_ERROR, UploadReceipt::error(e.to_string()))
        }
    }
}

fn reply(status: StatusCode, receipt: UploadReceipt) -> (StatusCode, Json<UploadReceipt>) {
    (status, Json(receipt))
}

fn is_empty_payload(data: &Value) -> bool {
    match data {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

async fn save_payload(dir: &Path, data: &Value) -> anyhow::Result<PathBuf> {
    let scenario = data.get("scenario").and_then(Value::as_str).unwrap_or("");
    let path = dir.join(record_set_file_name(scenario, chrono::Local::now()));

    let mut bytes = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut bytes, formatter);
    data.serialize(&mut serializer)?;

    tokio::fs::create_dir_all(dir).await?;
    tokio::fs::write(&path, bytes).await?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(name: &str) -> (CollectorState, PathBuf) {
        let dir = std::env::temp_dir().join(name);
        let _ = std::fs::remove_dir_all(&dir);
        (CollectorState::new(dir.clone()), dir)
    }

    #[tokio::test]
    async fn test_empty_body_is_rejected() {
        let (state, dir) = state("parallax_test_collector_empty");
        let (status, Json(receipt)) = upload(State(state), Bytes::new()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(receipt.message.as_deref(), Some("No data received"));
        assert!(!dir.exists());
    }

    #[tokio::test]
    async fn test_empty_object_is_rejected() {
        let (state, _) = state("parallax_test_collector_empty_object");
        let (status, _) = upload(State(state), Bytes::from_static(b"{}")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_payload_saved_under_scenario_name() {
        let (state, dir) = state("parallax_test_collector_save");
        let body = br#"{"type":"spoof","scenario":"screen","motion":"left-right","data":[]}"#;
        let (status, Json(receipt)) = upload(State(state), Bytes::from_static(body)).await;

        assert_eq!(status, StatusCode::OK);
        assert!(receipt.is_success());
        let filename = receipt.filename.unwrap();
        let name = Path::new(&filename).file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("screen_"));
        assert!(name.ends_with(".json"));

        let saved: Value = serde_json::from_str(&std::fs::read_to_string(&filename).unwrap()).unwrap();
        assert_eq!(saved["motion"], "left-right");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_missing_scenario_saved_as_unknown() {
        let (state, dir) = state("parallax_test_collector_unknown");
        let (status, Json(receipt)) =
            upload(State(state), Bytes::from_static(br#"{"data":[1]}"#)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(receipt.filename.unwrap().contains("unknown_"));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_scenario_cannot_escape_save_dir() {
        let base = std::env::temp_dir().join("parallax_test_collector_traversal");
        let _ = std::fs::remove_dir_all(&base);
        let dir = base.join("collected");
        let body = br#"{"scenario":"../escaped","data":[1]}"#;
        let (status, Json(receipt)) =
            upload(State(CollectorState::new(dir.clone())), Bytes::from_static(body)).await;

        assert_eq!(status, StatusCode::OK);
        let written = PathBuf::from(receipt.filename.unwrap());
        assert_eq!(written.parent(), Some(dir.as_path()));
        assert!(written
            .file_name()
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("escaped_"));

        std::fs::remove_dir_all(&base).ok();
    }

    #[tokio::test]
    async fn test_invalid_json_is_bad_request() {
        let (state, _) = state("parallax_test_collector_invalid");
        let (status, Json(receipt)) = upload(State(state), Bytes::from_static(b"{nope")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(!receipt.is_success());
    }
}
