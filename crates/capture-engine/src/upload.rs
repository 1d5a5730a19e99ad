//! Record-set transport to the collector.

use std::path::PathBuf;
use std::time::Duration;

use parallax_common::config::UploadConfig;
use parallax_common::error::{ParallaxError, ParallaxResult};
use parallax_record_model::payload::{UploadPayload, UploadReceipt};
use parallax_record_model::record_set::save_record_set;

/// Trait for payload transports.
pub trait RecordUploader: Send + Sync {
    /// Send one payload. Called once per commit; no retry.
    fn upload(&self, payload: &UploadPayload) -> ParallaxResult<UploadReceipt>;
}

/// POSTs payloads as JSON to the collector's upload route.
pub struct HttpUploader {
    agent: ureq::Agent,
    endpoint: String,
}

impl HttpUploader {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();
        Self {
            agent,
            endpoint: endpoint.into(),
        }
    }

    pub fn from_config(config: &UploadConfig) -> Self {
        Self::new(config.endpoint.clone(), Duration::from_secs(config.timeout_secs))
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl RecordUploader for HttpUploader {
    fn upload(&self, payload: &UploadPayload) -> ParallaxResult<UploadReceipt> {
        tracing::info!(
            endpoint = %self.endpoint,
            frames = payload.data.len(),
            scenario = %payload.labels.scenario,
            "Uploading record set"
        );

        let mut response = self
            .agent
            .post(self.endpoint.as_str())
            .send_json(payload)
            .map_err(|e| ParallaxError::upload(format!("{}: {e}", self.endpoint)))?;

        let status = response.status();
        let receipt = response
            .body_mut()
            .read_json::<UploadReceipt>()
            .unwrap_or_else(|e| UploadReceipt::error(format!("HTTP {status}: {e}")));

        if !status.is_success() || !receipt.is_success() {
            let message = receipt
                .message
                .unwrap_or_else(|| format!("collector replied HTTP {status}"));
            return Err(ParallaxError::upload(message));
        }

        tracing::info!(filename = ?receipt.filename, "Upload accepted");
        Ok(receipt)
    }
}

/// Writes payloads into a local collection directory instead of sending them.
pub struct DirectoryUploader {
    dir: PathBuf,
}

impl DirectoryUploader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl RecordUploader for DirectoryUploader {
    fn upload(&self, payload: &UploadPayload) -> ParallaxResult<UploadReceipt> {
        let path = save_record_set(&self.dir, payload)
            .map_err(|e| ParallaxError::upload(e.to_string()))?;
        tracing::info!(path = %path.display(), frames = payload.data.len(), "Record set saved");
        Ok(UploadReceipt::success(path.display().to_string()))
    }
}
