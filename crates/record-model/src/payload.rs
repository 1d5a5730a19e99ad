//! Upload payload and collector reply types.

use serde::{Deserialize, Serialize};

use crate::frame::FrameRecord;

/// Operator-chosen labels describing what a recording contains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureLabels {
    /// Sample class, e.g. `real` or `spoof`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Presentation scenario, e.g. `live`, `photo`, `screen`.
    pub scenario: String,
    /// Requested subject/device motion, e.g. `left-right`.
    pub motion: String,
}

impl Default for CaptureLabels {
    fn default() -> Self {
        Self {
            kind: "real".to_string(),
            scenario: "live".to_string(),
            motion: "free".to_string(),
        }
    }
}

/// One committed recording, as sent to the collector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadPayload {
    #[serde(flatten)]
    pub labels: CaptureLabels,
    pub data: Vec<FrameRecord>,
}

impl UploadPayload {
    pub fn new(labels: CaptureLabels, data: Vec<FrameRecord>) -> Self {
        Self { labels, data }
    }

    /// Scenario label reduced to a file-name component, or `unknown` when
    /// nothing usable remains.
    pub fn scenario_or_unknown(&self) -> String {
        scenario_file_component(&self.labels.scenario)
    }
}

/// Keep only `[A-Za-z0-9_-]` from a scenario label so it can never name a
/// path outside the collection directory. Falls back to `unknown`.
pub fn scenario_file_component(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect();
    if cleaned.is_empty() {
        "unknown".to_string()
    } else {
        cleaned
    }
}

/// Outcome reported by the collector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadStatusKind {
    Success,
    Error,
}

/// Collector reply body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReceipt {
    pub status: UploadStatusKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl UploadReceipt {
    pub fn success(filename: impl Into<String>) -> Self {
        Self {
            status: UploadStatusKind::Success,
            filename: Some(filename.into()),
            message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: UploadStatusKind::Error,
            filename: None,
            message: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == UploadStatusKind::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_labels_are_top_level() {
        let payload = UploadPayload::new(
            CaptureLabels {
                kind: "spoof".to_string(),
                scenario: "screen".to_string(),
                motion: "up-down".to_string(),
            },
            vec![],
        );
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["type"], "spoof");
        assert_eq!(value["scenario"], "screen");
        assert_eq!(value["motion"], "up-down");
        assert!(value["data"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_blank_scenario_is_unknown() {
        let mut labels = CaptureLabels::default();
        labels.scenario = "  ".to_string();
        let payload = UploadPayload::new(labels, vec![]);
        assert_eq!(payload.scenario_or_unknown(), "unknown");
    }

    #[test]
    fn test_scenario_path_separators_are_stripped() {
        assert_eq!(scenario_file_component("../escaped"), "escaped");
        assert_eq!(scenario_file_component("..\\..\\win"), "win");
        assert_eq!(scenario_file_component("/etc/passwd"), "etcpasswd");
        assert_eq!(scenario_file_component("../.."), "unknown");
        assert_eq!(scenario_file_component("left-right_2"), "left-right_2");
    }

    #[test]
    fn test_receipt_parses_collector_reply() {
        let receipt: UploadReceipt = serde_json::from_str(
            r#"{"status": "success", "filename": "collected_data/live_0101_120000.json"}"#,
        )
        .unwrap();
        assert!(receipt.is_success());

        let receipt: UploadReceipt =
            serde_json::from_str(r#"{"status": "error", "message": "No data received"}"#)
                .unwrap();
        assert!(!receipt.is_success());
        assert_eq!(receipt.message.as_deref(), Some("No data received"));
    }
}
