//! Re-send a saved record set.

use std::path::PathBuf;

use parallax_capture_engine::{HttpUploader, RecordUploader};
use parallax_common::config::AppConfig;
use parallax_record_model::record_set::load_record_set;

pub async fn run(path: PathBuf, endpoint: Option<String>, config: AppConfig) -> anyhow::Result<()> {
    let payload = load_record_set(&path)?;
    let mut upload_config = config.upload;
    if let Some(endpoint) = endpoint {
        upload_config.endpoint = endpoint;
    }

    println!(
        "Uploading {} frames ({}) to {}",
        payload.data.len(),
        payload.scenario_or_unknown(),
        upload_config.endpoint
    );

    let uploader = HttpUploader::from_config(&upload_config);
    let receipt = tokio::task::spawn_blocking(move || uploader.upload(&payload)).await??;

    match receipt.filename {
        Some(filename) => println!("Collector saved: {filename}"),
        None => println!("Upload accepted"),
    }
    Ok(())
}
