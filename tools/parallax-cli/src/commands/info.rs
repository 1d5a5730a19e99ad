//! Show record-set information.

use std::path::PathBuf;

use parallax_record_model::record_set::{load_record_set, RecordSetSummary};

pub fn run(path: PathBuf) -> anyhow::Result<()> {
    let payload =
        load_record_set(&path).map_err(|e| anyhow::anyhow!("Failed to load record set: {e}"))?;
    let summary = RecordSetSummary::from_payload(&payload);

    println!("Record set: {}", path.display());
    println!("  Type: {}", payload.labels.kind);
    println!("  Scenario: {}", payload.scenario_or_unknown());
    println!("  Motion: {}", payload.labels.motion);
    println!();

    println!("Frames:");
    println!("  Count: {}", summary.frames);
    println!("  Duration: {:.2}s", summary.duration_ms as f64 / 1000.0);
    if let Some(first) = payload.data.first() {
        println!("  Facing: {}", first.meta.facing_mode);
    }
    println!();

    println!("Coverage:");
    println!("  Face: {}", coverage(summary.frames_with_face, summary.frames));
    println!("  Accelerometer: {}", coverage(summary.frames_with_accel, summary.frames));
    println!("  Gyroscope: {}", coverage(summary.frames_with_gyro, summary.frames));
    println!("  Snapshots: {}", coverage(summary.frames_with_image, summary.frames));
    println!();

    println!("Motion:");
    println!("  Mean tracked points: {:.1}", summary.mean_tracked_points);
    println!(
        "  Relative magnitude: mean {:.3}px, max {:.3}px",
        summary.mean_relative_magnitude, summary.max_relative_magnitude
    );

    Ok(())
}

fn coverage(count: usize, total: usize) -> String {
    if total == 0 {
        return "0/0".to_string();
    }
    format!(
        "{count}/{total} ({:.0}%)",
        count as f64 * 100.0 / total as f64
    )
}
