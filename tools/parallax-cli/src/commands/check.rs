//! Print the effective configuration.

use parallax_common::config::{config_file_path, AppConfig};
use parallax_record_model::frame::FacingMode;

pub fn run(config: &AppConfig) -> anyhow::Result<()> {
    println!("Parallax Configuration Check");
    println!("{}", "=".repeat(50));

    let path = config_file_path();
    if path.exists() {
        println!("[OK] Config file: {}", path.display());
    } else {
        println!("[INFO] No config file at {}; using defaults", path.display());
    }

    match config.capture.facing_mode.parse::<FacingMode>() {
        Ok(mode) => println!("[OK] Default camera: {mode}"),
        Err(e) => println!("[WARN] {e}"),
    }

    let t = &config.tracking;
    if t.reacquire_below > t.max_corners {
        println!(
            "[WARN] reacquire_below ({}) exceeds max_corners ({}); corners will be re-detected every frame",
            t.reacquire_below, t.max_corners
        );
    }
    if !(1..=100).contains(&config.capture.snapshot_quality) {
        println!(
            "[WARN] snapshot_quality {} is outside 1-100 and will be clamped",
            config.capture.snapshot_quality
        );
    }
    println!();

    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}
