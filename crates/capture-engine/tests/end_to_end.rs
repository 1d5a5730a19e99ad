use image::{DynamicImage, GrayImage, Luma};

use parallax_capture_engine::assembler::FrameAssembler;
use parallax_capture_engine::session::{RecordingSession, StopOutcome};
use parallax_capture_engine::sources::{ImageSequenceSource, VideoSource};
use parallax_common::config::AppConfig;
use parallax_record_model::payload::CaptureLabels;
use parallax_sensor_tracker::SharedSensorBuffer;

fn textured(shift: f32) -> DynamicImage {
    DynamicImage::ImageLuma8(GrayImage::from_fn(320, 240, |x, y| {
        let fx = x as f32 - shift;
        let fy = y as f32;
        let v = 128.0 + 55.0 * (fx * 0.19).sin() * (fy * 0.23).sin()
            + 25.0 * (fx * 0.07 + fy * 0.05).cos();
        Luma([v.clamp(0.0, 255.0) as u8])
    }))
}

#[test]
fn three_frames_without_face_or_sensors() {
    let mut config = AppConfig::default();
    config.capture.snapshots = false;

    let mut assembler = FrameAssembler::from_config(&config, SharedSensorBuffer::new(500));
    let mut session = RecordingSession::default();
    let mut video = ImageSequenceSource::from_images(
        vec![textured(0.0), textured(1.0), textured(2.0)],
        33,
    );

    session.start().unwrap();
    while let Some(frame) = video.next_frame().unwrap() {
        assembler.process(&mut session, &frame, None, None);
    }
    assert_eq!(session.stop().unwrap(), StopOutcome::Reviewing { frames: 3 });

    let payload = session.commit(CaptureLabels::default()).unwrap();
    assert_eq!(payload.data.len(), 3);
    for record in &payload.data {
        assert!(record.landmarks.is_none());
        assert!(record.sensors.accel.is_none());
        assert!(record.sensors.gyro.is_none());
        assert!(record.image.is_none());
    }

    assert_eq!(payload.data[0].optical_flow_stats.count, 0);
    for record in &payload.data[1..] {
        let stats = record.optical_flow_stats;
        assert!(stats.count > 0);
        assert!((stats.avg_dx - 1.0).abs() < 0.5, "avg dx {}", stats.avg_dx);
        // No face: relative magnitude is the background motion itself.
        assert!((record.motion_analysis.relative_magnitude - stats.avg_dx.hypot(stats.avg_dy)).abs() < 1e-9);
    }

    let json = serde_json::to_value(&payload).unwrap();
    assert_eq!(json["type"], "real");
    assert!(json["data"][0]["landmarks"].is_null());
    assert!(json["data"][0]["sensors"]["accel"].is_null());
    assert_eq!(json["data"][0]["meta"]["facingMode"], "front");
    assert!(json["data"][1]["opticalFlowStats"]["avgDx"].is_number());
}

#[test]
fn frames_before_start_are_not_recorded() {
    let config = AppConfig::default();
    let mut assembler = FrameAssembler::from_config(&config, SharedSensorBuffer::new(500));
    let mut session = RecordingSession::default();
    let mut video = ImageSequenceSource::from_images(vec![textured(0.0), textured(1.0)], 33);

    let first = video.next_frame().unwrap().unwrap();
    assert!(!assembler.process(&mut session, &first, None, None).recorded);

    session.start().unwrap();
    let second = video.next_frame().unwrap().unwrap();
    let outcome = assembler.process(&mut session, &second, None, None);
    assert!(outcome.recorded);
    // The tracker was primed by the idle frame.
    assert!(session.records()[0].optical_flow_stats.count > 0);
    assert!(session.records()[0].image.is_some());
}
