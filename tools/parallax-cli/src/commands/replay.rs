//! Drive the capture pipeline over recorded inputs.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parallax_capture_engine::{
    CaptureController, DirectoryUploader, FrameAssembler, HttpUploader, ImageSequenceSource,
    JsonlLandmarkSource, RecordUploader, StopOutcome, VideoSource,
};
use parallax_common::clock::CaptureClock;
use parallax_common::config::AppConfig;
use parallax_common::error::ParallaxResult;
use parallax_record_model::frame::FacingMode;
use parallax_record_model::payload::CaptureLabels;
use parallax_sensor_tracker::sources::ReplaySource;
use parallax_sensor_tracker::{SensorPump, SharedSensorBuffer};

#[derive(Debug, clap::Args)]
pub struct ReplayArgs {
    /// Directory of PNG/JPEG frames, replayed in file-name order from t=0
    pub frames: PathBuf,

    /// Landmark track (JSONL: {"t": ms, "landmarks": [[x,y,z],...] | null})
    #[arg(long)]
    pub landmarks: Option<PathBuf>,

    /// Motion events (JSONL), timestamped on the same clock as the frames
    #[arg(long)]
    pub sensors: Option<PathBuf>,

    /// Milliseconds between frames
    #[arg(long, default_value = "33")]
    pub interval_ms: i64,

    /// Camera the frames came from: front|rear (defaults to config)
    #[arg(long)]
    pub facing: Option<FacingMode>,

    /// Sample class label
    #[arg(long = "type", default_value = "real")]
    pub kind: String,

    /// Scenario label
    #[arg(long, default_value = "live")]
    pub scenario: String,

    /// Motion label
    #[arg(long, default_value = "free")]
    pub motion: String,

    /// Save into this directory instead of the configured collection directory
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Send to the configured upload endpoint instead of saving locally
    #[arg(long, conflicts_with = "output")]
    pub upload: bool,

    /// Do not embed JPEG snapshots in records
    #[arg(long)]
    pub no_snapshots: bool,

    /// Play frames at their recorded rate with the sensor pump on its own task
    #[arg(long)]
    pub realtime: bool,
}

/// Sensor pump running on a tokio task alongside the frame loop.
struct PumpTask {
    stop: Arc<AtomicBool>,
    handle: tokio::task::JoinHandle<ParallaxResult<u64>>,
}

impl PumpTask {
    fn spawn(mut pump: SensorPump) -> Self {
        let stop = pump.stop_flag();
        let handle = tokio::spawn(async move { pump.run().await });
        Self { stop, handle }
    }

    async fn finish(self) -> anyhow::Result<u64> {
        self.stop.store(true, Ordering::SeqCst);
        Ok(self.handle.await??)
    }
}

pub async fn run(args: ReplayArgs, mut config: AppConfig) -> anyhow::Result<()> {
    if args.no_snapshots {
        config.capture.snapshots = false;
    }
    let facing = match args.facing {
        Some(facing) => facing,
        None => config
            .capture
            .facing_mode
            .parse::<FacingMode>()
            .map_err(anyhow::Error::msg)?,
    };

    let mut video = ImageSequenceSource::from_dir(&args.frames, args.interval_ms)?;
    video.set_facing_mode(facing);
    let total = video.remaining();

    let sensors = SharedSensorBuffer::new(config.sensors.buffer_capacity);
    let playhead = Arc::new(AtomicI64::new(i64::MIN));
    let pump = match &args.sensors {
        Some(path) => Some(SensorPump::new(
            Box::new(ReplaySource::from_jsonl_file(path)?.paced(playhead.clone())),
            sensors.clone(),
            CaptureClock::start(),
            Duration::from_millis(config.sensors.poll_interval_ms),
        )),
        None => None,
    };
    let (mut pump, pump_task) = if args.realtime {
        (None, pump.map(PumpTask::spawn))
    } else {
        (pump, None)
    };

    let uploader: Arc<dyn RecordUploader> = if args.upload {
        Arc::new(HttpUploader::from_config(&config.upload))
    } else {
        let dir = args
            .output
            .clone()
            .unwrap_or_else(|| config.collector.save_dir.clone());
        Arc::new(DirectoryUploader::new(dir))
    };

    let assembler = FrameAssembler::from_config(&config, sensors);
    let mut controller = CaptureController::new(Box::new(video), assembler, uploader);
    if let Some(path) = &args.landmarks {
        controller = controller.with_landmarks(Box::new(JsonlLandmarkSource::from_jsonl_file(path)?));
    }

    println!("Replaying {total} frames from {}", args.frames.display());
    println!("  Facing: {facing}");
    println!("  Interval: {}ms", args.interval_ms);
    if args.realtime {
        println!("  Pacing: realtime");
    }
    println!();

    controller.start()?;

    let mut frame_ts = 0i64;
    let mut processed = 0usize;
    let mut relative_sum = 0.0;
    loop {
        // Release motion events that would have arrived by this frame.
        playhead.store(frame_ts, Ordering::Release);
        if let Some(pump) = pump.as_mut() {
            pump.drain()?;
        } else if args.realtime {
            tokio::time::sleep(Duration::from_millis(args.interval_ms.max(0) as u64)).await;
        }
        let Some(outcome) = controller.process_next_frame()? else {
            break;
        };
        processed += 1;
        relative_sum += outcome.analysis.relative_magnitude;
        frame_ts += args.interval_ms;
    }

    let pumped = match pump_task {
        Some(task) => Some(task.finish().await?),
        None => pump.as_ref().map(SensorPump::samples_pushed),
    };

    match controller.stop()? {
        StopOutcome::NoData => {
            println!("No data collected.");
            return Ok(());
        }
        StopOutcome::Reviewing { frames } => {
            println!("Recorded {frames} frames");
            println!(
                "  Mean relative magnitude: {:.3}px",
                relative_sum / processed.max(1) as f64
            );
            if let Some(samples) = pumped {
                println!("  Sensor samples: {samples}");
            }
        }
    }

    let labels = CaptureLabels {
        kind: args.kind,
        scenario: args.scenario,
        motion: args.motion,
    };
    let receipt = controller.commit(labels)?.await??;
    match receipt.filename {
        Some(filename) => println!("Saved: {filename}"),
        None => println!("Upload accepted"),
    }

    Ok(())
}
