//! Parallax Record Model
//!
//! Defines the data contracts of the capture pipeline:
//! - **Sensors:** Timestamped inertial samples and raw platform events
//! - **Frames:** Landmarks, motion statistics, and the per-frame record
//! - **Payloads:** Labeled record sets sent to the collector
//!
//! Landmark coordinates are normalized to `[0.0, 1.0]` relative to the
//! frame; motion values are in pixels.

pub mod frame;
pub mod payload;
pub mod record_set;
pub mod sensor;

pub use frame::*;
pub use payload::*;
pub use record_set::*;
pub use sensor::*;
