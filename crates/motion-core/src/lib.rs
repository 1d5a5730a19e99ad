//! Parallax Motion Core
//!
//! Per-frame motion estimation for parallax liveness capture:
//! - **Background:** Shi-Tomasi corners tracked with pyramidal Lucas-Kanade
//! - **Face:** displacement of a single reference landmark
//! - **Consistency:** face motion relative to mean background motion
//!
//! Pure computation on in-memory frames. No capture devices, no I/O.

pub mod background;
pub mod consistency;
pub mod corners;
pub mod face;
pub mod flow;
pub mod geometry;
pub mod pyramid;

pub use background::{BackgroundTracker, BackgroundTrackerConfig};
pub use consistency::analyze;
pub use face::FaceMotionTracker;
pub use geometry::{PixelRect, TrackedPoint};
