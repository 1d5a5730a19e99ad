//! Error types shared across Parallax crates.

/// Top-level error type for Parallax operations.
#[derive(Debug, thiserror::Error)]
pub enum ParallaxError {
    #[error("Capture error: {message}")]
    Capture { message: String },

    #[error("Tracking error: {message}")]
    Tracking { message: String },

    #[error("Sensor error: {message}")]
    Sensor { message: String },

    #[error("Session error: {message}")]
    Session { message: String },

    #[error("Upload error: {message}")]
    Upload { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Capture device unavailable: {message}")]
    DeviceUnavailable { message: String },

    #[error("Permission denied: {message}")]
    PermissionDenied { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using ParallaxError.
pub type ParallaxResult<T> = Result<T, ParallaxError>;

impl ParallaxError {
    pub fn capture(msg: impl Into<String>) -> Self {
        Self::Capture {
            message: msg.into(),
        }
    }

    pub fn tracking(msg: impl Into<String>) -> Self {
        Self::Tracking {
            message: msg.into(),
        }
    }

    pub fn sensor(msg: impl Into<String>) -> Self {
        Self::Sensor {
            message: msg.into(),
        }
    }

    pub fn session(msg: impl Into<String>) -> Self {
        Self::Session {
            message: msg.into(),
        }
    }

    pub fn upload(msg: impl Into<String>) -> Self {
        Self::Upload {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn device_unavailable(msg: impl Into<String>) -> Self {
        Self::DeviceUnavailable {
            message: msg.into(),
        }
    }

    pub fn permission_denied(msg: impl Into<String>) -> Self {
        Self::PermissionDenied {
            message: msg.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_carry_subsystem() {
        let err = ParallaxError::upload("connection refused");
        assert_eq!(err.to_string(), "Upload error: connection refused");

        let err = ParallaxError::device_unavailable("no camera");
        assert_eq!(err.to_string(), "Capture device unavailable: no camera");
    }

    #[test]
    fn test_io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "frames.jsonl");
        let err: ParallaxError = io.into();
        assert!(matches!(err, ParallaxError::Io(_)));
        assert_eq!(err.to_string(), "frames.jsonl");
    }
}
