//! Sound system error types.
//!
//! Every error here is non-fatal for the timer: the engine logs it and
//! carries on with the mode transition and session accounting.

use thiserror::Error;

/// Errors that can occur in the alarm playback system.
#[derive(Debug, Error)]
pub enum SoundError {
    /// Audio device is not available (e.g., headless machine, no speakers).
    #[error("audio device not available: {0}")]
    DeviceNotAvailable(String),

    /// Failed to create the audio output sink.
    #[error("failed to create audio stream: {0}")]
    StreamError(String),

    /// The audio thread is gone or rejected the request.
    #[error("alarm playback failed: {0}")]
    PlaybackError(String),
}

impl SoundError {
    /// Returns true if this error is related to device availability.
    #[must_use]
    pub fn is_device_error(&self) -> bool {
        matches!(self, Self::DeviceNotAvailable(_) | Self::StreamError(_))
    }

    /// Returns a user-friendly suggestion for resolving this error.
    #[must_use]
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::DeviceNotAvailable(_) => "connect an audio device or run with --no-sound",
            Self::StreamError(_) => "check the system audio settings",
            Self::PlaybackError(_) => "restart the timer session",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SoundError::DeviceNotAvailable("no device".to_string());
        assert!(err.to_string().contains("no device"));
        assert!(err.to_string().contains("audio device not available"));

        let err = SoundError::StreamError("stream failed".to_string());
        assert!(err.to_string().contains("stream failed"));

        let err = SoundError::PlaybackError("thread gone".to_string());
        assert!(err.to_string().contains("thread gone"));
    }

    #[test]
    fn test_is_device_error() {
        assert!(SoundError::DeviceNotAvailable("x".into()).is_device_error());
        assert!(SoundError::StreamError("x".into()).is_device_error());
        assert!(!SoundError::PlaybackError("x".into()).is_device_error());
    }

    #[test]
    fn test_suggestion() {
        assert!(SoundError::DeviceNotAvailable("x".into())
            .suggestion()
            .contains("--no-sound"));
        assert!(SoundError::StreamError("x".into())
            .suggestion()
            .contains("audio settings"));
        assert!(SoundError::PlaybackError("x".into())
            .suggestion()
            .contains("restart"));
    }
}
