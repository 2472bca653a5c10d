//! Synthesized alarm tone.

use std::time::Duration;

use rodio::source::SineWave;
use rodio::Source;

/// A short sequence of identical sine beeps separated by silence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneSequence {
    /// Beep pitch in Hz
    pub frequency_hz: f32,
    /// Number of beeps
    pub beeps: u32,
    /// Length of each beep
    pub beep: Duration,
    /// Silence before every beep except the first
    pub gap: Duration,
    /// Amplitude multiplier (0.0-1.0)
    pub volume: f32,
}

impl Default for ToneSequence {
    fn default() -> Self {
        Self {
            frequency_hz: 880.0,
            beeps: 3,
            beep: Duration::from_millis(200),
            gap: Duration::from_millis(150),
            volume: 0.25,
        }
    }
}

impl ToneSequence {
    /// Total playback length.
    #[must_use]
    pub fn total_duration(&self) -> Duration {
        if self.beeps == 0 {
            return Duration::ZERO;
        }
        self.beep * self.beeps + self.gap * (self.beeps - 1)
    }

    /// Builds one rodio source per beep, to be appended to a sink in order.
    pub fn sources(&self) -> Vec<impl Source<Item = f32> + Send + 'static> {
        let volume = self.volume.clamp(0.0, 1.0);
        (0..self.beeps)
            .map(|i| {
                let delay = if i == 0 { Duration::ZERO } else { self.gap };
                SineWave::new(self.frequency_hz)
                    .take_duration(self.beep)
                    .amplify(volume)
                    .delay(delay)
            })
            .collect()
    }
}
