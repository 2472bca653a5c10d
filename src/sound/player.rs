//! Alarm player implementation using rodio.
//!
//! The rodio output stream is not `Send`, so it lives on a dedicated audio
//! thread. `RodioAlarmPlayer` only holds a channel to that thread and can be
//! shared freely with the timer engine.

use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender};
use rodio::{OutputStream, Sink};
use tracing::{debug, warn};

use super::error::SoundError;
use super::tone::ToneSequence;

enum AudioCommand {
    Play,
    Stop,
    Shutdown,
}

/// An alarm player that synthesizes its tone with rodio.
pub struct RodioAlarmPlayer {
    tx: Sender<AudioCommand>,
    thread: Option<JoinHandle<()>>,
}

impl RodioAlarmPlayer {
    /// Creates a new player and opens the default output device.
    ///
    /// # Errors
    ///
    /// Returns `SoundError::DeviceNotAvailable` if no audio output device
    /// is available or the audio thread cannot be started.
    pub fn new(tones: ToneSequence) -> Result<Self, SoundError> {
        let (tx, rx) = crossbeam_channel::unbounded();
        let (ready_tx, ready_rx) = crossbeam_channel::bounded(1);

        let thread = std::thread::Builder::new()
            .name("alarm-audio".to_string())
            .spawn(move || audio_thread(tones, rx, ready_tx))
            .map_err(|e| SoundError::DeviceNotAvailable(e.to_string()))?;

        match ready_rx.recv() {
            Ok(Ok(())) => {
                debug!("Audio output stream initialized");
                Ok(Self {
                    tx,
                    thread: Some(thread),
                })
            }
            Ok(Err(e)) => {
                let _ = thread.join();
                Err(e)
            }
            Err(_) => Err(SoundError::DeviceNotAvailable(
                "audio thread exited during startup".to_string(),
            )),
        }
    }

    /// Starts the alarm, replacing any alarm still sounding.
    ///
    /// This method is non-blocking; the tone plays on the audio thread.
    ///
    /// # Errors
    ///
    /// Returns `SoundError::PlaybackError` if the audio thread is gone.
    pub fn play(&self) -> Result<(), SoundError> {
        self.tx
            .send(AudioCommand::Play)
            .map_err(|e| SoundError::PlaybackError(e.to_string()))
    }

    /// Stops the alarm early. Safe to call when nothing is playing.
    pub fn stop(&self) {
        if self.tx.send(AudioCommand::Stop).is_err() {
            debug!("Audio thread already stopped");
        }
    }
}

impl Drop for RodioAlarmPlayer {
    fn drop(&mut self) {
        let _ = self.tx.send(AudioCommand::Shutdown);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl std::fmt::Debug for RodioAlarmPlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RodioAlarmPlayer")
            .field("audio_thread", &self.thread.is_some())
            .finish_non_exhaustive()
    }
}

fn audio_thread(
    tones: ToneSequence,
    rx: Receiver<AudioCommand>,
    ready: Sender<Result<(), SoundError>>,
) {
    // The stream must stay alive for as long as sinks play on it.
    let (_stream, handle) = match OutputStream::try_default() {
        Ok(pair) => {
            let _ = ready.send(Ok(()));
            pair
        }
        Err(e) => {
            let _ = ready.send(Err(SoundError::DeviceNotAvailable(e.to_string())));
            return;
        }
    };

    let mut current: Option<Sink> = None;

    for command in rx {
        match command {
            AudioCommand::Play => {
                if let Some(sink) = current.take() {
                    sink.stop();
                }
                match Sink::try_new(&handle) {
                    Ok(sink) => {
                        debug!(duration = ?tones.total_duration(), "Playing alarm");
                        for source in tones.sources() {
                            sink.append(source);
                        }
                        current = Some(sink);
                    }
                    Err(e) => warn!("{}", SoundError::StreamError(e.to_string())),
                }
            }
            AudioCommand::Stop => {
                if let Some(sink) = current.take() {
                    sink.stop();
                }
            }
            AudioCommand::Shutdown => break,
        }
    }

    debug!("Audio thread finished");
}

/// Creates an alarm player, returning None if audio is unavailable.
///
/// If audio initialization fails, a warning is logged and None is returned.
#[must_use]
pub fn try_create_player() -> Option<Arc<RodioAlarmPlayer>> {
    match RodioAlarmPlayer::new(ToneSequence::default()) {
        Ok(player) => Some(Arc::new(player)),
        Err(e) => {
            warn!("Audio not available, alarm disabled: {} ({})", e, e.suggestion());
            None
        }
    }
}
