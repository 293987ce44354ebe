//! Voice recorder lifecycle
//!
//! `VoiceRecorder` coordinates three threads per recording session: the
//! caller's thread (start/stop/reset/polling), the capture thread owned by
//! [`crate::audio::CaptureStream`], and the silence monitor. The monitor
//! signals an auto-stop purely by setting the session's stop flag; actual
//! teardown always runs on the caller's thread via [`VoiceRecorder::stop`].
//!
//! One recording session exists at a time. The encoded bytes of the most
//! recently finalized session are cached, so a `stop()` that races an
//! auto-stop (or a repeated `stop()`) still returns the clip.

pub(crate) mod monitor;
pub(crate) mod session;

use crate::audio::{wav, CaptureStream, RecorderFeedback, SoundEvent};
use crate::config::{AudioConfig, Config, FeedbackConfig, RecordingConfig};
use crate::error::RecorderError;
use monitor::MonitorSettings;
use session::SessionState;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Bound on waiting for the monitor thread during stop/reset. The monitor is
/// self-terminating, so on timeout we detach rather than hang the caller.
const MONITOR_JOIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Microphone recorder with silence-based auto-stop
pub struct VoiceRecorder {
    audio: AudioConfig,
    recording: RecordingConfig,
    feedback: Option<RecorderFeedback>,
    session: Option<Arc<SessionState>>,
    stream: Option<CaptureStream>,
    monitor: Option<thread::JoinHandle<()>>,
    last_wav: Option<Vec<u8>>,
}

impl VoiceRecorder {
    /// Create a recorder from configuration. Chimes are pre-generated here;
    /// a missing output device downgrades to silent operation.
    pub fn new(config: &Config) -> Self {
        let feedback = init_feedback(&config.feedback);

        Self {
            audio: config.audio.clone(),
            recording: config.recording.clone(),
            feedback,
            session: None,
            stream: None,
            monitor: None,
            last_wav: None,
        }
    }

    /// Begin a new recording session.
    ///
    /// Fails with [`RecorderError::AlreadyActive`] while a session exists and
    /// with a device error when the microphone cannot be opened. A failed
    /// start leaves the recorder idle.
    pub fn start(&mut self) -> Result<(), RecorderError> {
        if self.is_active() {
            tracing::warn!("Recording already in progress");
            return Err(RecorderError::AlreadyActive);
        }

        self.play_feedback(SoundEvent::RecordingStart);

        // Clear remnants of a prior session (auto-stopped sessions whose
        // stop() was never collected leave stream/monitor handles behind)
        self.teardown_session();

        let session = SessionState::new();

        let stream = match CaptureStream::open(&self.audio, Arc::clone(&session)) {
            Ok(stream) => stream,
            Err(e) => {
                session.set_active(false);
                tracing::error!("Failed to start recording: {}", e);
                return Err(e);
            }
        };

        let monitor = monitor::spawn(
            Arc::clone(&session),
            MonitorSettings::from_config(&self.recording),
        );

        self.session = Some(session);
        self.stream = Some(stream);
        self.monitor = Some(monitor);

        tracing::info!("Recording started");
        Ok(())
    }

    /// Stop the current session and return the finalized WAV bytes.
    ///
    /// Calling `stop()` with nothing in flight returns the previously
    /// finalized clip when one exists, otherwise
    /// [`RecorderError::EmptyRecording`]. Repeated calls after a successful
    /// stop keep returning the same bytes.
    pub fn stop(&mut self) -> Result<Vec<u8>, RecorderError> {
        let session = match self.session.clone() {
            Some(session) => session,
            None => return self.last_finalized(),
        };

        if !session.is_active() && session.frame_count() == 0 {
            return self.last_finalized();
        }

        if session.is_active() {
            tracing::info!("Stopping recording");
            session.set_active(false);

            if let Some(mut stream) = self.stream.take() {
                stream.close();
            }

            self.play_feedback(SoundEvent::RecordingStop);

            if let Some(handle) = self.monitor.take() {
                join_with_timeout(handle, MONITOR_JOIN_TIMEOUT);
            }
        }

        let samples = session.concatenated();
        // The stop flag is discarded along with the session
        self.session = None;

        if samples.is_empty() {
            tracing::warn!("No audio data recorded");
            return self.last_finalized();
        }

        tracing::info!(
            "Recorded {} samples ({:.2}s)",
            samples.len(),
            samples.len() as f32 / self.audio.sample_rate as f32
        );

        match wav::encode_wav_mono(&samples, self.audio.sample_rate) {
            Ok(bytes) => {
                self.last_wav = Some(bytes.clone());
                Ok(bytes)
            }
            Err(e) => {
                tracing::error!("Failed to finalize recording: {}", e);
                Err(e)
            }
        }
    }

    /// Force the recorder back to idle, releasing every resource.
    ///
    /// Safe from any state and idempotent; also drops the cached clip.
    pub fn reset(&mut self) {
        tracing::debug!("Resetting recorder state");
        self.teardown_session();
        self.last_wav = None;
    }

    /// True between a successful `start()` and the matching `stop()`.
    pub fn is_active(&self) -> bool {
        self.session
            .as_ref()
            .map(|session| session.is_active())
            .unwrap_or(false)
    }

    /// True once the silence monitor (or an external caller) has requested a
    /// stop. Callers poll this and invoke [`VoiceRecorder::stop`].
    pub fn stop_requested(&self) -> bool {
        self.session
            .as_ref()
            .map(|session| session.stop_requested())
            .unwrap_or(false)
    }

    /// Ask the active session to stop without tearing it down.
    /// The next `stop()` call finalizes as usual.
    pub fn request_stop(&self) {
        if let Some(session) = &self.session {
            session.request_stop();
        }
    }

    fn last_finalized(&self) -> Result<Vec<u8>, RecorderError> {
        match &self.last_wav {
            Some(bytes) => {
                tracing::debug!("Returning previously finalized recording");
                Ok(bytes.clone())
            }
            None => {
                tracing::warn!("No recording in progress");
                Err(RecorderError::EmptyRecording)
            }
        }
    }

    /// Deactivate and drop the session, stream and monitor thread.
    /// Keeps the cached clip; `reset()` clears that separately.
    fn teardown_session(&mut self) {
        if let Some(session) = self.session.take() {
            session.set_active(false);
            session.request_stop();
        }

        if let Some(mut stream) = self.stream.take() {
            stream.close();
        }

        if let Some(handle) = self.monitor.take() {
            join_with_timeout(handle, MONITOR_JOIN_TIMEOUT);
        }
    }

    fn play_feedback(&self, event: SoundEvent) {
        if let Some(ref feedback) = self.feedback {
            feedback.play(event);
        }
    }
}

impl Drop for VoiceRecorder {
    fn drop(&mut self) {
        self.teardown_session();
    }
}

fn init_feedback(config: &FeedbackConfig) -> Option<RecorderFeedback> {
    if !config.enabled {
        return None;
    }
    match RecorderFeedback::new(config) {
        Ok(feedback) => {
            tracing::debug!("Audio feedback enabled (volume {:.0}%)", config.volume * 100.0);
            Some(feedback)
        }
        Err(e) => {
            tracing::warn!("Audio feedback unavailable: {}", e);
            None
        }
    }
}

/// Wait for a worker thread with an upper bound, never joining the thread we
/// are currently running on.
fn join_with_timeout(handle: thread::JoinHandle<()>, timeout: Duration) {
    if handle.thread().id() == thread::current().id() {
        tracing::warn!("Skipping join of the current thread");
        return;
    }

    let deadline = Instant::now() + timeout;
    while !handle.is_finished() {
        if Instant::now() >= deadline {
            tracing::warn!("Worker thread did not exit within {:?}, detaching", timeout);
            return;
        }
        thread::sleep(Duration::from_millis(10));
    }

    if handle.join().is_err() {
        tracing::warn!("Worker thread panicked");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet_config() -> Config {
        let mut config = Config::default();
        config.feedback.enabled = false;
        config
    }

    /// Decode finalized WAV bytes back into samples
    fn decode_samples(bytes: &[u8]) -> Vec<i16> {
        let reader = hound::WavReader::new(std::io::Cursor::new(bytes.to_vec())).unwrap();
        reader.into_samples::<i16>().map(|s| s.unwrap()).collect()
    }

    #[test]
    fn test_stop_before_start_reports_nothing() {
        let mut recorder = VoiceRecorder::new(&quiet_config());
        assert!(matches!(
            recorder.stop(),
            Err(RecorderError::EmptyRecording)
        ));
    }

    #[test]
    fn test_stop_twice_without_session() {
        let mut recorder = VoiceRecorder::new(&quiet_config());
        assert!(recorder.stop().is_err());
        assert!(recorder.stop().is_err());
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut recorder = VoiceRecorder::new(&quiet_config());
        recorder.reset();
        assert!(!recorder.is_active());
        recorder.reset();
        assert!(!recorder.is_active());
        assert!(!recorder.stop_requested());
    }

    #[test]
    fn test_start_fails_while_session_active() {
        let mut recorder = VoiceRecorder::new(&quiet_config());
        // Simulate a live session without touching audio hardware
        recorder.session = Some(SessionState::new());

        assert!(matches!(recorder.start(), Err(RecorderError::AlreadyActive)));
        assert!(recorder.is_active());
    }

    #[test]
    fn test_stop_finalizes_buffered_frames() {
        let mut recorder = VoiceRecorder::new(&quiet_config());

        let session = SessionState::new();
        session.append(vec![0.1; 160]);
        session.append(vec![-0.1; 320]);
        session.append(vec![0.2; 480]);
        recorder.session = Some(session);

        let bytes = recorder.stop().unwrap();
        assert_eq!(decode_samples(&bytes).len(), 160 + 320 + 480);
        assert!(!recorder.is_active());
    }

    #[test]
    fn test_stop_is_idempotent_after_finalize() {
        let mut recorder = VoiceRecorder::new(&quiet_config());

        let session = SessionState::new();
        session.append(vec![0.25; 256]);
        recorder.session = Some(session);

        let first = recorder.stop().unwrap();
        let second = recorder.stop().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_stop_with_empty_session_falls_back_to_cached_clip() {
        let mut recorder = VoiceRecorder::new(&quiet_config());

        // First session records something
        let session = SessionState::new();
        session.append(vec![0.25; 256]);
        recorder.session = Some(session);
        let first = recorder.stop().unwrap();

        // Second session captures nothing before stop
        recorder.session = Some(SessionState::new());
        let second = recorder.stop().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_auto_stopped_session_still_finalizes() {
        let mut recorder = VoiceRecorder::new(&quiet_config());

        // Monitor requested a stop but the session was never collected
        let session = SessionState::new();
        session.append(vec![0.1; 512]);
        session.request_stop();
        recorder.session = Some(session);

        assert!(recorder.stop_requested());
        let bytes = recorder.stop().unwrap();
        assert_eq!(decode_samples(&bytes).len(), 512);
        assert!(!recorder.stop_requested());
    }

    #[test]
    fn test_reset_discards_cached_clip() {
        let mut recorder = VoiceRecorder::new(&quiet_config());

        let session = SessionState::new();
        session.append(vec![0.25; 256]);
        recorder.session = Some(session);
        recorder.stop().unwrap();

        recorder.reset();
        assert!(matches!(
            recorder.stop(),
            Err(RecorderError::EmptyRecording)
        ));
    }

    #[test]
    fn test_request_stop_marks_session() {
        let mut recorder = VoiceRecorder::new(&quiet_config());
        recorder.session = Some(SessionState::new());

        assert!(!recorder.stop_requested());
        recorder.request_stop();
        assert!(recorder.stop_requested());
        // Still active until stop() runs the teardown
        assert!(recorder.is_active());
    }
}
