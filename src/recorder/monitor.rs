//! Silence monitor
//!
//! A polling loop on its own thread that watches the energy of the most
//! recent captured frame and requests a stop once silence has persisted
//! long enough, or once the maximum recording length is reached.
//!
//! The monitor never tears anything down itself: it only sets the session's
//! stop flag and exits. Stream and thread teardown always happen on a
//! caller thread, which keeps the monitor free of self-join hazards.

use super::session::SessionState;
use crate::config::RecordingConfig;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Timing and threshold parameters for one monitor run
#[derive(Debug, Clone)]
pub(crate) struct MonitorSettings {
    pub poll_interval: Duration,
    pub silence_threshold: f32,
    pub silence_duration: Duration,
    pub min_recording_time: Duration,
    pub max_recording_time: Duration,
}

impl MonitorSettings {
    pub(crate) fn from_config(config: &RecordingConfig) -> Self {
        Self {
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            silence_threshold: config.silence_threshold,
            silence_duration: Duration::from_secs_f32(config.silence_duration_secs.max(0.0)),
            min_recording_time: Duration::from_secs_f32(config.min_recording_secs.max(0.0)),
            max_recording_time: Duration::from_secs_f32(config.max_recording_secs.max(0.0)),
        }
    }
}

/// Spawn the monitor thread for the given session.
pub(crate) fn spawn(session: Arc<SessionState>, settings: MonitorSettings) -> thread::JoinHandle<()> {
    thread::spawn(move || run(&session, &settings))
}

fn run(session: &SessionState, settings: &MonitorSettings) {
    tracing::debug!("Silence monitor started");

    // Start of the current continuous run of below-threshold frames
    let mut silence_since: Option<Instant> = None;

    while session.is_active() && !session.stop_requested() {
        let elapsed = session.elapsed();

        // Length cap applies on every tick, silent or not
        if elapsed >= settings.max_recording_time {
            tracing::info!(
                "Max recording time ({:.1}s) reached, requesting stop",
                settings.max_recording_time.as_secs_f32()
            );
            session.request_stop();
            break;
        }

        // Hold off silence evaluation until the grace period has passed
        if elapsed >= settings.min_recording_time {
            let energy = session
                .most_recent_frame()
                .map(|frame| rms_energy(&frame))
                .unwrap_or(0.0);

            if energy < settings.silence_threshold {
                match silence_since {
                    None => {
                        silence_since = Some(Instant::now());
                        tracing::debug!(
                            "Silence detected (energy {:.4}) after {:.1}s",
                            energy,
                            elapsed.as_secs_f32()
                        );
                    }
                    Some(opened) if opened.elapsed() >= settings.silence_duration => {
                        tracing::info!(
                            "Auto-stopping after {:.1}s of silence (total {:.1}s)",
                            settings.silence_duration.as_secs_f32(),
                            elapsed.as_secs_f32()
                        );
                        session.request_stop();
                        break;
                    }
                    Some(_) => {}
                }
            } else if silence_since.take().is_some() {
                tracing::debug!("Sound resumed (energy {:.4}), silence timer cleared", energy);
            }
        }

        thread::sleep(settings.poll_interval);
    }

    tracing::debug!("Silence monitor exiting");
}

/// Root-mean-square energy of a frame. Empty frames count as silence.
pub(crate) fn rms_energy(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f32 = samples.iter().map(|&s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(
        min_ms: u64,
        silence_ms: u64,
        max_ms: u64,
        threshold: f32,
    ) -> MonitorSettings {
        MonitorSettings {
            poll_interval: Duration::from_millis(20),
            silence_threshold: threshold,
            silence_duration: Duration::from_millis(silence_ms),
            min_recording_time: Duration::from_millis(min_ms),
            max_recording_time: Duration::from_millis(max_ms),
        }
    }

    fn loud_frame() -> Vec<f32> {
        // Constant 0.3 amplitude, RMS 0.3
        vec![0.3; 320]
    }

    fn silent_frame() -> Vec<f32> {
        vec![0.0; 320]
    }

    fn wait_for_stop(session: &SessionState, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if session.stop_requested() {
                return true;
            }
            thread::sleep(Duration::from_millis(10));
        }
        session.stop_requested()
    }

    #[test]
    fn test_rms_energy() {
        assert_eq!(rms_energy(&[]), 0.0);
        assert_eq!(rms_energy(&[0.0; 100]), 0.0);
        assert!((rms_energy(&[1.0; 100]) - 1.0).abs() < 0.001);

        // Sine wave with amplitude 1.0 has RMS ~0.707
        let sine: Vec<f32> = (0..1000)
            .map(|i| (i as f32 * 2.0 * std::f32::consts::PI / 100.0).sin())
            .collect();
        assert!((rms_energy(&sine) - 0.707).abs() < 0.01);
    }

    #[test]
    fn test_auto_stop_after_silence() {
        let session = SessionState::new();
        session.append(silent_frame());

        let handle = spawn(Arc::clone(&session), settings(0, 150, 10_000, 0.01));

        assert!(
            wait_for_stop(&session, Duration::from_secs(2)),
            "monitor should request stop after continuous silence"
        );
        handle.join().unwrap();
    }

    #[test]
    fn test_empty_session_counts_as_silence() {
        // No frames at all: the monitor must still time out on silence
        let session = SessionState::new();
        let handle = spawn(Arc::clone(&session), settings(0, 150, 10_000, 0.01));

        assert!(wait_for_stop(&session, Duration::from_secs(2)));
        handle.join().unwrap();
    }

    #[test]
    fn test_sound_clears_silence_timer() {
        let session = SessionState::new();
        session.append(loud_frame());

        let handle = spawn(Arc::clone(&session), settings(0, 300, 10_000, 0.01));

        // Loud audio for longer than the silence window: no stop yet
        thread::sleep(Duration::from_millis(500));
        assert!(
            !session.stop_requested(),
            "loud audio must not trigger the silence stop"
        );

        // Go quiet; stop should follow within the silence window (+ slack)
        session.append(silent_frame());
        assert!(wait_for_stop(&session, Duration::from_secs(2)));
        handle.join().unwrap();
    }

    #[test]
    fn test_max_duration_cutoff_despite_sound() {
        let session = SessionState::new();
        session.append(loud_frame());

        // Threshold 0.0 means no frame ever counts as silent
        let handle = spawn(Arc::clone(&session), settings(0, 100, 300, 0.0));

        assert!(
            wait_for_stop(&session, Duration::from_secs(2)),
            "monitor should stop at the max recording time"
        );
        handle.join().unwrap();
    }

    #[test]
    fn test_min_recording_gate_delays_silence_stop() {
        // Sound for 150ms, then silence. With min=300ms the silence window
        // cannot open before 300ms, so with a 400ms window the stop must not
        // fire before ~700ms and must fire shortly after.
        let session = SessionState::new();
        session.append(loud_frame());

        let handle = spawn(Arc::clone(&session), settings(300, 400, 10_000, 0.01));

        thread::sleep(Duration::from_millis(150));
        session.append(silent_frame());

        // At 500ms from start the silence window (opened at ~300ms) has not
        // yet reached 400ms
        thread::sleep(Duration::from_millis(350));
        assert!(
            !session.stop_requested(),
            "stop must not fire before min_recording + silence_duration"
        );

        assert!(wait_for_stop(&session, Duration::from_secs(2)));
        handle.join().unwrap();
    }

    #[test]
    fn test_monitor_exits_when_session_deactivates() {
        let session = SessionState::new();
        session.append(loud_frame());

        let handle = spawn(Arc::clone(&session), settings(0, 10_000, 60_000, 0.01));

        session.set_active(false);
        let deadline = Instant::now() + Duration::from_secs(2);
        while !handle.is_finished() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        assert!(handle.is_finished(), "monitor must exit once session is inactive");
        handle.join().unwrap();
        // Deactivation alone is not a stop request
        assert!(!session.stop_requested());
    }
}
