//! Shared bookkeeping for one recording session
//!
//! One `SessionState` lives per start-to-stop lifetime and is shared via
//! `Arc` between the lifecycle controller, the capture callback and the
//! silence monitor. Frames are written by the capture callback only; the
//! two flags are the cross-thread coordination points.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

pub(crate) struct SessionState {
    /// True between a successful start and a completed stop
    active: AtomicBool,
    /// Set once by the monitor (or an external caller) to request teardown;
    /// never cleared within a session
    stop_requested: AtomicBool,
    started_at: Instant,
    frames: Mutex<Vec<Vec<f32>>>,
}

impl SessionState {
    /// Create a new active session starting now.
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            active: AtomicBool::new(true),
            stop_requested: AtomicBool::new(false),
            started_at: Instant::now(),
            frames: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub(crate) fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::SeqCst);
    }

    pub(crate) fn stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::SeqCst)
    }

    pub(crate) fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::SeqCst);
    }

    /// Wall-clock time since the session started.
    pub(crate) fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Append a captured frame. Ignored once the session is no longer active.
    pub(crate) fn append(&self, frame: Vec<f32>) {
        if !self.is_active() {
            return;
        }
        match self.frames.lock() {
            Ok(mut frames) => frames.push(frame),
            Err(_) => tracing::warn!("Frame buffer lock poisoned, dropping frame"),
        }
    }

    /// Most recently captured frame, if any.
    pub(crate) fn most_recent_frame(&self) -> Option<Vec<f32>> {
        self.frames
            .lock()
            .ok()
            .and_then(|frames| frames.last().cloned())
    }

    pub(crate) fn frame_count(&self) -> usize {
        self.frames.lock().map(|frames| frames.len()).unwrap_or(0)
    }

    /// All captured samples joined in arrival order.
    /// Empty when nothing was recorded.
    pub(crate) fn concatenated(&self) -> Vec<f32> {
        match self.frames.lock() {
            Ok(frames) => frames.iter().flatten().copied().collect(),
            Err(_) => {
                tracing::warn!("Frame buffer lock poisoned, treating as empty");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_new_session_is_active() {
        let session = SessionState::new();
        assert!(session.is_active());
        assert!(!session.stop_requested());
        assert_eq!(session.frame_count(), 0);
    }

    #[test]
    fn test_append_and_most_recent() {
        let session = SessionState::new();
        session.append(vec![0.1, 0.2]);
        session.append(vec![0.3]);

        assert_eq!(session.frame_count(), 2);
        assert_eq!(session.most_recent_frame(), Some(vec![0.3]));
    }

    #[test]
    fn test_append_ignored_when_inactive() {
        let session = SessionState::new();
        session.set_active(false);
        session.append(vec![0.1, 0.2]);

        assert_eq!(session.frame_count(), 0);
        assert!(session.most_recent_frame().is_none());
    }

    #[test]
    fn test_concatenated_preserves_order() {
        let session = SessionState::new();
        session.append(vec![1.0, 2.0]);
        session.append(vec![3.0]);
        session.append(vec![4.0, 5.0]);

        assert_eq!(session.concatenated(), vec![1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_concatenated_empty_session() {
        let session = SessionState::new();
        assert!(session.concatenated().is_empty());
    }

    #[test]
    fn test_elapsed_advances() {
        let session = SessionState::new();
        thread::sleep(Duration::from_millis(20));
        assert!(session.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn test_request_stop_is_sticky() {
        let session = SessionState::new();
        session.request_stop();
        session.request_stop();
        assert!(session.stop_requested());
        // The flag stays set even after the session deactivates
        session.set_active(false);
        assert!(session.stop_requested());
    }
}
