//! Voxcap: silence-aware voice capture
//!
//! This library records a voice clip from a microphone and stops
//! automatically once the speaker goes quiet, returning the clip as
//! in-memory WAV bytes. It is built for push-to-ask assistant clients:
//! start a recording, poll until the recorder signals completion, collect
//! the bytes, ship them to whatever consumes them.
//!
//! # Architecture
//!
//! Three threads cooperate per recording session:
//!
//! ```text
//!   caller thread                capture thread            monitor thread
//!   ─────────────                ──────────────            ──────────────
//!   start() ───────────────────▶ cpal input stream         poll every tick:
//!       │                            │ frames                │ RMS of newest
//!       │ poll is_active()/          ▼                       │ frame vs the
//!       │ stop_requested()       SessionState ◀──────────────┘ silence window
//!       │                        (frames + flags)             sets stop flag,
//!       ▼                                                     never tears down
//!   stop() ── closes stream, joins monitor, encodes WAV
//! ```
//!
//! The monitor only ever sets the session's stop flag; stream and thread
//! teardown always run on the caller's thread inside `stop()` or `reset()`.
//!
//! # Example
//!
//! ```no_run
//! use voxcap::{Config, VoiceRecorder};
//!
//! # fn main() -> Result<(), voxcap::RecorderError> {
//! let config = Config::default();
//! let mut recorder = VoiceRecorder::new(&config);
//!
//! recorder.start()?;
//! while recorder.is_active() && !recorder.stop_requested() {
//!     std::thread::sleep(std::time::Duration::from_millis(100));
//! }
//!
//! let wav = recorder.stop()?;
//! std::fs::write("question.wav", &wav).expect("write clip");
//! # Ok(())
//! # }
//! ```

pub mod audio;
pub mod cli;
pub mod config;
pub mod error;
pub mod recorder;

pub use cli::{Cli, Commands};
pub use config::Config;
pub use error::{RecorderError, Result, VoxcapError};
pub use recorder::VoiceRecorder;
