//! Audio I/O building blocks
//!
//! Capture via cpal (works with PipeWire, PulseAudio, ALSA, CoreAudio and
//! WASAPI backends), feedback playback via rodio, WAV encoding via hound.

pub mod capture;
pub mod feedback;
pub mod wav;

pub use capture::CaptureStream;
pub use feedback::{RecorderFeedback, SoundEvent};
