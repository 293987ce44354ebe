//! Audio feedback chimes
//!
//! Short swept-frequency cues for recording start/stop. The chimes are
//! generated once at construction and played through a detached rodio sink
//! so the caller never blocks on playback. A missing output device disables
//! feedback; it never fails a recording operation.

use crate::audio::wav;
use crate::config::FeedbackConfig;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use std::io::Cursor;

const CHIME_SAMPLE_RATE: u32 = 44_100;
const CHIME_DURATION_SECS: f32 = 0.3;
const CHIME_AMPLITUDE: f32 = 0.3;

/// Sound event types
#[derive(Debug, Clone, Copy)]
pub enum SoundEvent {
    /// Recording started
    RecordingStart,
    /// Recording stopped
    RecordingStop,
}

/// Feedback chime player
pub struct RecorderFeedback {
    _stream: OutputStream,
    stream_handle: OutputStreamHandle,
    volume: f32,
    start_chime: Vec<u8>,
    stop_chime: Vec<u8>,
}

impl RecorderFeedback {
    /// Create a new feedback player with pre-generated chimes.
    pub fn new(config: &FeedbackConfig) -> Result<Self, String> {
        if !config.enabled {
            return Err("Audio feedback is disabled".to_string());
        }

        let (stream, stream_handle) = OutputStream::try_default()
            .map_err(|e| format!("Failed to open audio output: {}", e))?;

        // Ascending sweep on start, the mirror image on stop
        let start_chime = generate_chime(440.0, 660.0)?;
        let stop_chime = generate_chime(660.0, 440.0)?;

        Ok(Self {
            _stream: stream,
            stream_handle,
            volume: config.volume,
            start_chime,
            stop_chime,
        })
    }

    /// Play the chime for the given event, fire-and-forget.
    pub fn play(&self, event: SoundEvent) {
        let data = match event {
            SoundEvent::RecordingStart => &self.start_chime,
            SoundEvent::RecordingStop => &self.stop_chime,
        };

        if let Err(e) = self.play_wav(data) {
            tracing::warn!("Failed to play feedback chime: {}", e);
        }
    }

    fn play_wav(&self, data: &[u8]) -> Result<(), String> {
        let cursor = Cursor::new(data.to_vec());
        let source = Decoder::new(cursor).map_err(|e| format!("Failed to decode chime: {}", e))?;

        let sink = Sink::try_new(&self.stream_handle)
            .map_err(|e| format!("Failed to create audio sink: {}", e))?;

        sink.append(source.amplify(self.volume));
        sink.detach(); // Let it play in the background

        Ok(())
    }
}

/// Generate a linear frequency sweep with a triangular fade envelope,
/// encoded as WAV bytes.
fn generate_chime(freq_from: f32, freq_to: f32) -> Result<Vec<u8>, String> {
    let num_samples = (CHIME_SAMPLE_RATE as f32 * CHIME_DURATION_SECS) as usize;
    let mut samples = Vec::with_capacity(num_samples);

    for i in 0..num_samples {
        let t = i as f32 / CHIME_SAMPLE_RATE as f32;
        let progress = i as f32 / num_samples as f32;
        let freq = freq_from + (freq_to - freq_from) * progress;

        // progress * (1 - progress) peaks at 0.25, so scale back to unity
        let envelope = progress * (1.0 - progress) * 4.0;
        let sample = (2.0 * std::f32::consts::PI * freq * t).sin();

        samples.push(sample * envelope * CHIME_AMPLITUDE);
    }

    wav::encode_wav_mono(&samples, CHIME_SAMPLE_RATE).map_err(|e| e.to_string())
}
