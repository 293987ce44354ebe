//! In-memory WAV encoding
//!
//! Finalized recordings and generated feedback chimes are both encoded as
//! mono 16-bit PCM WAV using hound, written into an in-memory buffer so the
//! caller decides whether the bytes hit disk, a socket, or a playback sink.

use crate::error::RecorderError;
use std::io::Cursor;

/// Encode f32 samples (nominally in [-1.0, 1.0]) as a mono 16-bit PCM WAV.
///
/// Out-of-range samples are clamped rather than wrapped. An empty sample
/// slice produces a valid WAV with an empty data chunk.
pub fn encode_wav_mono(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>, RecorderError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    let mut writer = hound::WavWriter::new(&mut cursor, spec)
        .map_err(|e| RecorderError::Encoding(e.to_string()))?;

    for &sample in samples {
        let clamped = sample.clamp(-1.0, 1.0);
        writer
            .write_sample((clamped * i16::MAX as f32) as i16)
            .map_err(|e| RecorderError::Encoding(e.to_string()))?;
    }

    writer
        .finalize()
        .map_err(|e| RecorderError::Encoding(e.to_string()))?;

    Ok(cursor.into_inner())
}
