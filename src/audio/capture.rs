//! cpal-based capture stream
//!
//! Opens an input stream on the configured device and appends fixed-size
//! mono frames to the shared session state from the audio callback.
//!
//! Note: cpal::Stream is not Send, so the stream lives on a dedicated
//! thread for its entire lifetime and is controlled via a channel.

use crate::config::AudioConfig;
use crate::error::RecorderError;
use crate::recorder::session::SessionState;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// How long to wait for the capture thread to confirm the stream is live
const OPEN_TIMEOUT: Duration = Duration::from_secs(2);

/// How long to wait for the capture thread to wind down on close
const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

/// Commands sent to the capture thread
enum StreamCommand {
    Close,
}

/// Handle to a running capture stream
pub struct CaptureStream {
    cmd_tx: Option<mpsc::Sender<StreamCommand>>,
    thread: Option<thread::JoinHandle<()>>,
}

/// Everything the audio callback needs to turn raw device buffers into
/// session frames
struct FrameSink {
    session: Arc<SessionState>,
    channels: usize,
    source_rate: u32,
    target_rate: u32,
}

impl FrameSink {
    fn deliver<T>(&self, data: &[T])
    where
        T: cpal::Sample,
        f32: cpal::FromSample<T>,
    {
        // Convert to f32 and average interleaved channels down to mono;
        // silence analysis downstream assumes mono frames
        let mono: Vec<f32> = data
            .chunks(self.channels)
            .map(|frame| {
                let sum: f32 = frame
                    .iter()
                    .map(|&s| <f32 as cpal::FromSample<T>>::from_sample_(s))
                    .sum();
                sum / frame.len() as f32
            })
            .collect();

        let frame = if self.source_rate != self.target_rate {
            resample(&mono, self.source_rate, self.target_rate)
        } else {
            mono
        };

        if frame.is_empty() {
            return;
        }

        // append() is a no-op once the session has been deactivated
        self.session.append(frame);
    }
}

impl CaptureStream {
    /// Open the configured input device and start delivering frames to the
    /// session. Fails with a reportable error when no usable device exists.
    pub(crate) fn open(
        config: &AudioConfig,
        session: Arc<SessionState>,
    ) -> Result<Self, RecorderError> {
        use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

        let host = cpal::default_host();

        let device = if config.device == "default" {
            host.default_input_device()
                .ok_or_else(|| RecorderError::DeviceNotFound("default".to_string()))?
        } else {
            find_input_device(&host, &config.device)?
        };

        let device_name = device.name().unwrap_or_else(|_| "unknown".to_string());

        let supported = device
            .default_input_config()
            .map_err(|e| RecorderError::DeviceUnavailable(e.to_string()))?;

        let source_rate = supported.sample_rate().0;
        let source_channels = supported.channels().max(1);
        let sample_format = supported.sample_format();
        // Never request more channels than the device offers
        let stream_channels = config.channels.clamp(1, source_channels);
        let target_rate = config.sample_rate;

        tracing::info!(
            "Using audio device: {} ({} Hz, {} ch, {:?})",
            device_name,
            source_rate,
            stream_channels,
            sample_format
        );

        let stream_config = cpal::StreamConfig {
            channels: stream_channels,
            sample_rate: supported.sample_rate(),
            buffer_size: cpal::BufferSize::Default,
        };

        let (cmd_tx, cmd_rx) = mpsc::channel::<StreamCommand>();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), String>>();

        let handle = thread::spawn(move || {
            let err_fn = |err| tracing::error!("Audio stream error: {}", err);

            let sink = FrameSink {
                session,
                channels: stream_channels as usize,
                source_rate,
                target_rate,
            };

            let built = match sample_format {
                cpal::SampleFormat::F32 => {
                    build_stream::<f32>(&device, &stream_config, sink, err_fn)
                }
                cpal::SampleFormat::I16 => {
                    build_stream::<i16>(&device, &stream_config, sink, err_fn)
                }
                cpal::SampleFormat::U16 => {
                    build_stream::<u16>(&device, &stream_config, sink, err_fn)
                }
                format => Err(RecorderError::Stream(format!(
                    "unsupported sample format: {:?}",
                    format
                ))),
            };

            let stream = match built {
                Ok(stream) => stream,
                Err(e) => {
                    let _ = ready_tx.send(Err(e.to_string()));
                    return;
                }
            };

            if let Err(e) = stream.play() {
                let _ = ready_tx.send(Err(e.to_string()));
                return;
            }

            let _ = ready_tx.send(Ok(()));
            tracing::debug!("Capture thread started");

            // Block until told to close; a dropped sender also unblocks us
            let _ = cmd_rx.recv();
            drop(stream);

            tracing::debug!("Capture thread stopped");
        });

        match ready_rx.recv_timeout(OPEN_TIMEOUT) {
            Ok(Ok(())) => Ok(Self {
                cmd_tx: Some(cmd_tx),
                thread: Some(handle),
            }),
            Ok(Err(msg)) => {
                let _ = handle.join();
                Err(RecorderError::DeviceUnavailable(msg))
            }
            // Dropping cmd_tx unblocks the thread; it detaches and exits
            Err(_) => Err(RecorderError::DeviceUnavailable(format!(
                "capture thread did not start within {:?}",
                OPEN_TIMEOUT
            ))),
        }
    }

    /// Stop the stream and release the device.
    /// Safe to call more than once.
    pub fn close(&mut self) {
        if let Some(tx) = self.cmd_tx.take() {
            let _ = tx.send(StreamCommand::Close);
        }

        if let Some(handle) = self.thread.take() {
            let deadline = Instant::now() + CLOSE_TIMEOUT;
            while !handle.is_finished() && Instant::now() < deadline {
                thread::sleep(Duration::from_millis(10));
            }

            if handle.is_finished() {
                let _ = handle.join();
            } else {
                tracing::warn!("Capture thread did not stop within {:?}", CLOSE_TIMEOUT);
            }
        }
    }
}

impl Drop for CaptureStream {
    fn drop(&mut self) {
        self.close();
    }
}

/// Build an input stream for a specific sample type
fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    sink: FrameSink,
    err_fn: impl Fn(cpal::StreamError) + Send + 'static,
) -> Result<cpal::Stream, RecorderError>
where
    T: cpal::Sample + cpal::SizedSample + Send + 'static,
    f32: cpal::FromSample<T>,
{
    use cpal::traits::DeviceTrait;

    device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                sink.deliver(data);
            },
            err_fn,
            None,
        )
        .map_err(|e| RecorderError::Stream(e.to_string()))
}

/// Find an input device by name.
///
/// Matching order: exact, case-insensitive, then case-insensitive substring,
/// so users can write either full cpal names or short fragments like "usb".
fn find_input_device(host: &cpal::Host, requested: &str) -> Result<cpal::Device, RecorderError> {
    use cpal::traits::{DeviceTrait, HostTrait};

    let devices: Vec<cpal::Device> = host
        .input_devices()
        .map_err(|e| RecorderError::DeviceUnavailable(e.to_string()))?
        .collect();

    let names: Vec<String> = devices
        .iter()
        .map(|d| d.name().unwrap_or_default())
        .collect();
    let wanted = requested.to_lowercase();

    let index = names
        .iter()
        .position(|name| name == requested)
        .or_else(|| names.iter().position(|name| name.to_lowercase() == wanted))
        .or_else(|| {
            names
                .iter()
                .position(|name| name.to_lowercase().contains(&wanted))
        });

    match index {
        Some(i) => {
            tracing::debug!("Matched audio device {:?} for {:?}", names[i], requested);
            devices
                .into_iter()
                .nth(i)
                .ok_or_else(|| RecorderError::DeviceNotFound(requested.to_string()))
        }
        None => {
            let available = if names.is_empty() {
                "no input devices present".to_string()
            } else {
                format!("available: {}", names.join(", "))
            };
            Err(RecorderError::DeviceNotFound(format!(
                "{:?} ({})",
                requested, available
            )))
        }
    }
}

/// Linear interpolation resampling between device and target rates
fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || samples.is_empty() {
        return samples.to_vec();
    }

    let ratio = to_rate as f64 / from_rate as f64;
    let out_len = (samples.len() as f64 * ratio).ceil() as usize;

    (0..out_len)
        .map(|i| {
            let src = i as f64 / ratio;
            let idx = src.floor() as usize;
            let frac = (src - idx as f64) as f32;

            match (samples.get(idx), samples.get(idx + 1)) {
                (Some(&a), Some(&b)) => a * (1.0 - frac) + b * frac,
                (Some(&a), None) => a,
                _ => 0.0,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resample_same_rate_is_identity() {
        let samples = vec![1.0, 2.0, 3.0, 4.0];
        assert_eq!(resample(&samples, 16000, 16000), samples);
    }

    #[test]
    fn test_resample_downsample() {
        let samples = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
        let result = resample(&samples, 48000, 16000);
        // 3:1 ratio, 8 samples -> ~3
        assert!(result.len() >= 2 && result.len() <= 4);
    }

    #[test]
    fn test_resample_upsample() {
        let samples = vec![1.0, 2.0];
        let result = resample(&samples, 8000, 16000);
        assert_eq!(result.len(), 4);
    }

    #[test]
    fn test_resample_empty() {
        assert!(resample(&[], 48000, 16000).is_empty());
    }

    #[test]
    fn test_frame_sink_downmixes_to_mono() {
        let session = SessionState::new();
        let sink = FrameSink {
            session: Arc::clone(&session),
            channels: 2,
            source_rate: 16000,
            target_rate: 16000,
        };

        // Interleaved stereo: L=0.2/R=0.4 then L=-0.2/R=0.0
        sink.deliver(&[0.2f32, 0.4, -0.2, 0.0]);

        let frame = session.most_recent_frame().unwrap();
        assert_eq!(frame.len(), 2);
        assert!((frame[0] - 0.3).abs() < 1e-6);
        assert!((frame[1] + 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_frame_sink_respects_inactive_session() {
        let session = SessionState::new();
        session.set_active(false);

        let sink = FrameSink {
            session: Arc::clone(&session),
            channels: 1,
            source_rate: 16000,
            target_rate: 16000,
        };
        sink.deliver(&[0.5f32; 64]);

        assert_eq!(session.frame_count(), 0);
    }
}
