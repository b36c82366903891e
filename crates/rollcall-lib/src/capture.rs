//! Cross-platform audio capture using cpal.
//!
//! `AudioCapture` opens an input device and delivers 16 kHz mono i16 samples
//! regardless of the device's native format, rate, or channel count. The
//! device is selectable by name so the checklist can run off a headset mic
//! while the room speakers carry the prompts.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::SampleFormat;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error};

use rollcall_core::types::InputDevice;

use crate::error::{Error, Result};

/// Sample rate delivered to the recognizer.
pub const TARGET_SAMPLE_RATE: u32 = 16_000;

/// Chunk size returned by `read_chunk()`: 100 ms at 16 kHz mono.
pub const CHUNK_SAMPLES: usize = 1_600;

pub struct AudioCapture {
    rx: mpsc::UnboundedReceiver<Vec<i16>>,
    buf: Vec<i16>,
    stop: Arc<AtomicBool>,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl AudioCapture {
    /// Open an input device and start capturing.
    pub fn open(wanted: &InputDevice) -> Result<Self> {
        let host = cpal::default_host();
        let device = select_device(&host, wanted)?;

        let device_name = device.name().unwrap_or_else(|_| "<unnamed>".into());
        let supported = device
            .default_input_config()
            .map_err(|e| Error::Audio(format!("no usable config for '{device_name}': {e}")))?;

        let native_rate = supported.sample_rate().0;
        let channels = supported.channels();
        let sample_format = supported.sample_format();
        debug!(device = %device_name, native_rate, channels, "capture opening");

        let config: cpal::StreamConfig = supported.into();

        let (tx, rx) = mpsc::unbounded_channel::<Vec<i16>>();
        let stop = Arc::new(AtomicBool::new(false));
        let stop_clone = stop.clone();

        // cpal Stream is !Send on macOS; it must live on a dedicated OS thread.
        let thread = std::thread::spawn(move || {
            let stream = match sample_format {
                SampleFormat::I16 => {
                    let tx = tx.clone();
                    let stop = stop_clone.clone();
                    device.build_input_stream(
                        &config,
                        move |data: &[i16], _: &cpal::InputCallbackInfo| {
                            if stop.load(Ordering::Relaxed) {
                                return;
                            }
                            let mono = mix_to_mono(data, channels);
                            let _ = tx.send(resample_linear(&mono, native_rate, TARGET_SAMPLE_RATE));
                        },
                        |err| error!("capture stream error: {err}"),
                        None,
                    )
                }
                SampleFormat::F32 => {
                    let tx = tx.clone();
                    let stop = stop_clone.clone();
                    device.build_input_stream(
                        &config,
                        move |data: &[f32], _: &cpal::InputCallbackInfo| {
                            if stop.load(Ordering::Relaxed) {
                                return;
                            }
                            let widened: Vec<i16> = data
                                .iter()
                                .map(|&s| (s.clamp(-1.0, 1.0) * 32767.0) as i16)
                                .collect();
                            let mono = mix_to_mono(&widened, channels);
                            let _ = tx.send(resample_linear(&mono, native_rate, TARGET_SAMPLE_RATE));
                        },
                        |err| error!("capture stream error: {err}"),
                        None,
                    )
                }
                other => {
                    error!("unsupported capture sample format: {other:?}");
                    return;
                }
            };

            let stream = match stream {
                Ok(s) => s,
                Err(e) => {
                    error!("failed to build capture stream: {e}");
                    return;
                }
            };

            if let Err(e) = stream.play() {
                error!("failed to start capture stream: {e}");
                return;
            }

            // Park until stop signal
            loop {
                std::thread::park();
                if stop_clone.load(Ordering::Relaxed) {
                    break;
                }
            }
            // stream drops here, stopping cpal
        });

        Ok(AudioCapture {
            rx,
            buf: Vec::new(),
            stop,
            thread: Some(thread),
        })
    }

    /// Read exactly [`CHUNK_SAMPLES`] i16 samples.
    /// Errors if the capture stream ends unexpectedly.
    pub async fn read_chunk(&mut self) -> Result<Vec<i16>> {
        while self.buf.len() < CHUNK_SAMPLES {
            match self.rx.recv().await {
                Some(samples) => self.buf.extend_from_slice(&samples),
                None => return Err(Error::Audio("capture stream ended".into())),
            }
        }
        let chunk = self.buf.drain(..CHUNK_SAMPLES).collect();
        Ok(chunk)
    }
}

impl Drop for AudioCapture {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.thread.take() {
            handle.thread().unpark();
            let _ = handle.join();
        }
    }
}

fn select_device(host: &cpal::Host, wanted: &InputDevice) -> Result<cpal::Device> {
    match wanted {
        InputDevice::SystemDefault => host
            .default_input_device()
            .ok_or_else(|| Error::Audio("no input device available".into())),
        InputDevice::Named(name) => {
            let mut devices = host
                .input_devices()
                .map_err(|e| Error::Audio(format!("cannot enumerate input devices: {e}")))?;
            devices
                .find(|d| d.name().is_ok_and(|n| n == *name))
                .ok_or_else(|| Error::Audio(format!("input device '{name}' not found")))
        }
    }
}

// ---------------------------------------------------------------------------
// Audio processing helpers
// ---------------------------------------------------------------------------

/// Mix interleaved multi-channel audio down to mono by averaging each frame.
fn mix_to_mono(input: &[i16], channels: u16) -> Vec<i16> {
    if channels <= 1 {
        return input.to_vec();
    }
    input
        .chunks(channels as usize)
        .map(|frame| {
            let sum: i32 = frame.iter().map(|&s| i32::from(s)).sum();
            (sum / frame.len() as i32) as i16
        })
        .collect()
}

/// Resample with linear interpolation. Good enough for speech.
fn resample_linear(input: &[i16], from_rate: u32, to_rate: u32) -> Vec<i16> {
    if from_rate == to_rate || input.is_empty() {
        return input.to_vec();
    }
    let step = f64::from(from_rate) / f64::from(to_rate);
    let out_len = (input.len() as f64 / step) as usize;
    (0..out_len)
        .map(|i| {
            let pos = i as f64 * step;
            let idx = pos as usize;
            let frac = pos - idx as f64;
            let a = f64::from(input[idx]);
            let b = input.get(idx + 1).map_or(a, |&s| f64::from(s));
            (a + frac * (b - a)) as i16
        })
        .collect()
}
