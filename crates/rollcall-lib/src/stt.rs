//! Speech recognition: VAD-delimited capture plus whisper-server
//! transcription.
//!
//! [`WhisperListener::listen`] opens the capture device fresh for each call
//! and uses the RMS level to delimit one utterance; the device is released
//! before the call returns. [`WhisperListener::transcribe`] ships the
//! utterance to a local whisper-server as multipart WAV.

use std::io::Cursor;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::debug;

use rollcall_core::types::{AudioClip, InputDevice, RecognizerConfig};

use crate::capture::{AudioCapture, TARGET_SAMPLE_RATE};
use crate::error::{Error, Result};
use crate::voice::Listener;

// VAD tuning
const SILENCE_THRESHOLD: f32 = 0.005;
const MIN_SPEECH_MS: u64 = 200;
const TRAILING_SILENCE_MS: u64 = 800;
const MAX_UTTERANCE_MS: u64 = 10_000;
const NO_SPEECH_TIMEOUT_MS: u64 = 6_000;

/// Model names whisper-server accepts.
const VALID_MODELS: &[&str] = &["tiny", "base", "small", "medium", "large"];

/// Listener backed by local capture and a whisper-server instance.
pub struct WhisperListener {
    client: reqwest::Client,
    url: String,
    model: String,
    device: InputDevice,
}

impl WhisperListener {
    pub fn new(config: RecognizerConfig) -> Result<Self> {
        if !VALID_MODELS.contains(&config.model.as_str()) {
            return Err(Error::Config(format!(
                "invalid recognition model '{}'; expected one of {}",
                config.model,
                VALID_MODELS.join(", ")
            )));
        }
        Ok(Self {
            client: reqwest::Client::new(),
            url: config.url,
            model: config.model,
            device: config.device,
        })
    }
}

#[async_trait]
impl Listener for WhisperListener {
    async fn listen(&self) -> Result<AudioClip> {
        let mut capture = AudioCapture::open(&self.device)?;
        let mut buffer: Vec<i16> = Vec::new();

        let started = Instant::now();
        let mut speech_since: Option<Instant> = None;
        let mut quiet_since: Option<Instant> = None;

        loop {
            let chunk = tokio::time::timeout(Duration::from_millis(500), capture.read_chunk())
                .await
                .map_err(|_| Error::Audio("capture read timed out".into()))??;
            let level = rms_level(&chunk);

            if level > SILENCE_THRESHOLD {
                quiet_since = None;
                if speech_since.is_none() {
                    speech_since = Some(Instant::now());
                    debug!("speech detected");
                }
                buffer.extend_from_slice(&chunk);
            } else if let Some(since) = speech_since {
                buffer.extend_from_slice(&chunk);
                if elapsed_ms(since) >= MIN_SPEECH_MS {
                    let quiet = *quiet_since.get_or_insert_with(Instant::now);
                    if elapsed_ms(quiet) >= TRAILING_SILENCE_MS {
                        break;
                    }
                }
            }

            if speech_since.is_none() && elapsed_ms(started) >= NO_SPEECH_TIMEOUT_MS {
                return Err(Error::NoSpeech);
            }
            if speech_since.is_some() && elapsed_ms(started) >= MAX_UTTERANCE_MS {
                break;
            }
        }

        drop(capture);

        let clip = AudioClip {
            samples: buffer,
            sample_rate: TARGET_SAMPLE_RATE,
        };
        debug!(ms = clip.duration_ms(), "utterance captured");
        Ok(clip)
    }

    async fn transcribe(&self, clip: AudioClip) -> Result<String> {
        let wav = clip_to_wav(&clip)?;

        let part = reqwest::multipart::Part::bytes(wav)
            .file_name("utterance.wav")
            .mime_str("audio/wav")
            .map_err(|e| Error::Transcription(format!("mime error: {e}")))?;
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("model", self.model.clone())
            .text("language", "en")
            .text("response_format", "json");

        let resp = self
            .client
            .post(format!("{}/v1/audio/transcriptions", self.url))
            .multipart(form)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            return Err(Error::Transcription(format!(
                "whisper-server returned {status}: {detail}"
            )));
        }

        let value: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| Error::Transcription(format!("invalid response: {e}")))?;
        let text = clean_transcript(value.get("text").and_then(|v| v.as_str()).unwrap_or(""));
        if text.is_empty() {
            return Err(Error::EmptyTranscript);
        }

        debug!(transcript = %text, "utterance transcribed");
        Ok(text)
    }
}

fn elapsed_ms(since: Instant) -> u64 {
    since.elapsed().as_millis() as u64
}

/// Strip whisper's blank-audio marker and surrounding whitespace.
fn clean_transcript(raw: &str) -> String {
    raw.replace("[BLANK_AUDIO]", "").trim().to_string()
}

/// RMS level of 16-bit PCM samples, normalized to 0.0–1.0.
fn rms_level(samples: &[i16]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let energy: f64 = samples
        .iter()
        .map(|&s| {
            let v = f64::from(s) / 32768.0;
            v * v
        })
        .sum();
    (energy / samples.len() as f64).sqrt() as f32
}

/// Encode a clip as 16-bit mono PCM WAV.
fn clip_to_wav(clip: &AudioClip) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: clip.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer =
            hound::WavWriter::new(&mut cursor, spec).map_err(|e| Error::Audio(e.to_string()))?;
        for &sample in &clip.samples {
            writer
                .write_sample(sample)
                .map_err(|e| Error::Audio(e.to_string()))?;
        }
        writer.finalize().map_err(|e| Error::Audio(e.to_string()))?;
    }

    Ok(cursor.into_inner())
}
