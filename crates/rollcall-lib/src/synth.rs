//! Speech synthesis: HTTP fetch from an OpenAI-compatible speech endpoint,
//! with rodio playback on a dedicated OS thread.
//!
//! Each prompt is one full round trip. The text is posted, the WAV response
//! buffered, and playback drained to the end before [`Speaker::speak`]
//! resolves, which is the signal that the room is quiet and the microphone
//! may open.

use std::io::Cursor;

use async_trait::async_trait;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use tokio::sync::oneshot;
use tracing::{debug, error};

use rollcall_core::types::SynthConfig;

use crate::error::{Error, Result};
use crate::voice::Speaker;

struct PlayJob {
    wav: Vec<u8>,
    done: oneshot::Sender<Result<()>>,
}

/// Speaker backed by a Kokoro-style `/v1/audio/speech` endpoint.
pub struct HttpSpeaker {
    client: reqwest::Client,
    config: SynthConfig,
    play_tx: std::sync::mpsc::Sender<PlayJob>,
}

impl HttpSpeaker {
    /// Spawn the playback thread and return the speaker.
    pub fn new(config: SynthConfig) -> Self {
        let (play_tx, play_rx) = std::sync::mpsc::channel::<PlayJob>();
        std::thread::Builder::new()
            .name("rollcall-playback".into())
            .spawn(move || playback_thread(play_rx))
            .expect("failed to spawn playback thread");

        Self {
            client: reqwest::Client::new(),
            config,
            play_tx,
        }
    }

    async fn fetch_wav(&self, text: &str) -> Result<Vec<u8>> {
        let url = format!("{}/v1/audio/speech", self.config.url);
        let body = serde_json::json!({
            "input": text,
            "voice": self.config.voice,
            "model": "kokoro",
            "response_format": "wav",
            "speed": self.config.speed,
        });

        let resp = self.client.post(&url).json(&body).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            return Err(Error::Synthesis(format!(
                "speech endpoint returned {status}: {detail}"
            )));
        }

        Ok(patch_wav_sizes(resp.bytes().await?.to_vec()))
    }
}

#[async_trait]
impl Speaker for HttpSpeaker {
    async fn speak(&self, text: &str) -> Result<()> {
        let wav = self.fetch_wav(text).await?;
        debug!(bytes = wav.len(), "prompt synthesized");

        let (done_tx, done_rx) = oneshot::channel();
        self.play_tx
            .send(PlayJob {
                wav,
                done: done_tx,
            })
            .map_err(|_| Error::Audio("playback thread is not running".into()))?;
        done_rx
            .await
            .map_err(|_| Error::Audio("playback thread dropped the clip".into()))?
    }
}

// ─── Playback OS thread ────────────────────────────────────────────────────

fn playback_thread(jobs: std::sync::mpsc::Receiver<PlayJob>) {
    let (_stream, sink) = match open_sink() {
        Ok(pair) => pair,
        Err(e) => {
            error!("playback unavailable: {e}");
            // Keep draining; every job still gets an answer.
            for job in jobs {
                let _ = job.done.send(Err(Error::Audio(format!("audio output unavailable: {e}"))));
            }
            return;
        }
    };

    for job in jobs {
        match Decoder::new(Cursor::new(job.wav)) {
            Ok(source) => {
                sink.append(source);
                sink.sleep_until_end();
                let _ = job.done.send(Ok(()));
            }
            Err(e) => {
                let _ = job.done.send(Err(Error::Audio(format!("undecodable clip: {e}"))));
            }
        }
    }
}

fn open_sink() -> Result<((OutputStream, OutputStreamHandle), Sink)> {
    let (stream, handle) = OutputStream::try_default()
        .map_err(|e| Error::Audio(format!("failed to open audio output: {e}")))?;
    let sink =
        Sink::try_new(&handle).map_err(|e| Error::Audio(format!("failed to create sink: {e}")))?;
    Ok(((stream, handle), sink))
}

/// Rewrite the RIFF and data chunk sizes of a fully buffered WAV.
///
/// Streaming speech servers emit `0xFFFFFFFF` placeholder sizes over chunked
/// transfer. The whole response is in memory before playback starts, so the
/// real sizes can be filled in before the decoder reads the header.
fn patch_wav_sizes(mut wav: Vec<u8>) -> Vec<u8> {
    if wav.len() < 44 || &wav[..4] != b"RIFF" || &wav[8..12] != b"WAVE" {
        return wav;
    }

    let riff_size = (wav.len() - 8) as u32;
    wav[4..8].copy_from_slice(&riff_size.to_le_bytes());

    let mut pos = 12;
    while pos + 8 <= wav.len() {
        let declared =
            u32::from_le_bytes([wav[pos + 4], wav[pos + 5], wav[pos + 6], wav[pos + 7]]);
        if &wav[pos..pos + 4] == b"data" {
            let data_size = (wav.len() - pos - 8) as u32;
            wav[pos + 4..pos + 8].copy_from_slice(&data_size.to_le_bytes());
            break;
        }
        let skip = if declared == u32::MAX { 0 } else { declared as usize };
        pos += 8 + skip;
    }

    wav
}
