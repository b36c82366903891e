//! Shared configuration and report types.
//!
//! Used across rollcall-lib and rollcall-cli. Keeping them here means
//! consumers can depend on types without pulling in tokio, rodio, or cpal.

use serde::Serialize;

// ─── Voice backend configuration ───────────────────────────────────────────

/// Speech synthesis backend configuration (OpenAI-compatible speech API).
#[derive(Debug, Clone)]
pub struct SynthConfig {
    pub url: String,
    pub voice: String,
    pub speed: f32,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8880".into(),
            voice: "af_heart".into(),
            speed: 1.0,
        }
    }
}

/// Speech recognition backend configuration (whisper-server + local capture).
#[derive(Debug, Clone, Default)]
pub struct RecognizerConfig {
    pub url: String,
    pub model: String,
    pub device: InputDevice,
}

impl RecognizerConfig {
    pub fn localhost() -> Self {
        Self {
            url: "http://localhost:2022".into(),
            model: "base".into(),
            device: InputDevice::SystemDefault,
        }
    }
}

/// Which capture device to open.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum InputDevice {
    #[default]
    SystemDefault,
    /// Match against the device names the host enumerates.
    Named(String),
}

// ─── Run types ─────────────────────────────────────────────────────────────

/// Per-question retry policy.
#[derive(Debug, Clone)]
pub struct RunPolicy {
    /// Capture attempts per question before the runner gives up and moves on.
    pub max_attempts: u32,
}

impl Default for RunPolicy {
    fn default() -> Self {
        Self { max_attempts: 3 }
    }
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunOutcome {
    Completed,
    Cancelled,
}

/// Question abandoned after exhausting its capture attempts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedQuestion {
    pub section: String,
    pub question: String,
}

/// Summary handed back by a finished run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub outcome: RunOutcome,
    /// Items that received a yes/no mark.
    pub answered: usize,
    pub skipped: Vec<SkippedQuestion>,
}

// ─── Audio ─────────────────────────────────────────────────────────────────

/// One captured utterance: mono 16-bit PCM.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
}

impl AudioClip {
    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        (self.samples.len() as u64 * 1000) / self.sample_rate as u64
    }
}
