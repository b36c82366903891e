//! Voice capability traits.
//!
//! The runner talks to its speech backends through these seams, so tests can
//! script runs without touching a sound card.

use async_trait::async_trait;

use rollcall_core::types::AudioClip;

use crate::error::Result;

/// Speech output. [`HttpSpeaker`](crate::synth::HttpSpeaker) is the real
/// implementation.
#[async_trait]
pub trait Speaker: Send + Sync {
    /// Synthesize and play `text`, resolving only after playback has fully
    /// drained. The runner relies on this to keep the microphone closed while
    /// a prompt is sounding.
    async fn speak(&self, text: &str) -> Result<()>;
}

/// Speech input. [`WhisperListener`](crate::stt::WhisperListener) is the real
/// implementation.
#[async_trait]
pub trait Listener: Send + Sync {
    /// Capture one utterance from the configured device.
    async fn listen(&self) -> Result<AudioClip>;

    /// Turn a captured utterance into text.
    async fn transcribe(&self, clip: AudioClip) -> Result<String>;
}
