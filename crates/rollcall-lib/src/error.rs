//! Error types for the checklist engine

use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while driving a checklist
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// Capture or playback device error
    #[error("audio error: {0}")]
    Audio(String),

    /// Speech synthesis backend failure
    #[error("synthesis error: {0}")]
    Synthesis(String),

    /// No speech arrived before the capture timeout
    #[error("no speech detected")]
    NoSpeech,

    /// Transcription produced no usable text
    #[error("empty transcript")]
    EmptyTranscript,

    /// Transcription backend failure
    #[error("transcription error: {0}")]
    Transcription(String),

    /// A checklist run is already live
    #[error("checklist run already in progress")]
    RunInProgress,

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}
