//! rollcall-lib: the voice checklist engine.
//!
//! Checklist narration over TTS, spoken-answer capture over STT, the
//! single-run engine, and the HTTP API. Depends on rollcall-core for the
//! pure domain model.

pub mod capture;
pub mod engine;
pub mod error;
mod runner;
pub mod server;
pub mod stt;
pub mod synth;
pub mod voice;

// Re-export rollcall-core for convenience
pub use rollcall_core;
