//! rollcall-core: the pure checklist domain.
//!
//! Model, answer classification, the static checklist definition, and shared
//! config/report types. No async runtime, no I/O, no platform dependencies.

pub mod classify;
pub mod definition;
pub mod model;
pub mod types;
