//! Gemini API client for the chat pipeline.
//!
//! Two operations are exposed:
//!
//! - [`GeminiBrain::embed`] maps text to a fixed-length vector, returning
//!   `None` when the upstream call fails. Downstream stages treat a missing
//!   embedding as a legitimate skip condition, never as a fatal error.
//! - [`GeminiBrain::generate`] composes the persona instruction, retrieved
//!   context, and user prompt into one non-streaming generation call. Any
//!   upstream failure degrades to a fixed fallback reply; this method never
//!   returns an error.

pub mod api_types;
pub mod brain;
pub mod config;
pub mod error;

pub use brain::{GeminiBrain, FALLBACK_REPLY, SYSTEM_PROMPT};
pub use config::GeminiConfig;
pub use error::GeminiError;

/// Dimensionality of the embedding model's output. The storage schema pins
/// its vector column to the same width.
pub const EMBEDDING_DIM: usize = 768;
