//! Conversation orchestration for Prism.
//!
//! This crate ties the pipeline together per incoming message:
//!
//! 1. Resolve (or create) the user and session
//! 2. Persist the user turn with a best-effort embedding
//! 3. Retrieve context: vector-similar prior messages plus a conditional
//!    GitHub digest when the prompt mentions repository activity
//! 4. Generate a reply (degrading to a fixed fallback on upstream failure)
//! 5. Persist the assistant turn and finalize the session
//!
//! It also owns the integration lifecycle (OAuth handshake state, credential
//! cache, connect/callback/disconnect/status) used by the HTTP layer.

pub mod augment;
pub mod connections;
pub mod context;
pub mod error;
pub mod language_model;
pub mod oauth_states;
pub mod orchestrator;

pub use connections::{GitHubQuery, IntegrationManager, IntegrationStatus, GITHUB};
pub use context::{ContextRetriever, RetrievedContext, RECENCY_WINDOW_DAYS, TOP_K_CONTEXT};
pub use error::ConnectionError;
pub use language_model::{LanguageModel, StaticModel};
pub use oauth_states::{HandshakeStore, PendingHandshake};
pub use orchestrator::{ChatOrchestrator, SessionSnapshot};
