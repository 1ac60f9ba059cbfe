// Core functionality shared by every Yojana-Setu surface:
// - HTTP client for the caseworker backend
// - Conversation and registration data structures
// - Action directive extraction
// - Scheme catalog
// - Session / identity storage
// - Configuration loading
// - Shared error types

// Export client module - HTTP client for /register and /chat
pub mod client;
pub use client::*;

// Export types module - Conversation and request/response data structures
pub mod types;
pub use types::*;

// Export history module - Transcript serialization for the backend
pub mod history;

// Export directive module - [ACTION: OPEN_PORTAL ...] extraction
pub mod directive;
pub use directive::{extract_directive, ActionDirective, DirectiveError, ExtractionOutcome};

// Export schemes module - Static scheme template catalog
pub mod schemes;
pub use schemes::{FieldSpec, SchemeCatalog, SchemeTemplate};

// Export session module - Locally persisted identity
pub mod session;

// Export dispatcher module - Chat turn dispatcher
pub mod dispatcher;
pub use dispatcher::{ChatDispatcher, DirectiveHandler, DispatchError, TurnOutcome};

// Export config module - Configuration loading
pub mod config;
pub use config::*;

// Export errors module - Shared error types
pub mod errors;
pub use errors::*;
