//! API layer for docspace
//!
//! The only part of the core that faces the HTTP/CLI boundary. It sequences
//! schema building, marshalling and storage calls per operation and renders
//! every outcome as a response [`Envelope`].
//!
//! # Supported Operations
//!
//! - introduce type (simple and full schema description)
//! - get by id, get by query, count
//! - delete by id, delete by query
//! - write (upsert of one document or a batch)
//! - list types

mod orchestrator;
mod response;

pub use orchestrator::{OrchestratorOptions, RequestOrchestrator, DEFAULT_ID_PROPERTY};
pub use response::{sanitize_message, Envelope, ErrorBody};
