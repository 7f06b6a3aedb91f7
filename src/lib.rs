//! docspace - A schema-driven document store exposed over a REST-like surface
//!
//! Callers register a type from a schema description, then write, read and
//! delete schema-conformant documents by id or by query.
//!
//! # Layers
//!
//! - [`schema`]: schema descriptions to immutable type descriptors
//! - [`registry`]: registered descriptors, atomic check-and-insert
//! - [`document`]: JSON to typed documents and back
//! - [`storage`]: the storage collaborator and its in-memory implementation
//! - [`api`]: per-operation orchestration and the response envelope
//! - [`http_server`]: axum routes, configuration and server
//! - [`cli`]: command-line entry points

pub mod api;
pub mod cli;
pub mod document;
pub mod errors;
pub mod http_server;
pub mod registry;
pub mod schema;
pub mod storage;

pub use errors::{ErrorKind, StoreError, StoreResult};
