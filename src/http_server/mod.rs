//! # docspace HTTP Server Module
//!
//! Exposes the request orchestrator over HTTP with axum.
//!
//! # Endpoints
//!
//! - `/health` - Health check
//! - `<base_path>/_types` - Registered type names
//! - `<base_path>/{type}/_introduce_type` - Type introduction (GET simple, PUT full)
//! - `<base_path>/{type}` - Query read (GET), write (POST), query take (DELETE)
//! - `<base_path>/{type}/count` - Count
//! - `<base_path>/{type}/{id}` - Read (GET) and take (DELETE) by id

pub mod config;
pub mod routes;
pub mod server;

pub use config::{ConfigError, HttpServerConfig};
pub use routes::{space_routes, status_for, ApiError};
pub use server::HttpServer;
