//! # Storage API
//!
//! HTTP gateway in front of a single S3-compatible bucket.
//!
//! This crate provides:
//! - **File API**: list, download, upload, delete and share files
//! - **Access control**: client IP allowlist followed by a shared token
//! - **Listing filters**: hidden entries and configurable exclusion patterns
//! - **Uniform responses**: every JSON body uses the same result envelope
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │              HTTP Clients (web, curl)               │
//! └─────────────────────────┬───────────────────────────┘
//!                           │
//! ┌─────────────────────────▼───────────────────────────┐
//! │                    Storage API                      │
//! ├─────────────────────────────────────────────────────┤
//! │  CORS │ Request Log │ IP Allowlist │ Token Check    │
//! ├─────────────────────────────────────────────────────┤
//! │                  File Handlers                      │
//! │     (list, download, upload, delete, share)         │
//! ├─────────────────────────────────────────────────────┤
//! │                storage-api-store                    │
//! │           (S3 / R2, in-memory for tests)            │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod auth;
pub mod config;
pub mod envelope;
pub mod error;
pub mod filter;
pub mod handlers;
pub mod logging;
pub mod middleware;
pub mod model;
pub mod paths;
pub mod routes;
pub mod server;
pub mod state;

pub use config::{Cli, GatewayConfig};
pub use envelope::ResultEnvelope;
pub use error::ApiError;
pub use server::{run_server, run_server_with_shutdown};
pub use state::AppState;
