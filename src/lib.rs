//! Webhook capture core.
//!
//! Provision anonymous inbound endpoints, durably record every request sent to
//! them, and answer each one with a configurable simulated response. Captured
//! requests can be listed, filtered, and polled incrementally. Uploaded files
//! are stored as blobs and asynchronously indexed for semantic search.
//!
//! This crate is the core that a routing/transport layer dispatches typed
//! calls into; it owns no HTTP server of its own. Relational persistence, blob
//! backends, and the embedding engine are reached through traits with real and
//! in-memory implementations selected at startup via [`context::AppContext`].

pub mod capture;
pub mod config;
pub mod context;
pub mod files;
pub mod ids;
pub mod logging;
pub mod storage;
pub mod store;
pub mod tasks;
pub mod vector;

#[cfg(test)]
mod test_utils;
