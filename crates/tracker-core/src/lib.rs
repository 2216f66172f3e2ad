//! Ambient stack shared by tracker services.
//!
//! Error envelope, health probes, request ids, tracing setup, serde helpers,
//! sea-orm error helpers and the env config loader.

pub mod config;
pub mod error;
pub mod health;
pub mod middleware;
pub mod sea_ext;
pub mod serde;
pub mod tracing;
