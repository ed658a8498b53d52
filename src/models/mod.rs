//! Core data models for the clients API.
//!
//! Clients and images map to SQLite tables via `sqlx::FromRow` and serialize
//! as JSON via `serde`; `query` holds the parsed form of list requests.

pub mod client;
pub mod image;
pub mod query;
