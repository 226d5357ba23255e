//! Database models backing the document store.

#[cfg(feature = "server")]
pub mod config;
pub mod document;
pub mod user;
