//! Domain aggregates exposed by the service layer.

pub mod types;
pub mod user;
