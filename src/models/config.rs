//! Configuration model loaded from external sources.

use serde::Deserialize;

use crate::list::DEFAULT_PAGE_SIZE;

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

#[derive(Clone, Debug, Deserialize)]
/// Basic configuration shared across handlers.
pub struct ServerConfig {
    pub address: String,
    pub port: u16,
    pub database_url: String,
    /// Rows per page when a list request does not send `per_page`.
    #[serde(default = "default_page_size")]
    pub default_page_size: usize,
}
