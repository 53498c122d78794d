//! Queue configuration

use covau_core::Backend;
use serde::{Deserialize, Serialize};

/// Autoplay and paging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Start with autoplay enabled
    pub autoplay: bool,
    /// Backend used for autoplay searches
    pub autoplay_backend: Backend,
    pub related_page_size: usize,
    pub radio_page_size: usize,
    pub search_page_size: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            autoplay: true,
            autoplay_backend: Backend::Local,
            related_page_size: 50,
            radio_page_size: 30,
            search_page_size: 50,
        }
    }
}
