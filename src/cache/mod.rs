mod error;
mod file;
mod keys;
mod memory;
mod traits;

use std::sync::Arc;

pub use error::{CacheError, CacheResult};
pub use file::FileCache;
pub use keys::CacheKeys;
pub use memory::MemoryCache;
pub use traits::{Cache, CacheExt};

use crate::config::CacheConfig;

/// Build the configured cache backend, or `None` when caching is disabled.
pub fn create_cache(config: &CacheConfig) -> Option<Arc<dyn Cache>> {
    match config {
        CacheConfig::None => None,
        CacheConfig::Memory(memory) => {
            tracing::debug!(max_entries = memory.max_entries, "Using in-memory registry cache");
            Some(Arc::new(MemoryCache::new(memory)))
        }
        CacheConfig::File(file) => {
            tracing::debug!(path = ?file.path, "Using file registry cache");
            Some(Arc::new(FileCache::new(file)))
        }
    }
}
