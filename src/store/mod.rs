//! Persistence layer — the `Database` port and its backends.

pub mod libsql_backend;
pub mod memory;
pub mod migrations;
pub mod traits;

use std::sync::Arc;

pub use libsql_backend::LibSqlBackend;
pub use memory::MemoryStore;
pub use traits::Database;

use crate::config::PlacementConfig;
use crate::error::Result;

/// Open the store selected by `config`.
pub async fn open(config: &PlacementConfig) -> Result<Arc<dyn Database>> {
    if config.in_memory {
        let store: Arc<dyn Database> = MemoryStore::new();
        return Ok(store);
    }
    let backend = LibSqlBackend::new_local(&config.db_path).await?;
    Ok(Arc::new(backend))
}
