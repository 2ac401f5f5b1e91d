//! Connection pool managing the single writer and the read-only pool.

pub mod pragmas;
pub mod read_pool;
pub mod write_connection;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use ram_core::config::StorageConfig;
use ram_core::RamResult;

pub use read_pool::ReadPool;
pub use write_connection::WriteConnection;

/// Owns the single write connection and the read connection pool.
pub struct ConnectionPool {
    pub writer: Arc<WriteConnection>,
    pub readers: Arc<ReadPool>,
    pub db_path: Option<PathBuf>,
}

impl ConnectionPool {
    pub fn open(path: &Path, config: &StorageConfig) -> RamResult<Self> {
        let writer = Arc::new(WriteConnection::open(path, config)?);
        let readers = Arc::new(ReadPool::open(path, config.read_pool_size, config)?);
        Ok(Self {
            writer,
            readers,
            db_path: Some(path.to_path_buf()),
        })
    }

    /// Open an in-memory pool. Readers see the writer's data only when the
    /// same shared-cache connection is used; in-memory engines in this crate
    /// are intended for single-connection test scenarios, so prefer a temp
    /// file for anything exercising the read pool.
    pub fn open_in_memory(config: &StorageConfig) -> RamResult<Self> {
        let writer = Arc::new(WriteConnection::open_in_memory(config)?);
        let readers = Arc::new(ReadPool::open_in_memory(config.read_pool_size, config)?);
        Ok(Self {
            writer,
            readers,
            db_path: None,
        })
    }
}
