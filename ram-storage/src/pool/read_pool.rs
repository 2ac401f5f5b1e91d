//! A small fixed pool of read-only connections, selected round-robin. Reads
//! proceed concurrently with each other and with the writer (WAL allows
//! concurrent readers during a write).

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use rusqlite::Connection;

use ram_core::config::StorageConfig;
use ram_core::RamResult;

use super::pragmas::apply_read_pragmas;
use crate::to_storage_err;

pub struct ReadPool {
    conns: Vec<Mutex<Connection>>,
    next: AtomicUsize,
}

impl ReadPool {
    pub fn open(path: &Path, size: usize, config: &StorageConfig) -> RamResult<Self> {
        let size = size.max(1);
        let mut conns = Vec::with_capacity(size);
        for _ in 0..size {
            let conn = Connection::open(path).map_err(|e| to_storage_err(e.to_string()))?;
            apply_read_pragmas(&conn, config)?;
            conns.push(Mutex::new(conn));
        }
        Ok(Self {
            conns,
            next: AtomicUsize::new(0),
        })
    }

    pub fn open_in_memory(size: usize, config: &StorageConfig) -> RamResult<Self> {
        let size = size.max(1);
        let mut conns = Vec::with_capacity(size);
        for _ in 0..size {
            let conn =
                Connection::open_in_memory().map_err(|e| to_storage_err(e.to_string()))?;
            apply_read_pragmas(&conn, config)?;
            conns.push(Mutex::new(conn));
        }
        Ok(Self {
            conns,
            next: AtomicUsize::new(0),
        })
    }

    /// Execute a closure against the next connection in round-robin order.
    pub fn with_conn<F, T>(&self, f: F) -> RamResult<T>
    where
        F: FnOnce(&Connection) -> RamResult<T>,
    {
        let idx = self.next.fetch_add(1, Ordering::Relaxed) % self.conns.len();
        let guard = self.conns[idx]
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&guard)
    }
}
