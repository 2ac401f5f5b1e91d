//! Single write connection behind `parking_lot::Mutex`. Writes are
//! serialized by construction — there is exactly one of these per `Storage`.
//!
//! A `tokio::sync::Mutex` would be the obvious choice for code reached from
//! `async fn`s, but its `blocking_lock()` panics inside an async execution
//! context, and startup (`Storage::open`) and in-memory reads both need a
//! synchronous lock acquired from code that may itself be running under a
//! tokio runtime. `parking_lot::Mutex` has no such restriction — it is a
//! plain blocking lock either way — and every critical section here is a
//! synchronous SQLite call with no `.await` inside it, so holding the guard
//! never spans a suspension point.

use std::path::Path;

use parking_lot::Mutex;
use rusqlite::Connection;

use ram_core::config::StorageConfig;
use ram_core::RamResult;

use super::pragmas::apply_pragmas;
use crate::to_storage_err;

pub struct WriteConnection {
    conn: Mutex<Connection>,
}

impl WriteConnection {
    pub fn open(path: &Path, config: &StorageConfig) -> RamResult<Self> {
        let conn = Connection::open(path).map_err(|e| to_storage_err(e.to_string()))?;
        apply_pragmas(&conn, config)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory(config: &StorageConfig) -> RamResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| to_storage_err(e.to_string()))?;
        apply_pragmas(&conn, config)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Acquire the write lock and execute a closure with the connection.
    /// `&mut Connection` so callers can open transactions (`Connection::
    /// transaction` requires a unique reference); the mutex is what makes
    /// that safe across the single writer.
    pub async fn with_conn<F, T>(&self, f: F) -> RamResult<T>
    where
        F: FnOnce(&mut Connection) -> RamResult<T>,
    {
        let mut guard = self.conn.lock();
        f(&mut guard)
    }

    /// Synchronous access for non-async contexts (migrations at startup, and
    /// in-memory reads which share the writer connection).
    pub fn with_conn_sync<F, T>(&self, f: F) -> RamResult<T>
    where
        F: FnOnce(&mut Connection) -> RamResult<T>,
    {
        let mut guard = self.conn.lock();
        f(&mut guard)
    }
}
