//! Process-local vector store using SQLite and sqlite-vec
use rusqlite::Connection;
use sqlite_vec::sqlite3_vec_init;
use std::sync::Once;
use thiserror::Error;
use tracing::info;

pub mod collection;
pub mod models;

pub use collection::Collection;

/// Errors raised by the vector store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("invalid collection name: {0:?}")]
    InvalidName(String),

    #[error("collection {name} already exists")]
    CollectionExists { name: String },

    #[error("embedding dimension mismatch: collection expects {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

static INIT_VEC: Once = Once::new();

/// Initialize the sqlite-vec extension. Safe to call multiple times.
fn init_sqlite_vec() {
    INIT_VEC.call_once(|| unsafe {
        rusqlite::ffi::sqlite3_auto_extension(Some(std::mem::transmute(
            sqlite3_vec_init as *const (),
        )));
    });
}

/// An in-memory SQLite connection with sqlite-vec loaded.
///
/// Nothing is written to disk; the store lives exactly as long as the run.
pub struct Db {
    pub(crate) conn: Connection,
}

impl Db {
    /// Open a fresh in-memory store.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        // Register sqlite-vec extension globally
        init_sqlite_vec();

        let conn = Connection::open_in_memory()?;

        // Verify sqlite-vec is loaded
        let vec_version: String = conn.query_row("SELECT vec_version()", [], |row| row.get(0))?;
        info!("sqlite-vec version: {}", vec_version);

        Ok(Self { conn })
    }
}

/// Helper to serialize a float32 vector into bytes for vec0 virtual table
pub fn serialize_vector(vec: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(vec.len() * 4);
    for v in vec {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}
