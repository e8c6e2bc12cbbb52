use super::{Db, StoreError, models::QueryMatch, serialize_vector};
use crate::config::is_identifier;
use rusqlite::{OptionalExtension, params};
use tracing::debug;

/// A named set of `(id, embedding, document)` records.
///
/// Backed by a plain table for ids and documents and a `vec0` virtual table
/// for the embeddings, joined on the record's sequence number.
pub struct Collection<'db> {
    db: &'db Db,
    name: String,
    dimensions: usize,
}

impl Db {
    /// Create a new, empty collection whose vectors have `dimensions` entries.
    pub fn create_collection(
        &self,
        name: &str,
        dimensions: usize,
    ) -> Result<Collection<'_>, StoreError> {
        if !is_identifier(name) || dimensions == 0 {
            return Err(StoreError::InvalidName(name.to_string()));
        }

        let exists: Option<String> = self
            .conn
            .query_row(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?",
                params![format!("{name}_records")],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_some() {
            return Err(StoreError::CollectionExists {
                name: name.to_string(),
            });
        }

        self.conn.execute_batch(&format!(
            r#"
            CREATE TABLE "{name}_records" (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                document TEXT NOT NULL
            );

            CREATE VIRTUAL TABLE "{name}_vectors" USING vec0(
                embedding FLOAT[{dimensions}]
            );
            "#
        ))?;

        debug!("Created collection {name} ({dimensions} dimensions)");

        Ok(Collection {
            db: self,
            name: name.to_string(),
            dimensions,
        })
    }
}

impl Collection<'_> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Insert one record. Ids must be unique within the collection.
    pub fn add(&self, id: &str, embedding: &[f32], document: &str) -> Result<(), StoreError> {
        if embedding.len() != self.dimensions {
            return Err(StoreError::DimensionMismatch {
                expected: self.dimensions,
                actual: embedding.len(),
            });
        }

        let name = &self.name;
        let tx = self.db.conn.unchecked_transaction()?;

        tx.execute(
            &format!(r#"INSERT INTO "{name}_records" (id, document) VALUES (?, ?)"#),
            params![id, document],
        )?;
        let seq = tx.last_insert_rowid();

        let vector_blob = serialize_vector(embedding);
        tx.execute(
            &format!(r#"INSERT INTO "{name}_vectors" (rowid, embedding) VALUES (?, ?)"#),
            params![seq, vector_blob],
        )?;

        tx.commit()?;
        Ok(())
    }

    /// Return up to `top_k` records ordered by cosine distance to `embedding`.
    ///
    /// Equal distances keep insertion order.
    pub fn query(&self, embedding: &[f32], top_k: usize) -> Result<Vec<QueryMatch>, StoreError> {
        if embedding.len() != self.dimensions {
            return Err(StoreError::DimensionMismatch {
                expected: self.dimensions,
                actual: embedding.len(),
            });
        }

        let name = &self.name;
        let mut stmt = self.db.conn.prepare(&format!(
            r#"
            SELECT
                r.id,
                r.document,
                vec_distance_cosine(v.embedding, ?) AS distance
            FROM "{name}_vectors" v
            JOIN "{name}_records" r ON v.rowid = r.seq
            ORDER BY distance ASC, r.seq ASC
            LIMIT ?
            "#
        ))?;

        let rows = stmt.query_map(
            params![serialize_vector(embedding), top_k as i64],
            |row| {
                Ok(QueryMatch {
                    id: row.get(0)?,
                    document: row.get(1)?,
                    distance: row.get(2)?,
                })
            },
        )?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }

        Ok(results)
    }

    /// Number of records stored.
    pub fn len(&self) -> Result<usize, StoreError> {
        let count: i64 = self.db.conn.query_row(
            &format!(r#"SELECT COUNT(*) FROM "{}_records""#, self.name),
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    /// All record ids in insertion order.
    pub fn ids(&self) -> Result<Vec<String>, StoreError> {
        let mut stmt = self.db.conn.prepare(&format!(
            r#"SELECT id FROM "{}_records" ORDER BY seq ASC"#,
            self.name
        ))?;
        let rows = stmt.query_map([], |row| row.get(0))?;

        let mut ids = Vec::new();
        for row in rows {
            ids.push(row?);
        }
        Ok(ids)
    }

    /// Look up the document stored under `id`.
    pub fn get(&self, id: &str) -> Result<Option<String>, StoreError> {
        let document = self
            .db
            .conn
            .query_row(
                &format!(r#"SELECT document FROM "{}_records" WHERE id = ?"#, self.name),
                params![id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(document)
    }
}
