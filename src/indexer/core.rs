use crate::console::{Output, status};
use crate::db::{Collection, Db};
use crate::embedder::Embedder;
use crate::error::RagError;
use crate::indexer::normalize::NormalizedDocument;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

/// A fresh collection name: `<prefix>_<uuid>`.
pub fn collection_name(prefix: &str) -> String {
    format!("{prefix}_{}", Uuid::new_v4().simple())
}

pub struct Indexer<'a, E: Embedder + ?Sized> {
    pub embedder: &'a E,
    pub output: &'a dyn Output,
}

impl<'a, E: Embedder + ?Sized> Indexer<'a, E> {
    pub fn new(embedder: &'a E, output: &'a dyn Output) -> Self {
        Self { embedder, output }
    }

    /// Embeds every document in order and stores it under id `0..N-1`.
    ///
    /// The collection's dimension comes from the first embedding.
    pub fn build_index<'db>(
        &self,
        db: &'db Db,
        name: &str,
        documents: &[NormalizedDocument],
        token: &CancellationToken,
    ) -> Result<Collection<'db>, RagError> {
        let mut collection: Option<Collection<'db>> = None;

        {
            let _working = status(self.output, "Generating vector embedding database...");

            for (idx, doc) in documents.iter().enumerate() {
                if token.is_cancelled() {
                    return Err(RagError::Cancelled);
                }

                let vector = self.embedder.embed(&doc.text)?;
                if collection.is_none() {
                    collection = Some(db.create_collection(name, vector.len())?);
                }
                if let Some(target) = &collection {
                    target.add(&idx.to_string(), &vector, &doc.text)?;
                    debug!("Indexed {} as {idx} in {}", doc.name, target.name());
                }
            }
        }

        let collection = collection.ok_or(RagError::NoDocumentsConverted)?;
        info!(
            "Collection {} holds {} documents ({} dimensions)",
            collection.name(),
            documents.len(),
            collection.dimensions()
        );
        self.output.print("Documents embeddings generated.");
        Ok(collection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::MemoryOutput;
    use crate::embedder::mock::MockEmbedder;

    fn docs(texts: &[&str]) -> Vec<NormalizedDocument> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| NormalizedDocument {
                name: format!("doc{i}.pdf"),
                text: t.to_string(),
            })
            .collect()
    }

    #[test]
    fn test_build_index_dense_ids() {
        let db = Db::open_in_memory().unwrap();
        let embedder = MockEmbedder::default();
        let output = MemoryOutput::new();
        let indexer = Indexer::new(&embedder, &output);

        let documents = docs(&["alpha text", "beta text", "gamma text"]);
        let collection = indexer
            .build_index(&db, "docs_a", &documents, &CancellationToken::new())
            .unwrap();

        assert_eq!(collection.name(), "docs_a");
        assert_eq!(collection.len().unwrap(), 3);
        assert_eq!(collection.ids().unwrap(), vec!["0", "1", "2"]);
        assert_eq!(collection.get("1").unwrap().as_deref(), Some("beta text"));
        assert_eq!(collection.dimensions(), embedder.dimensions);
        assert_eq!(embedder.calls(), 3);
        assert!(output
            .lines()
            .contains(&"Documents embeddings generated.".to_string()));
    }

    #[test]
    fn test_build_index_ids_follow_order_not_content() {
        let db = Db::open_in_memory().unwrap();
        let embedder = MockEmbedder::default();
        let output = MemoryOutput::new();
        let indexer = Indexer::new(&embedder, &output);
        let token = CancellationToken::new();

        let forward = indexer
            .build_index(&db, "fwd", &docs(&["one", "two"]), &token)
            .unwrap();
        let reversed = indexer
            .build_index(&db, "rev", &docs(&["two", "one"]), &token)
            .unwrap();

        assert_eq!(forward.ids().unwrap(), reversed.ids().unwrap());
        assert_eq!(forward.get("0").unwrap().as_deref(), Some("one"));
        assert_eq!(reversed.get("0").unwrap().as_deref(), Some("two"));
    }

    #[test]
    fn test_build_index_empty_corpus() {
        let db = Db::open_in_memory().unwrap();
        let embedder = MockEmbedder::default();
        let output = MemoryOutput::new();
        let result =
            Indexer::new(&embedder, &output).build_index(&db, "empty", &[], &CancellationToken::new());
        assert!(matches!(result, Err(RagError::NoDocumentsConverted)));
    }

    #[test]
    fn test_collection_name_is_unique() {
        let a = collection_name("docs");
        let b = collection_name("docs");
        assert!(a.starts_with("docs_"));
        assert_ne!(a, b);
        assert!(crate::config::is_identifier(&a));
    }
}
