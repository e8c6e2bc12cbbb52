use crate::db::Collection;
use crate::embedder::Embedder;
use crate::error::RagError;
use tracing::debug;

/// The single best match for a query.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedDocument {
    pub id: String,
    pub text: String,
    pub distance: f64,
}

pub struct Retriever<'a> {
    collection: &'a Collection<'a>,
    embedder: &'a dyn Embedder,
}

impl<'a> Retriever<'a> {
    pub fn new(collection: &'a Collection<'a>, embedder: &'a dyn Embedder) -> Self {
        Self {
            collection,
            embedder,
        }
    }

    /// Embed `query` and return the nearest stored document. No relevance
    /// threshold is applied.
    pub fn retrieve(&self, query: &str) -> Result<RetrievedDocument, RagError> {
        let query_embedding = self.embedder.embed(query)?;
        let best = self
            .collection
            .query(&query_embedding, 1)?
            .into_iter()
            .next()
            .ok_or(RagError::EmptyCollection)?;

        debug!(
            "Retrieved document {} (similarity {:.3})",
            best.id,
            best.similarity()
        );

        Ok(RetrievedDocument {
            id: best.id,
            text: best.document,
            distance: best.distance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Db;
    use crate::embedder::mock::MockEmbedder;

    #[test]
    fn test_retrieve_nearest() {
        let db = Db::open_in_memory().unwrap();
        let embedder = MockEmbedder::new(1024);
        let collection = db.create_collection("docs_r", 1024).unwrap();

        let texts = [
            "Use VPN for remote access.",
            "The cafeteria serves lunch from noon.",
            "Expense reports are due monthly.",
        ];
        for (i, text) in texts.iter().enumerate() {
            collection
                .add(&i.to_string(), &embedder.embed(text).unwrap(), text)
                .unwrap();
        }

        let retriever = Retriever::new(&collection, &embedder);
        let hit = retriever.retrieve("remote access VPN").unwrap();
        assert_eq!(hit.id, "0");
        assert_eq!(hit.text, texts[0]);

        let hit = retriever.retrieve("When does the cafeteria serve lunch?").unwrap();
        assert_eq!(hit.text, texts[1]);
    }

    #[test]
    fn test_retrieve_always_returns_a_stored_document() {
        let db = Db::open_in_memory().unwrap();
        let embedder = MockEmbedder::default();
        let collection = db.create_collection("docs_any", 64).unwrap();
        collection
            .add("0", &embedder.embed("only one").unwrap(), "only one")
            .unwrap();

        let retriever = Retriever::new(&collection, &embedder);
        for query in ["unrelated words", "?", "only"] {
            assert_eq!(retriever.retrieve(query).unwrap().text, "only one");
        }
    }

    #[test]
    fn test_retrieve_empty_collection() {
        let db = Db::open_in_memory().unwrap();
        let embedder = MockEmbedder::default();
        let collection = db.create_collection("docs_none", 64).unwrap();
        let retriever = Retriever::new(&collection, &embedder);
        assert!(matches!(
            retriever.retrieve("anything"),
            Err(RagError::EmptyCollection)
        ));
    }
}
