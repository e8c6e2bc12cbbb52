pub mod core;
pub mod normalize;

pub use self::core::{Indexer, collection_name};
pub use self::normalize::{NormalizedDocument, SourceFile, normalize_directory};
