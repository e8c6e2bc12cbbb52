//! Retrieval, prompt assembly, response delivery and the session loop.
pub mod delivery;
pub mod prompt;
pub mod retriever;
pub mod session;

pub use delivery::DeliveryMode;
pub use retriever::{RetrievedDocument, Retriever};
pub use session::{Session, SessionOutcome, Turn};
