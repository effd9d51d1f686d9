pub mod embedding;
pub mod error;
pub mod index;
pub mod memory;
pub mod mock;
pub mod store;

pub use embedding::{cosine_similarity, EmbeddingProvider, HttpEmbeddingProvider};
pub use error::{EmbeddingError, VectorError};
pub use index::{ScoredDocument, VectorDocument, VectorIndex};
pub use memory::InMemoryVectorIndex;
pub use store::VectorStore;

#[cfg(test)]
mod tests;
