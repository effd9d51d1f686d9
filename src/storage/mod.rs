pub mod error;
pub mod memory;
pub mod object_store;
pub mod s3;

pub use error::StorageError;
pub use memory::MemoryObjectStore;
pub use object_store::{ObjectEntry, ObjectStore};
pub use s3::S3ObjectStore;

#[cfg(test)]
mod tests;
