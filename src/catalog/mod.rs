//! Medicine catalog: record model, store interface and the in-memory backend

pub mod import;
pub mod memory;
pub mod record;
pub mod store;

pub use memory::MemoryStore;
pub use record::Medicine;
pub use store::{Candidate, RecordStore, StoreError};
