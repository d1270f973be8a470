pub mod cache;
pub mod store;

mod macros;

pub use cache::Cache;
pub use cache::CacheKey;
pub use store::{FileStore, KeyValueStore, MemoryStore};
