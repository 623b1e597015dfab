pub mod cache;
pub mod dataset;
pub mod file_store;
pub mod redis;

pub use cache::{CacheLookup, SimilarityStore};
pub use dataset::InteractionDataset;
pub use file_store::FileSimilarityStore;
pub use self::redis::create_redis_client;
pub use self::redis::RedisSimilarityStore;
