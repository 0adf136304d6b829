// Response cache module
// Author: kelexine (https://github.com/kelexine)

pub mod key;
pub mod models;
pub mod store;

pub use key::cache_key;
pub use models::CacheEntry;
pub use store::{ExpiringStore, FileStore};
