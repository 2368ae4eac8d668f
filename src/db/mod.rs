pub mod journal;
pub mod postgres;
pub mod redis;

pub use journal::{Journal, JournalHandle, RoomSink};
pub use postgres::{create_pool, run_migrations, RoomRepository};
pub use redis::{create_redis_client, Cache, CacheKey, CacheWriterHandle};
