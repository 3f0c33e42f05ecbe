pub mod cache;
pub mod occasions;

pub use cache::{CacheKey, Clock, RecommendationCache, SystemClock};
pub use occasions::{create_redis_client, OccasionStore, RedisOccasionStore};
