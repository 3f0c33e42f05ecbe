use redis::{AsyncCommands, Client};

use crate::{
    error::{AppError, AppResult},
    models::ResultItem,
};

/// Durable occasion cache TTL: 7 days
const OCCASION_TTL_SECS: u64 = 7 * 24 * 60 * 60;

/// Creates a Redis client for the durable occasion cache
///
/// Uses connection pooling via the connection-manager feature.
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Long-lived store of occasion results, keyed by occasion name.
///
/// Sits in front of the full pipeline for budget-agnostic occasion
/// requests; entries outlive the in-process cache by design.
#[async_trait::async_trait]
pub trait OccasionStore: Send + Sync {
    async fn get(&self, occasion: &str) -> AppResult<Option<Vec<ResultItem>>>;
    async fn put(&self, occasion: &str, items: &[ResultItem]) -> AppResult<()>;
}

#[derive(Clone)]
pub struct RedisOccasionStore {
    redis_client: Client,
}

impl RedisOccasionStore {
    pub fn new(redis_client: Client) -> Self {
        Self { redis_client }
    }

    fn key(occasion: &str) -> String {
        format!("occasion:{}", occasion.trim().to_lowercase())
    }
}

#[async_trait::async_trait]
impl OccasionStore for RedisOccasionStore {
    async fn get(&self, occasion: &str) -> AppResult<Option<Vec<ResultItem>>> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let cached: Option<String> = conn.get(Self::key(occasion)).await?;

        match cached {
            Some(json) => {
                let items = serde_json::from_str(&json).map_err(|e| {
                    AppError::Internal(format!("Occasion cache deserialization error: {}", e))
                })?;
                Ok(Some(items))
            }
            None => Ok(None),
        }
    }

    async fn put(&self, occasion: &str, items: &[ResultItem]) -> AppResult<()> {
        let json = serde_json::to_string(items).map_err(|e| {
            AppError::Internal(format!("Occasion cache serialization error: {}", e))
        })?;

        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let _: () = conn.set_ex(Self::key(occasion), json, OCCASION_TTL_SECS).await?;

        tracing::debug!(occasion = %occasion, ttl = OCCASION_TTL_SECS, "Cached occasion results");

        Ok(())
    }
}
