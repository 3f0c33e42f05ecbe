use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use giftscout_api::{
    config::Config,
    db::{self, RecommendationCache, RedisOccasionStore, SystemClock},
    routes::{create_router, AppState},
    services::{
        explain::ResultExplainer,
        planner::SearchPlanner,
        providers::{ebay::EbayProvider, openai::OpenAiPlanner},
        recommendations::Recommender,
        retrieval::CandidateRetriever,
    },
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("giftscout_api=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;

    let redis_client = db::create_redis_client(&config.redis_url)?;
    let timeout = Duration::from_secs(config.request_timeout_secs);

    let planner_provider = Arc::new(OpenAiPlanner::new(
        config.planner_api_key.clone(),
        config.planner_api_url.clone(),
        config.planner_model.clone(),
        config.request_timeout_secs,
    ));
    let marketplace = Arc::new(EbayProvider::new(
        config.marketplace_api_key.clone(),
        config.marketplace_api_url.clone(),
        config.marketplace_id.clone(),
        config.request_timeout_secs,
    ));

    let clock = Arc::new(SystemClock);
    let cache = Arc::new(RecommendationCache::with_default_ttl(clock.clone()));

    // Periodic sweep; expired entries are also evicted lazily on lookup
    let sweep_cache = cache.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(300));
        loop {
            interval.tick().await;
            let evicted = sweep_cache.sweep_expired();
            if evicted > 0 {
                tracing::debug!(evicted, "Swept expired recommendation cache entries");
            }
        }
    });

    let recommender = Arc::new(Recommender::new(
        SearchPlanner::new(planner_provider.clone(), timeout),
        CandidateRetriever::new(marketplace),
        ResultExplainer::new(planner_provider, timeout),
        cache,
        Arc::new(RedisOccasionStore::new(redis_client)),
        clock,
    ));

    let app = create_router(AppState { recommender });

    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;
    tracing::info!(host = %config.host, port = config.port, "GiftScout API listening");
    axum::serve(listener, app).await?;

    Ok(())
}
