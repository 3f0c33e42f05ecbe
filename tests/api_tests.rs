use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use giftscout_api::db::{Clock, OccasionStore, RecommendationCache, SystemClock};
use giftscout_api::error::{AppError, AppResult};
use giftscout_api::models::{
    Mode, PlanContext, PlanDraft, RawCandidate, ResultItem, ScoredCandidate, SearchQuery,
};
use giftscout_api::routes::{create_router, AppState};
use giftscout_api::services::{
    explain::ResultExplainer,
    planner::SearchPlanner,
    providers::{MarketplaceProvider, PlanningProvider},
    recommendations::Recommender,
    retrieval::CandidateRetriever,
};

struct OfflinePlanner;

#[async_trait::async_trait]
impl PlanningProvider for OfflinePlanner {
    async fn plan(&self, _mode: Mode, _context: &PlanContext) -> AppResult<PlanDraft> {
        Err(AppError::Planning("planner offline".to_string()))
    }

    async fn explain(&self, _candidate: &ScoredCandidate, _mode: Mode) -> AppResult<String> {
        Err(AppError::Explanation("planner offline".to_string()))
    }

    fn name(&self) -> &'static str {
        "offline-planner"
    }
}

struct WorkingPlanner;

#[async_trait::async_trait]
impl PlanningProvider for WorkingPlanner {
    async fn plan(&self, _mode: Mode, _context: &PlanContext) -> AppResult<PlanDraft> {
        Ok(PlanDraft {
            keywords: vec!["gift".to_string()],
            category_weights: vec![],
            price_min: None,
            price_max: None,
            condition: None,
            candidate_target: Some(20),
        })
    }

    async fn explain(&self, candidate: &ScoredCandidate, _mode: Mode) -> AppResult<String> {
        Ok(format!("A well-made {}", candidate.candidate.title))
    }

    fn name(&self) -> &'static str {
        "working-planner"
    }
}

struct UnconfiguredMarketplace;

#[async_trait::async_trait]
impl MarketplaceProvider for UnconfiguredMarketplace {
    async fn search(&self, _query: &SearchQuery) -> AppResult<Vec<RawCandidate>> {
        Err(AppError::Internal("should not be called".to_string()))
    }

    fn is_configured(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "unconfigured"
    }
}

struct FixedMarketplace {
    items: Vec<RawCandidate>,
}

#[async_trait::async_trait]
impl MarketplaceProvider for FixedMarketplace {
    async fn search(&self, _query: &SearchQuery) -> AppResult<Vec<RawCandidate>> {
        Ok(self.items.clone())
    }

    fn is_configured(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "fixed"
    }
}

#[derive(Default)]
struct MemoryOccasionStore {
    entries: Mutex<HashMap<String, Vec<ResultItem>>>,
}

#[async_trait::async_trait]
impl OccasionStore for MemoryOccasionStore {
    async fn get(&self, occasion: &str) -> AppResult<Option<Vec<ResultItem>>> {
        Ok(self
            .entries
            .lock()
            .unwrap()
            .get(&occasion.to_lowercase())
            .cloned())
    }

    async fn put(&self, occasion: &str, items: &[ResultItem]) -> AppResult<()> {
        self.entries
            .lock()
            .unwrap()
            .insert(occasion.to_lowercase(), items.to_vec());
        Ok(())
    }
}

fn trusted_candidate(id: &str, title: &str, price: f64) -> RawCandidate {
    RawCandidate {
        external_id: id.to_string(),
        title: title.to_string(),
        price_min: price,
        price_max: price,
        currency: "USD".to_string(),
        rating_avg: Some(4.6),
        rating_count: Some(2500),
        badges: vec!["Best Seller".to_string()],
        available: Some(true),
        image_url: None,
        source_url: format!("https://www.amazon.com/dp/{}", id),
        category: Some("Home & Living".to_string()),
        snippet: Some(format!("{} gift ${:.2} 4.6/5 Best Seller", title, price)),
    }
}

fn build_server(
    planner: Arc<dyn PlanningProvider>,
    marketplace: Arc<dyn MarketplaceProvider>,
) -> TestServer {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let timeout = Duration::from_secs(2);

    let recommender = Arc::new(Recommender::new(
        SearchPlanner::new(planner.clone(), timeout),
        CandidateRetriever::new(marketplace),
        ResultExplainer::new(planner, timeout),
        Arc::new(RecommendationCache::with_default_ttl(clock.clone())),
        Arc::new(MemoryOccasionStore::default()),
        clock,
    ));

    let app = create_router(AppState { recommender });
    TestServer::new(app).unwrap()
}

fn offline_server() -> TestServer {
    build_server(Arc::new(OfflinePlanner), Arc::new(UnconfiguredMarketplace))
}

#[tokio::test]
async fn test_health_check() {
    let server = offline_server();
    let response = server.get("/health").await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_popular_serves_fallback_when_providers_unreachable() {
    let server = offline_server();

    let response = server
        .post("/api/v1/recommendations/popular")
        .json(&json!({ "limit": 5 }))
        .await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 5);

    for (index, item) in items.iter().enumerate() {
        assert_eq!(item["rank"].as_u64().unwrap() as usize, index + 1);
        assert!(!item["why_text"].as_str().unwrap().is_empty());
    }

    assert!(body["audit_id"].as_str().is_some());
    assert_eq!(body["region"], "US");
    assert_eq!(body["coverage"]["price_range_label"], "$25–$100");
}

#[tokio::test]
async fn test_popular_requests_get_fresh_audit_ids() {
    let server = offline_server();

    let first: serde_json::Value = server
        .post("/api/v1/recommendations/popular")
        .json(&json!({ "limit": 3 }))
        .await
        .json();
    let second: serde_json::Value = server
        .post("/api/v1/recommendations/popular")
        .json(&json!({ "limit": 3 }))
        .await
        .json();

    assert_ne!(first["audit_id"], second["audit_id"]);
}

#[tokio::test]
async fn test_invalid_budget_band_is_client_error() {
    let server = offline_server();

    let response = server
        .post("/api/v1/recommendations/popular")
        .json(&json!({ "limit": 5, "budget_bands": ["luxury"] }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_occasion_requires_name() {
    let server = offline_server();

    let response = server
        .post("/api/v1/recommendations/occasion")
        .json(&json!({ "occasion": "  " }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_personalized_missing_relationship_rejected() {
    let server = offline_server();

    let response = server
        .post("/api/v1/recommendations/personalized")
        .json(&json!({ "interests": ["coffee"] }))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_personalized_coworker_fallback_response() {
    let server = offline_server();

    let response = server
        .post("/api/v1/recommendations/personalized")
        .json(&json!({ "relationship": "coworker", "limit": 4 }))
        .await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert_eq!(body["items"].as_array().unwrap().len(), 4);
    // Coworker fallback budget is the single 25–50 band
    assert_eq!(body["coverage"]["price_range_label"], "$25–$50");
}

#[tokio::test]
async fn test_occasion_wedding_fallback_budget() {
    let server = offline_server();

    let response = server
        .post("/api/v1/recommendations/occasion")
        .json(&json!({ "occasion": "wedding", "limit": 3 }))
        .await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert_eq!(body["coverage"]["price_range_label"], "$50–$200");
}

#[tokio::test]
async fn test_full_pipeline_with_working_providers() {
    let items = vec![
        trusted_candidate("x1", "Candle gift set", 32.0),
        trusted_candidate("x2", "Throw blanket", 45.0),
        trusted_candidate("x3", "Chess board", 78.0),
        // Restricted item must never reach the results
        RawCandidate {
            snippet: Some("Fine wine gift basket".to_string()),
            ..trusted_candidate("x4", "Wine basket", 60.0)
        },
    ];

    let server = build_server(
        Arc::new(WorkingPlanner),
        Arc::new(FixedMarketplace { items }),
    );

    let response = server
        .post("/api/v1/recommendations/popular")
        .json(&json!({ "limit": 10 }))
        .await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 3);

    for (index, item) in items.iter().enumerate() {
        assert_eq!(item["rank"].as_u64().unwrap() as usize, index + 1);
        let title = item["title"].as_str().unwrap();
        assert_ne!(title, "Wine basket");
        assert!(item["why_text"].as_str().unwrap().starts_with("A well-made"));

        let scores = &item["scores"];
        for key in ["popularity", "quality", "giftability", "logistics", "match", "final"] {
            let value = scores[key].as_f64().unwrap();
            assert!((0.0..=1.0).contains(&value), "{} out of bounds", key);
        }
    }

    let histogram = body["coverage"]["categories_histogram"].as_object().unwrap();
    assert_eq!(histogram["Home & Living"].as_u64(), Some(3));
}

#[tokio::test]
async fn test_request_id_echoed_on_response() {
    use axum::http::{HeaderName, HeaderValue};

    let server = offline_server();

    let response = server
        .post("/api/v1/recommendations/popular")
        .add_header(
            HeaderName::from_static("x-request-id"),
            HeaderValue::from_static("7f9c24e5-1c5a-4b0a-9f62-6d3c1c111111"),
        )
        .json(&json!({ "limit": 1 }))
        .await;
    response.assert_status_ok();
    assert_eq!(
        response.header("x-request-id"),
        HeaderValue::from_static("7f9c24e5-1c5a-4b0a-9f62-6d3c1c111111")
    );
}
