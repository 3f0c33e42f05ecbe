use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;

use crate::{
    error::{AppError, AppResult},
    models::{RawCandidate, SearchPlan, SearchQuery},
    services::providers::MarketplaceProvider,
};

/// Upper bound on keyword fan-out, protecting external rate limits
pub const MAX_KEYWORDS: usize = 8;

/// Per-task start offset; smooths bursts without serializing the fan-out
const STAGGER: Duration = Duration::from_millis(75);

/// Executes a plan's keywords against the marketplace provider in
/// parallel and deduplicates the results by item identity.
pub struct CandidateRetriever {
    marketplace: Arc<dyn MarketplaceProvider>,
}

impl CandidateRetriever {
    pub fn new(marketplace: Arc<dyn MarketplaceProvider>) -> Self {
        Self { marketplace }
    }

    /// Runs every keyword query concurrently, awaiting all of them before
    /// dedup. Individual failures are logged and excluded; only a complete
    /// failure (or an unconfigured provider) is an error.
    pub async fn retrieve(&self, plan: &SearchPlan) -> AppResult<Vec<RawCandidate>> {
        if !self.marketplace.is_configured() {
            return Err(AppError::NoCandidates(
                "Marketplace provider is not configured".to_string(),
            ));
        }

        let keywords: Vec<String> = plan.keywords.iter().take(MAX_KEYWORDS).cloned().collect();
        let per_keyword = (plan.candidate_target as usize).div_ceil(keywords.len());

        let mut tasks = JoinSet::new();
        for (index, keyword) in keywords.into_iter().enumerate() {
            let provider = Arc::clone(&self.marketplace);
            let query = SearchQuery {
                keyword,
                price_range: plan.price_range.clone(),
                condition: plan.condition,
                limit: per_keyword,
            };
            tasks.spawn(async move {
                if index > 0 {
                    tokio::time::sleep(STAGGER * index as u32).await;
                }
                let result = provider.search(&query).await;
                (query.keyword, result)
            });
        }

        let mut collected = Vec::new();
        let mut successes = 0usize;
        let mut failures = 0usize;

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(candidates))) => {
                    successes += 1;
                    collected.extend(candidates);
                }
                Ok((keyword, Err(e))) => {
                    failures += 1;
                    tracing::warn!(keyword = %keyword, error = %e, "Keyword search failed, excluded");
                }
                Err(e) => {
                    failures += 1;
                    tracing::error!(error = %e, "Keyword search task join error");
                }
            }
        }

        if successes == 0 {
            return Err(AppError::NoCandidates(
                "All marketplace queries failed".to_string(),
            ));
        }

        if failures > 0 {
            tracing::warn!(successes, failures, "Partial keyword fan-out failure");
        }

        let deduped = dedup_by_external_id(collected);

        if deduped.is_empty() {
            return Err(AppError::NoCandidates(
                "Marketplace queries returned no items".to_string(),
            ));
        }

        tracing::info!(candidates = deduped.len(), "Retrieval completed");

        Ok(deduped)
    }
}

/// First-seen-wins dedup by `external_id`
fn dedup_by_external_id(candidates: Vec<RawCandidate>) -> Vec<RawCandidate> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|c| seen.insert(c.external_id.clone()))
        .collect()
}
