use rand::seq::SliceRandom;
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    db::{CacheKey, Clock, OccasionStore, RecommendationCache},
    error::{AppError, AppResult},
    models::{
        BudgetBand, Coverage, Mode, PlanContext, PriceRange, RecommendationRequest,
        RecommendationResponse, ResultItem, ScoredCandidate, SearchPlan,
    },
    services::{
        budget::{self, FallbackContext, ResolvedBudget},
        diversity,
        explain::{template_why, ResultExplainer},
        fallback,
        planner::SearchPlanner,
        retrieval::CandidateRetriever,
        scoring, trust,
    },
};

/// Mode dispatcher wiring the pipeline stages together, with the tiered
/// fallback chain.
///
/// Tier 1 is the full pipeline (plan → retrieve → filter → score → select
/// → explain); a planner or retrieval failure abandons it for tier 2, the
/// bundled static catalog, which never fails. Explanation failures alone
/// never reach tier 2. Every collaborator is injected so tests can
/// substitute fakes and a controlled clock.
pub struct Recommender {
    planner: SearchPlanner,
    retriever: CandidateRetriever,
    explainer: ResultExplainer,
    cache: Arc<RecommendationCache>,
    occasions: Arc<dyn OccasionStore>,
    clock: Arc<dyn Clock>,
}

impl Recommender {
    pub fn new(
        planner: SearchPlanner,
        retriever: CandidateRetriever,
        explainer: ResultExplainer,
        cache: Arc<RecommendationCache>,
        occasions: Arc<dyn OccasionStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            planner,
            retriever,
            explainer,
            cache,
            occasions,
            clock,
        }
    }

    /// Runs one recommendation request through the cache and pipeline.
    ///
    /// Only caller-input faults (`InvalidInput`, `InvalidBudget`) surface
    /// as errors; every external-service failure degrades to the static
    /// fallback instead.
    pub async fn recommend(
        &self,
        request: RecommendationRequest,
    ) -> AppResult<RecommendationResponse> {
        request.validate()?;

        let resolved = self.resolve_budget(&request)?;
        let mode = request.mode();
        let limit = request.limit();
        let audit_id = Uuid::new_v4();

        tracing::info!(
            audit_id = %audit_id,
            mode = %mode,
            limit,
            budget_min = resolved.min,
            budget_max = resolved.max,
            "Processing recommendation request"
        );

        let key = CacheKey::recommendation(&request);
        if let Some(items) = self.cache.get(&key) {
            tracing::info!(audit_id = %audit_id, cache_key = %key, "Cache hit");
            return Ok(self.assemble(items, &request, &resolved, audit_id));
        }

        if let Some(mut items) = self.durable_occasion_lookup(&request).await {
            tracing::info!(audit_id = %audit_id, "Durable occasion cache hit");
            // Stored entries are keyed by occasion alone; honor this
            // request's limit (ranks stay dense under prefix truncation)
            items.truncate(limit);
            self.cache.put(&key, items.clone());
            return Ok(self.assemble(items, &request, &resolved, audit_id));
        }

        let items = match self.run_pipeline(&request, &resolved, limit).await {
            Ok(items) => {
                self.cache.put(&key, items.clone());
                self.durable_occasion_store(&request, &items).await;
                items
            }
            Err(AppError::Planning(reason)) | Err(AppError::NoCandidates(reason)) => {
                tracing::warn!(
                    audit_id = %audit_id,
                    reason = %reason,
                    "Pipeline abandoned, serving static fallback"
                );
                self.fallback_items(mode, &resolved, limit)
            }
            Err(e) => return Err(e),
        };

        Ok(self.assemble(items, &request, &resolved, audit_id))
    }

    fn resolve_budget(&self, request: &RecommendationRequest) -> AppResult<ResolvedBudget> {
        let context = match request {
            RecommendationRequest::Popular(_) => FallbackContext::Popular,
            RecommendationRequest::Occasion(p) => FallbackContext::Occasion(&p.occasion),
            RecommendationRequest::Personalized(p) => {
                FallbackContext::Personalized(&p.relationship)
            }
        };
        budget::resolve(request.budget_tokens(), context)
    }

    /// Tier 1: the full pipeline
    async fn run_pipeline(
        &self,
        request: &RecommendationRequest,
        resolved: &ResolvedBudget,
        limit: usize,
    ) -> AppResult<Vec<ResultItem>> {
        let mode = request.mode();
        let context = PlanContext::from_request(request, resolved.min, resolved.max);

        let plan = self.planner.plan(mode, &context, resolved).await?;
        let raw = self.retriever.retrieve(&plan).await?;

        let trusted = trust::filter_candidates(raw);
        if trusted.is_empty() {
            return Err(AppError::NoCandidates(
                "No candidates above the trust threshold".to_string(),
            ));
        }

        let scored: Vec<ScoredCandidate> = trusted
            .into_iter()
            .map(|(candidate, trust_score)| {
                let scores = scoring::score_candidate(&candidate, mode, resolved, &plan);
                ScoredCandidate {
                    candidate,
                    trust_score,
                    scores,
                }
            })
            .collect();

        let selected = diversity::select_diverse(scored, limit, diversity::DEFAULT_LAMBDA);
        let why_texts = self.explainer.explain_all(&selected, mode).await;

        Ok(build_items(selected, why_texts))
    }

    /// Tier 2: the bundled catalog, shuffled and truncated; never fails
    fn fallback_items(
        &self,
        mode: Mode,
        resolved: &ResolvedBudget,
        limit: usize,
    ) -> Vec<ResultItem> {
        let mut catalog = fallback::sample_catalog();
        catalog.shuffle(&mut rand::thread_rng());
        catalog.truncate(limit);

        let plan = SearchPlan::neutral(PriceRange {
            min: resolved.min,
            max: resolved.max,
        });

        let selected: Vec<ScoredCandidate> = catalog
            .into_iter()
            .map(|candidate| {
                let trust_score = trust::trust_score(&candidate);
                let scores = scoring::score_candidate(&candidate, mode, resolved, &plan);
                ScoredCandidate {
                    candidate,
                    trust_score,
                    scores,
                }
            })
            .collect();

        let why_texts = selected
            .iter()
            .map(|s| template_why(&s.candidate))
            .collect();

        build_items(selected, why_texts)
    }

    /// Consults the durable occasion store for budget-agnostic occasion
    /// requests; store errors are logged and treated as misses
    async fn durable_occasion_lookup(
        &self,
        request: &RecommendationRequest,
    ) -> Option<Vec<ResultItem>> {
        let RecommendationRequest::Occasion(params) = request else {
            return None;
        };
        if params.budget_bands.is_some() {
            return None;
        }

        match self.occasions.get(&params.occasion).await {
            Ok(hit) => hit.filter(|items| !items.is_empty()),
            Err(e) => {
                tracing::warn!(error = %e, "Durable occasion lookup failed, treating as miss");
                None
            }
        }
    }

    async fn durable_occasion_store(&self, request: &RecommendationRequest, items: &[ResultItem]) {
        let RecommendationRequest::Occasion(params) = request else {
            return;
        };
        if params.budget_bands.is_some() || items.is_empty() {
            return;
        }

        if let Err(e) = self.occasions.put(&params.occasion, items).await {
            tracing::warn!(error = %e, "Durable occasion store write failed");
        }
    }

    fn assemble(
        &self,
        items: Vec<ResultItem>,
        request: &RecommendationRequest,
        resolved: &ResolvedBudget,
        audit_id: Uuid,
    ) -> RecommendationResponse {
        let mut categories_histogram = BTreeMap::new();
        for item in &items {
            if let Some(category) = &item.category {
                *categories_histogram.entry(category.clone()).or_insert(0) += 1;
            }
        }

        RecommendationResponse {
            items,
            coverage: Coverage {
                categories_histogram,
                price_range_label: resolved.label(),
            },
            region: request.region(),
            generated_at: self.clock.now(),
            audit_id,
        }
    }
}

/// Zips selections with their justifications and assigns dense 1-based ranks
fn build_items(selected: Vec<ScoredCandidate>, why_texts: Vec<String>) -> Vec<ResultItem> {
    selected
        .into_iter()
        .zip(why_texts)
        .enumerate()
        .map(|(index, (scored, why_text))| {
            let candidate = scored.candidate;
            ResultItem {
                rank: index + 1,
                price_band_label: BudgetBand::containing(candidate.price_midpoint())
                    .label()
                    .to_string(),
                title: candidate.title,
                category: candidate.category,
                currency: candidate.currency,
                badges: candidate.badges,
                source_url: candidate.source_url,
                image_url: candidate.image_url,
                scores: scored.scores,
                why_text,
            }
        })
        .collect()
}
