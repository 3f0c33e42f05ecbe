/// External service provider abstractions
///
/// This module provides a pluggable architecture for the two remote
/// dependencies of the pipeline: the language-model planning service and
/// the marketplace search provider. Both are fallible, possibly slow, and
/// hidden behind traits so the orchestrator can be tested with fakes.
use crate::{
    error::AppResult,
    models::{Mode, PlanContext, PlanDraft, RawCandidate, ScoredCandidate, SearchQuery},
};

pub mod ebay;
pub mod openai;

/// Trait for the language-model planning service
///
/// Produces a search plan draft for a request and short per-item
/// explanations. Both operations are treated as advisory: drafts are
/// validated and clamped by the planner service, and explanation failures
/// always have a deterministic template fallback.
#[async_trait::async_trait]
pub trait PlanningProvider: Send + Sync {
    /// Translate a mode + context into an unvalidated plan draft
    async fn plan(&self, mode: Mode, context: &PlanContext) -> AppResult<PlanDraft>;

    /// Produce a short justification for one selected candidate
    ///
    /// Constrained to reference only fields already present on the
    /// candidate; the caller enforces the word budget.
    async fn explain(&self, candidate: &ScoredCandidate, mode: Mode) -> AppResult<String>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Trait for the marketplace search provider
#[async_trait::async_trait]
pub trait MarketplaceProvider: Send + Sync {
    /// Execute one keyword query, filtered by price range and condition
    async fn search(&self, query: &SearchQuery) -> AppResult<Vec<RawCandidate>>;

    /// Availability probe consulted before attempting any call
    fn is_configured(&self) -> bool;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
