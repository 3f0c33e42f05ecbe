use std::sync::Arc;
use std::time::Duration;

use crate::{
    error::{AppError, AppResult},
    models::{ItemCondition, Mode, PlanContext, PlanDraft, PriceRange, SearchPlan},
    services::{budget::ResolvedBudget, providers::PlanningProvider},
};

/// Produces a validated `SearchPlan` from the planning service.
///
/// The provider's draft is advisory: keywords are required, but numeric
/// fields are range-checked and clamped to the resolved budget rather
/// than rejected.
pub struct SearchPlanner {
    provider: Arc<dyn PlanningProvider>,
    timeout: Duration,
}

impl SearchPlanner {
    pub fn new(provider: Arc<dyn PlanningProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    pub async fn plan(
        &self,
        mode: Mode,
        context: &PlanContext,
        budget: &ResolvedBudget,
    ) -> AppResult<SearchPlan> {
        let draft = tokio::time::timeout(self.timeout, self.provider.plan(mode, context))
            .await
            .map_err(|_| AppError::Planning("Planning service timed out".to_string()))??;

        let plan = validate_draft(draft, budget)?;

        tracing::info!(
            mode = %mode,
            keywords = plan.keywords.len(),
            candidate_target = plan.candidate_target,
            price_min = plan.price_range.min,
            price_max = plan.price_range.max,
            provider = self.provider.name(),
            "Search plan validated"
        );

        Ok(plan)
    }
}

/// Validates a draft against the plan shape and clamps its numeric fields
/// to the resolved budget
pub fn validate_draft(draft: PlanDraft, budget: &ResolvedBudget) -> AppResult<SearchPlan> {
    let keywords: Vec<String> = draft
        .keywords
        .into_iter()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .collect();

    if keywords.is_empty() {
        return Err(AppError::Planning(
            "Plan contained no usable keywords".to_string(),
        ));
    }

    let candidate_target = match draft.candidate_target {
        Some(target) if target > 0 => target,
        _ => {
            return Err(AppError::Planning(
                "Plan missing a positive candidate target".to_string(),
            ))
        }
    };

    // Price bounds are advisory: out-of-range values fall back to the
    // budget's bounding box instead of failing the plan.
    let mut min = draft.price_min.filter(|m| m.is_finite() && *m >= 0.0).unwrap_or(budget.min);
    let mut max = draft.price_max.filter(|m| m.is_finite() && *m >= 0.0).unwrap_or(budget.max);
    if min > max {
        min = budget.min;
        max = budget.max;
    }

    let category_weights = draft
        .category_weights
        .into_iter()
        .filter(|cw| !cw.path.trim().is_empty() && cw.weight.is_finite())
        .map(|mut cw| {
            cw.weight = cw.weight.clamp(0.0, 1.0);
            cw
        })
        .collect();

    let condition = draft
        .condition
        .as_deref()
        .map(ItemCondition::from_token)
        .unwrap_or(ItemCondition::Any);

    Ok(SearchPlan {
        keywords,
        category_weights,
        price_range: PriceRange { min, max },
        condition,
        candidate_target,
    })
}
