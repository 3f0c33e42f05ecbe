use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;

use crate::{
    models::{Mode, RawCandidate, ScoredCandidate},
    services::providers::PlanningProvider,
};

/// Upper word bound for generated justifications
pub const MAX_WHY_WORDS: usize = 20;

/// Attaches a short human-readable justification to each selected item.
///
/// Explanation failures are never fatal: any provider error, timeout, or
/// empty response degrades to a deterministic template built from the
/// candidate's category and top badge.
pub struct ResultExplainer {
    provider: Arc<dyn PlanningProvider>,
    timeout: Duration,
}

impl ResultExplainer {
    pub fn new(provider: Arc<dyn PlanningProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    /// Explains all selected candidates concurrently, preserving input order
    pub async fn explain_all(&self, selected: &[ScoredCandidate], mode: Mode) -> Vec<String> {
        let mut tasks = JoinSet::new();
        for (index, candidate) in selected.iter().enumerate() {
            let provider = Arc::clone(&self.provider);
            let candidate = candidate.clone();
            let timeout = self.timeout;
            tasks.spawn(async move {
                let why = match tokio::time::timeout(timeout, provider.explain(&candidate, mode)).await
                {
                    Ok(Ok(text)) if !text.trim().is_empty() => {
                        truncate_words(text.trim(), MAX_WHY_WORDS)
                    }
                    Ok(Ok(_)) => template_why(&candidate.candidate),
                    Ok(Err(e)) => {
                        tracing::warn!(
                            external_id = %candidate.candidate.external_id,
                            error = %e,
                            "Explanation failed, using template"
                        );
                        template_why(&candidate.candidate)
                    }
                    Err(_) => {
                        tracing::warn!(
                            external_id = %candidate.candidate.external_id,
                            "Explanation timed out, using template"
                        );
                        template_why(&candidate.candidate)
                    }
                };
                (index, why)
            });
        }

        let mut texts = vec![String::new(); selected.len()];
        while let Some(joined) = tasks.join_next().await {
            if let Ok((index, why)) = joined {
                texts[index] = why;
            }
        }

        // Join errors leave an empty slot; fill from the template
        for (index, text) in texts.iter_mut().enumerate() {
            if text.is_empty() {
                *text = template_why(&selected[index].candidate);
            }
        }

        texts
    }
}

/// Deterministic fallback justification from category and top badge
pub fn template_why(candidate: &RawCandidate) -> String {
    match (candidate.top_badge(), candidate.category.as_deref()) {
        (Some(badge), Some(category)) => format!("{} pick in {}", badge, category),
        (None, Some(category)) => format!("Well-reviewed pick in {}", category),
        (Some(badge), None) => format!("{} pick", badge),
        (None, None) => "A well-reviewed gift pick".to_string(),
    }
}

fn truncate_words(text: &str, max_words: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= max_words {
        return words.join(" ");
    }
    words[..max_words].join(" ")
}
