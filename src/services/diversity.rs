use crate::models::ScoredCandidate;

/// Default trade-off between relevance and redundancy
pub const DEFAULT_LAMBDA: f64 = 0.75;

/// Greedy Maximal-Marginal-Relevance selection.
///
/// Grows the selection one candidate at a time, each step picking the
/// remaining candidate maximizing
/// `λ * final_score − (1 − λ) * max_similarity_to_selected`.
/// Output order is the selection order; ties keep the first-discovered
/// candidate (input order), which makes the result deterministic.
pub fn select_diverse(
    candidates: Vec<ScoredCandidate>,
    k: usize,
    lambda: f64,
) -> Vec<ScoredCandidate> {
    if k == 0 || candidates.is_empty() {
        return Vec::new();
    }

    let mut remaining = candidates;
    let mut selected: Vec<ScoredCandidate> = Vec::with_capacity(k.min(remaining.len()));

    while selected.len() < k && !remaining.is_empty() {
        let mut best_index = 0;
        let mut best_score = f64::NEG_INFINITY;

        for (index, candidate) in remaining.iter().enumerate() {
            let redundancy = selected
                .iter()
                .map(|s| similarity(candidate, s))
                .fold(0.0, f64::max);
            let mmr = lambda * candidate.scores.final_score - (1.0 - lambda) * redundancy;

            // Strict comparison keeps the earliest candidate on ties
            if mmr > best_score {
                best_score = mmr;
                best_index = index;
            }
        }

        selected.push(remaining.remove(best_index));
    }

    selected
}

/// Pairwise similarity: title edit distance, category equality, and
/// price-midpoint proximity
pub fn similarity(a: &ScoredCandidate, b: &ScoredCandidate) -> f64 {
    let title = strsim::normalized_levenshtein(
        &a.candidate.title.to_lowercase(),
        &b.candidate.title.to_lowercase(),
    );

    let category = match (&a.candidate.category, &b.candidate.category) {
        (Some(ca), Some(cb)) if ca.eq_ignore_ascii_case(cb) => 1.0,
        _ => 0.0,
    };

    let price = price_similarity(a.candidate.price_midpoint(), b.candidate.price_midpoint());

    0.5 * title + 0.3 * category + 0.2 * price
}

fn price_similarity(a: f64, b: f64) -> f64 {
    // A zero midpoint makes the ratio meaningless; treat as neutral
    if a <= 0.0 || b <= 0.0 {
        return 0.5;
    }
    (1.0 - (a - b).abs() / a.max(b)).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CriteriaScores, RawCandidate};

    fn scored(id: &str, title: &str, category: &str, price: f64, final_score: f64) -> ScoredCandidate {
        ScoredCandidate {
            candidate: RawCandidate {
                external_id: id.to_string(),
                title: title.to_string(),
                price_min: price,
                price_max: price,
                currency: "USD".to_string(),
                rating_avg: None,
                rating_count: None,
                badges: vec![],
                available: Some(true),
                image_url: None,
                source_url: format!("https://www.ebay.com/itm/{}", id),
                category: Some(category.to_string()),
                snippet: None,
            },
            trust_score: 0.8,
            scores: CriteriaScores {
                popularity: final_score,
                quality: final_score,
                giftability: final_score,
                logistics: final_score,
                match_score: final_score,
                final_score,
            },
        }
    }

    #[test]
    fn test_selection_cardinality() {
        let candidates: Vec<ScoredCandidate> = (0..10)
            .map(|i| scored(&format!("c{}", i), &format!("Item number {}", i), "Toys", 20.0 + i as f64, 0.5))
            .collect();

        assert_eq!(select_diverse(candidates.clone(), 4, DEFAULT_LAMBDA).len(), 4);
        assert_eq!(select_diverse(candidates.clone(), 10, DEFAULT_LAMBDA).len(), 10);
        assert_eq!(select_diverse(candidates.clone(), 25, DEFAULT_LAMBDA).len(), 10);
        assert_eq!(select_diverse(candidates, 0, DEFAULT_LAMBDA).len(), 0);
        assert_eq!(select_diverse(Vec::new(), 5, DEFAULT_LAMBDA).len(), 0);
    }

    #[test]
    fn test_highest_score_selected_first() {
        let candidates = vec![
            scored("a", "Wool blanket", "Home", 40.0, 0.4),
            scored("b", "Chess board", "Games", 60.0, 0.9),
            scored("c", "Travel mug", "Kitchen", 25.0, 0.6),
        ];

        let selected = select_diverse(candidates, 3, DEFAULT_LAMBDA);
        assert_eq!(selected[0].candidate.external_id, "b");
    }

    #[test]
    fn test_mmr_collapse_k1_returns_higher_scorer() {
        let candidates = vec![
            scored("low", "Ceramic coffee mug set", "Kitchen", 30.0, 0.3),
            scored("high", "Ceramic coffee mug sets", "Kitchen", 30.0, 0.9),
        ];

        let selected = select_diverse(candidates, 1, DEFAULT_LAMBDA);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].candidate.external_id, "high");
    }

    #[test]
    fn test_mmr_collapse_k2_returns_both() {
        let candidates = vec![
            scored("low", "Ceramic coffee mug set", "Kitchen", 30.0, 0.3),
            scored("high", "Ceramic coffee mug sets", "Kitchen", 30.0, 0.9),
        ];

        let selected = select_diverse(candidates, 2, DEFAULT_LAMBDA);
        assert_eq!(selected.len(), 2);
        assert_eq!(selected[0].candidate.external_id, "high");
        assert_eq!(selected[1].candidate.external_id, "low");
    }

    #[test]
    fn test_diversity_penalizes_near_duplicates() {
        // Two near-identical items and one distinct item with a slightly
        // lower score; the distinct one should be picked second.
        let candidates = vec![
            scored("a", "Bamboo cutting board with engraving", "Kitchen", 35.0, 0.90),
            scored("b", "Bamboo cutting board with engravings", "Kitchen", 35.0, 0.88),
            scored("c", "Leather travel journal", "Stationery", 32.0, 0.80),
        ];

        let selected = select_diverse(candidates, 2, DEFAULT_LAMBDA);
        assert_eq!(selected[0].candidate.external_id, "a");
        assert_eq!(selected[1].candidate.external_id, "c");
    }

    #[test]
    fn test_tie_broken_by_first_discovered() {
        let candidates = vec![
            scored("first", "Wool blanket", "Home", 40.0, 0.5),
            scored("second", "Chess board", "Games", 90.0, 0.5),
        ];

        let selected = select_diverse(candidates, 1, DEFAULT_LAMBDA);
        assert_eq!(selected[0].candidate.external_id, "first");
    }

    #[test]
    fn test_similarity_components() {
        let a = scored("a", "Ceramic mug", "Kitchen", 20.0, 0.5);
        let b = scored("b", "Ceramic mug", "Kitchen", 20.0, 0.5);
        assert!((similarity(&a, &b) - 1.0).abs() < 1e-9);

        let c = scored("c", "Completely different thing", "Garden", 200.0, 0.5);
        assert!(similarity(&a, &c) < 0.5);
    }

    #[test]
    fn test_price_similarity_zero_midpoint_neutral() {
        assert_eq!(price_similarity(0.0, 50.0), 0.5);
        assert_eq!(price_similarity(50.0, 0.0), 0.5);
        assert!((price_similarity(50.0, 50.0) - 1.0).abs() < 1e-9);
        assert!((price_similarity(25.0, 50.0) - 0.5).abs() < 1e-9);
    }
}
