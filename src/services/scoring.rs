use crate::{
    models::{CriteriaScores, Mode, RawCandidate, SearchPlan},
    services::{budget::ResolvedBudget, trust::EVIDENCE_BADGES},
};

/// Per-mode weights for the final score; each row sums to 1.0
#[derive(Debug, Clone, Copy)]
pub struct ModeWeights {
    pub popularity: f64,
    pub quality: f64,
    pub giftability: f64,
    pub logistics: f64,
    pub match_score: f64,
}

pub fn mode_weights(mode: Mode) -> ModeWeights {
    match mode {
        Mode::Popular => ModeWeights {
            popularity: 0.40,
            quality: 0.25,
            giftability: 0.20,
            logistics: 0.15,
            match_score: 0.00,
        },
        Mode::Occasion => ModeWeights {
            popularity: 0.25,
            quality: 0.20,
            giftability: 0.15,
            logistics: 0.10,
            match_score: 0.30,
        },
        Mode::Personalized => ModeWeights {
            popularity: 0.20,
            quality: 0.15,
            giftability: 0.25,
            logistics: 0.05,
            match_score: 0.35,
        },
    }
}

const PERSONALIZED_TOKENS: &[&str] = &["personalized", "custom", "engraved", "monogram"];
const BUNDLE_TOKENS: &[&str] = &["set", "bundle", "collection", "kit"];
const GENERIC_GIFT_TOKENS: &[&str] = &["gift", "present", "for him", "for her", "for men", "for women"];

/// Computes the five criteria scores and the mode-weighted final score,
/// all clamped to [0, 1]
pub fn score_candidate(
    candidate: &RawCandidate,
    mode: Mode,
    budget: &ResolvedBudget,
    plan: &SearchPlan,
) -> CriteriaScores {
    let popularity = popularity_score(candidate);
    let quality = quality_score(candidate);
    let giftability = giftability_score(&candidate.title);
    let logistics = logistics_score(candidate, budget);
    let match_score = plan.category_weight(candidate.category.as_deref()).clamp(0.0, 1.0);

    let w = mode_weights(mode);
    let final_score = (w.popularity * popularity
        + w.quality * quality
        + w.giftability * giftability
        + w.logistics * logistics
        + w.match_score * match_score)
        .clamp(0.0, 1.0);

    CriteriaScores {
        popularity,
        quality,
        giftability,
        logistics,
        match_score,
        final_score,
    }
}

fn popularity_score(candidate: &RawCandidate) -> f64 {
    let count = f64::from(candidate.rating_count.unwrap_or(0));
    let volume = ((count + 1.0).log10() / 5.0).min(1.0);
    let evidence = if has_evidence_badge(candidate) { 1.0 } else { 0.0 };
    (0.7 * volume + 0.3 * evidence).clamp(0.0, 1.0)
}

fn quality_score(candidate: &RawCandidate) -> f64 {
    let avg = candidate.rating_avg.unwrap_or(0.0).clamp(0.0, 5.0);
    let count = f64::from(candidate.rating_count.unwrap_or(0));
    (0.6 * (avg / 5.0) + 0.4 * (count / 1000.0).min(1.0)).clamp(0.0, 1.0)
}

fn giftability_score(title: &str) -> f64 {
    let title = title.to_lowercase();
    let mut score: f64 = 0.0;

    if GENERIC_GIFT_TOKENS.iter().any(|t| contains_token(&title, t)) {
        score += 0.4;
    }
    if PERSONALIZED_TOKENS.iter().any(|t| contains_token(&title, t)) {
        score += 0.3;
    }
    if BUNDLE_TOKENS.iter().any(|t| contains_token(&title, t)) {
        score += 0.3;
    }

    score.min(1.0)
}

fn logistics_score(candidate: &RawCandidate, budget: &ResolvedBudget) -> f64 {
    let available: f64 = if candidate.available == Some(true) { 1.0 } else { 0.0 };
    let band_fit: f64 = if budget.explicit {
        if budget.overlaps(candidate.price_min, candidate.price_max) {
            1.0
        } else {
            0.0
        }
    } else {
        0.5
    };
    (0.6 * available + 0.4 * band_fit).clamp(0.0, 1.0)
}

fn has_evidence_badge(candidate: &RawCandidate) -> bool {
    candidate
        .badges
        .iter()
        .any(|badge| EVIDENCE_BADGES.contains(&badge.to_lowercase().as_str()))
}

/// Word-boundary containment; multi-word tokens fall back to substring match
fn contains_token(text: &str, token: &str) -> bool {
    if token.contains(' ') {
        return text.contains(token);
    }
    text.split(|c: char| !c.is_alphanumeric())
        .any(|word| word == token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PriceRange;
    use crate::services::budget::{self, FallbackContext};

    fn candidate(title: &str, rating_avg: Option<f64>, rating_count: Option<u32>) -> RawCandidate {
        RawCandidate {
            external_id: "c1".to_string(),
            title: title.to_string(),
            price_min: 40.0,
            price_max: 40.0,
            currency: "USD".to_string(),
            rating_avg,
            rating_count,
            badges: vec![],
            available: Some(true),
            image_url: None,
            source_url: "https://www.amazon.com/dp/B0TEST".to_string(),
            category: Some("Home & Kitchen".to_string()),
            snippet: None,
        }
    }

    fn neutral_plan() -> SearchPlan {
        SearchPlan::neutral(PriceRange { min: 0.0, max: 100.0 })
    }

    #[test]
    fn test_mode_weights_sum_to_one() {
        for mode in [Mode::Popular, Mode::Occasion, Mode::Personalized] {
            let w = mode_weights(mode);
            let sum = w.popularity + w.quality + w.giftability + w.logistics + w.match_score;
            assert!((sum - 1.0).abs() < 1e-9, "weights for {} must sum to 1", mode);
        }
    }

    #[test]
    fn test_scores_bounded_for_all_modes() {
        let budget = budget::resolve(None, FallbackContext::Popular).unwrap();
        let extreme = candidate(
            "Personalized custom engraved gift set bundle collection for him",
            Some(5.0),
            Some(u32::MAX),
        );

        for mode in [Mode::Popular, Mode::Occasion, Mode::Personalized] {
            let scores = score_candidate(&extreme, mode, &budget, &neutral_plan());
            for value in [
                scores.popularity,
                scores.quality,
                scores.giftability,
                scores.logistics,
                scores.match_score,
                scores.final_score,
            ] {
                assert!((0.0..=1.0).contains(&value), "{} out of bounds", value);
            }
        }
    }

    #[test]
    fn test_missing_rating_treated_as_zero() {
        let budget = budget::resolve(None, FallbackContext::Popular).unwrap();
        let scores = score_candidate(
            &candidate("Plain mug", None, None),
            Mode::Popular,
            &budget,
            &neutral_plan(),
        );
        assert_eq!(scores.quality, 0.0);
        assert_eq!(scores.popularity, 0.0);
    }

    #[test]
    fn test_popularity_log_curve() {
        let budget = budget::resolve(None, FallbackContext::Popular).unwrap();
        // log10(1000 + 1) / 5 ≈ 0.6 → 0.7 * 0.6 = 0.42, no badge
        let scores = score_candidate(
            &candidate("Plain mug", None, Some(1000)),
            Mode::Popular,
            &budget,
            &neutral_plan(),
        );
        assert!((scores.popularity - 0.42).abs() < 0.01);
    }

    #[test]
    fn test_evidence_badge_boosts_popularity() {
        let budget = budget::resolve(None, FallbackContext::Popular).unwrap();
        let mut with_badge = candidate("Plain mug", None, None);
        with_badge.badges = vec!["Best Seller".to_string()];

        let scores = score_candidate(&with_badge, Mode::Popular, &budget, &neutral_plan());
        assert!((scores.popularity - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_giftability_indicators_cap_at_one() {
        assert_eq!(giftability_score("Personalized custom gift set for her"), 1.0);
        assert!((giftability_score("Gift card") - 0.4).abs() < 1e-9);
        assert!((giftability_score("Engraved pen") - 0.3).abs() < 1e-9);
        assert!((giftability_score("Knife set") - 0.3).abs() < 1e-9);
        assert_eq!(giftability_score("Ordinary lamp"), 0.0);
    }

    #[test]
    fn test_giftability_word_boundaries() {
        // "sunset" must not match the bundle token "set"
        assert_eq!(giftability_score("Sunset photo print"), 0.0);
    }

    #[test]
    fn test_logistics_neutral_when_no_explicit_bands() {
        let fallback = budget::resolve(None, FallbackContext::Popular).unwrap();
        let scores = score_candidate(
            &candidate("Plain mug", None, None),
            Mode::Popular,
            &fallback,
            &neutral_plan(),
        );
        // 0.6 * available + 0.4 * 0.5
        assert!((scores.logistics - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_logistics_band_overlap_with_explicit_bands() {
        let tokens = vec!["25_50".to_string()];
        let explicit = budget::resolve(Some(&tokens), FallbackContext::Popular).unwrap();

        let inside = score_candidate(
            &candidate("Plain mug", None, None),
            Mode::Popular,
            &explicit,
            &neutral_plan(),
        );
        assert!((inside.logistics - 1.0).abs() < 1e-9);

        let mut expensive = candidate("Plain mug", None, None);
        expensive.price_min = 300.0;
        expensive.price_max = 300.0;
        let outside = score_candidate(&expensive, Mode::Popular, &explicit, &neutral_plan());
        assert!((outside.logistics - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_match_score_from_plan_weights() {
        let budget = budget::resolve(None, FallbackContext::Popular).unwrap();
        let mut plan = neutral_plan();
        plan.category_weights = vec![crate::models::CategoryWeight {
            path: "Home & Kitchen".to_string(),
            weight: 0.9,
        }];

        let scores = score_candidate(
            &candidate("Plain mug", None, None),
            Mode::Occasion,
            &budget,
            &plan,
        );
        assert!((scores.match_score - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_match_ignored_in_popular_mode() {
        let w = mode_weights(Mode::Popular);
        assert_eq!(w.match_score, 0.0);
    }
}
