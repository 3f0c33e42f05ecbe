use regex::Regex;
use std::sync::LazyLock;
use url::Url;

use crate::models::RawCandidate;

/// Candidates scoring below this are dropped before scoring
pub const TRUST_THRESHOLD: f64 = 0.55;

/// Retail hosts that earn the full source weight
const TRUSTED_HOSTS: &[&str] = &[
    "amazon.com",
    "ebay.com",
    "etsy.com",
    "target.com",
    "walmart.com",
    "bestbuy.com",
    "nordstrom.com",
    "uncommongoods.com",
    "williams-sonoma.com",
    "crateandbarrel.com",
];

/// Restricted-category tokens: any match zeroes the score outright
const RESTRICTED_TOKENS: &[&str] = &[
    "alcohol",
    "liquor",
    "whiskey",
    "vodka",
    "beer",
    "wine",
    "weapon",
    "firearm",
    "gun",
    "ammunition",
    "adult",
    "nsfw",
    "prescription",
    "pharmacy",
    "opioid",
    "cannabis",
    "thc",
    "vape",
    "tobacco",
    "cigarette",
];

const GIFT_INTENT_TOKENS: &[&str] = &["gift", "best seller", "top 100", "ideas", "top rated"];

/// Badges that count as curation evidence, shared with the popularity score
pub const EVIDENCE_BADGES: &[&str] = &[
    "most gifted",
    "best seller",
    "top 100",
    "editors' pick",
    "top rated",
    "best gifts",
];

static PRICE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[$€£]\s?\d").expect("price pattern must compile"));

static RATING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(★|\bstars?\b|\brating\b|\d\.\d\s*/\s*5)").expect("rating pattern must compile")
});

/// Scores the credibility of a raw result's source and content in [0, 1].
///
/// Restricted-category matches hard-override everything else to 0; a
/// malformed source URL degrades to the low base weight instead of failing.
pub fn trust_score(candidate: &RawCandidate) -> f64 {
    let mut text = candidate.title.clone();
    if let Some(snippet) = &candidate.snippet {
        text.push(' ');
        text.push_str(snippet);
    }
    for badge in &candidate.badges {
        text.push(' ');
        text.push_str(badge);
    }
    let text = text.to_lowercase();

    if RESTRICTED_TOKENS.iter().any(|t| text.contains(t)) {
        return 0.0;
    }

    let mut score = source_weight(&candidate.source_url);

    if GIFT_INTENT_TOKENS.iter().any(|t| text.contains(t)) {
        score += 0.20;
    }
    if PRICE_RE.is_match(&text) {
        score += 0.15;
    }
    if RATING_RE.is_match(&text) {
        score += 0.15;
    }
    if EVIDENCE_BADGES.iter().any(|b| text.contains(b)) {
        score += 0.15;
    }

    score.min(1.0)
}

/// Keeps candidates at or above the trust threshold, paired with their score
pub fn filter_candidates(candidates: Vec<RawCandidate>) -> Vec<(RawCandidate, f64)> {
    let total = candidates.len();
    let kept: Vec<(RawCandidate, f64)> = candidates
        .into_iter()
        .filter_map(|candidate| {
            let score = trust_score(&candidate);
            if score >= TRUST_THRESHOLD {
                Some((candidate, score))
            } else {
                tracing::debug!(
                    external_id = %candidate.external_id,
                    trust_score = score,
                    "Candidate below trust threshold, dropped"
                );
                None
            }
        })
        .collect();

    tracing::info!(total, kept = kept.len(), "Trust filter applied");

    kept
}

fn source_weight(source_url: &str) -> f64 {
    let Ok(parsed) = Url::parse(source_url) else {
        return 0.10;
    };
    let Some(host) = parsed.host_str() else {
        return 0.10;
    };
    let host = host.to_lowercase();

    let trusted = TRUSTED_HOSTS
        .iter()
        .any(|d| host == *d || host.ends_with(&format!(".{}", d)));

    if trusted {
        0.35
    } else {
        0.10
    }
}
