use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt::Display};
use uuid::Uuid;

// ============================================================================
// Request Types
// ============================================================================

/// The three recommendation modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Popular,
    Occasion,
    Personalized,
}

impl Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Popular => write!(f, "popular"),
            Mode::Occasion => write!(f, "occasion"),
            Mode::Personalized => write!(f, "personalized"),
        }
    }
}

impl Mode {
    /// Default number of results when the caller does not specify a limit
    pub fn default_limit(&self) -> usize {
        match self {
            Mode::Popular => 30,
            Mode::Occasion => 24,
            Mode::Personalized => 20,
        }
    }

    /// How many raw candidates the planner should aim for
    pub fn candidate_target(&self) -> u32 {
        match self {
            Mode::Popular => 100,
            Mode::Occasion => 75,
            Mode::Personalized => 80,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PopularParams {
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub budget_bands: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OccasionParams {
    pub occasion: String,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub budget_bands: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PersonalizedParams {
    pub relationship: String,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub age_range: Option<String>,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub budget_bands: Option<Vec<String>>,
    #[serde(default)]
    pub special_preferences: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub region: Option<String>,
}

/// A recommendation request in one of the three modes.
///
/// Mode is an explicit sum type so that dispatch in the orchestrator is
/// exhaustive; handlers construct the matching variant from their own
/// request body type.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum RecommendationRequest {
    Popular(PopularParams),
    Occasion(OccasionParams),
    Personalized(PersonalizedParams),
}

impl RecommendationRequest {
    pub fn mode(&self) -> Mode {
        match self {
            RecommendationRequest::Popular(_) => Mode::Popular,
            RecommendationRequest::Occasion(_) => Mode::Occasion,
            RecommendationRequest::Personalized(_) => Mode::Personalized,
        }
    }

    pub fn limit(&self) -> usize {
        let requested = match self {
            RecommendationRequest::Popular(p) => p.limit,
            RecommendationRequest::Occasion(p) => p.limit,
            RecommendationRequest::Personalized(p) => p.limit,
        };
        requested
            .filter(|&l| l > 0)
            .unwrap_or_else(|| self.mode().default_limit())
    }

    pub fn region(&self) -> String {
        let region = match self {
            RecommendationRequest::Popular(p) => &p.region,
            RecommendationRequest::Occasion(p) => &p.region,
            RecommendationRequest::Personalized(p) => &p.region,
        };
        region
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .unwrap_or("US")
            .to_uppercase()
    }

    pub fn budget_tokens(&self) -> Option<&[String]> {
        let bands = match self {
            RecommendationRequest::Popular(p) => &p.budget_bands,
            RecommendationRequest::Occasion(p) => &p.budget_bands,
            RecommendationRequest::Personalized(p) => &p.budget_bands,
        };
        bands.as_deref()
    }

    /// Validates the mode-specific required fields
    pub fn validate(&self) -> crate::error::AppResult<()> {
        match self {
            RecommendationRequest::Popular(_) => Ok(()),
            RecommendationRequest::Occasion(p) => {
                if p.occasion.trim().is_empty() {
                    return Err(crate::error::AppError::InvalidInput(
                        "Occasion name cannot be empty".to_string(),
                    ));
                }
                Ok(())
            }
            RecommendationRequest::Personalized(p) => {
                if p.relationship.trim().is_empty() {
                    return Err(crate::error::AppError::InvalidInput(
                        "Relationship cannot be empty".to_string(),
                    ));
                }
                Ok(())
            }
        }
    }

    /// Canonical JSON of the normalized input, used to derive cache keys.
    ///
    /// Fields are serialized in a fixed order with trimmed, lowercased
    /// values so that equivalent requests map to the same key.
    pub fn canonical_json(&self) -> String {
        fn norm(s: &str) -> String {
            s.trim().to_lowercase()
        }
        fn norm_opt(s: &Option<String>) -> Option<String> {
            s.as_deref().map(norm).filter(|v| !v.is_empty())
        }
        fn norm_bands(bands: &Option<Vec<String>>) -> Option<Vec<String>> {
            bands.as_ref().map(|b| {
                let mut tokens: Vec<String> = b.iter().map(|t| norm(t)).collect();
                tokens.sort();
                tokens.dedup();
                tokens
            })
        }

        let value = match self {
            RecommendationRequest::Popular(p) => serde_json::json!({
                "mode": "popular",
                "limit": self.limit(),
                "region": self.region(),
                "budget_bands": norm_bands(&p.budget_bands),
            }),
            RecommendationRequest::Occasion(p) => serde_json::json!({
                "mode": "occasion",
                "occasion": norm(&p.occasion),
                "limit": self.limit(),
                "region": self.region(),
                "budget_bands": norm_bands(&p.budget_bands),
            }),
            RecommendationRequest::Personalized(p) => {
                let mut interests: Vec<String> = p.interests.iter().map(|i| norm(i)).collect();
                interests.sort();
                interests.dedup();
                serde_json::json!({
                    "mode": "personalized",
                    "relationship": norm(&p.relationship),
                    "gender": norm_opt(&p.gender),
                    "age_range": norm_opt(&p.age_range),
                    "interests": interests,
                    "special_preferences": norm_opt(&p.special_preferences),
                    "limit": self.limit(),
                    "region": self.region(),
                    "budget_bands": norm_bands(&p.budget_bands),
                })
            }
        };

        value.to_string()
    }
}

// ============================================================================
// Budget Bands
// ============================================================================

/// Discrete price-range buckets used for coarse budget filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BudgetBand {
    #[serde(rename = "under_25")]
    Under25,
    #[serde(rename = "25_50")]
    From25To50,
    #[serde(rename = "50_100")]
    From50To100,
    #[serde(rename = "100_200")]
    From100To200,
    #[serde(rename = "200_500")]
    From200To500,
    #[serde(rename = "500_plus")]
    Over500,
}

impl BudgetBand {
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_lowercase().as_str() {
            "under_25" => Some(BudgetBand::Under25),
            "25_50" => Some(BudgetBand::From25To50),
            "50_100" => Some(BudgetBand::From50To100),
            "100_200" => Some(BudgetBand::From100To200),
            "200_500" => Some(BudgetBand::From200To500),
            "500_plus" => Some(BudgetBand::Over500),
            _ => None,
        }
    }

    pub fn token(&self) -> &'static str {
        match self {
            BudgetBand::Under25 => "under_25",
            BudgetBand::From25To50 => "25_50",
            BudgetBand::From50To100 => "50_100",
            BudgetBand::From100To200 => "100_200",
            BudgetBand::From200To500 => "200_500",
            BudgetBand::Over500 => "500_plus",
        }
    }

    /// Numeric bounds, open-ended at the extremes
    pub fn bounds(&self) -> (Option<f64>, Option<f64>) {
        match self {
            BudgetBand::Under25 => (None, Some(25.0)),
            BudgetBand::From25To50 => (Some(25.0), Some(50.0)),
            BudgetBand::From50To100 => (Some(50.0), Some(100.0)),
            BudgetBand::From100To200 => (Some(100.0), Some(200.0)),
            BudgetBand::From200To500 => (Some(200.0), Some(500.0)),
            BudgetBand::Over500 => (Some(500.0), None),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BudgetBand::Under25 => "Under $25",
            BudgetBand::From25To50 => "$25–$50",
            BudgetBand::From50To100 => "$50–$100",
            BudgetBand::From100To200 => "$100–$200",
            BudgetBand::From200To500 => "$200–$500",
            BudgetBand::Over500 => "$500+",
        }
    }

    /// Union test: does the item's price range overlap this band?
    pub fn overlaps(&self, price_min: f64, price_max: f64) -> bool {
        let (lo, hi) = self.bounds();
        let above_lo = lo.map_or(true, |lo| price_max >= lo);
        let below_hi = hi.map_or(true, |hi| price_min <= hi);
        above_lo && below_hi
    }

    /// The band containing a single price point, for result labeling
    pub fn containing(price: f64) -> Self {
        match price {
            p if p < 25.0 => BudgetBand::Under25,
            p if p < 50.0 => BudgetBand::From25To50,
            p if p < 100.0 => BudgetBand::From50To100,
            p if p < 200.0 => BudgetBand::From100To200,
            p if p < 500.0 => BudgetBand::From200To500,
            _ => BudgetBand::Over500,
        }
    }
}

// ============================================================================
// Search Plans
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemCondition {
    New,
    Refurbished,
    Any,
}

impl ItemCondition {
    pub fn from_token(token: &str) -> Self {
        match token.trim().to_lowercase().as_str() {
            "new" => ItemCondition::New,
            "refurbished" => ItemCondition::Refurbished,
            _ => ItemCondition::Any,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryWeight {
    pub path: String,
    pub weight: f64,
}

/// Unvalidated planner output, as deserialized from the planning service.
///
/// All fields default so that partial payloads deserialize; validation and
/// clamping into a `SearchPlan` happen in the planner service.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlanDraft {
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub category_weights: Vec<CategoryWeight>,
    #[serde(default)]
    pub price_min: Option<f64>,
    #[serde(default)]
    pub price_max: Option<f64>,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub candidate_target: Option<u32>,
}

/// A validated search plan, produced once per request
#[derive(Debug, Clone, Serialize)]
pub struct SearchPlan {
    pub keywords: Vec<String>,
    pub category_weights: Vec<CategoryWeight>,
    pub price_range: PriceRange,
    pub condition: ItemCondition,
    pub candidate_target: u32,
}

impl SearchPlan {
    /// A plan with no category signal, used when scoring fallback items
    pub fn neutral(price_range: PriceRange) -> Self {
        Self {
            keywords: Vec::new(),
            category_weights: Vec::new(),
            price_range,
            condition: ItemCondition::Any,
            candidate_target: 1,
        }
    }

    /// Relevance weight for a candidate category, default 0
    pub fn category_weight(&self, category: Option<&str>) -> f64 {
        let Some(category) = category else {
            return 0.0;
        };
        let category = category.trim().to_lowercase();
        if category.is_empty() {
            return 0.0;
        }

        self.category_weights
            .iter()
            .filter(|cw| {
                let path = cw.path.trim().to_lowercase();
                !path.is_empty() && (path == category || path.contains(&category) || category.contains(&path))
            })
            .map(|cw| cw.weight.clamp(0.0, 1.0))
            .fold(0.0, f64::max)
    }
}

/// One marketplace query derived from a plan keyword
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub keyword: String,
    pub price_range: PriceRange,
    pub condition: ItemCondition,
    pub limit: usize,
}

/// Context passed to the planning service alongside the mode
#[derive(Debug, Clone)]
pub struct PlanContext {
    pub occasion: Option<String>,
    pub relationship: Option<String>,
    pub gender: Option<String>,
    pub age_range: Option<String>,
    pub interests: Vec<String>,
    pub special_preferences: Option<String>,
    pub region: String,
    pub budget_min: f64,
    pub budget_max: f64,
    pub candidate_target: u32,
}

impl PlanContext {
    pub fn from_request(request: &RecommendationRequest, budget_min: f64, budget_max: f64) -> Self {
        let mut ctx = Self {
            occasion: None,
            relationship: None,
            gender: None,
            age_range: None,
            interests: Vec::new(),
            special_preferences: None,
            region: request.region(),
            budget_min,
            budget_max,
            candidate_target: request.mode().candidate_target(),
        };

        match request {
            RecommendationRequest::Popular(_) => {}
            RecommendationRequest::Occasion(p) => {
                ctx.occasion = Some(p.occasion.trim().to_string());
            }
            RecommendationRequest::Personalized(p) => {
                ctx.relationship = Some(p.relationship.trim().to_string());
                ctx.gender = p.gender.clone();
                ctx.age_range = p.age_range.clone();
                ctx.interests = p.interests.clone();
                ctx.special_preferences = p.special_preferences.clone();
            }
        }

        ctx
    }
}

// ============================================================================
// Candidates & Results
// ============================================================================

/// A single external search hit, validated at the provider boundary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawCandidate {
    pub external_id: String,
    pub title: String,
    pub price_min: f64,
    pub price_max: f64,
    pub currency: String,
    pub rating_avg: Option<f64>,
    pub rating_count: Option<u32>,
    #[serde(default)]
    pub badges: Vec<String>,
    pub available: Option<bool>,
    pub image_url: Option<String>,
    pub source_url: String,
    pub category: Option<String>,
    /// Originating result text, consumed by the trust filter
    #[serde(default)]
    pub snippet: Option<String>,
}

impl RawCandidate {
    pub fn price_midpoint(&self) -> f64 {
        (self.price_min + self.price_max) / 2.0
    }

    pub fn top_badge(&self) -> Option<&str> {
        self.badges.first().map(String::as_str)
    }
}

/// Per-criterion quality scores, each in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CriteriaScores {
    pub popularity: f64,
    pub quality: f64,
    pub giftability: f64,
    pub logistics: f64,
    #[serde(rename = "match")]
    pub match_score: f64,
    #[serde(rename = "final")]
    pub final_score: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoredCandidate {
    #[serde(flatten)]
    pub candidate: RawCandidate,
    pub trust_score: f64,
    pub scores: CriteriaScores,
}

/// The public output unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultItem {
    pub rank: usize,
    pub title: String,
    pub category: Option<String>,
    pub price_band_label: String,
    pub currency: String,
    pub badges: Vec<String>,
    pub source_url: String,
    pub image_url: Option<String>,
    pub scores: CriteriaScores,
    pub why_text: String,
}

/// Category/price coverage summary attached to every response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coverage {
    pub categories_histogram: BTreeMap<String, usize>,
    pub price_range_label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub items: Vec<ResultItem>,
    pub coverage: Coverage,
    pub region: String,
    pub generated_at: DateTime<Utc>,
    pub audit_id: Uuid,
}

// ============================================================================
// Marketplace API Types (eBay Browse)
// ============================================================================

/// Raw API response from the item summary search endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EbaySearchResponse {
    #[serde(default)]
    pub item_summaries: Vec<EbayItemSummary>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EbayItemSummary {
    pub item_id: String,
    pub title: String,
    #[serde(default)]
    pub price: Option<EbayPrice>,
    #[serde(default)]
    pub image: Option<EbayImage>,
    #[serde(default)]
    pub item_web_url: Option<String>,
    #[serde(default)]
    pub categories: Vec<EbayCategory>,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub seller: Option<EbaySeller>,
    #[serde(default)]
    pub buying_options: Vec<String>,
    #[serde(default)]
    pub top_rated_buying_experience: Option<bool>,
    #[serde(default)]
    pub short_description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EbayPrice {
    pub value: String,
    pub currency: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EbayImage {
    pub image_url: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EbayCategory {
    pub category_name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EbaySeller {
    #[serde(default)]
    pub feedback_percentage: Option<String>,
    #[serde(default)]
    pub feedback_score: Option<u32>,
}

impl EbayItemSummary {
    /// Converts a summary into a validated candidate.
    ///
    /// Returns `None` when required fields are missing or unparseable;
    /// such entries are filtered at the boundary rather than propagated.
    pub fn into_candidate(self) -> Option<RawCandidate> {
        let price = self.price?;
        let amount: f64 = price.value.trim().parse().ok()?;
        if amount < 0.0 {
            return None;
        }
        let source_url = self.item_web_url.filter(|u| !u.trim().is_empty())?;

        // Seller feedback stands in for product ratings: percentage maps
        // onto a 5-point scale, score onto a review count.
        let rating_avg = self
            .seller
            .as_ref()
            .and_then(|s| s.feedback_percentage.as_deref())
            .and_then(|p| p.trim().parse::<f64>().ok())
            .map(|pct| (pct / 20.0).clamp(0.0, 5.0));
        let rating_count = self.seller.as_ref().and_then(|s| s.feedback_score);

        let mut badges = Vec::new();
        if self.top_rated_buying_experience == Some(true) {
            badges.push("Top Rated".to_string());
        }

        let category = self.categories.first().map(|c| c.category_name.clone());
        let snippet = match &self.short_description {
            Some(desc) => format!("{} {}", self.title, desc),
            None => self.title.clone(),
        };

        Some(RawCandidate {
            external_id: self.item_id,
            title: self.title,
            price_min: amount,
            price_max: amount,
            currency: price.currency,
            rating_avg,
            rating_count,
            badges,
            available: Some(!self.buying_options.is_empty()),
            image_url: self.image.map(|i| i.image_url),
            source_url,
            category,
            snippet: Some(snippet),
        })
    }
}
