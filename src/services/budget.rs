use crate::{
    error::{AppError, AppResult},
    models::BudgetBand,
};

/// Absolute clipping bounds for the numeric filter range sent to the retriever
pub const ABSOLUTE_FLOOR: f64 = 0.0;
pub const ABSOLUTE_CEILING: f64 = 10_000.0;

/// Mode-specific context used to pick fallback bands when the caller
/// supplies none
#[derive(Debug, Clone, Copy)]
pub enum FallbackContext<'a> {
    Popular,
    Occasion(&'a str),
    Personalized(&'a str),
}

/// A concrete price range plus the band set it was derived from
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedBudget {
    pub bands: Vec<BudgetBand>,
    pub min: f64,
    pub max: f64,
    /// Whether the caller supplied the bands explicitly (affects the
    /// logistics score's band-overlap term)
    pub explicit: bool,
}

impl ResolvedBudget {
    /// True if the item's price range overlaps at least one band
    pub fn overlaps(&self, price_min: f64, price_max: f64) -> bool {
        self.bands.iter().any(|b| b.overlaps(price_min, price_max))
    }

    /// Human label for the covered range, used in coverage summaries
    pub fn label(&self) -> String {
        let open_floor = self.min <= ABSOLUTE_FLOOR;
        let open_ceiling = self.max >= ABSOLUTE_CEILING;
        match (open_floor, open_ceiling) {
            (true, true) => "Any price".to_string(),
            (true, false) => format!("Under ${:.0}", self.max),
            (false, true) => format!("${:.0}+", self.min),
            (false, false) => format!("${:.0}–${:.0}", self.min, self.max),
        }
    }
}

/// Resolves the requested band tokens (or the mode-specific fallback) into
/// a concrete numeric range for downstream filters.
///
/// An unrecognized token is a caller contract violation and fails with
/// `InvalidBudget`; it is never silently ignored.
pub fn resolve(tokens: Option<&[String]>, context: FallbackContext<'_>) -> AppResult<ResolvedBudget> {
    let (bands, explicit) = match tokens {
        Some(tokens) if !tokens.is_empty() => (parse_tokens(tokens)?, true),
        _ => (fallback_bands(context), false),
    };

    let (min, max) = bounding_box(&bands);

    Ok(ResolvedBudget {
        bands,
        min,
        max,
        explicit,
    })
}

fn parse_tokens(tokens: &[String]) -> AppResult<Vec<BudgetBand>> {
    let mut bands = Vec::with_capacity(tokens.len());
    for token in tokens {
        let band = BudgetBand::from_token(token)
            .ok_or_else(|| AppError::InvalidBudget(format!("Unrecognized budget band: {}", token)))?;
        if !bands.contains(&band) {
            bands.push(band);
        }
    }
    Ok(bands)
}

/// Fallback band tables, total over every input
fn fallback_bands(context: FallbackContext<'_>) -> Vec<BudgetBand> {
    match context {
        FallbackContext::Popular => vec![BudgetBand::From25To50, BudgetBand::From50To100],
        FallbackContext::Occasion(occasion) => {
            let occasion = occasion.to_lowercase();
            if occasion.contains("wedding") || occasion.contains("anniversary") {
                vec![BudgetBand::From50To100, BudgetBand::From100To200]
            } else if occasion.contains("housewarming")
                || occasion.contains("birthday")
                || occasion.contains("baby")
            {
                vec![BudgetBand::From25To50, BudgetBand::From50To100]
            } else {
                vec![BudgetBand::From25To50, BudgetBand::From50To100]
            }
        }
        FallbackContext::Personalized(relationship) => {
            let relationship = relationship.to_lowercase();
            if relationship.contains("coworker") || relationship.contains("colleague") {
                vec![BudgetBand::From25To50]
            } else if relationship.contains("parent")
                || relationship.contains("grandma")
                || relationship.contains("grandpa")
                || relationship.contains("mom")
                || relationship.contains("dad")
                || relationship.contains("mother")
                || relationship.contains("father")
            {
                vec![BudgetBand::From50To100]
            } else {
                vec![BudgetBand::From25To50, BudgetBand::From50To100]
            }
        }
    }
}

/// Union bounding box over the band set, open ends treated as infinite
/// before clipping to the absolute floor/ceiling
fn bounding_box(bands: &[BudgetBand]) -> (f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;

    for band in bands {
        let (lo, hi) = band.bounds();
        min = min.min(lo.unwrap_or(f64::NEG_INFINITY));
        max = max.max(hi.unwrap_or(f64::INFINITY));
    }

    if bands.is_empty() {
        return (ABSOLUTE_FLOOR, ABSOLUTE_CEILING);
    }

    (
        min.clamp(ABSOLUTE_FLOOR, ABSOLUTE_CEILING),
        max.clamp(ABSOLUTE_FLOOR, ABSOLUTE_CEILING),
    )
}
