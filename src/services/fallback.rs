use crate::models::RawCandidate;

/// Bundled sample catalog backing the tier-2 fallback.
///
/// Served shuffled and truncated when the planner or retrieval fails;
/// every entry is broadly giftable and spans the common price bands.
pub fn sample_catalog() -> Vec<RawCandidate> {
    let entries: &[(&str, &str, f64, &str, f64, u32, &str)] = &[
        (
            "fb-001",
            "Scented soy candle gift set",
            24.99,
            "Home & Living",
            4.7,
            8214,
            "Best Seller",
        ),
        (
            "fb-002",
            "Insulated stainless steel travel mug",
            29.95,
            "Kitchen & Dining",
            4.8,
            15203,
            "Most Gifted",
        ),
        (
            "fb-003",
            "Personalized leather journal",
            34.50,
            "Stationery",
            4.6,
            3122,
            "Top Rated",
        ),
        (
            "fb-004",
            "Bamboo cheese board and knife set",
            42.99,
            "Kitchen & Dining",
            4.7,
            6540,
            "Best Seller",
        ),
        (
            "fb-005",
            "Cozy knit throw blanket",
            39.99,
            "Home & Living",
            4.8,
            11840,
            "Most Gifted",
        ),
        (
            "fb-006",
            "Ceramic pour over coffee set",
            48.00,
            "Kitchen & Dining",
            4.5,
            2310,
            "Top Rated",
        ),
        (
            "fb-007",
            "Essential oil diffuser with lights",
            33.99,
            "Wellness",
            4.6,
            20577,
            "Best Seller",
        ),
        (
            "fb-008",
            "Walnut chess set with storage",
            79.99,
            "Games & Puzzles",
            4.8,
            1890,
            "Editors' Pick",
        ),
        (
            "fb-009",
            "Waterproof portable speaker",
            59.99,
            "Electronics",
            4.6,
            30412,
            "Best Seller",
        ),
        (
            "fb-010",
            "Spa gift basket with bath bombs",
            54.95,
            "Wellness",
            4.7,
            9344,
            "Most Gifted",
        ),
        (
            "fb-011",
            "Cast iron dutch oven",
            89.90,
            "Kitchen & Dining",
            4.9,
            7723,
            "Top Rated",
        ),
        (
            "fb-012",
            "Star projector night light",
            36.99,
            "Home & Living",
            4.4,
            12650,
            "Best Seller",
        ),
        (
            "fb-013",
            "Gourmet hot chocolate sampler",
            27.50,
            "Food & Treats",
            4.6,
            4188,
            "Best Gifts",
        ),
        (
            "fb-014",
            "Smart reusable notebook",
            31.95,
            "Stationery",
            4.5,
            18037,
            "Top 100",
        ),
        (
            "fb-015",
            "Indoor herb garden starter kit",
            44.99,
            "Garden",
            4.5,
            5126,
            "Editors' Pick",
        ),
    ];

    entries
        .iter()
        .map(
            |&(id, title, price, category, rating_avg, rating_count, badge)| RawCandidate {
                external_id: id.to_string(),
                title: title.to_string(),
                price_min: price,
                price_max: price,
                currency: "USD".to_string(),
                rating_avg: Some(rating_avg),
                rating_count: Some(rating_count),
                badges: vec![badge.to_string()],
                available: Some(true),
                image_url: None,
                source_url: format!("https://www.ebay.com/itm/{}", id),
                category: Some(category.to_string()),
                snippet: Some(format!("{} {}", title, badge)),
            },
        )
        .collect()
}
