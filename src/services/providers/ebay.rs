/// eBay Browse API marketplace provider
///
/// Executes one item-summary search per keyword, filtered by price range
/// and condition, sorted by the marketplace's own best-match ordering.
/// Item summaries are converted into validated `RawCandidate`s at this
/// boundary; entries missing a price or URL are filtered, not propagated.
use reqwest::Client as HttpClient;

use crate::{
    error::{AppError, AppResult},
    models::{EbaySearchResponse, ItemCondition, RawCandidate, SearchQuery},
    services::providers::MarketplaceProvider,
};

#[derive(Clone)]
pub struct EbayProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    marketplace_id: String,
}

impl EbayProvider {
    pub fn new(api_key: String, api_url: String, marketplace_id: String, timeout_secs: u64) -> Self {
        let http_client = HttpClient::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_default();

        Self {
            http_client,
            api_key,
            api_url,
            marketplace_id,
        }
    }

    /// Browse API filter expression for the query's price range and condition
    fn filter_expression(query: &SearchQuery) -> String {
        let mut filter = format!(
            "price:[{:.0}..{:.0}],priceCurrency:USD",
            query.price_range.min, query.price_range.max
        );
        match query.condition {
            ItemCondition::New => filter.push_str(",conditions:{NEW}"),
            ItemCondition::Refurbished => filter.push_str(",conditions:{CERTIFIED_REFURBISHED}"),
            ItemCondition::Any => {}
        }
        filter
    }
}

#[async_trait::async_trait]
impl MarketplaceProvider for EbayProvider {
    async fn search(&self, query: &SearchQuery) -> AppResult<Vec<RawCandidate>> {
        let url = format!("{}/buy/browse/v1/item_summary/search", self.api_url);
        let limit = query.limit.clamp(1, 200).to_string();
        let filter = Self::filter_expression(query);

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&self.api_key)
            .header("X-EBAY-C-MARKETPLACE-ID", &self.marketplace_id)
            .query(&[
                ("q", query.keyword.as_str()),
                ("filter", filter.as_str()),
                ("limit", limit.as_str()),
                ("sort", "bestMatch"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::NoCandidates(format!(
                "Marketplace API returned status {}: {}",
                status, body
            )));
        }

        let payload: EbaySearchResponse = response.json().await?;
        let total = payload.item_summaries.len();
        let candidates: Vec<RawCandidate> = payload
            .item_summaries
            .into_iter()
            .filter_map(|summary| summary.into_candidate())
            .collect();

        tracing::info!(
            keyword = %query.keyword,
            returned = total,
            valid = candidates.len(),
            provider = "ebay",
            "Keyword search completed"
        );

        Ok(candidates)
    }

    fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    fn name(&self) -> &'static str {
        "ebay"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PriceRange;

    fn query(condition: ItemCondition) -> SearchQuery {
        SearchQuery {
            keyword: "wedding gift".to_string(),
            price_range: PriceRange {
                min: 50.0,
                max: 200.0,
            },
            condition,
            limit: 25,
        }
    }

    #[test]
    fn test_filter_expression_new_condition() {
        let filter = EbayProvider::filter_expression(&query(ItemCondition::New));
        assert_eq!(filter, "price:[50..200],priceCurrency:USD,conditions:{NEW}");
    }

    #[test]
    fn test_filter_expression_any_condition() {
        let filter = EbayProvider::filter_expression(&query(ItemCondition::Any));
        assert_eq!(filter, "price:[50..200],priceCurrency:USD");
    }

    #[test]
    fn test_is_configured_requires_api_key() {
        let configured = EbayProvider::new(
            "token".to_string(),
            "http://test.local".to_string(),
            "EBAY_US".to_string(),
            5,
        );
        assert!(configured.is_configured());

        let unconfigured = EbayProvider::new(
            "  ".to_string(),
            "http://test.local".to_string(),
            "EBAY_US".to_string(),
            5,
        );
        assert!(!unconfigured.is_configured());
    }

    #[test]
    fn test_search_response_deserialization() {
        let json = r#"{
            "itemSummaries": [
                {
                    "itemId": "v1|111|0",
                    "title": "Walnut chess set",
                    "price": {"value": "89.99", "currency": "USD"},
                    "itemWebUrl": "https://www.ebay.com/itm/111",
                    "categories": [{"categoryName": "Games"}],
                    "buyingOptions": ["FIXED_PRICE"]
                },
                {
                    "itemId": "v1|222|0",
                    "title": "Item with no price"
                }
            ]
        }"#;

        let payload: EbaySearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(payload.item_summaries.len(), 2);

        let candidates: Vec<RawCandidate> = payload
            .item_summaries
            .into_iter()
            .filter_map(|s| s.into_candidate())
            .collect();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].external_id, "v1|111|0");
    }

    #[test]
    fn test_empty_search_response() {
        let payload: EbaySearchResponse = serde_json::from_str("{}").unwrap();
        assert!(payload.item_summaries.is_empty());
    }
}
