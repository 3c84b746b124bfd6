//! Product models and listing query parameters.

use chrono::{DateTime, Utc};
use hifiy_core::{CategoryId, ProductId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cache::keys;

/// One product in a listing response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductSummary {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    /// Discounted price when a discount is currently active, else `price`.
    pub effective_price: Decimal,
    pub discount_percent: Decimal,
    pub category: Option<String>,
    pub image: Option<String>,
}

/// A page of products plus the unfiltered total.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductPage {
    pub products: Vec<ProductSummary>,
    pub total: i64,
}

/// Full product record for the detail endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ProductDetail {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub category: Option<String>,
    pub images: Vec<String>,
    pub sizes: Vec<SizePrice>,
    pub created_at: DateTime<Utc>,
}

/// One size-specific price of a product.
#[derive(Debug, Clone, Serialize)]
pub struct SizePrice {
    pub size_id: i64,
    pub name: Option<String>,
    pub price: Decimal,
}

/// Sort orders accepted by the product listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    PriceAsc,
    PriceDesc,
    Newest,
}

/// Query parameters of `GET /products`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductListQuery {
    page: Option<u32>,
    limit: Option<u32>,
    /// Free-text search term.
    pub q: Option<String>,
    pub sort: Option<ProductSort>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    /// Comma-separated category ids.
    pub category: Option<String>,
}

impl ProductListQuery {
    #[must_use]
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    #[must_use]
    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(10).clamp(1, 100)
    }

    /// Parsed category filter; malformed ids are ignored.
    #[must_use]
    pub fn category_ids(&self) -> Vec<CategoryId> {
        self.category
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .filter_map(|part| part.trim().parse::<i64>().ok())
            .map(CategoryId::new)
            .collect()
    }

    /// Whether this listing may be served from (and stored in) the cache.
    ///
    /// Search terms, sorts and value filters produce low-reuse keys, so those
    /// requests go straight to the database.
    #[must_use]
    pub fn cache_key(&self) -> Option<String> {
        let plain = self.q.as_deref().is_none_or(str::is_empty)
            && self.sort.is_none()
            && self.min_price.is_none()
            && self.max_price.is_none()
            && self.category_ids().is_empty();
        plain.then(|| keys::product_listing(self.page(), self.limit()))
    }
}

/// Payload of `POST /admin/products`.
#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub category_id: Option<CategoryId>,
}

/// Payload of `PUT /admin/products/{id}`. Absent fields are left unchanged.
#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub category_id: Option<CategoryId>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_plain_listing_is_cacheable_and_deterministic() {
        let a = ProductListQuery {
            page: Some(2),
            limit: Some(10),
            ..Default::default()
        };
        let b = ProductListQuery {
            page: Some(2),
            limit: Some(10),
            q: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(a.cache_key().as_deref(), Some("products:page:2:limit:10"));
        // An empty search term is not a filter.
        assert_eq!(a.cache_key(), b.cache_key());
    }

    #[test]
    fn test_filtered_listings_bypass_cache() {
        let searched = ProductListQuery {
            q: Some("amplifier".into()),
            ..Default::default()
        };
        assert!(searched.cache_key().is_none());

        let priced = ProductListQuery {
            min_price: Some(dec!(10)),
            ..Default::default()
        };
        assert!(priced.cache_key().is_none());

        let sorted = ProductListQuery {
            sort: Some(ProductSort::PriceAsc),
            ..Default::default()
        };
        assert!(sorted.cache_key().is_none());

        let categorized = ProductListQuery {
            category: Some("1,2".into()),
            ..Default::default()
        };
        assert!(categorized.cache_key().is_none());
    }

    #[test]
    fn test_page_and_limit_are_normalized() {
        let q = ProductListQuery {
            page: Some(0),
            limit: Some(5_000),
            ..Default::default()
        };
        assert_eq!(q.page(), 1);
        assert_eq!(q.limit(), 100);
        assert_eq!(ProductListQuery::default().limit(), 10);
    }

    #[test]
    fn test_category_ids_skip_malformed_entries() {
        let q = ProductListQuery {
            category: Some("3, x,7".into()),
            ..Default::default()
        };
        assert_eq!(q.category_ids(), vec![CategoryId::new(3), CategoryId::new(7)]);
    }
}
