//! Catalog reads: priced product listings, detail, pricing inputs, favorites.
//!
//! Listing rows carry the raw discount window; the effective price is
//! resolved in [`crate::pricing`] so every row of one response is priced
//! against the same instant.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};

use hifiy_core::{ProductId, SizeId, UserId};

use super::RepositoryError;
use crate::models::product::{
    ProductDetail, ProductListQuery, ProductPage, ProductSort, ProductSummary, SizePrice,
};
use crate::pricing::{self, DiscountWindow, LinePricing};

/// Repository for catalog reads.
pub struct CatalogRepository<'a> {
    pool: &'a PgPool,
}

/// Listing row before price resolution.
#[derive(Debug, sqlx::FromRow)]
struct SummaryRow {
    id: i64,
    name: String,
    price: Decimal,
    percent_discount: Option<Decimal>,
    start_discount: Option<DateTime<Utc>>,
    end_discount: Option<DateTime<Utc>>,
    category: Option<String>,
    image: Option<String>,
}

impl SummaryRow {
    fn into_summary(self, now: DateTime<Utc>) -> ProductSummary {
        let pricing = LinePricing {
            base_price: self.price,
            discount: discount_window(
                self.percent_discount,
                self.start_discount,
                self.end_discount,
            ),
        };
        let quote = pricing::quote(&pricing, 1, now);
        ProductSummary {
            id: ProductId::new(self.id),
            name: self.name,
            price: self.price,
            effective_price: quote.unit_price,
            discount_percent: quote.discount_percent,
            category: self.category,
            image: self.image,
        }
    }
}

/// Pricing row for one cart line.
#[derive(Debug, sqlx::FromRow)]
struct PricingRow {
    size_row: Option<i64>,
    base_price: Option<Decimal>,
    percent_discount: Option<Decimal>,
    start_discount: Option<DateTime<Utc>>,
    end_discount: Option<DateTime<Utc>>,
}

/// Whether a requested size id actually joined to a row of this product.
///
/// The size join is constrained to the product, so a size id that belongs to
/// a different product leaves `resolved` empty and must be rejected rather
/// than silently priced from the fallback columns.
pub(crate) fn size_resolved(requested: Option<SizeId>, resolved: Option<i64>) -> bool {
    requested.is_none() || resolved.is_some()
}

/// Assemble an optional discount window from nullable join columns.
pub(crate) fn discount_window(
    percent: Option<Decimal>,
    starts_at: Option<DateTime<Utc>>,
    ends_at: Option<DateTime<Utc>>,
) -> Option<DiscountWindow> {
    match (percent, starts_at, ends_at) {
        (Some(percent), Some(starts_at), Some(ends_at)) => Some(DiscountWindow {
            percent,
            starts_at,
            ends_at,
        }),
        _ => None,
    }
}

const SUMMARY_SELECT: &str = r"
    SELECT p.id, p.name, p.price,
           d.percent_discount, d.start_discount, d.end_discount,
           c.name AS category,
           (SELECT MIN(pi.image) FROM product_img pi WHERE pi.product_id = p.id) AS image
    FROM products p
    LEFT JOIN category c ON c.id = p.category_id
    LEFT JOIN product_discount pd ON pd.product_id = p.id
    LEFT JOIN discount d ON d.id = pd.discount_id
    WHERE 1 = 1";

impl<'a> CatalogRepository<'a> {
    /// Create a new catalog repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Resolve the pricing inputs for one line: the size-specific price when
    /// `size_id` is given, else the product's minimum size price, else the
    /// product's own price, plus the product's discount window if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product (or requested size
    /// row) does not exist, `DataCorruption` if no price can be resolved.
    pub async fn pricing_for_line(
        &self,
        product_id: ProductId,
        size_id: Option<SizeId>,
    ) -> Result<LinePricing, RepositoryError> {
        let row: Option<PricingRow> = sqlx::query_as(
            r"
            SELECT ps.id AS size_row,
                   COALESCE(
                       ps.price,
                       (SELECT MIN(price) FROM product_size WHERE product_id = p.id),
                       p.price
                   ) AS base_price,
                   d.percent_discount, d.start_discount, d.end_discount
            FROM products p
            LEFT JOIN product_size ps ON ps.id = $2 AND ps.product_id = p.id
            LEFT JOIN product_discount pd ON pd.product_id = p.id
            LEFT JOIN discount d ON d.id = pd.discount_id
            WHERE p.id = $1
            ",
        )
        .bind(product_id)
        .bind(size_id)
        .fetch_optional(self.pool)
        .await?;

        let row = row.ok_or(RepositoryError::NotFound)?;
        if !size_resolved(size_id, row.size_row) {
            return Err(RepositoryError::NotFound);
        }
        let base_price = row.base_price.ok_or_else(|| {
            RepositoryError::DataCorruption(format!("product {product_id} has no price"))
        })?;

        Ok(LinePricing {
            base_price,
            discount: discount_window(
                row.percent_discount,
                row.start_discount,
                row.end_discount,
            ),
        })
    }

    /// List products with the query's filters applied.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if either query fails.
    pub async fn list_products(
        &self,
        query: &ProductListQuery,
        now: DateTime<Utc>,
    ) -> Result<ProductPage, RepositoryError> {
        let mut builder = QueryBuilder::new(SUMMARY_SELECT);
        push_filters(&mut builder, query);

        match query.sort {
            Some(ProductSort::PriceAsc) => builder.push(" ORDER BY p.price ASC"),
            Some(ProductSort::PriceDesc) => builder.push(" ORDER BY p.price DESC"),
            Some(ProductSort::Newest) => builder.push(" ORDER BY p.created_at DESC"),
            None => builder.push(" ORDER BY p.id"),
        };

        let limit = i64::from(query.limit());
        let offset = i64::from(query.page() - 1) * limit;
        builder.push(" LIMIT ");
        builder.push_bind(limit);
        builder.push(" OFFSET ");
        builder.push_bind(offset);

        let rows: Vec<SummaryRow> = builder.build_query_as().fetch_all(self.pool).await?;

        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM products p WHERE 1 = 1");
        push_filters(&mut count, query);
        let (total,): (i64,) = count.build_query_as().fetch_one(self.pool).await?;

        Ok(ProductPage {
            products: rows.into_iter().map(|r| r.into_summary(now)).collect(),
            total,
        })
    }

    /// List a user's favorite products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if either query fails.
    pub async fn list_favorites(
        &self,
        user_id: UserId,
        page: u32,
        limit: u32,
        now: DateTime<Utc>,
    ) -> Result<ProductPage, RepositoryError> {
        let limit = i64::from(limit);
        let offset = i64::from(page - 1) * limit;

        let rows: Vec<SummaryRow> = sqlx::query_as(&format!(
            "{SUMMARY_SELECT}
             AND p.id IN (SELECT product_id FROM favorite WHERE user_id = $1)
             ORDER BY p.id
             LIMIT $2 OFFSET $3"
        ))
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;

        let (total,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM favorite WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(self.pool)
                .await?;

        Ok(ProductPage {
            products: rows.into_iter().map(|r| r.into_summary(now)).collect(),
            total,
        })
    }

    /// Mark a product as a favorite of `user_id`. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails (including a
    /// missing product, surfaced as a foreign-key error).
    pub async fn add_favorite(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO favorite (user_id, product_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(product_id)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Remove a favorite.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if it was not a favorite.
    pub async fn remove_favorite(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM favorite WHERE user_id = $1 AND product_id = $2")
            .bind(user_id)
            .bind(product_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Fetch the full product record.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn product_detail(
        &self,
        product_id: ProductId,
    ) -> Result<ProductDetail, RepositoryError> {
        #[derive(sqlx::FromRow)]
        struct DetailRow {
            id: i64,
            name: String,
            description: Option<String>,
            price: Decimal,
            category: Option<String>,
            created_at: DateTime<Utc>,
        }

        let row: Option<DetailRow> = sqlx::query_as(
            r"
            SELECT p.id, p.name, p.description, p.price, c.name AS category, p.created_at
            FROM products p
            LEFT JOIN category c ON c.id = p.category_id
            WHERE p.id = $1
            ",
        )
        .bind(product_id)
        .fetch_optional(self.pool)
        .await?;
        let row = row.ok_or(RepositoryError::NotFound)?;

        let images: Vec<(String,)> =
            sqlx::query_as("SELECT image FROM product_img WHERE product_id = $1 ORDER BY id")
                .bind(product_id)
                .fetch_all(self.pool)
                .await?;

        #[derive(sqlx::FromRow)]
        struct SizeRow {
            id: i64,
            name: Option<String>,
            price: Decimal,
        }

        let sizes: Vec<SizeRow> = sqlx::query_as(
            r"
            SELECT ps.id, s.name, ps.price
            FROM product_size ps
            LEFT JOIN size s ON s.id = ps.size_id
            WHERE ps.product_id = $1
            ORDER BY ps.price
            ",
        )
        .bind(product_id)
        .fetch_all(self.pool)
        .await?;

        Ok(ProductDetail {
            id: ProductId::new(row.id),
            name: row.name,
            description: row.description,
            price: row.price,
            category: row.category,
            images: images.into_iter().map(|(i,)| i).collect(),
            sizes: sizes
                .into_iter()
                .map(|s| SizePrice {
                    size_id: s.id,
                    name: s.name,
                    price: s.price,
                })
                .collect(),
            created_at: row.created_at,
        })
    }
}

/// Append the listing filters to `builder`. Shared between the page query and
/// its count so the two can never disagree.
fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &ProductListQuery) {
    if let Some(q) = query.q.as_deref().filter(|q| !q.is_empty()) {
        builder.push(" AND p.name ILIKE ");
        builder.push_bind(format!("%{q}%"));
    }
    if let Some(min) = query.min_price {
        builder.push(" AND p.price >= ");
        builder.push_bind(min);
    }
    if let Some(max) = query.max_price {
        builder.push(" AND p.price <= ");
        builder.push_bind(max);
    }
    let categories = query.category_ids();
    if !categories.is_empty() {
        builder.push(" AND p.category_id = ANY(");
        builder.push_bind(
            categories
                .into_iter()
                .map(|id| id.as_i64())
                .collect::<Vec<_>>(),
        );
        builder.push(")");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_discount_window_requires_all_columns() {
        assert!(discount_window(Some(dec!(10)), Some(at(1)), Some(at(2))).is_some());
        assert!(discount_window(Some(dec!(10)), None, Some(at(2))).is_none());
        assert!(discount_window(None, None, None).is_none());
    }

    #[test]
    fn test_summary_row_applies_active_discount() {
        let row = SummaryRow {
            id: 1,
            name: "Tube Amp".into(),
            price: dec!(200.00),
            percent_discount: Some(dec!(25)),
            start_discount: Some(at(100)),
            end_discount: Some(at(300)),
            category: None,
            image: None,
        };
        let summary = row.into_summary(at(200));
        assert_eq!(summary.effective_price, dec!(150.00));
        assert_eq!(summary.discount_percent, dec!(25));
    }

    #[test]
    fn test_summary_row_ignores_expired_discount() {
        let row = SummaryRow {
            id: 1,
            name: "Tube Amp".into(),
            price: dec!(200.00),
            percent_discount: Some(dec!(25)),
            start_discount: Some(at(100)),
            end_discount: Some(at(300)),
            category: None,
            image: None,
        };
        let summary = row.into_summary(at(301));
        assert_eq!(summary.effective_price, dec!(200.00));
        assert_eq!(summary.discount_percent, Decimal::ZERO);
    }

    #[test]
    fn test_size_must_resolve_when_requested() {
        // No size requested: whatever the join produced is fine.
        assert!(size_resolved(None, None));
        assert!(size_resolved(None, Some(7)));
        // Size requested: the product-constrained join must have matched,
        // otherwise the size belongs to another product (or nothing).
        assert!(size_resolved(Some(SizeId::new(7)), Some(7)));
        assert!(!size_resolved(Some(SizeId::new(7)), None));
    }

    #[test]
    fn test_push_filters_binds_rather_than_concatenates() {
        let query: ProductListQuery = serde_json::from_value(serde_json::json!({
            "q": "'; DROP TABLE products; --",
            "min_price": "1",
            "max_price": "10",
            "category": "1,2",
        }))
        .unwrap();
        let mut builder = QueryBuilder::<Postgres>::new("SELECT 1 WHERE 1 = 1");
        push_filters(&mut builder, &query);

        let sql = builder.sql();
        assert!(!sql.contains("DROP TABLE"));
        assert!(sql.contains("$1") && sql.contains("$4"));
    }
}
