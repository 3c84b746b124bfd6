//! Cart storage: one active cart per user, upserted lines.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};

use hifiy_core::{CartId, CartLineId, ProductId, SizeId, UserId, VariantId};

use super::RepositoryError;
use super::catalog::discount_window;
use crate::models::cart::CartLineView;
use crate::pricing::LinePricing;

/// A cart line joined with everything needed to price it.
#[derive(Debug, Clone)]
pub struct PricedCartLine {
    pub product_id: ProductId,
    pub variant_id: Option<VariantId>,
    pub size_id: Option<SizeId>,
    pub qty: u32,
    pub pricing: LinePricing,
}

/// Repository for cart operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the user's cart id, creating the cart on first use.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the queries fail.
    async fn cart_id_for(&self, user_id: UserId) -> Result<CartId, RepositoryError> {
        let id: (i64,) = sqlx::query_as(
            r"
            INSERT INTO cart (user_id) VALUES ($1)
            ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id
            RETURNING id
            ",
        )
        .bind(user_id)
        .fetch_one(self.pool)
        .await?;
        Ok(CartId::new(id.0))
    }

    /// Add `qty` of a product to the user's cart.
    ///
    /// At most one line exists per (cart, product, variant, size); a repeated
    /// add increments the existing line's quantity. `unit_price` is the
    /// resolved effective price used for the stored line subtotal.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the upsert fails.
    pub async fn add_line(
        &self,
        user_id: UserId,
        product_id: ProductId,
        variant_id: Option<VariantId>,
        size_id: Option<SizeId>,
        qty: u32,
        unit_price: Decimal,
    ) -> Result<CartId, RepositoryError> {
        let cart_id = self.cart_id_for(user_id).await?;

        sqlx::query(
            r"
            INSERT INTO cart_items (cart_id, product_id, variant_id, size_id, qty, subtotal)
            VALUES ($1, $2, $3, $4, $5, $6 * $5)
            ON CONFLICT (cart_id, product_id, variant_id, size_id)
            DO UPDATE SET qty = cart_items.qty + EXCLUDED.qty,
                          subtotal = (cart_items.qty + EXCLUDED.qty) * $6
            ",
        )
        .bind(cart_id)
        .bind(product_id)
        .bind(variant_id)
        .bind(size_id)
        .bind(i32::try_from(qty).map_err(|_| {
            RepositoryError::DataCorruption("quantity out of range".to_owned())
        })?)
        .bind(unit_price)
        .execute(self.pool)
        .await?;

        Ok(cart_id)
    }

    /// List the user's cart lines for display.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_lines(&self, user_id: UserId) -> Result<Vec<CartLineView>, RepositoryError> {
        #[derive(sqlx::FromRow)]
        struct LineRow {
            id: i64,
            product_id: i64,
            name: String,
            variant: Option<String>,
            size: Option<String>,
            qty: i32,
            price: Option<Decimal>,
            subtotal: Decimal,
            image: Option<String>,
        }

        let rows: Vec<LineRow> = sqlx::query_as(
            r"
            SELECT ci.id, ci.product_id, p.name,
                   v.name AS variant, s.name AS size,
                   ci.qty, COALESCE(ps.price, p.price) AS price, ci.subtotal,
                   (SELECT MIN(pi.image) FROM product_img pi WHERE pi.product_id = p.id) AS image
            FROM cart_items ci
            JOIN cart c ON c.id = ci.cart_id
            JOIN products p ON p.id = ci.product_id
            LEFT JOIN variant v ON v.id = ci.variant_id
            LEFT JOIN product_size ps ON ps.id = ci.size_id AND ps.product_id = ci.product_id
            LEFT JOIN size s ON s.id = ps.size_id
            WHERE c.user_id = $1
            ORDER BY ci.id
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| CartLineView {
                id: CartLineId::new(r.id),
                product_id: ProductId::new(r.product_id),
                name: r.name,
                variant: r.variant,
                size: r.size,
                quantity: u32::try_from(r.qty).unwrap_or(0),
                price: r.price.unwrap_or_default(),
                subtotal: r.subtotal,
                image: r.image,
            })
            .collect())
    }

    /// Remove one line from the user's cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the line does not exist or
    /// belongs to another user's cart.
    pub async fn remove_line(
        &self,
        user_id: UserId,
        line_id: CartLineId,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            DELETE FROM cart_items
            WHERE id = $1
              AND cart_id IN (SELECT id FROM cart WHERE user_id = $2)
            ",
        )
        .bind(line_id)
        .bind(user_id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

/// Load the user's cart lines with their pricing inputs, inside `tx`.
///
/// Used by checkout so that the lines it prices are the lines it later
/// deletes, under the same snapshot and advisory lock.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails, `DataCorruption`
/// if a line has no resolvable price or its size belongs to another product.
pub async fn lines_for_checkout(
    tx: &mut Transaction<'_, Postgres>,
    user_id: UserId,
) -> Result<Vec<PricedCartLine>, RepositoryError> {
    #[derive(sqlx::FromRow)]
    struct PricedRow {
        product_id: i64,
        variant_id: Option<i64>,
        size_id: Option<i64>,
        qty: i32,
        size_row: Option<i64>,
        base_price: Option<Decimal>,
        percent_discount: Option<Decimal>,
        start_discount: Option<DateTime<Utc>>,
        end_discount: Option<DateTime<Utc>>,
    }

    let rows: Vec<PricedRow> = sqlx::query_as(
        r"
        SELECT ci.product_id, ci.variant_id, ci.size_id, ci.qty,
               ps.id AS size_row,
               COALESCE(
                   ps.price,
                   (SELECT MIN(price) FROM product_size WHERE product_id = p.id),
                   p.price
               ) AS base_price,
               d.percent_discount, d.start_discount, d.end_discount
        FROM cart_items ci
        JOIN cart c ON c.id = ci.cart_id
        JOIN products p ON p.id = ci.product_id
        LEFT JOIN product_size ps ON ps.id = ci.size_id AND ps.product_id = ci.product_id
        LEFT JOIN product_discount pd ON pd.product_id = ci.product_id
        LEFT JOIN discount d ON d.id = pd.discount_id
        WHERE c.user_id = $1
        ORDER BY ci.id
        ",
    )
    .bind(user_id)
    .fetch_all(&mut **tx)
    .await?;

    rows.into_iter()
        .map(|r| {
            let size_id = r.size_id.map(SizeId::new);
            if !super::catalog::size_resolved(size_id, r.size_row) {
                return Err(RepositoryError::DataCorruption(format!(
                    "cart line for product {} references a size of another product",
                    r.product_id
                )));
            }
            let base_price = r.base_price.ok_or_else(|| {
                RepositoryError::DataCorruption(format!(
                    "cart line for product {} has no price",
                    r.product_id
                ))
            })?;
            Ok(PricedCartLine {
                product_id: ProductId::new(r.product_id),
                variant_id: r.variant_id.map(VariantId::new),
                size_id,
                qty: u32::try_from(r.qty).map_err(|_| {
                    RepositoryError::DataCorruption("negative cart quantity".to_owned())
                })?,
                pricing: LinePricing {
                    base_price,
                    discount: discount_window(
                        r.percent_discount,
                        r.start_discount,
                        r.end_discount,
                    ),
                },
            })
        })
        .collect()
}

/// Delete every line of the user's cart, inside `tx`.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the delete fails.
pub async fn clear_cart(
    tx: &mut Transaction<'_, Postgres>,
    user_id: UserId,
) -> Result<(), RepositoryError> {
    sqlx::query(
        "DELETE FROM cart_items WHERE cart_id IN (SELECT id FROM cart WHERE user_id = $1)",
    )
    .bind(user_id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}
