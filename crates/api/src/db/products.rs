//! Admin product writes. Plain validate-then-persist; the interesting part
//! is that every successful write must be followed by a product-listing
//! cache invalidation, which the admin routes do.

use sqlx::{PgPool, Postgres, QueryBuilder};

use hifiy_core::ProductId;

use super::RepositoryError;
use crate::models::product::{CreateProductRequest, UpdateProductRequest};

/// Repository for admin product writes.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a product and return its id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, req: &CreateProductRequest) -> Result<ProductId, RepositoryError> {
        let (id,): (i64,) = sqlx::query_as(
            r"
            INSERT INTO products (name, description, price, category_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            ",
        )
        .bind(&req.name)
        .bind(&req.description)
        .bind(req.price)
        .bind(req.category_id)
        .fetch_one(self.pool)
        .await?;

        Ok(ProductId::new(id))
    }

    /// Update the provided fields of a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn update(
        &self,
        product_id: ProductId,
        req: &UpdateProductRequest,
    ) -> Result<(), RepositoryError> {
        let mut builder = QueryBuilder::<Postgres>::new("UPDATE products SET updated_at = NOW()");

        if let Some(name) = &req.name {
            builder.push(", name = ");
            builder.push_bind(name);
        }
        if let Some(description) = &req.description {
            builder.push(", description = ");
            builder.push_bind(description);
        }
        if let Some(price) = req.price {
            builder.push(", price = ");
            builder.push_bind(price);
        }
        if let Some(category_id) = req.category_id {
            builder.push(", category_id = ");
            builder.push_bind(category_id);
        }

        builder.push(" WHERE id = ");
        builder.push_bind(product_id);

        let result = builder.build().execute(self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn delete(&self, product_id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(product_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
