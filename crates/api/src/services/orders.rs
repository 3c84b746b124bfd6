//! Order status manager.
//!
//! Two separate administrative operations: a status transition and a
//! shipping reassignment. They are deliberately not one overloaded endpoint;
//! each touches exactly one field.

use sqlx::PgPool;
use thiserror::Error;
use tracing::{info, instrument};

use hifiy_core::{OrderId, OrderStatus, ShippingId};

use crate::db::RepositoryError;
use crate::db::orders::OrderRepository;

/// Failures of the administrative order updates.
#[derive(Debug, Error)]
pub enum OrderUpdateError {
    /// The order does not exist.
    #[error("order not found")]
    NotFound,

    /// The requested status transition is not allowed.
    #[error("cannot transition order from {from} to {to}")]
    InvalidTransition {
        from: OrderStatus,
        to: OrderStatus,
    },

    /// Underlying database failure.
    #[error(transparent)]
    Repository(RepositoryError),
}

impl From<RepositoryError> for OrderUpdateError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound => Self::NotFound,
            other => Self::Repository(other),
        }
    }
}

/// Administrative order updates.
pub struct OrderService<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderService<'a> {
    /// Create a new order service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Move an order to `next`.
    ///
    /// The current status is read under a row lock so concurrent updates
    /// serialize; the transition must be legal per
    /// [`OrderStatus::can_transition_to`]. Note the source system accepted
    /// any status string here; the transition check is a deliberate
    /// tightening.
    ///
    /// # Errors
    ///
    /// `NotFound` for a missing order, `InvalidTransition` for an illegal
    /// move, `Repository` for database failures.
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        order_id: OrderId,
        next: OrderStatus,
    ) -> Result<(), OrderUpdateError> {
        let repo = OrderRepository::new(self.pool);

        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;

        let current = repo.status_for_update(&mut tx, order_id).await?;
        if !current.can_transition_to(next) {
            return Err(OrderUpdateError::InvalidTransition {
                from: current,
                to: next,
            });
        }

        repo.set_status(&mut tx, order_id, next).await?;
        tx.commit().await.map_err(RepositoryError::from)?;

        info!(%order_id, from = %current, to = %next, "order status updated");
        Ok(())
    }

    /// Reassign an order's shipping option.
    ///
    /// # Errors
    ///
    /// `NotFound` for a missing order, `Repository` for database failures.
    #[instrument(skip(self))]
    pub async fn update_shipping(
        &self,
        order_id: OrderId,
        shipping_id: ShippingId,
    ) -> Result<(), OrderUpdateError> {
        OrderRepository::new(self.pool)
            .set_shipping(order_id, shipping_id)
            .await?;

        info!(%order_id, %shipping_id, "order shipping updated");
        Ok(())
    }
}
