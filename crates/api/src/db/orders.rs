//! Order persistence: header/item inserts, history, detail, admin updates.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};

use hifiy_core::{
    MethodId, OrderId, OrderStatus, PaymentId, ProductId, ShippingId, SizeId, UserId, VariantId,
};

use super::RepositoryError;
use crate::models::order::{
    AdminOrderEntry, HistoryQuery, OrderDetailView, OrderHistoryEntry, OrderItemView,
};

/// A new order header, ready to insert.
#[derive(Debug)]
pub struct NewOrder<'a> {
    pub user_id: UserId,
    pub payment_id: PaymentId,
    pub shipping_id: ShippingId,
    pub method_id: MethodId,
    pub invoice: &'a str,
    pub customer_name: &'a str,
    pub customer_phone: &'a str,
    pub customer_address: &'a str,
    pub status: OrderStatus,
    pub total: Decimal,
    pub order_date: DateTime<Utc>,
}

/// A frozen order line, ready to insert.
#[derive(Debug)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub variant_id: Option<VariantId>,
    pub size_id: Option<SizeId>,
    pub qty: u32,
    pub base_price: Decimal,
    pub discount_price: Decimal,
    pub discount_percent: Decimal,
    pub subtotal: Decimal,
}

fn parse_status(raw: &str) -> Result<OrderStatus, RepositoryError> {
    raw.parse()
        .map_err(|_| RepositoryError::DataCorruption(format!("unknown order status: {raw}")))
}

/// Insert the order header and return its id, inside `tx`.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` on a duplicate invoice,
/// `RepositoryError::Database` otherwise.
pub async fn insert_order(
    tx: &mut Transaction<'_, Postgres>,
    order: &NewOrder<'_>,
) -> Result<OrderId, RepositoryError> {
    let (id,): (i64,) = sqlx::query_as(
        r"
        INSERT INTO orders (
            users_id, payment_id, shipping_id, method_id,
            invoice, customer_name, customer_phone, customer_address,
            status, total, order_date
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING id
        ",
    )
    .bind(order.user_id)
    .bind(order.payment_id)
    .bind(order.shipping_id)
    .bind(order.method_id)
    .bind(order.invoice)
    .bind(order.customer_name)
    .bind(order.customer_phone)
    .bind(order.customer_address)
    .bind(order.status.as_str())
    .bind(order.total)
    .bind(order.order_date)
    .fetch_one(&mut **tx)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_unique_violation()
        {
            return RepositoryError::Conflict("duplicate invoice".to_owned());
        }
        RepositoryError::Database(e)
    })?;

    Ok(OrderId::new(id))
}

/// Insert one frozen order item, inside `tx`.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the insert fails.
pub async fn insert_order_item(
    tx: &mut Transaction<'_, Postgres>,
    order_id: OrderId,
    item: &NewOrderItem,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        INSERT INTO order_items (
            order_id, product_id, variant_id, size_id, qty,
            base_price, discount_price, discount_percent, subtotal
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        ",
    )
    .bind(order_id)
    .bind(item.product_id)
    .bind(item.variant_id)
    .bind(item.size_id)
    .bind(i32::try_from(item.qty).map_err(|_| {
        RepositoryError::DataCorruption("quantity out of range".to_owned())
    })?)
    .bind(item.base_price)
    .bind(item.discount_price)
    .bind(item.discount_percent)
    .bind(item.subtotal)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// Repository for order reads and admin updates.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Paginated order history for a user.
    ///
    /// Without a month filter the latest month that has orders is shown,
    /// matching the storefront's default view.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if either query fails.
    pub async fn history(
        &self,
        user_id: UserId,
        query: &HistoryQuery,
    ) -> Result<(Vec<OrderHistoryEntry>, i64), RepositoryError> {
        #[derive(sqlx::FromRow)]
        struct HistoryRow {
            order_id: i64,
            invoice: String,
            order_date: DateTime<Utc>,
            total: Decimal,
            status: String,
            image: Option<String>,
        }

        let mut builder = QueryBuilder::new(
            r"
            SELECT o.id AS order_id, o.invoice, o.order_date,
                   COALESCE(o.total, 0) AS total, o.status,
                   (SELECT MIN(pi.image)
                    FROM order_items oi
                    JOIN product_img pi ON pi.product_id = oi.product_id
                    WHERE oi.order_id = o.id) AS image
            FROM orders o
            WHERE o.users_id = ",
        );
        builder.push_bind(user_id);
        push_history_filters(&mut builder, user_id, query);
        builder.push(" ORDER BY o.order_date DESC LIMIT ");
        builder.push_bind(i64::from(query.limit()));
        builder.push(" OFFSET ");
        builder.push_bind(i64::from(query.page() - 1) * i64::from(query.limit()));

        let rows: Vec<HistoryRow> = builder.build_query_as().fetch_all(self.pool).await?;

        let mut count =
            QueryBuilder::new("SELECT COUNT(*) FROM orders o WHERE o.users_id = ");
        count.push_bind(user_id);
        push_history_filters(&mut count, user_id, query);
        let (total,): (i64,) = count.build_query_as().fetch_one(self.pool).await?;

        let entries = rows
            .into_iter()
            .map(|r| {
                Ok(OrderHistoryEntry {
                    order_id: OrderId::new(r.order_id),
                    invoice: r.invoice,
                    order_date: r.order_date,
                    total: r.total,
                    status: parse_status(&r.status)?,
                    image: r.image,
                })
            })
            .collect::<Result<_, RepositoryError>>()?;

        Ok((entries, total))
    }

    /// Paginated listing of every order, newest first, for the admin view.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if either query fails.
    pub async fn list_all(
        &self,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<AdminOrderEntry>, i64), RepositoryError> {
        #[derive(sqlx::FromRow)]
        struct AdminRow {
            id: i64,
            invoice: String,
            order_date: DateTime<Utc>,
            status: String,
            total: Decimal,
        }

        let limit = i64::from(limit);
        let offset = i64::from(page - 1) * limit;

        let rows: Vec<AdminRow> = sqlx::query_as(
            r"
            SELECT o.id, o.invoice, o.order_date, o.status,
                   COALESCE(o.total, 0) AS total
            FROM orders o
            ORDER BY o.order_date DESC
            LIMIT $1 OFFSET $2
            ",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;

        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders")
            .fetch_one(self.pool)
            .await?;

        let entries = rows
            .into_iter()
            .map(|r| {
                Ok(AdminOrderEntry {
                    order_id: OrderId::new(r.id),
                    invoice: r.invoice,
                    order_date: r.order_date,
                    status: parse_status(&r.status)?,
                    total: r.total,
                })
            })
            .collect::<Result<_, RepositoryError>>()?;

        Ok((entries, total))
    }

    /// Full order detail with its frozen items.
    ///
    /// When `owner` is given, the order must belong to that user; an order
    /// owned by someone else reads as absent rather than forbidden.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    pub async fn detail(
        &self,
        order_id: OrderId,
        owner: Option<UserId>,
    ) -> Result<OrderDetailView, RepositoryError> {
        #[derive(sqlx::FromRow)]
        struct HeaderRow {
            id: i64,
            invoice: String,
            customer_name: String,
            customer_phone: String,
            customer_address: String,
            payment_method: String,
            shipping_method: String,
            order_date: DateTime<Utc>,
            status: String,
            total: Decimal,
        }

        let header: Option<HeaderRow> = sqlx::query_as(
            r"
            SELECT o.id, o.invoice, o.customer_name, o.customer_phone, o.customer_address,
                   p.name AS payment_method, m.name AS shipping_method,
                   o.order_date, o.status, o.total
            FROM orders o
            JOIN payment p ON p.id = o.payment_id
            JOIN method m ON m.id = o.method_id
            WHERE o.id = $1
              AND ($2::BIGINT IS NULL OR o.users_id = $2)
            ",
        )
        .bind(order_id)
        .bind(owner)
        .fetch_optional(self.pool)
        .await?;
        let header = header.ok_or(RepositoryError::NotFound)?;

        #[derive(sqlx::FromRow)]
        struct ItemRow {
            product_name: String,
            variant: Option<String>,
            size: Option<String>,
            qty: i32,
            base_price: Decimal,
            discount_price: Decimal,
            discount_percent: Decimal,
            subtotal: Decimal,
            image: Option<String>,
        }

        let items: Vec<ItemRow> = sqlx::query_as(
            r"
            SELECT pr.name AS product_name,
                   v.name AS variant, s.name AS size,
                   oi.qty, oi.base_price, oi.discount_price, oi.discount_percent, oi.subtotal,
                   (SELECT MIN(pi.image) FROM product_img pi WHERE pi.product_id = pr.id) AS image
            FROM order_items oi
            JOIN products pr ON pr.id = oi.product_id
            LEFT JOIN variant v ON v.id = oi.variant_id
            LEFT JOIN product_size ps ON ps.id = oi.size_id
            LEFT JOIN size s ON s.id = ps.size_id
            WHERE oi.order_id = $1
            ORDER BY oi.id
            ",
        )
        .bind(order_id)
        .fetch_all(self.pool)
        .await?;

        Ok(OrderDetailView {
            order_id: OrderId::new(header.id),
            invoice: header.invoice,
            customer_name: header.customer_name,
            customer_phone: header.customer_phone,
            customer_address: header.customer_address,
            payment_method: header.payment_method,
            shipping_method: header.shipping_method,
            order_date: header.order_date,
            status: parse_status(&header.status)?,
            total: header.total,
            items: items
                .into_iter()
                .map(|i| OrderItemView {
                    product_name: i.product_name,
                    variant: i.variant,
                    size: i.size,
                    quantity: u32::try_from(i.qty).unwrap_or(0),
                    base_price: i.base_price,
                    discount_price: i.discount_price,
                    discount_percent: i.discount_percent,
                    subtotal: i.subtotal,
                    image: i.image,
                })
                .collect(),
        })
    }

    /// Current status of an order, locking the row for update inside `tx`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    pub async fn status_for_update(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order_id: OrderId,
    ) -> Result<OrderStatus, RepositoryError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT status FROM orders WHERE id = $1 FOR UPDATE")
                .bind(order_id)
                .fetch_optional(&mut **tx)
                .await?;
        let (raw,) = row.ok_or(RepositoryError::NotFound)?;
        parse_status(&raw)
    }

    /// Set an order's status, inside `tx`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn set_status(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order_id: OrderId,
        status: OrderStatus,
    ) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE orders SET status = $1 WHERE id = $2")
            .bind(status.as_str())
            .bind(order_id)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    /// Point an order at a different shipping option.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    pub async fn set_shipping(
        &self,
        order_id: OrderId,
        shipping_id: ShippingId,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE orders SET shipping_id = $1 WHERE id = $2")
            .bind(shipping_id)
            .bind(order_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

}

/// Append the month/shipping filters to a history query.
fn push_history_filters(
    builder: &mut QueryBuilder<'_, Postgres>,
    user_id: UserId,
    query: &HistoryQuery,
) {
    if let Some(month) = query.month.filter(|m| (1..=12).contains(m)) {
        builder.push(" AND EXTRACT(MONTH FROM o.order_date) = ");
        builder.push_bind(i32::try_from(month).unwrap_or(1));
    } else {
        builder.push(
            " AND EXTRACT(MONTH FROM o.order_date) = \
             (SELECT EXTRACT(MONTH FROM MAX(order_date)) FROM orders WHERE users_id = ",
        );
        builder.push_bind(user_id);
        builder.push(")");
    }
    if let Some(shipping_id) = query.shipping_id {
        builder.push(" AND o.shipping_id = ");
        builder.push_bind(shipping_id);
    }
}
