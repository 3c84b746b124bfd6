//! Checkout coordinator: converts a user's cart into an immutable order.
//!
//! The whole conversion happens in one transaction, serialized per user by a
//! Postgres advisory lock so two concurrent checkouts cannot both drain the
//! same cart. Every line is quoted against a single instant captured when the
//! transaction starts, so a discount ending mid-checkout cannot price half an
//! order differently from the other half.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use thiserror::Error;
use tracing::{info, instrument, warn};

use hifiy_core::{MethodId, OrderStatus, PaymentId, ShippingId, UserId};

use crate::cache::{ResponseCache, keys};
use crate::db::RepositoryError;
use crate::db::cart::{self, PricedCartLine};
use crate::db::orders::{self, NewOrder, NewOrderItem};
use crate::db::users::UserRepository;
use crate::models::order::{CheckoutRequest, OrderReceipt};
use crate::models::user::Profile;
use crate::pricing;

/// Checkout failures.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Required payment/shipping/method references are missing.
    #[error("payment_id, shipping_id, and method_id are required")]
    MissingReference,

    /// The user's cart has no lines.
    #[error("cannot create order: cart is empty")]
    EmptyCart,

    /// Neither the request nor the stored profile provides an address.
    #[error("profile is missing a delivery address")]
    IncompleteProfile,

    /// A database step failed; the transaction was rolled back.
    #[error("failed to {step}")]
    Repository {
        step: &'static str,
        #[source]
        source: RepositoryError,
    },
}

/// Tag a repository error with the step that produced it.
fn step(step: &'static str) -> impl FnOnce(RepositoryError) -> CheckoutError {
    move |source| CheckoutError::Repository { step, source }
}

/// The customer fields frozen onto the order header.
#[derive(Debug, Clone, PartialEq, Eq)]
struct CustomerInfo {
    name: String,
    phone: String,
    address: String,
}

/// The fully priced order, ready to persist.
#[derive(Debug)]
struct OrderPlan {
    total: Decimal,
    items: Vec<NewOrderItem>,
}

/// Merge request fields with the stored profile; blank request fields fall
/// back to the profile. Fails when no address is available from either side.
fn resolve_customer(
    req: &CheckoutRequest,
    profile: Option<&Profile>,
) -> Result<CustomerInfo, CheckoutError> {
    let fallback = |field: &str, stored: Option<&str>| {
        if field.trim().is_empty() {
            stored.unwrap_or_default().to_owned()
        } else {
            field.to_owned()
        }
    };

    let name = fallback(&req.customer_name, profile.and_then(|p| p.name.as_deref()));
    let phone = fallback(&req.customer_phone, profile.and_then(|p| p.phone.as_deref()));
    let address = fallback(
        &req.customer_address,
        profile.and_then(|p| p.address.as_deref()),
    );

    if address.trim().is_empty() {
        return Err(CheckoutError::IncompleteProfile);
    }

    Ok(CustomerInfo {
        name,
        phone,
        address,
    })
}

/// Quote every cart line at `now` and sum the subtotals.
fn plan_order(lines: &[PricedCartLine], now: DateTime<Utc>) -> Result<OrderPlan, CheckoutError> {
    if lines.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    let mut total = Decimal::ZERO;
    let items = lines
        .iter()
        .map(|line| {
            let quote = pricing::quote(&line.pricing, line.qty, now);
            total += quote.subtotal;
            NewOrderItem {
                product_id: line.product_id,
                variant_id: line.variant_id,
                size_id: line.size_id,
                qty: line.qty,
                base_price: quote.base_price,
                discount_price: quote.unit_price,
                discount_percent: quote.discount_percent,
                subtotal: quote.subtotal,
            }
        })
        .collect();

    Ok(OrderPlan { total, items })
}

/// Human-readable order reference: unix timestamp plus user id.
fn invoice_code(now: DateTime<Utc>, user_id: UserId) -> String {
    format!("INV-{}-{}", now.timestamp(), user_id)
}

/// Serialize checkouts per user for the duration of `tx`.
///
/// Released automatically at commit or rollback.
async fn lock_user_cart(
    tx: &mut Transaction<'_, Postgres>,
    user_id: UserId,
) -> Result<(), RepositoryError> {
    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(user_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

/// Coordinates the cart-to-order conversion.
pub struct CheckoutService<'a> {
    pool: &'a PgPool,
    cache: &'a ResponseCache,
}

impl<'a> CheckoutService<'a> {
    /// Create a new checkout service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, cache: &'a ResponseCache) -> Self {
        Self { pool, cache }
    }

    /// Convert the user's cart into an order.
    ///
    /// All-or-nothing: any failure after the transaction opens rolls back the
    /// order header, its items, and the cart delete together. On success the
    /// cart is empty and the receipt carries the frozen total.
    ///
    /// # Errors
    ///
    /// See [`CheckoutError`]. Repository failures name the step that broke.
    #[instrument(skip(self, req), fields(user_id = %user_id))]
    pub async fn checkout(
        &self,
        user_id: UserId,
        req: &CheckoutRequest,
    ) -> Result<OrderReceipt, CheckoutError> {
        let (payment_id, shipping_id, method_id) = required_refs(req)?;

        let customer = self.resolve_customer_fields(user_id, req).await?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| step("start transaction")(e.into()))?;

        lock_user_cart(&mut tx, user_id)
            .await
            .map_err(step("acquire checkout lock"))?;

        let lines = cart::lines_for_checkout(&mut tx, user_id)
            .await
            .map_err(step("load cart"))?;

        // One pricing instant for the whole order.
        let now = Utc::now();
        let plan = plan_order(&lines, now)?;
        let invoice = invoice_code(now, user_id);

        let order = NewOrder {
            user_id,
            payment_id,
            shipping_id,
            method_id,
            invoice: &invoice,
            customer_name: &customer.name,
            customer_phone: &customer.phone,
            customer_address: &customer.address,
            status: OrderStatus::OnProgress,
            total: plan.total,
            order_date: now,
        };

        let order_id = orders::insert_order(&mut tx, &order)
            .await
            .map_err(step("insert order"))?;

        for item in &plan.items {
            orders::insert_order_item(&mut tx, order_id, item)
                .await
                .map_err(step("insert order item"))?;
        }

        cart::clear_cart(&mut tx, user_id)
            .await
            .map_err(step("clear cart"))?;

        tx.commit()
            .await
            .map_err(|e| step("commit transaction")(e.into()))?;

        info!(order_id = %order_id, invoice = %invoice, total = %plan.total, "order created");

        // Post-commit, best-effort: a failure here only delays freshness
        // until the entry TTL.
        self.cache.invalidate_prefix(keys::ADMIN_USERS);

        Ok(OrderReceipt {
            order_id,
            invoice,
            total: plan.total,
            customer_name: customer.name,
            customer_phone: customer.phone,
            customer_address: customer.address,
            status: OrderStatus::OnProgress,
        })
    }

    /// Fill blank customer fields from the stored profile, only touching the
    /// database when something is actually missing.
    async fn resolve_customer_fields(
        &self,
        user_id: UserId,
        req: &CheckoutRequest,
    ) -> Result<CustomerInfo, CheckoutError> {
        let any_blank = req.customer_name.trim().is_empty()
            || req.customer_phone.trim().is_empty()
            || req.customer_address.trim().is_empty();

        if !any_blank {
            return resolve_customer(req, None);
        }

        let profile = match UserRepository::new(self.pool).get_profile(user_id).await {
            Ok(profile) => profile,
            Err(RepositoryError::NotFound) => {
                warn!(%user_id, "checkout for user without a profile row");
                return Err(CheckoutError::IncompleteProfile);
            }
            Err(e) => return Err(step("load profile")(e)),
        };

        resolve_customer(req, Some(&profile))
    }
}

fn required_refs(
    req: &CheckoutRequest,
) -> Result<(PaymentId, ShippingId, MethodId), CheckoutError> {
    match (req.payment_id, req.shipping_id, req.method_id) {
        (Some(p), Some(s), Some(m)) => Ok((p, s, m)),
        _ => Err(CheckoutError::MissingReference),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use hifiy_core::ProductId;
    use rust_decimal_macros::dec;

    use crate::pricing::{DiscountWindow, LinePricing};

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn request(name: &str, phone: &str, address: &str) -> CheckoutRequest {
        CheckoutRequest {
            payment_id: Some(PaymentId::new(1)),
            shipping_id: Some(ShippingId::new(1)),
            method_id: Some(MethodId::new(1)),
            customer_name: name.to_owned(),
            customer_phone: phone.to_owned(),
            customer_address: address.to_owned(),
        }
    }

    fn line(product: i64, base: Decimal, qty: u32, discount: Option<Decimal>) -> PricedCartLine {
        PricedCartLine {
            product_id: ProductId::new(product),
            variant_id: None,
            size_id: None,
            qty,
            pricing: LinePricing {
                base_price: base,
                discount: discount.map(|percent| DiscountWindow {
                    percent,
                    starts_at: at(0),
                    ends_at: at(10_000),
                }),
            },
        }
    }

    #[test]
    fn test_plan_rejects_empty_cart() {
        assert!(matches!(
            plan_order(&[], at(100)),
            Err(CheckoutError::EmptyCart)
        ));
    }

    #[test]
    fn test_plan_totals_discounted_and_plain_lines() {
        // Product A: $100 base, qty 2, 10% discount active -> subtotal $180.
        // Product B: $50 base, qty 1, no discount -> subtotal $50.
        let lines = vec![
            line(1, dec!(100.00), 2, Some(dec!(10))),
            line(2, dec!(50.00), 1, None),
        ];

        let plan = plan_order(&lines, at(5_000)).unwrap();
        assert_eq!(plan.total, dec!(230.00));
        assert_eq!(plan.items.len(), 2);

        assert_eq!(plan.items[0].discount_percent, dec!(10));
        assert_eq!(plan.items[0].discount_price, dec!(90.00));
        assert_eq!(plan.items[0].subtotal, dec!(180.00));

        assert_eq!(plan.items[1].discount_percent, Decimal::ZERO);
        assert_eq!(plan.items[1].subtotal, dec!(50.00));
    }

    #[test]
    fn test_plan_total_equals_sum_of_subtotals() {
        let lines = vec![
            line(1, dec!(19.99), 3, Some(dec!(5))),
            line(2, dec!(7.50), 2, None),
            line(3, dec!(120.00), 1, Some(dec!(50))),
        ];
        let plan = plan_order(&lines, at(5_000)).unwrap();
        let sum: Decimal = plan.items.iter().map(|i| i.subtotal).sum();
        assert_eq!(plan.total, sum);
    }

    #[test]
    fn test_plan_applies_discount_at_window_end_instant() {
        let mut l = line(1, dec!(100.00), 1, Some(dec!(10)));
        l.pricing.discount.as_mut().unwrap().ends_at = at(5_000);

        let plan = plan_order(std::slice::from_ref(&l), at(5_000)).unwrap();
        assert_eq!(plan.items[0].discount_price, dec!(90.00));

        let plan = plan_order(std::slice::from_ref(&l), at(5_001)).unwrap();
        assert_eq!(plan.items[0].discount_price, dec!(100.00));
    }

    #[test]
    fn test_resolve_customer_prefers_request_fields() {
        let profile = Profile {
            id: UserId::new(1),
            name: Some("Stored Name".into()),
            phone: Some("0800".into()),
            address: Some("Stored Street 1".into()),
        };
        let req = request("Req Name", "", "");

        let customer = resolve_customer(&req, Some(&profile)).unwrap();
        assert_eq!(customer.name, "Req Name");
        assert_eq!(customer.phone, "0800");
        assert_eq!(customer.address, "Stored Street 1");
    }

    #[test]
    fn test_resolve_customer_without_any_address_fails() {
        let profile = Profile {
            id: UserId::new(1),
            name: Some("Name".into()),
            phone: None,
            address: None,
        };
        assert!(matches!(
            resolve_customer(&request("N", "P", ""), Some(&profile)),
            Err(CheckoutError::IncompleteProfile)
        ));
        assert!(matches!(
            resolve_customer(&request("N", "P", "  "), None),
            Err(CheckoutError::IncompleteProfile)
        ));
    }

    #[test]
    fn test_required_refs() {
        assert!(required_refs(&request("n", "p", "a")).is_ok());

        let mut missing = request("n", "p", "a");
        missing.method_id = None;
        assert!(matches!(
            required_refs(&missing),
            Err(CheckoutError::MissingReference)
        ));
    }

    #[test]
    fn test_invoice_code_embeds_timestamp_and_user() {
        let code = invoice_code(at(1_700_000_000), UserId::new(42));
        assert_eq!(code, "INV-1700000000-42");
    }
}
