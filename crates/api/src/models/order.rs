//! Order models: checkout request/receipt, history, detail, admin updates.

use chrono::{DateTime, Utc};
use hifiy_core::{MethodId, OrderId, OrderStatus, PaymentId, ShippingId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Payload of `POST /orders`.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutRequest {
    pub payment_id: Option<PaymentId>,
    pub shipping_id: Option<ShippingId>,
    pub method_id: Option<MethodId>,
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub customer_phone: String,
    #[serde(default)]
    pub customer_address: String,
}

/// The receipt returned by a successful checkout.
#[derive(Debug, Clone, Serialize)]
pub struct OrderReceipt {
    pub order_id: OrderId,
    pub invoice: String,
    pub total: Decimal,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_address: String,
    pub status: OrderStatus,
}

/// Query parameters of `GET /user/history`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryQuery {
    /// Calendar month (1-12); absent means the month of the latest order.
    pub month: Option<u32>,
    pub shipping_id: Option<ShippingId>,
    page: Option<u32>,
    limit: Option<u32>,
}

impl HistoryQuery {
    #[must_use]
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    #[must_use]
    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(10).clamp(1, 100)
    }
}

/// One order in the history listing.
#[derive(Debug, Clone, Serialize)]
pub struct OrderHistoryEntry {
    pub order_id: OrderId,
    pub invoice: String,
    pub order_date: DateTime<Utc>,
    pub total: Decimal,
    pub status: OrderStatus,
    pub image: Option<String>,
}

/// Full order record for `GET /user/order/{id}`.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetailView {
    pub order_id: OrderId,
    pub invoice: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_address: String,
    pub payment_method: String,
    pub shipping_method: String,
    pub order_date: DateTime<Utc>,
    pub status: OrderStatus,
    pub total: Decimal,
    pub items: Vec<OrderItemView>,
}

/// One frozen line of an order.
#[derive(Debug, Clone, Serialize)]
pub struct OrderItemView {
    pub product_name: String,
    pub variant: Option<String>,
    pub size: Option<String>,
    pub quantity: u32,
    pub base_price: Decimal,
    pub discount_price: Decimal,
    pub discount_percent: Decimal,
    pub subtotal: Decimal,
    pub image: Option<String>,
}

/// One order in the admin listing, `GET /admin/orders`.
#[derive(Debug, Clone, Serialize)]
pub struct AdminOrderEntry {
    pub order_id: OrderId,
    pub invoice: String,
    pub order_date: DateTime<Utc>,
    pub status: OrderStatus,
    pub total: Decimal,
}

/// Payload of `PUT /admin/orders/{id}/status`.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

/// Payload of `PUT /admin/orders/{id}/shipping`.
#[derive(Debug, Deserialize)]
pub struct UpdateShippingRequest {
    pub shipping_id: ShippingId,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_admin_order_entry_serializes_for_listing() {
        let entry = AdminOrderEntry {
            order_id: OrderId::new(9),
            invoice: "INV-1700000000-3".to_owned(),
            order_date: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            status: OrderStatus::OnProgress,
            total: "120.50".parse().unwrap(),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["order_id"], 9);
        assert_eq!(json["status"], "on_progress");
        assert_eq!(json["total"], "120.50");
    }
}
