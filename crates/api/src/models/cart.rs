//! Cart models.

use hifiy_core::{CartLineId, ProductId, SizeId, VariantId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Payload of `POST /cart`.
#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: ProductId,
    pub variant_id: Option<VariantId>,
    pub size_id: Option<SizeId>,
    #[serde(default = "default_qty")]
    pub quantity: u32,
}

const fn default_qty() -> u32 {
    1
}

/// One cart line in the `GET /cart` response.
#[derive(Debug, Clone, Serialize)]
pub struct CartLineView {
    pub id: CartLineId,
    pub product_id: ProductId,
    pub name: String,
    pub variant: Option<String>,
    pub size: Option<String>,
    pub quantity: u32,
    pub price: Decimal,
    pub subtotal: Decimal,
    pub image: Option<String>,
}
