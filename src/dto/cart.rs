use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::CartItem;

/// Any `price` sent by the client is ignored; it is always recomputed.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AddToCartRequest {
    pub menuitem: Uuid,
    pub quantity: i32,
    pub unit_price: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct CartList {
    #[schema(value_type = Vec<CartItem>)]
    pub items: Vec<CartItem>,
}
