use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

pub use crate::entity::orders::OrderStatus;
use crate::entity::users::Model as UserModel;

/// Public view of an account; never carries credentials.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
}

impl From<UserModel> for User {
    fn from(model: UserModel) -> Self {
        Self {
            id: model.id,
            username: model.username,
            email: model.email,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Category {
    pub id: Uuid,
    pub title: String,
}

/// Prices are minor currency units (cents).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MenuItem {
    pub id: Uuid,
    pub title: String,
    pub price: i64,
    pub featured: bool,
    /// Category title.
    pub category: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CartItem {
    pub id: Uuid,
    pub user: Uuid,
    pub menuitem: Uuid,
    pub menuitem_title: Option<String>,
    pub quantity: i32,
    pub unit_price: i64,
    pub price: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub user: Uuid,
    pub delivery_crew: Option<Uuid>,
    pub status: OrderStatus,
    pub date: NaiveDate,
    pub total: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: Uuid,
    pub order: Uuid,
    pub menuitem: Uuid,
    pub quantity: i32,
    pub unit_price: i64,
    pub price: i64,
}

/// `quantity * unit_price`, or `None` when the quantity is not positive or the product overflows.
pub fn line_price(quantity: i32, unit_price: i64) -> Option<i64> {
    if quantity <= 0 || unit_price < 0 {
        return None;
    }
    unit_price.checked_mul(i64::from(quantity))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_price_multiplies_quantity_and_unit_price() {
        assert_eq!(line_price(2, 500), Some(1000));
        assert_eq!(line_price(1, 250), Some(250));
    }

    #[test]
    fn line_price_rejects_non_positive_quantity() {
        assert_eq!(line_price(0, 500), None);
        assert_eq!(line_price(-3, 500), None);
    }

    #[test]
    fn line_price_rejects_overflow() {
        assert_eq!(line_price(i32::MAX, i64::MAX / 2), None);
    }
}
