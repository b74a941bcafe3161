use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    models::{Order, OrderItem, OrderStatus},
    roles::OrderWriteMask,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub order_items: Vec<OrderItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<OrderWithItems>,
}

/// Writable order fields. `delivery_crew: null` unassigns; an absent key leaves it alone.
/// Fields such as `user` or `total` are not part of the payload and are ignored if sent.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateOrderRequest {
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<Uuid>)]
    pub delivery_crew: Option<Option<Uuid>>,
    pub status: Option<OrderStatus>,
    pub date: Option<NaiveDate>,
}

impl UpdateOrderRequest {
    /// Drop the fields the mask marks read-only.
    pub fn restrict(self, mask: OrderWriteMask) -> Self {
        match mask {
            OrderWriteMask::Full => self,
            OrderWriteMask::StatusOnly => Self {
                status: self.status,
                ..Self::default()
            },
        }
    }

    pub fn is_empty(&self) -> bool {
        self.delivery_crew.is_none() && self.status.is_none() && self.date.is_none()
    }
}

fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_only_mask_drops_other_fields() {
        let patch: UpdateOrderRequest = serde_json::from_value(serde_json::json!({
            "delivery_crew": Uuid::nil(),
            "status": "delivered",
            "date": "2024-05-01",
            "total": 1
        }))
        .unwrap();

        let restricted = patch.restrict(OrderWriteMask::StatusOnly);
        assert_eq!(restricted.status, Some(OrderStatus::Delivered));
        assert!(restricted.delivery_crew.is_none());
        assert!(restricted.date.is_none());
    }

    #[test]
    fn null_delivery_crew_means_unassign() {
        let patch: UpdateOrderRequest =
            serde_json::from_value(serde_json::json!({ "delivery_crew": null })).unwrap();
        assert_eq!(patch.delivery_crew, Some(None));

        let patch: UpdateOrderRequest = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(patch.delivery_crew.is_none());
        assert!(patch.is_empty());
    }

    #[test]
    fn full_mask_keeps_everything() {
        let crew = Uuid::new_v4();
        let patch: UpdateOrderRequest =
            serde_json::from_value(serde_json::json!({ "delivery_crew": crew, "status": "pending" }))
                .unwrap();
        let kept = patch.restrict(OrderWriteMask::Full);
        assert_eq!(kept.delivery_crew, Some(Some(crew)));
        assert_eq!(kept.status, Some(OrderStatus::Pending));
    }
}
