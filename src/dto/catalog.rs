use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Category, MenuItem};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCategoryRequest {
    pub title: String,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct CategoryList {
    #[schema(value_type = Vec<Category>)]
    pub items: Vec<Category>,
}

/// Full menu item payload, used for creation and PUT.
#[derive(Debug, Deserialize, ToSchema)]
pub struct MenuItemRequest {
    pub title: String,
    pub price: i64,
    #[serde(default)]
    pub featured: bool,
    /// Category title.
    pub category: String,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct PatchMenuItemRequest {
    pub title: Option<String>,
    pub price: Option<i64>,
    pub featured: Option<bool>,
    pub category: Option<String>,
}

impl From<MenuItemRequest> for PatchMenuItemRequest {
    fn from(value: MenuItemRequest) -> Self {
        Self {
            title: Some(value.title),
            price: Some(value.price),
            featured: Some(value.featured),
            category: Some(value.category),
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct MenuItemList {
    #[schema(value_type = Vec<MenuItem>)]
    pub items: Vec<MenuItem>,
}
