use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::cart::{AddToCartRequest, CartList},
    entity::{
        cart_items::{
            ActiveModel as CartActive, Column as CartCol, Entity as CartItems, Model as CartModel,
        },
        menu_items::{Entity as MenuItems, Model as MenuItemModel},
    },
    error::{AppError, AppResult},
    middleware::auth::Principal,
    models::{CartItem, line_price},
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    state::AppState,
};

pub async fn list_cart(
    state: &AppState,
    principal: &Principal,
    pagination: Pagination,
) -> AppResult<ApiResponse<CartList>> {
    let (page, limit, offset) = pagination.normalize();
    let finder = CartItems::find().filter(CartCol::UserId.eq(principal.id));

    let total = finder.clone().count(state.db()).await? as i64;

    let items = finder
        .find_also_related(MenuItems)
        .order_by_desc(CartCol::CreatedAt)
        .limit(limit as u64)
        .offset(offset as u64)
        .all(state.db())
        .await?
        .into_iter()
        .map(|(line, item)| cart_item_from_entity(line, item))
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("OK", CartList { items }, Some(meta)))
}

/// Insert or replace the caller's line for a menu item. The unit price is the menu
/// item's current price and the line price is always recomputed here.
pub async fn add_to_cart(
    state: &AppState,
    principal: &Principal,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartItem>> {
    if payload.quantity <= 0 {
        return Err(AppError::validation(
            "quantity",
            "quantity must be greater than 0",
        ));
    }

    let item = MenuItems::find_by_id(payload.menuitem)
        .one(state.db())
        .await?;
    let item = match item {
        Some(i) => i,
        None => {
            return Err(AppError::validation(
                "menuitem",
                format!("Invalid pk \"{}\" - object does not exist.", payload.menuitem),
            ));
        }
    };

    if let Some(unit_price) = payload.unit_price {
        if unit_price != item.price {
            return Err(AppError::validation(
                "unit_price",
                "unit_price does not match the menu item price",
            ));
        }
    }

    let price = line_price(payload.quantity, item.price)
        .ok_or_else(|| AppError::validation("quantity", "quantity is too large"))?;

    let line = CartItems::insert(CartActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(principal.id),
        menuitem_id: Set(item.id),
        quantity: Set(payload.quantity),
        unit_price: Set(item.price),
        price: Set(price),
        created_at: NotSet,
    })
    .on_conflict(
        OnConflict::columns([CartCol::UserId, CartCol::MenuitemId])
            .update_columns([CartCol::Quantity, CartCol::UnitPrice, CartCol::Price])
            .to_owned(),
    )
    .exec_with_returning(state.db())
    .await?;

    audit::record(
        state,
        principal.id,
        "cart_update",
        "cart_items",
        serde_json::json!({ "menuitem_id": item.id, "quantity": payload.quantity }),
    )
    .await;

    Ok(ApiResponse::success(
        "Added to cart",
        cart_item_from_entity(line, Some(item)),
        None,
    ))
}

/// Remove every line the caller owns. Clearing an empty cart succeeds.
pub async fn clear_cart(state: &AppState, principal: &Principal) -> AppResult<u64> {
    let result = CartItems::delete_many()
        .filter(CartCol::UserId.eq(principal.id))
        .exec(state.db())
        .await?;

    if result.rows_affected > 0 {
        audit::record(
            state,
            principal.id,
            "cart_clear",
            "cart_items",
            serde_json::json!({ "removed": result.rows_affected }),
        )
        .await;
    }

    Ok(result.rows_affected)
}

fn cart_item_from_entity(model: CartModel, item: Option<MenuItemModel>) -> CartItem {
    CartItem {
        id: model.id,
        user: model.user_id,
        menuitem: model.menuitem_id,
        menuitem_title: item.map(|i| i.title),
        quantity: model.quantity,
        unit_price: model.unit_price,
        price: model.price,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
