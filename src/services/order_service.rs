use std::collections::HashMap;

use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseTransaction, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::orders::{OrderList, OrderWithItems, UpdateOrderRequest},
    entity::{
        cart_items::{Column as CartCol, Entity as CartItems},
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
            Model as OrderItemModel,
        },
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        users::Entity as Users,
    },
    error::{AppError, AppResult},
    middleware::auth::Principal,
    models::{Order, OrderItem, OrderStatus},
    response::{ApiResponse, Meta},
    roles::{Action, OrderScope, OrderWriteMask, authorize},
    routes::params::{OrderListQuery, SortOrder},
    state::AppState,
};

pub const EMPTY_CART_MESSAGE: &str = "There are currently no items in your cart";

/// Result of turning a cart into an order.
#[derive(Debug)]
pub enum PlaceOrderOutcome {
    Placed(OrderWithItems),
    /// Nothing was in the cart; nothing was written.
    EmptyCart,
}

fn scope_condition(principal: &Principal, scope: OrderScope) -> Condition {
    match scope {
        OrderScope::Own => Condition::all().add(OrderCol::UserId.eq(principal.id)),
        OrderScope::Assigned => Condition::all().add(OrderCol::DeliveryCrewId.eq(principal.id)),
        OrderScope::All => Condition::all(),
    }
}

pub async fn list_orders(
    state: &AppState,
    principal: &Principal,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = scope_condition(principal, OrderScope::for_listing(principal));
    if let Some(status) = query.status {
        condition = condition.add(OrderCol::Status.eq(status));
    }

    let mut finder = Orders::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(state.db()).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(state.db())
        .await?;

    let items = with_items(state.db(), orders).await?;

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Ok", OrderList { items }, Some(meta)))
}

/// Drain the caller's cart into a new order inside one transaction. Any failure
/// rolls the whole drain back, leaving the cart as it was.
pub async fn create_order(
    state: &AppState,
    principal: &Principal,
) -> AppResult<PlaceOrderOutcome> {
    let txn = state.db().begin().await?;

    let placed = match drain_cart(&txn, principal).await {
        Ok(Some(placed)) => placed,
        Ok(None) => {
            txn.rollback().await?;
            return Ok(PlaceOrderOutcome::EmptyCart);
        }
        Err(err) => {
            txn.rollback().await?;
            return Err(err);
        }
    };

    txn.commit().await?;

    let total = placed.order.total;
    tracing::info!(
        order_id = %placed.order.id,
        user_id = %principal.id,
        items = placed.order_items.len(),
        total,
        "order placed"
    );
    audit::record(
        state,
        principal.id,
        "order_create",
        "orders",
        serde_json::json!({ "order_id": placed.order.id, "total": total }),
    )
    .await;

    Ok(PlaceOrderOutcome::Placed(placed))
}

async fn drain_cart(
    txn: &DatabaseTransaction,
    principal: &Principal,
) -> AppResult<Option<OrderWithItems>> {
    let lines = CartItems::find()
        .filter(CartCol::UserId.eq(principal.id))
        .order_by_asc(CartCol::CreatedAt)
        .lock(LockType::Update)
        .all(txn)
        .await?;

    if lines.is_empty() {
        return Ok(None);
    }

    let now = Utc::now();
    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(principal.id),
        delivery_crew_id: Set(None),
        status: Set(OrderStatus::Pending),
        date: Set(now.date_naive()),
        total: Set(0),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(txn)
    .await?;

    let mut total: i64 = 0;
    let mut order_items = Vec::with_capacity(lines.len());
    for line in &lines {
        let item = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            menuitem_id: Set(line.menuitem_id),
            quantity: Set(line.quantity),
            unit_price: Set(line.unit_price),
            price: Set(line.price),
            created_at: NotSet,
        }
        .insert(txn)
        .await?;

        total = total
            .checked_add(item.price)
            .ok_or_else(|| AppError::BadRequest("order total is too large".into()))?;
        order_items.push(order_item_from_entity(item));
    }

    // Only the lines that became order items; anything added meanwhile stays.
    let drained: Vec<Uuid> = lines.iter().map(|line| line.id).collect();
    CartItems::delete_many()
        .filter(CartCol::Id.is_in(drained))
        .exec(txn)
        .await?;

    let mut active: OrderActive = order.into();
    active.total = Set(total);
    active.updated_at = Set(now.into());
    let order = active.update(txn).await?;

    Ok(Some(OrderWithItems {
        order: order_from_entity(order),
        order_items,
    }))
}

pub async fn get_order(
    state: &AppState,
    principal: &Principal,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = find_visible(state.db(), principal, id, false).await?;
    let data = load_with_items(state.db(), order).await?;
    Ok(ApiResponse::success("OK", data, Some(Meta::empty())))
}

/// Customers are refused before the order is looked up. Delivery crew can only
/// change `status`; everything else they send is dropped.
pub async fn update_order(
    state: &AppState,
    principal: &Principal,
    id: Uuid,
    payload: UpdateOrderRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    authorize(principal, Action::UpdateOrder)?;
    let patch = payload.restrict(OrderWriteMask::for_principal(principal));

    let txn = state.db().begin().await?;
    let existing = find_visible(&txn, principal, id, true).await?;

    if patch.is_empty() {
        txn.rollback().await?;
        let data = load_with_items(state.db(), existing).await?;
        return Ok(ApiResponse::success("Order updated", data, Some(Meta::empty())));
    }

    if let Some(Some(crew_id)) = patch.delivery_crew {
        let crew = Users::find_by_id(crew_id).one(&txn).await?;
        if crew.is_none() {
            txn.rollback().await?;
            return Err(AppError::validation(
                "delivery_crew",
                format!("Invalid pk \"{crew_id}\" - object does not exist."),
            ));
        }
    }

    if existing.status == OrderStatus::Delivered && patch.status == Some(OrderStatus::Pending) {
        tracing::warn!(order_id = %existing.id, user_id = %principal.id, "order moved back to pending");
    }

    let mut active: OrderActive = existing.into();
    if let Some(delivery_crew) = patch.delivery_crew {
        active.delivery_crew_id = Set(delivery_crew);
    }
    if let Some(status) = patch.status {
        active.status = Set(status);
    }
    if let Some(date) = patch.date {
        active.date = Set(date);
    }
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&txn).await?;

    txn.commit().await?;

    audit::record(
        state,
        principal.id,
        "order_update",
        "orders",
        serde_json::json!({
            "order_id": order.id,
            "status": order.status,
            "delivery_crew": order.delivery_crew_id,
        }),
    )
    .await;

    let data = load_with_items(state.db(), order).await?;
    Ok(ApiResponse::success("Order updated", data, Some(Meta::empty())))
}

pub async fn delete_order(
    state: &AppState,
    principal: &Principal,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    authorize(principal, Action::DeleteOrder)?;
    let order = find_visible(state.db(), principal, id, false).await?;

    Orders::delete_by_id(order.id).exec(state.db()).await?;

    tracing::info!(order_id = %order.id, user_id = %principal.id, "order deleted");
    audit::record(
        state,
        principal.id,
        "order_delete",
        "orders",
        serde_json::json!({ "order_id": order.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

async fn find_visible<C: ConnectionTrait>(
    conn: &C,
    principal: &Principal,
    id: Uuid,
    for_update: bool,
) -> AppResult<OrderModel> {
    let condition = scope_condition(principal, OrderScope::for_detail(principal))
        .add(OrderCol::Id.eq(id));
    let mut finder = Orders::find().filter(condition);
    if for_update {
        finder = finder.lock(LockType::Update);
    }
    finder.one(conn).await?.ok_or(AppError::NotFound)
}

async fn load_with_items<C: ConnectionTrait>(
    conn: &C,
    order: OrderModel,
) -> AppResult<OrderWithItems> {
    let order_items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .order_by_asc(OrderItemCol::CreatedAt)
        .all(conn)
        .await?
        .into_iter()
        .map(order_item_from_entity)
        .collect();

    Ok(OrderWithItems {
        order: order_from_entity(order),
        order_items,
    })
}

async fn with_items<C: ConnectionTrait>(
    conn: &C,
    orders: Vec<OrderModel>,
) -> AppResult<Vec<OrderWithItems>> {
    if orders.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
    let mut grouped: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
    for item in OrderItems::find()
        .filter(OrderItemCol::OrderId.is_in(ids))
        .order_by_asc(OrderItemCol::CreatedAt)
        .all(conn)
        .await?
    {
        grouped
            .entry(item.order_id)
            .or_default()
            .push(order_item_from_entity(item));
    }

    Ok(orders
        .into_iter()
        .map(|order| OrderWithItems {
            order_items: grouped.remove(&order.id).unwrap_or_default(),
            order: order_from_entity(order),
        })
        .collect())
}

fn order_from_entity(model: OrderModel) -> Order {
    Order {
        id: model.id,
        user: model.user_id,
        delivery_crew: model.delivery_crew_id,
        status: model.status,
        date: model.date,
        total: model.total,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

fn order_item_from_entity(model: OrderItemModel) -> OrderItem {
    OrderItem {
        id: model.id,
        order: model.order_id,
        menuitem: model.menuitem_id,
        quantity: model.quantity,
        unit_price: model.unit_price,
        price: model.price,
    }
}
