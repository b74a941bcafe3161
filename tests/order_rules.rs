mod common;

use chrono::{NaiveDate, Utc};
use little_lemon_api::{
    dto::{cart::AddToCartRequest, catalog::MenuItemRequest, orders::UpdateOrderRequest},
    entity::{
        cart_items, menu_items, order_items,
        groups::{DELIVERY_CREW, MANAGER},
        orders::{self, OrderStatus},
    },
    error::AppError,
    roles::{DELETE_ORDER_DENIED, UPDATE_ORDER_DENIED},
    services::{
        cart_service, catalog_service,
        group_service::{self, StaffGroup},
        order_service::{self, PlaceOrderOutcome},
    },
};
use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
use uuid::Uuid;

use common::{principal, state_with};

fn empty_db() -> MockDatabase {
    MockDatabase::new(DatabaseBackend::Postgres)
}

fn order_row(id: Uuid, user_id: Uuid, total: i64) -> orders::Model {
    orders::Model {
        id,
        user_id,
        delivery_crew_id: None,
        status: OrderStatus::Pending,
        date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
        total,
        created_at: Utc::now().into(),
        updated_at: Utc::now().into(),
    }
}

fn order_item_row(order_id: Uuid, quantity: i32, unit_price: i64) -> order_items::Model {
    order_items::Model {
        id: Uuid::new_v4(),
        order_id,
        menuitem_id: Uuid::new_v4(),
        quantity,
        unit_price,
        price: i64::from(quantity) * unit_price,
        created_at: Utc::now().into(),
    }
}

fn cart_row(user_id: Uuid, quantity: i32, unit_price: i64) -> cart_items::Model {
    cart_items::Model {
        id: Uuid::new_v4(),
        user_id,
        menuitem_id: Uuid::new_v4(),
        quantity,
        unit_price,
        price: i64::from(quantity) * unit_price,
        created_at: Utc::now().into(),
    }
}

#[tokio::test]
async fn customer_cannot_update_own_order() {
    let state = state_with(empty_db().into_connection());
    let customer = principal(&[], false, false);

    let err = order_service::update_order(
        &state,
        &customer,
        Uuid::new_v4(),
        UpdateOrderRequest {
            status: Some(OrderStatus::Delivered),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();

    assert!(matches!(err, AppError::Forbidden(ref m) if m == UPDATE_ORDER_DENIED));
}

#[tokio::test]
async fn delivery_crew_and_customers_cannot_delete_orders() {
    let state = state_with(empty_db().into_connection());

    for who in [principal(&[DELIVERY_CREW], false, false), principal(&[], false, false)] {
        let err = order_service::delete_order(&state, &who, Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(ref m) if m == DELETE_ORDER_DENIED));
    }
}

#[tokio::test]
async fn empty_cart_places_nothing() {
    let db = empty_db()
        .append_query_results([Vec::<cart_items::Model>::new()])
        .into_connection();
    let state = state_with(db);
    let customer = principal(&[], false, false);

    let outcome = order_service::create_order(&state, &customer).await.unwrap();
    assert!(matches!(outcome, PlaceOrderOutcome::EmptyCart));
}

#[tokio::test]
async fn placed_order_total_is_sum_of_items() {
    let customer = principal(&[], false, false);
    let order_id = Uuid::new_v4();
    let burger = order_item_row(order_id, 2, 500);
    let fries = order_item_row(order_id, 1, 250);

    let db = empty_db()
        .append_query_results([vec![cart_row(customer.id, 2, 500), cart_row(customer.id, 1, 250)]])
        .append_query_results([vec![order_row(order_id, customer.id, 0)]])
        .append_query_results([vec![burger.clone()]])
        .append_query_results([vec![fries.clone()]])
        .append_exec_results([MockExecResult {
            last_insert_id: 0,
            rows_affected: 2,
        }])
        .append_query_results([vec![order_row(order_id, customer.id, 1250)]])
        .into_connection();
    let state = state_with(db);

    let outcome = order_service::create_order(&state, &customer).await.unwrap();
    let placed = match outcome {
        PlaceOrderOutcome::Placed(placed) => placed,
        PlaceOrderOutcome::EmptyCart => panic!("expected an order"),
    };

    assert_eq!(placed.order_items.len(), 2);
    let sum: i64 = placed.order_items.iter().map(|i| i.price).sum();
    assert_eq!(sum, 1250);
    assert_eq!(placed.order.total, sum);
    assert_eq!(placed.order.status, OrderStatus::Pending);
    assert_eq!(placed.order.user, customer.id);
}

#[tokio::test]
async fn customer_cannot_see_orders_of_others() {
    let db = empty_db()
        .append_query_results([Vec::<orders::Model>::new()])
        .into_connection();
    let state = state_with(db);
    let customer = principal(&[], false, false);

    let err = order_service::get_order(&state, &customer, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));
}

#[tokio::test]
async fn manager_reads_order_with_items() {
    let owner = Uuid::new_v4();
    let order_id = Uuid::new_v4();
    let db = empty_db()
        .append_query_results([vec![order_row(order_id, owner, 1250)]])
        .append_query_results([vec![
            order_item_row(order_id, 2, 500),
            order_item_row(order_id, 1, 250),
        ]])
        .into_connection();
    let state = state_with(db);
    let manager = principal(&[MANAGER], false, false);

    let resp = order_service::get_order(&state, &manager, order_id).await.unwrap();
    let data = resp.data.unwrap();
    assert_eq!(data.order.id, order_id);
    assert_eq!(data.order.user, owner);
    assert_eq!(data.order_items.len(), 2);
    assert_eq!(
        data.order.total,
        data.order_items.iter().map(|i| i.price).sum::<i64>()
    );
}

#[tokio::test]
async fn catalog_writes_need_a_manager() {
    let state = state_with(empty_db().into_connection());
    let crew = principal(&[DELIVERY_CREW], false, false);

    let err = catalog_service::create_menu_item(
        &state,
        &crew,
        MenuItemRequest {
            title: "Burger".into(),
            price: 500,
            featured: false,
            category: "Mains".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let err = catalog_service::delete_menu_item(&state, &principal(&[], false, false), Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
}

#[tokio::test]
async fn cart_rejects_non_positive_quantity() {
    let state = state_with(empty_db().into_connection());
    let customer = principal(&[], false, false);

    let err = cart_service::add_to_cart(
        &state,
        &customer,
        AddToCartRequest {
            menuitem: Uuid::new_v4(),
            quantity: 0,
            unit_price: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation { field: "quantity", .. }));
}

#[tokio::test]
async fn cart_rejects_unit_price_that_differs_from_menu() {
    let item = menu_items::Model {
        id: Uuid::new_v4(),
        title: "Burger".into(),
        price: 500,
        featured: false,
        category_id: Uuid::new_v4(),
        created_at: Utc::now().into(),
    };
    let db = empty_db()
        .append_query_results([vec![item.clone()]])
        .into_connection();
    let state = state_with(db);
    let customer = principal(&[], false, false);

    let err = cart_service::add_to_cart(
        &state,
        &customer,
        AddToCartRequest {
            menuitem: item.id,
            quantity: 2,
            unit_price: Some(1),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation { field: "unit_price", .. }));
}

#[tokio::test]
async fn group_admin_needs_staff_manager() {
    let state = state_with(empty_db().into_connection());

    for who in [
        principal(&[MANAGER], false, false),
        principal(&[], true, false),
        principal(&[DELIVERY_CREW], true, false),
    ] {
        let err = group_service::list_members(&state, &who, StaffGroup::Manager)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let err = group_service::add_member(&state, &who, StaffGroup::DeliveryCrew, "someone")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }
}

#[tokio::test]
async fn adding_unknown_user_to_group_is_not_found() {
    let db = empty_db()
        .append_query_results([Vec::<little_lemon_api::entity::users::Model>::new()])
        .into_connection();
    let state = state_with(db);
    let admin = principal(&[MANAGER], true, false);

    let err = group_service::add_member(&state, &admin, StaffGroup::Manager, "ghost")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));
}
