use axum::Router;

use crate::state::AppState;

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod doc;
pub mod extract;
pub mod groups;
pub mod health;
pub mod orders;
pub mod params;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/groups/manager/users", groups::manager_router())
        .nest("/groups/delivery-crew/users", groups::delivery_crew_router())
        .nest("/menu-items", catalog::menu_items_router())
        .nest("/category", catalog::category_router())
        .nest("/cart/menu-items", cart::router())
        .nest("/orders", orders::router())
        .nest("/auth", auth::router())
}
