use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{LoginRequest, LoginResponse, MeResponse, RegisterRequest},
        cart::{AddToCartRequest, CartList},
        catalog::{
            CategoryList, CreateCategoryRequest, MenuItemList, MenuItemRequest,
            PatchMenuItemRequest,
        },
        groups::{GroupMemberRequest, UserList},
        orders::{OrderList, OrderWithItems, UpdateOrderRequest},
    },
    models::{CartItem, Category, MenuItem, Order, OrderItem, OrderStatus, User},
    response::{ApiResponse, Meta},
    roles::Role,
    routes::{auth, cart, catalog, groups, health, orders, params},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::login,
        auth::register,
        auth::current_user,
        catalog::list_categories,
        catalog::create_category,
        catalog::list_menu_items,
        catalog::create_menu_item,
        catalog::get_menu_item,
        catalog::replace_menu_item,
        catalog::update_menu_item,
        catalog::delete_menu_item,
        cart::cart_list,
        cart::add_to_cart,
        cart::clear_cart,
        orders::list_orders,
        orders::create_order,
        orders::get_order,
        orders::update_order,
        orders::delete_order,
        groups::list_managers,
        groups::add_manager,
        groups::remove_manager,
        groups::list_delivery_crew,
        groups::add_delivery_crew,
        groups::remove_delivery_crew
    ),
    components(
        schemas(
            User,
            Category,
            MenuItem,
            CartItem,
            Order,
            OrderItem,
            OrderStatus,
            Role,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            MeResponse,
            CreateCategoryRequest,
            CategoryList,
            MenuItemRequest,
            PatchMenuItemRequest,
            MenuItemList,
            AddToCartRequest,
            CartList,
            UpdateOrderRequest,
            OrderWithItems,
            OrderList,
            GroupMemberRequest,
            UserList,
            params::Pagination,
            params::MenuItemQuery,
            params::OrderListQuery,
            Meta,
            ApiResponse<MenuItem>,
            ApiResponse<MenuItemList>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>,
            ApiResponse<CartList>,
            ApiResponse<UserList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Registration, tokens and the current user"),
        (name = "Catalog", description = "Categories and menu items"),
        (name = "Cart", description = "The caller's cart"),
        (name = "Orders", description = "Order placement and fulfilment"),
        (name = "Groups", description = "Manager and delivery crew membership"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
