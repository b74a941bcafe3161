use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::sea_query::{Expr, LikeExpr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DbErr, EntityTrait, JoinType, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set, SqlErr, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::catalog::{
        CategoryList, CreateCategoryRequest, MenuItemList, MenuItemRequest, PatchMenuItemRequest,
    },
    entity::{
        categories::{
            ActiveModel as CategoryActive, Column as CategoryCol, Entity as Categories,
            Model as CategoryModel,
        },
        menu_items::{
            ActiveModel as MenuItemActive, Column as MenuItemCol, Entity as MenuItems,
            Model as MenuItemModel, Relation as MenuItemRel,
        },
        order_items::{Column as OrderItemCol, Entity as OrderItems},
    },
    error::{AppError, AppResult},
    middleware::auth::Principal,
    models::{Category, MenuItem},
    response::{ApiResponse, Meta},
    roles::{Action, authorize},
    routes::params::{MenuItemQuery, SortOrder},
    state::AppState,
};

const MENU_ITEM_IN_USE: &str = "menu item is referenced by existing orders";

/// `%search%` with the LIKE wildcards in `search` matched literally.
fn contains_pattern(search: &str) -> LikeExpr {
    LikeExpr::new(format!("%{}%", escape_like(search))).escape('\\')
}

fn escape_like(search: &str) -> String {
    let mut escaped = String::with_capacity(search.len());
    for c in search.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

pub async fn list_categories(state: &AppState) -> AppResult<ApiResponse<CategoryList>> {
    let items = Categories::find()
        .order_by_asc(CategoryCol::Title)
        .all(state.db())
        .await?
        .into_iter()
        .map(category_from_entity)
        .collect();

    Ok(ApiResponse::success("Categories", CategoryList { items }, None))
}

pub async fn create_category(
    state: &AppState,
    principal: &Principal,
    payload: CreateCategoryRequest,
) -> AppResult<ApiResponse<Category>> {
    authorize(principal, Action::ManageCatalog)?;
    let title = payload.title.trim().to_string();
    if title.is_empty() {
        return Err(AppError::validation("title", "This field may not be blank."));
    }

    let exists = Categories::find()
        .filter(CategoryCol::Title.eq(title.as_str()))
        .one(state.db())
        .await?;
    if exists.is_some() {
        return Err(AppError::validation(
            "title",
            "category with this title already exists.",
        ));
    }

    let category = CategoryActive {
        id: Set(Uuid::new_v4()),
        title: Set(title),
    }
    .insert(state.db())
    .await?;

    audit::record(
        state,
        principal.id,
        "category_create",
        "categories",
        serde_json::json!({ "category_id": category.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Category created",
        category_from_entity(category),
        Some(Meta::empty()),
    ))
}

pub async fn list_menu_items(
    state: &AppState,
    query: MenuItemQuery,
) -> AppResult<ApiResponse<MenuItemList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all();

    if let Some(search) = query.search.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(
            Expr::col((Categories, CategoryCol::Title)).ilike(contains_pattern(search)),
        );
    }

    if let Some(category) = query.category.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(CategoryCol::Title.eq(category.as_str()));
    }

    let total = MenuItems::find()
        .join(JoinType::InnerJoin, MenuItemRel::Categories.def())
        .filter(condition.clone())
        .count(state.db())
        .await? as i64;

    let mut finder = MenuItems::find()
        .find_also_related(Categories)
        .filter(condition);
    finder = match query.sort_order {
        Some(SortOrder::Asc) => finder.order_by_asc(MenuItemCol::Price),
        Some(SortOrder::Desc) => finder.order_by_desc(MenuItemCol::Price),
        None => finder.order_by_asc(MenuItemCol::CreatedAt),
    };

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(state.db())
        .await?
        .into_iter()
        .map(|(item, category)| menu_item_from_entity(item, category))
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Menu items", MenuItemList { items }, Some(meta)))
}

pub async fn get_menu_item(state: &AppState, id: Uuid) -> AppResult<ApiResponse<MenuItem>> {
    let found = MenuItems::find_by_id(id)
        .find_also_related(Categories)
        .one(state.db())
        .await?;
    let (item, category) = match found {
        Some(pair) => pair,
        None => return Err(AppError::NotFound),
    };
    Ok(ApiResponse::success(
        "Menu item",
        menu_item_from_entity(item, category),
        None,
    ))
}

pub async fn create_menu_item(
    state: &AppState,
    principal: &Principal,
    payload: MenuItemRequest,
) -> AppResult<ApiResponse<MenuItem>> {
    authorize(principal, Action::ManageCatalog)?;
    let title = validate_title(&payload.title)?;
    validate_price(payload.price)?;
    let category = category_by_title(state, &payload.category).await?;

    let item = MenuItemActive {
        id: Set(Uuid::new_v4()),
        title: Set(title),
        price: Set(payload.price),
        featured: Set(payload.featured),
        category_id: Set(category.id),
        created_at: NotSet,
    }
    .insert(state.db())
    .await?;

    audit::record(
        state,
        principal.id,
        "menu_item_create",
        "menu_items",
        serde_json::json!({ "menuitem_id": item.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Menu item created",
        menu_item_from_entity(item, Some(category)),
        Some(Meta::empty()),
    ))
}

pub async fn update_menu_item(
    state: &AppState,
    principal: &Principal,
    id: Uuid,
    payload: PatchMenuItemRequest,
) -> AppResult<ApiResponse<MenuItem>> {
    authorize(principal, Action::ManageCatalog)?;
    let existing = MenuItems::find_by_id(id).one(state.db()).await?;
    let existing = match existing {
        Some(item) => item,
        None => return Err(AppError::NotFound),
    };

    let mut active: MenuItemActive = existing.into();
    if let Some(title) = payload.title {
        active.title = Set(validate_title(&title)?);
    }
    if let Some(price) = payload.price {
        validate_price(price)?;
        active.price = Set(price);
    }
    if let Some(featured) = payload.featured {
        active.featured = Set(featured);
    }
    if let Some(category) = payload.category {
        let category = category_by_title(state, &category).await?;
        active.category_id = Set(category.id);
    }

    let item = active.update(state.db()).await?;
    let category = Categories::find_by_id(item.category_id)
        .one(state.db())
        .await?;

    audit::record(
        state,
        principal.id,
        "menu_item_update",
        "menu_items",
        serde_json::json!({ "menuitem_id": item.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Updated",
        menu_item_from_entity(item, category),
        Some(Meta::empty()),
    ))
}

pub async fn delete_menu_item(
    state: &AppState,
    principal: &Principal,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    authorize(principal, Action::ManageCatalog)?;

    // The row lock makes concurrent order item inserts wait on the FK check.
    let txn = state.db().begin().await?;
    let item = MenuItems::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let ordered = OrderItems::find()
        .filter(OrderItemCol::MenuitemId.eq(item.id))
        .count(&txn)
        .await?;
    if ordered > 0 {
        txn.rollback().await?;
        return Err(AppError::BadRequest(MENU_ITEM_IN_USE.into()));
    }

    MenuItems::delete_by_id(item.id)
        .exec(&txn)
        .await
        .map_err(referenced_by_orders)?;
    txn.commit().await.map_err(referenced_by_orders)?;

    audit::record(
        state,
        principal.id,
        "menu_item_delete",
        "menu_items",
        serde_json::json!({ "menuitem_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

fn referenced_by_orders(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::ForeignKeyConstraintViolation(_)) => {
            AppError::BadRequest(MENU_ITEM_IN_USE.into())
        }
        _ => AppError::OrmError(err),
    }
}

async fn category_by_title(state: &AppState, title: &str) -> AppResult<CategoryModel> {
    Categories::find()
        .filter(CategoryCol::Title.eq(title))
        .one(state.db())
        .await?
        .ok_or_else(|| {
            AppError::validation("category", format!("Object with title={title} does not exist."))
        })
}

fn validate_title(title: &str) -> AppResult<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AppError::validation("title", "This field may not be blank."));
    }
    Ok(title.to_string())
}

fn validate_price(price: i64) -> AppResult<()> {
    if price <= 0 {
        return Err(AppError::validation("price", "price must be greater than 0"));
    }
    Ok(())
}

fn category_from_entity(model: CategoryModel) -> Category {
    Category {
        id: model.id,
        title: model.title,
    }
}

fn menu_item_from_entity(model: MenuItemModel, category: Option<CategoryModel>) -> MenuItem {
    MenuItem {
        id: model.id,
        title: model.title,
        price: model.price,
        featured: model.featured,
        category: category.map(|c| c.title).unwrap_or_default(),
        created_at: model.created_at.with_timezone(&Utc),
    }
}
