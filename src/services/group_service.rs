use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, EntityTrait, JoinType, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::groups::UserList,
    entity::{
        groups::{DELIVERY_CREW, MANAGER},
        user_groups::{ActiveModel as UserGroupActive, Column as UserGroupCol, Entity as UserGroups},
        users::{Column as UserCol, Entity as Users, Relation as UserRel},
    },
    error::{AppError, AppResult},
    middleware::auth::Principal,
    models::User,
    response::ApiResponse,
    roles::{Action, authorize},
    state::AppState,
};

/// The two staff groups whose membership can be administered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaffGroup {
    Manager,
    DeliveryCrew,
}

impl StaffGroup {
    pub fn name(self) -> &'static str {
        match self {
            StaffGroup::Manager => MANAGER,
            StaffGroup::DeliveryCrew => DELIVERY_CREW,
        }
    }

    fn label(self) -> &'static str {
        match self {
            StaffGroup::Manager => "the manager group",
            StaffGroup::DeliveryCrew => "the delivery crew",
        }
    }
}

pub async fn list_members(
    state: &AppState,
    principal: &Principal,
    group: StaffGroup,
) -> AppResult<ApiResponse<UserList>> {
    authorize(principal, Action::ManageGroups)?;

    let items = Users::find()
        .join(JoinType::InnerJoin, UserRel::UserGroups.def())
        .filter(UserGroupCol::GroupName.eq(group.name()))
        .order_by_asc(UserCol::Username)
        .all(state.db())
        .await?
        .into_iter()
        .map(User::from)
        .collect();

    Ok(ApiResponse::success("OK", UserList { items }, None))
}

/// Adding an existing member is a no-op success.
pub async fn add_member(
    state: &AppState,
    principal: &Principal,
    group: StaffGroup,
    username: &str,
) -> AppResult<ApiResponse<User>> {
    authorize(principal, Action::ManageGroups)?;

    let user = Users::find()
        .filter(UserCol::Username.eq(username))
        .one(state.db())
        .await?
        .ok_or(AppError::NotFound)?;

    let already_member = UserGroups::find_by_id((user.id, group.name().to_string()))
        .one(state.db())
        .await?
        .is_some();

    if !already_member {
        UserGroups::insert(UserGroupActive {
            user_id: Set(user.id),
            group_name: Set(group.name().to_string()),
        })
        .on_conflict(
            OnConflict::columns([UserGroupCol::UserId, UserGroupCol::GroupName])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(state.db())
        .await?;

        tracing::info!(user_id = %user.id, group = group.name(), by = %principal.id, "group member added");
        audit::record(
            state,
            principal.id,
            "group_add",
            "user_groups",
            serde_json::json!({ "user_id": user.id, "group": group.name() }),
        )
        .await;
    }

    let message = format!("{} has been added to {}", user.username, group.label());
    Ok(ApiResponse::success(message, User::from(user), None))
}

/// Removing a non-member is a no-op success.
pub async fn remove_member(
    state: &AppState,
    principal: &Principal,
    group: StaffGroup,
    user_id: Uuid,
) -> AppResult<ApiResponse<User>> {
    authorize(principal, Action::ManageGroups)?;

    let user = Users::find_by_id(user_id)
        .one(state.db())
        .await?
        .ok_or(AppError::NotFound)?;

    let result = UserGroups::delete_many()
        .filter(UserGroupCol::UserId.eq(user.id))
        .filter(UserGroupCol::GroupName.eq(group.name()))
        .exec(state.db())
        .await?;

    if result.rows_affected > 0 {
        tracing::info!(user_id = %user.id, group = group.name(), by = %principal.id, "group member removed");
        audit::record(
            state,
            principal.id,
            "group_remove",
            "user_groups",
            serde_json::json!({ "user_id": user.id, "group": group.name() }),
        )
        .await;
    }

    let message = format!("{} has been deleted from {}", user.username, group.label());
    Ok(ApiResponse::success(message, User::from(user), None))
}
