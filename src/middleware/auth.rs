use std::collections::BTreeSet;

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use jsonwebtoken::{DecodingKey, Validation, decode};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::{
    db::OrmConn,
    dto::auth::Claims,
    entity::{
        groups::{DELIVERY_CREW, MANAGER},
        user_groups::{Column as UserGroupCol, Entity as UserGroups},
        users::Entity as Users,
    },
    error::{AppError, AppResult},
    state::AppState,
};

/// The authenticated caller. Group memberships are read fresh for every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub groups: BTreeSet<String>,
    pub is_staff: bool,
    pub is_superuser: bool,
}

impl Principal {
    pub fn in_group(&self, name: &str) -> bool {
        self.groups.contains(name)
    }

    pub fn has_no_groups(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn in_manager_group(&self) -> bool {
        self.in_group(MANAGER)
    }

    pub fn in_delivery_crew(&self) -> bool {
        self.in_group(DELIVERY_CREW)
    }

    /// No group memberships and not a superuser.
    pub fn is_customer(&self) -> bool {
        self.has_no_groups() && !self.is_superuser
    }
}

pub async fn load_principal(orm: &OrmConn, user_id: Uuid) -> AppResult<Option<Principal>> {
    let Some(user) = Users::find_by_id(user_id).one(orm).await? else {
        return Ok(None);
    };

    let groups = UserGroups::find()
        .filter(UserGroupCol::UserId.eq(user.id))
        .all(orm)
        .await?
        .into_iter()
        .map(|membership| membership.group_name)
        .collect();

    Ok(Some(Principal {
        id: user.id,
        username: user.username,
        email: user.email,
        groups,
        is_staff: user.is_staff,
        is_superuser: user.is_superuser,
    }))
}

pub fn decode_token(token: &str, secret: &str) -> AppResult<Claims> {
    let decoded = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::Unauthorized)?;
    Ok(decoded.claims)
}

fn bearer_token(parts: &Parts) -> AppResult<Option<&str>> {
    let Some(auth_header) = parts.headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };

    let auth_str = auth_header.to_str().map_err(|_| AppError::Unauthorized)?;
    let token = auth_str
        .strip_prefix("Bearer ")
        .ok_or(AppError::Unauthorized)?
        .trim();
    Ok(Some(token))
}

async fn authenticate(state: &AppState, token: &str) -> AppResult<Principal> {
    let claims = decode_token(token, &state.config.jwt_secret)?;
    let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AppError::Unauthorized)?;

    load_principal(state.db(), user_id)
        .await?
        .ok_or(AppError::Unauthorized)
}

impl FromRequestParts<AppState> for Principal {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?.ok_or(AppError::Unauthorized)?;
        authenticate(state, token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(groups: &[&str], is_superuser: bool) -> Principal {
        Principal {
            id: Uuid::new_v4(),
            username: "tester".into(),
            email: "tester@example.com".into(),
            groups: groups.iter().map(|g| g.to_string()).collect(),
            is_staff: false,
            is_superuser,
        }
    }

    #[test]
    fn customer_requires_no_groups_and_no_superuser() {
        assert!(principal(&[], false).is_customer());
        assert!(!principal(&[], true).is_customer());
        assert!(!principal(&[DELIVERY_CREW], false).is_customer());
    }

    #[test]
    fn group_helpers_match_group_names() {
        let p = principal(&[MANAGER, DELIVERY_CREW], false);
        assert!(p.in_manager_group());
        assert!(p.in_delivery_crew());
        assert!(!p.has_no_groups());
    }

    #[test]
    fn decode_token_rejects_garbage() {
        let err = decode_token("not-a-token", "secret").unwrap_err();
        assert!(matches!(err, AppError::Unauthorized));
    }
}
