//! Role derivation and the operation policy table.
//!
//! Roles are derived from a [`Principal`] on every call and never stored. The order
//! scopes intentionally check group membership in different sequences for list and
//! detail access, and superuser status is never consulted for delivery-crew detection.

use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    middleware::auth::Principal,
};

pub const UPDATE_ORDER_DENIED: &str = "You are not allowed to update this order once submitted";
pub const DELETE_ORDER_DENIED: &str = "You are not allowed to delete an order";
pub const MANAGER_ONLY: &str = "You do not have permission to perform this action";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Customer,
    DeliveryCrew,
    Manager,
}

impl Role {
    /// Superusers count as managers whatever their groups are.
    pub fn resolve(principal: &Principal) -> Role {
        if principal.is_superuser || principal.in_manager_group() {
            Role::Manager
        } else if principal.in_delivery_crew() {
            Role::DeliveryCrew
        } else {
            Role::Customer
        }
    }
}

/// Which orders a principal can see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderScope {
    Own,
    Assigned,
    All,
}

impl OrderScope {
    pub fn for_listing(principal: &Principal) -> OrderScope {
        if principal.is_customer() {
            OrderScope::Own
        } else if principal.in_delivery_crew() {
            OrderScope::Assigned
        } else {
            OrderScope::All
        }
    }

    pub fn for_detail(principal: &Principal) -> OrderScope {
        if principal.is_customer() {
            OrderScope::Own
        } else if principal.in_manager_group() || principal.is_superuser {
            OrderScope::All
        } else if principal.in_delivery_crew() {
            OrderScope::Assigned
        } else {
            OrderScope::Own
        }
    }
}

/// Order fields a principal may write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderWriteMask {
    Full,
    StatusOnly,
}

impl OrderWriteMask {
    pub fn for_principal(principal: &Principal) -> OrderWriteMask {
        if principal.in_delivery_crew() {
            OrderWriteMask::StatusOnly
        } else {
            OrderWriteMask::Full
        }
    }
}

/// Gated operations. Reading the catalog, using one's own cart, listing, reading and
/// placing orders only need an authenticated principal, which the extractor enforces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ManageCatalog,
    UpdateOrder,
    DeleteOrder,
    ManageGroups,
}

pub fn is_allowed(principal: &Principal, action: Action) -> bool {
    let role = Role::resolve(principal);
    match action {
        Action::ManageCatalog => role == Role::Manager,
        // Group membership only; superuser status does not count here.
        Action::DeleteOrder => principal.in_manager_group(),
        Action::UpdateOrder => !principal.is_customer(),
        Action::ManageGroups => principal.is_staff && role == Role::Manager,
    }
}

pub fn authorize(principal: &Principal, action: Action) -> AppResult<()> {
    if is_allowed(principal, action) {
        return Ok(());
    }

    tracing::debug!(user_id = %principal.id, ?action, "denied by role");
    let message = match action {
        Action::UpdateOrder => UPDATE_ORDER_DENIED,
        Action::DeleteOrder => DELETE_ORDER_DENIED,
        Action::ManageCatalog | Action::ManageGroups => MANAGER_ONLY,
    };
    Err(AppError::forbidden(message))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use uuid::Uuid;

    use super::*;
    use crate::entity::groups::{DELIVERY_CREW, MANAGER};

    fn principal(groups: &[&str], is_staff: bool, is_superuser: bool) -> Principal {
        Principal {
            id: Uuid::new_v4(),
            username: "someone".into(),
            email: String::new(),
            groups: groups.iter().map(|g| g.to_string()).collect::<BTreeSet<_>>(),
            is_staff,
            is_superuser,
        }
    }

    #[test]
    fn resolves_roles_from_groups() {
        assert_eq!(Role::resolve(&principal(&[], false, false)), Role::Customer);
        assert_eq!(
            Role::resolve(&principal(&[DELIVERY_CREW], false, false)),
            Role::DeliveryCrew
        );
        assert_eq!(Role::resolve(&principal(&[MANAGER], false, false)), Role::Manager);
    }

    #[test]
    fn superuser_resolves_to_manager_without_groups() {
        assert_eq!(Role::resolve(&principal(&[], false, true)), Role::Manager);
        assert_eq!(
            Role::resolve(&principal(&[DELIVERY_CREW], false, true)),
            Role::Manager
        );
    }

    #[test]
    fn listing_scope_prefers_delivery_crew_over_manager() {
        assert_eq!(
            OrderScope::for_listing(&principal(&[], false, false)),
            OrderScope::Own
        );
        assert_eq!(
            OrderScope::for_listing(&principal(&[DELIVERY_CREW], false, false)),
            OrderScope::Assigned
        );
        assert_eq!(
            OrderScope::for_listing(&principal(&[MANAGER, DELIVERY_CREW], false, false)),
            OrderScope::Assigned
        );
        assert_eq!(
            OrderScope::for_listing(&principal(&[MANAGER], false, false)),
            OrderScope::All
        );
        assert_eq!(
            OrderScope::for_listing(&principal(&[], false, true)),
            OrderScope::All
        );
    }

    #[test]
    fn superuser_in_delivery_crew_lists_only_assigned_orders() {
        assert_eq!(
            OrderScope::for_listing(&principal(&[DELIVERY_CREW], true, true)),
            OrderScope::Assigned
        );
    }

    #[test]
    fn detail_scope_prefers_manager_over_delivery_crew() {
        assert_eq!(
            OrderScope::for_detail(&principal(&[MANAGER, DELIVERY_CREW], false, false)),
            OrderScope::All
        );
        assert_eq!(
            OrderScope::for_detail(&principal(&[DELIVERY_CREW], false, true)),
            OrderScope::All
        );
        assert_eq!(
            OrderScope::for_detail(&principal(&[DELIVERY_CREW], false, false)),
            OrderScope::Assigned
        );
        assert_eq!(
            OrderScope::for_detail(&principal(&[], false, false)),
            OrderScope::Own
        );
    }

    #[test]
    fn delivery_crew_membership_restricts_writes_to_status() {
        assert_eq!(
            OrderWriteMask::for_principal(&principal(&[DELIVERY_CREW], false, false)),
            OrderWriteMask::StatusOnly
        );
        assert_eq!(
            OrderWriteMask::for_principal(&principal(&[MANAGER, DELIVERY_CREW], false, false)),
            OrderWriteMask::StatusOnly
        );
        assert_eq!(
            OrderWriteMask::for_principal(&principal(&[MANAGER], false, false)),
            OrderWriteMask::Full
        );
    }

    #[test]
    fn customers_cannot_update_or_delete_orders() {
        let customer = principal(&[], false, false);
        let err = authorize(&customer, Action::UpdateOrder).unwrap_err();
        assert_eq!(err.to_string(), UPDATE_ORDER_DENIED);
        let err = authorize(&customer, Action::DeleteOrder).unwrap_err();
        assert_eq!(err.to_string(), DELETE_ORDER_DENIED);
    }

    #[test]
    fn delivery_crew_may_update_but_not_delete() {
        let crew = principal(&[DELIVERY_CREW], false, false);
        assert!(authorize(&crew, Action::UpdateOrder).is_ok());
        assert!(authorize(&crew, Action::DeleteOrder).is_err());
        assert!(authorize(&crew, Action::ManageCatalog).is_err());
    }

    #[test]
    fn managers_manage_catalog_and_delete_orders() {
        let manager = principal(&[MANAGER], false, false);
        assert!(authorize(&manager, Action::ManageCatalog).is_ok());
        assert!(authorize(&manager, Action::DeleteOrder).is_ok());
        assert!(authorize(&manager, Action::UpdateOrder).is_ok());
    }

    #[test]
    fn superuser_outside_manager_group_cannot_delete_orders() {
        let root = principal(&[], true, true);
        let err = authorize(&root, Action::DeleteOrder).unwrap_err();
        assert_eq!(err.to_string(), DELETE_ORDER_DENIED);
        assert!(authorize(&root, Action::ManageCatalog).is_ok());
        assert!(authorize(&root, Action::UpdateOrder).is_ok());
    }

    #[test]
    fn group_admin_needs_staff_and_manager() {
        assert!(!is_allowed(&principal(&[MANAGER], false, false), Action::ManageGroups));
        assert!(!is_allowed(&principal(&[], true, false), Action::ManageGroups));
        assert!(is_allowed(&principal(&[MANAGER], true, false), Action::ManageGroups));
        assert!(is_allowed(&principal(&[], true, true), Action::ManageGroups));
    }
}
