#![allow(dead_code)]

use std::collections::BTreeSet;

use little_lemon_api::{
    config::AppConfig, db::OrmConn, middleware::auth::Principal, state::AppState,
};
use uuid::Uuid;

pub const JWT_SECRET: &str = "test-secret";

pub fn test_config() -> AppConfig {
    AppConfig {
        database_url: "postgres://unused".into(),
        host: "127.0.0.1".into(),
        port: 0,
        jwt_secret: JWT_SECRET.into(),
        jwt_ttl_hours: 1,
        max_connections: 1,
    }
}

pub fn state_with(orm: OrmConn) -> AppState {
    AppState::new(orm, test_config())
}

pub fn principal(groups: &[&str], is_staff: bool, is_superuser: bool) -> Principal {
    Principal {
        id: Uuid::new_v4(),
        username: format!("user-{}", &Uuid::new_v4().to_string()[..8]),
        email: String::new(),
        groups: groups.iter().map(|g| g.to_string()).collect::<BTreeSet<_>>(),
        is_staff,
        is_superuser,
    }
}
