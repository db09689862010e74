use std::sync::Arc;

use api_ingress::error::method_not_supported;
use axum::{
    routing::{get, MethodRouter},
    Extension, Router,
};

use crate::api::rest::handlers;
use crate::domain::service::Service;

pub const USERS_PATH: &str = "/api/users";
pub const USERS_PATH_SLASH: &str = "/api/users/";
pub const USER_PATH: &str = "/api/users/{id}";

/// Mount the users endpoints on `router`.
///
/// `HEAD` and every method not listed below answer 405.
pub fn register_routes(router: Router, service: Arc<Service>) -> Router {
    router
        .route(USERS_PATH, collection())
        .route(USERS_PATH_SLASH, collection())
        .route(
            USER_PATH,
            get(handlers::get_user)
                .post(handlers::create_user)
                .put(handlers::update_user)
                .delete(handlers::delete_user)
                .head(method_not_supported)
                .fallback(method_not_supported),
        )
        .layer(Extension(service))
}

fn collection() -> MethodRouter {
    get(handlers::list_users)
        .post(handlers::create_user)
        .put(handlers::missing_id)
        .delete(handlers::missing_id)
        .head(method_not_supported)
        .fallback(method_not_supported)
}
