use crate::{AppState, handlers, permissions};
use axum::{
    Router,
    middleware,
    routing::{get, patch, put},
};

/// Authenticated Router Module
///
/// Every handler here runs behind the authentication layer applied in
/// `create_router`. `PUT /users/{id}` also passes through
/// `require_self_or_admin`, which needs the state to resolve the caller.
pub fn authenticated_routes(state: AppState) -> Router<AppState> {
    Router::<AppState>::new()
        // GET /users
        .route("/users", get(handlers::list_users))
        // GET/PUT /users/{id}
        // Reads are open to any signed-in user; writes only to the owner or an admin.
        .route(
            "/users/{id}",
            get(handlers::get_user).merge(put(handlers::update_user).route_layer(
                middleware::from_fn_with_state(state, permissions::require_self_or_admin),
            )),
        )
        // GET /me
        // The session's own user; drives the client bootstrap.
        .route("/me", get(handlers::get_me))
        // GET /notifications
        .route("/notifications", get(handlers::get_notifications))
        // PATCH /notifications/{id}/read
        .route(
            "/notifications/{id}/read",
            patch(handlers::mark_notification_read),
        )
}
