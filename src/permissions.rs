use axum::{
    extract::{Path, Request},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::{auth::AuthUser, error::ApiError};

/// Whether `actor` may modify the user record `target`.
pub fn can_modify_user(actor: &AuthUser, target: Uuid) -> bool {
    actor.id == target || actor.is_admin()
}

/// require_self_or_admin
///
/// Route-level middleware for `/users/{id}` writes. Runs after the
/// authentication layer; callers may only touch their own record unless they
/// hold the admin role.
pub async fn require_self_or_admin(
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !can_modify_user(&auth_user, id) {
        tracing::warn!(actor = %auth_user.id, target = %id, "permission denied");
        return Err(ApiError::Forbidden);
    }
    Ok(next.run(request).await)
}
