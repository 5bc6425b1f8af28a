use crate::{
    AppState,
    auth::{self, AuthUser},
    error::ApiError,
    models::{
        CreateUserRequest, DEFAULT_LOCALE, LogInRequest, LogInResponse, NewUser,
        NotificationsResponse, UpdateUserRequest, UserResponse, UsersResponse,
    },
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

pub const MIN_PASSWORD_LEN: usize = 8;

// --- Validation ---

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.'),
        None => false,
    }
}

fn validate_locale(locale: &str, errors: &mut Vec<String>) {
    if locale.trim().is_empty() {
        errors.push("preferredLocale must not be empty".to_string());
    }
}

/// Collects every problem with a sign-up payload instead of stopping at the first.
pub fn validate_create_user(req: &CreateUserRequest) -> Result<(), ApiError> {
    let mut errors = Vec::new();
    if req.name.trim().is_empty() {
        errors.push("name must not be empty".to_string());
    }
    if !looks_like_email(&normalize_email(&req.email)) {
        errors.push("email must be a valid address".to_string());
    }
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        errors.push(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        ));
    }
    if let Some(locale) = &req.preferred_locale {
        validate_locale(locale, &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::Validation(errors))
    }
}

pub fn validate_update_user(req: &UpdateUserRequest) -> Result<(), ApiError> {
    let mut errors = Vec::new();
    if req.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
        errors.push("name must not be empty".to_string());
    }
    if let Some(locale) = &req.preferred_locale {
        validate_locale(locale, &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::Validation(errors))
    }
}

// --- Handlers ---

/// list_users
///
/// [Authenticated Route] Lists every registered user.
#[utoipa::path(
    get,
    path = "/users",
    responses(
        (status = 200, description = "Users", body = UsersResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_users(
    _auth: AuthUser,
    State(state): State<AppState>,
) -> Json<UsersResponse> {
    let users = state.repo.list_users().await;
    Json(UsersResponse { users })
}

/// create_user
///
/// [Public Route] Sign-up. Hashes the password, stores the user with the
/// `member` role and the requested (or default) locale.
#[utoipa::path(
    post,
    path = "/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "Created", body = UserResponse),
        (status = 409, description = "Email already registered"),
        (status = 422, description = "Invalid payload")
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    validate_create_user(&payload)?;

    let new_user = NewUser {
        name: payload.name.trim().to_string(),
        email: normalize_email(&payload.email),
        password_hash: auth::hash_password(&payload.password)?,
        preferred_locale: payload
            .preferred_locale
            .unwrap_or_else(|| DEFAULT_LOCALE.to_string()),
    };

    let user = state.repo.create_user(new_user).await?;
    tracing::info!(user_id = %user.id, "user registered");
    Ok((StatusCode::CREATED, Json(UserResponse { user })))
}

/// get_user
///
/// [Authenticated Route] Retrieves a single user by ID.
#[utoipa::path(
    get,
    path = "/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Found", body = UserResponse),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_user(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserResponse>, ApiError> {
    match state.repo.get_user(id).await {
        Some(user) => Ok(Json(UserResponse { user })),
        None => Err(ApiError::NotFound),
    }
}

/// update_user
///
/// [Authenticated + Permissioned Route] Partial profile update. The
/// `require_self_or_admin` layer has already checked the caller.
#[utoipa::path(
    put,
    path = "/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated", body = UserResponse),
        (status = 403, description = "Not allowed"),
        (status = 404, description = "Not Found"),
        (status = 422, description = "Invalid payload")
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    validate_update_user(&payload)?;

    match state.repo.update_user(id, payload).await? {
        Some(user) => Ok(Json(UserResponse { user })),
        None => Err(ApiError::NotFound),
    }
}

/// log_in
///
/// [Public Route] Exchanges email and password for a signed bearer token.
/// Unknown emails and wrong passwords are indistinguishable to the caller.
#[utoipa::path(
    post,
    path = "/users/log-in",
    request_body = LogInRequest,
    responses(
        (status = 200, description = "Authenticated", body = LogInResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn log_in(
    State(state): State<AppState>,
    Json(payload): Json<LogInRequest>,
) -> Result<Json<LogInResponse>, ApiError> {
    let email = normalize_email(&payload.email);

    let credentials = state
        .repo
        .get_credentials(&email)
        .await
        .ok_or(ApiError::InvalidCredentials)?;

    if !auth::verify_password(&payload.password, &credentials.password_hash) {
        tracing::info!(user_id = %credentials.id, "log-in rejected");
        return Err(ApiError::InvalidCredentials);
    }

    let user = state
        .repo
        .get_user(credentials.id)
        .await
        .ok_or(ApiError::InvalidCredentials)?;

    let token = auth::issue_token(user.id, &state.config.jwt_secret, state.config.token_ttl_secs)?;
    Ok(Json(LogInResponse { token, user }))
}

/// get_me
///
/// [Authenticated Route] The current session's user. Rejections carry an
/// `error` field, which the client treats as a signal to log out.
#[utoipa::path(
    get,
    path = "/me",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Session invalid")
    )
)]
pub async fn get_me(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<UserResponse>, ApiError> {
    // The extractor just loaded this user; a miss means it was deleted in between.
    let user = state.repo.get_user(id).await.ok_or(ApiError::Unauthorized)?;
    Ok(Json(UserResponse { user }))
}

/// get_notifications
///
/// [Authenticated Route] The caller's notifications, newest first.
#[utoipa::path(
    get,
    path = "/notifications",
    responses((status = 200, description = "My Notifications", body = NotificationsResponse))
)]
pub async fn get_notifications(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> Json<NotificationsResponse> {
    let notifications = state.repo.get_notifications(id).await;
    Json(NotificationsResponse { notifications })
}

/// mark_notification_read
///
/// [Authenticated Route] Marks one of the caller's notifications as read.
#[utoipa::path(
    patch,
    path = "/notifications/{id}/read",
    params(("id" = Uuid, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Marked as read"),
        (status = 404, description = "Not Found or Not Yours")
    )
)]
pub async fn mark_notification_read(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if state.repo.mark_notification_read(id, user_id).await {
        Ok(StatusCode::OK)
    } else {
        Err(ApiError::NotFound)
    }
}
