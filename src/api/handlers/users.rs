use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, patch, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::middleware::auth::JWT_COOKIE;
use crate::api::middleware::JwtAuth;
use crate::app::AppState;
use crate::auth::jwt::{create_token, Claims};
use crate::auth::password::{hash_password, verify_password, MIN_PASSWORD_LEN};
use crate::domain::user::value_objects::{Email, Role};
use crate::domain::user::User;

/// Router mounted at /api/v1/users
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/logout", get(logout))
        .route("/me", get(me))
        .route("/update-me", patch(update_me))
        .route("/delete-me", delete(delete_me))
        .route("/", get(list_users))
        .route("/:id", get(get_user).delete(delete_user))
}

/// Request body for user signup
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Request body for user login
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request body for profile updates
///
/// A password field in the payload is rejected with 400 rather than
/// silently ignored.
#[derive(Debug, Deserialize)]
pub struct UpdateMeRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub photo: Option<String>,
    pub password: Option<String>,
}

/// User representation returned by the API; never includes the hash
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub photo: Option<String>,
    pub active: bool,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.to_string(),
            role: user.role,
            photo: user.photo.clone(),
            active: user.active,
        }
    }
}

/// Response for signup and login: the token plus the user it belongs to
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserResponse,
}

fn session_cookie(token: &str) -> Cookie<'static> {
    Cookie::build((JWT_COOKIE, token.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

/// Register a new account
///
/// POST /api/v1/users/signup
pub async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<SignupRequest>,
) -> Result<(StatusCode, CookieJar, Json<AuthResponse>), ApiError> {
    let email = Email::new(&req.email)
        .map_err(|e| ApiError::bad_request(format!("Invalid email: {}", e)))?;

    if req.password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::bad_request(
            "Password must be at least 8 characters",
        ));
    }

    let password_hash = hash_password(&req.password)
        .map_err(|e| ApiError::internal_server_error(format!("Failed to hash password: {}", e)))?;

    let user = User::new(req.name, email, password_hash).map_err(ApiError::bad_request)?;

    state.users.create(&user).await.map_err(|e| {
        if e.contains("duplicate") || e.contains("unique") {
            ApiError::bad_request("Email already registered")
        } else {
            ApiError::internal_server_error(format!("Failed to create user: {}", e))
        }
    })?;

    let token = create_token(
        user.id,
        user.role,
        &state.config.jwt_secret,
        state.config.jwt_expires_hours,
    )
    .map_err(|e| ApiError::internal_server_error(format!("Failed to create token: {}", e)))?;

    let jar = jar.add(session_cookie(&token));

    Ok((
        StatusCode::CREATED,
        jar,
        Json(AuthResponse {
            token,
            user: UserResponse::from(&user),
        }),
    ))
}

/// Login with email and password
///
/// POST /api/v1/users/login
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), ApiError> {
    let email = Email::new(&req.email)
        .map_err(|e| ApiError::bad_request(format!("Invalid email: {}", e)))?;

    let user = state
        .users
        .find_by_email(&email)
        .await
        .map_err(|e| ApiError::internal_server_error(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::unauthorized("Incorrect email or password"))?;

    if !user.active {
        return Err(ApiError::unauthorized("Account is disabled"));
    }

    let valid = verify_password(&req.password, &user.password_hash).map_err(|e| {
        ApiError::internal_server_error(format!("Password verification failed: {}", e))
    })?;

    if !valid {
        return Err(ApiError::unauthorized("Incorrect email or password"));
    }

    let token = create_token(
        user.id,
        user.role,
        &state.config.jwt_secret,
        state.config.jwt_expires_hours,
    )
    .map_err(|e| ApiError::internal_server_error(format!("Failed to create token: {}", e)))?;

    let jar = jar.add(session_cookie(&token));

    Ok((
        jar,
        Json(AuthResponse {
            token,
            user: UserResponse::from(&user),
        }),
    ))
}

/// Clear the session cookie
///
/// GET /api/v1/users/logout
pub async fn logout(jar: CookieJar) -> (CookieJar, Json<serde_json::Value>) {
    let jar = jar.remove(Cookie::build(JWT_COOKIE).path("/").build());
    (jar, Json(serde_json::json!({ "status": "success" })))
}

/// The logged-in user's own profile
///
/// GET /api/v1/users/me
pub async fn me(
    JwtAuth(claims): JwtAuth,
    State(state): State<AppState>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = current_user(&state, &claims).await?;
    Ok(Json(UserResponse::from(&user)))
}

/// Update the logged-in user's name, email or photo
///
/// PATCH /api/v1/users/update-me
pub async fn update_me(
    JwtAuth(claims): JwtAuth,
    State(state): State<AppState>,
    Json(req): Json<UpdateMeRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    if req.password.is_some() {
        return Err(ApiError::bad_request(
            "This route is not for password updates",
        ));
    }

    let mut user = current_user(&state, &claims).await?;

    if let Some(name) = req.name {
        if name.trim().is_empty() {
            return Err(ApiError::bad_request("Name cannot be empty"));
        }
        user.name = name;
    }
    if let Some(email) = req.email {
        user.email = Email::new(&email)
            .map_err(|e| ApiError::bad_request(format!("Invalid email: {}", e)))?;
    }
    if let Some(photo) = req.photo {
        user.photo = Some(photo);
    }

    state
        .users
        .update(&user)
        .await
        .map_err(ApiError::from_repo)?;

    Ok(Json(UserResponse::from(&user)))
}

/// Deactivate the logged-in user's account (soft delete)
///
/// DELETE /api/v1/users/delete-me
pub async fn delete_me(
    JwtAuth(claims): JwtAuth,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    state
        .users
        .deactivate(claims.sub)
        .await
        .map_err(ApiError::from_repo)?;

    Ok(StatusCode::NO_CONTENT)
}

/// List every account (admin only)
///
/// GET /api/v1/users
pub async fn list_users(
    JwtAuth(claims): JwtAuth,
    State(state): State<AppState>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    require_admin(&claims)?;

    let users = state.users.list().await.map_err(ApiError::from)?;
    Ok(Json(users.iter().map(UserResponse::from).collect()))
}

/// Get one account (admin only)
///
/// GET /api/v1/users/:id
pub async fn get_user(
    JwtAuth(claims): JwtAuth,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserResponse>, ApiError> {
    require_admin(&claims)?;

    let user = state
        .users
        .find_by_id(id)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::not_found(format!("User not found: {}", id)))?;

    Ok(Json(UserResponse::from(&user)))
}

/// Hard-delete an account (admin only)
///
/// DELETE /api/v1/users/:id
pub async fn delete_user(
    JwtAuth(claims): JwtAuth,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    require_admin(&claims)?;

    state
        .users
        .delete(id)
        .await
        .map_err(ApiError::from_repo)?;

    Ok(StatusCode::NO_CONTENT)
}

/// Loads the token's user and rejects tokens for deleted/deactivated accounts
async fn current_user(state: &AppState, claims: &Claims) -> Result<User, ApiError> {
    let user = state
        .users
        .find_by_id(claims.sub)
        .await
        .map_err(ApiError::from)?
        .filter(|user| user.active)
        .ok_or_else(|| {
            ApiError::unauthorized("The user belonging to this token no longer exists")
        })?;

    Ok(user)
}

fn require_admin(claims: &Claims) -> Result<(), ApiError> {
    if claims.role != Role::Admin {
        return Err(ApiError::forbidden(
            "You do not have permission to perform this action",
        ));
    }
    Ok(())
}
