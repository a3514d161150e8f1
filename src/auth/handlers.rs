use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::dto::{
    AuthResponse, ForgotPasswordRequest, ForgotPasswordResponse, LoginRequest, MessageResponse,
    ProcessAdminRequest, ProcessAdminResponse, ProfileResponse, RegisterRequest,
    RequestAdminResponse, ResetPasswordRequest, UpdateProfileRequest, UserSummary,
};
use super::extractors::{AdminUser, CurrentUser};
use super::services;
use crate::{
    error::{AppError, AppJson, AppPath},
    state::AppState,
};

// --- routers ---

pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password/:token", post(reset_password))
}

pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/profile", get(get_profile).put(update_profile))
        .route("/request-admin", put(request_admin))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin-requests", get(list_admin_requests))
        .route("/admin-requests/:id", put(process_admin_request))
}

// --- handlers ---

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let out = services::register(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(out)))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    services::login(&state, &payload.email, &payload.password)
        .await
        .map(Json)
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn get_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<ProfileResponse>, AppError> {
    services::profile(&state, user.id).await.map(Json)
}

#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn update_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppJson(payload): AppJson<UpdateProfileRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    services::update_profile(&state, user.id, payload)
        .await
        .map(Json)
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn request_admin(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<RequestAdminResponse>, AppError> {
    services::request_admin(&state, user.id).await.map(Json)
}

#[instrument(skip_all)]
pub async fn list_admin_requests(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Vec<UserSummary>>, AppError> {
    services::list_admin_requests(&state).await.map(Json)
}

#[instrument(skip(state, admin, payload), fields(verifier_id = %admin.0.id))]
pub async fn process_admin_request(
    State(state): State<AppState>,
    admin: AdminUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<ProcessAdminRequest>,
) -> Result<Json<ProcessAdminResponse>, AppError> {
    services::process_admin_request(&state, &admin.0, id, payload)
        .await
        .map(Json)
}

#[instrument(skip(state, payload))]
pub async fn forgot_password(
    State(state): State<AppState>,
    AppJson(payload): AppJson<ForgotPasswordRequest>,
) -> Result<Json<ForgotPasswordResponse>, AppError> {
    services::forgot_password(&state, &payload.email)
        .await
        .map(Json)
}

#[instrument(skip_all)]
pub async fn reset_password(
    State(state): State<AppState>,
    AppPath(token): AppPath<String>,
    AppJson(payload): AppJson<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    services::reset_password(&state, &token, &payload.password)
        .await
        .map(Json)
}
