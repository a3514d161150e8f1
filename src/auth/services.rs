//! Auth operations. Handlers stay thin; every rule lives here.

use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use super::claims::TokenKind;
use super::dto::{
    AuthResponse, ForgotPasswordResponse, MessageResponse, ProcessAdminRequest,
    ProcessAdminResponse, ProfileResponse, RegisterRequest, RequestAdminResponse,
    UpdateProfileRequest, UserSummary,
};
use super::password::{
    hash_password, is_valid_email, normalize_email, validate_password, verify_dummy,
    verify_password,
};
use super::repo_types::User;
use super::roles::{Role, VerificationStatus};
use super::verification::Decision;
use crate::{error::AppError, state::AppState};

fn required_name(value: &str, field: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidData(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

fn valid_email(raw: &str) -> Result<String, AppError> {
    let email = normalize_email(raw);
    if !is_valid_email(&email) {
        return Err(AppError::InvalidData(
            "Please provide a valid email address".into(),
        ));
    }
    Ok(email)
}

async fn load_user(state: &AppState, id: Uuid) -> Result<User, AppError> {
    state
        .users
        .find_by_id(id)
        .await?
        .ok_or_else(AppError::user_not_found)
}

pub async fn register(state: &AppState, req: RegisterRequest) -> Result<AuthResponse, AppError> {
    let first_name = required_name(&req.first_name, "First name")?;
    let last_name = required_name(&req.last_name, "Last name")?;
    let email = valid_email(&req.email)?;
    validate_password(&req.password)?;

    if state.users.find_by_email(&email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(AppError::DuplicateEmail);
    }

    let now = OffsetDateTime::now_utc();
    let role = req.role.unwrap_or_default();
    let mut user = User::new(
        first_name,
        last_name,
        email,
        hash_password(&req.password)?,
        role,
        now,
    );
    if role == Role::Admin {
        user.open_admin_request(now);
    }

    let user = state.users.insert(user).await?;
    let token = state.tokens.issue_session(user.id)?;

    info!(user_id = %user.id, email = %user.email, role = %user.role, "user registered");
    Ok(AuthResponse::new(&user, token))
}

pub async fn login(state: &AppState, email: &str, password: &str) -> Result<AuthResponse, AppError> {
    let email = normalize_email(email);

    let Some(mut user) = state.users.find_by_email(&email).await? else {
        verify_dummy(password);
        warn!(email = %email, "login unknown email");
        return Err(AppError::InvalidCredentials);
    };

    if !verify_password(password, &user.password_hash)? {
        warn!(email = %email, user_id = %user.id, "login invalid password");
        return Err(AppError::InvalidCredentials);
    }

    let now = OffsetDateTime::now_utc();
    state.users.record_login(user.id, now).await?;
    user.last_login = Some(now);
    user.updated_at = now;
    let token = state.tokens.issue_session(user.id)?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(AuthResponse::new(&user, token))
}

pub async fn profile(state: &AppState, user_id: Uuid) -> Result<ProfileResponse, AppError> {
    let user = load_user(state, user_id).await?;
    Ok(ProfileResponse::from(&user))
}

pub async fn update_profile(
    state: &AppState,
    user_id: Uuid,
    req: UpdateProfileRequest,
) -> Result<AuthResponse, AppError> {
    let mut user = load_user(state, user_id).await?;

    if let Some(first_name) = req.first_name {
        user.first_name = required_name(&first_name, "First name")?;
    }
    if let Some(last_name) = req.last_name {
        user.last_name = required_name(&last_name, "Last name")?;
    }
    if let Some(raw) = req.email {
        let email = valid_email(&raw)?;
        if email != user.email {
            if state.users.find_by_email(&email).await?.is_some() {
                return Err(AppError::DuplicateEmail);
            }
            user.email = email;
        }
    }
    if let Some(picture) = req.profile_picture {
        user.profile_picture = Some(picture);
    }
    if let Some(phone) = req.phone_number {
        user.phone_number = Some(phone);
    }
    if let Some(address) = req.address {
        user.address.merge(address);
    }
    if let Some(password) = req.password {
        validate_password(&password)?;
        user.password_hash = hash_password(&password)?;
    }

    // Role profiles only change for the role they belong to.
    match (user.role, req.gardener_profile, req.supervisor_profile) {
        (Role::Gardener, Some(patch), _) => user.gardener_profile.merge(patch),
        (Role::Supervisor, _, Some(patch)) => user.supervisor_profile.merge(patch),
        _ => {}
    }

    user.updated_at = OffsetDateTime::now_utc();
    let user = state.users.update(user).await?;
    let token = state.tokens.issue_session(user.id)?;

    info!(user_id = %user.id, "profile updated");
    Ok(AuthResponse::new(&user, token))
}

pub async fn request_admin(
    state: &AppState,
    user_id: Uuid,
) -> Result<RequestAdminResponse, AppError> {
    let mut user = load_user(state, user_id).await?;
    let now = OffsetDateTime::now_utc();
    user.request_admin(now)?;
    user.updated_at = now;
    let user = state.users.update(user).await?;

    info!(user_id = %user.id, "admin privileges requested");
    Ok(RequestAdminResponse {
        message: "Admin privileges requested successfully".into(),
        status: user.admin_verification.status,
    })
}

pub async fn list_admin_requests(state: &AppState) -> Result<Vec<UserSummary>, AppError> {
    let pending = state.users.find_pending_admin_requests().await?;
    Ok(pending.iter().map(UserSummary::from).collect())
}

fn parse_decision(req: ProcessAdminRequest) -> Result<Decision, AppError> {
    match VerificationStatus::parse(&req.status) {
        Some(VerificationStatus::Approved) => Ok(Decision::Approve),
        Some(VerificationStatus::Rejected) => Ok(Decision::Reject {
            reason: req.rejection_reason,
        }),
        _ => Err(AppError::InvalidStatus),
    }
}

pub async fn process_admin_request(
    state: &AppState,
    verifier: &User,
    target_id: Uuid,
    req: ProcessAdminRequest,
) -> Result<ProcessAdminResponse, AppError> {
    let decision = parse_decision(req)?;
    let status = decision.status();

    let mut target = load_user(state, target_id).await?;
    let now = OffsetDateTime::now_utc();
    target.decide_admin_request(decision, verifier.id, now)?;
    target.updated_at = now;
    let target = state.users.update(target).await?;

    info!(
        user_id = %target.id,
        verifier_id = %verifier.id,
        status = %status,
        "admin request decided"
    );
    Ok(ProcessAdminResponse {
        message: format!("Admin request {status}"),
        user: UserSummary::from(&target),
    })
}

pub async fn forgot_password(
    state: &AppState,
    email: &str,
) -> Result<ForgotPasswordResponse, AppError> {
    let email = normalize_email(email);
    let mut user = state
        .users
        .find_by_email(&email)
        .await?
        .ok_or_else(AppError::user_not_found)?;

    let now = OffsetDateTime::now_utc();
    let token = state.tokens.issue_at(user.id, TokenKind::Reset, now)?;
    user.open_reset_window(token.clone(), now + state.tokens.ttl(TokenKind::Reset));
    user.updated_at = now;
    let user = state.users.update(user).await?;

    info!(user_id = %user.id, "password reset token issued");
    Ok(ForgotPasswordResponse {
        message: "Password reset token issued".into(),
        reset_token: token,
    })
}

pub async fn reset_password(
    state: &AppState,
    token: &str,
    password: &str,
) -> Result<MessageResponse, AppError> {
    let now = OffsetDateTime::now_utc();
    let token_owner = state.tokens.verify_at(token, TokenKind::Reset, now)?;

    let mut user = match state.users.find_by_reset_token(token, now).await? {
        Some(u) if u.id == token_owner => u,
        _ => {
            warn!(user_id = %token_owner, "reset token not on record");
            return Err(AppError::InvalidOrExpiredToken);
        }
    };

    validate_password(password)?;
    user.password_hash = hash_password(password)?;
    user.close_reset_window();
    user.updated_at = now;
    let user = state.users.update(user).await?;

    info!(user_id = %user.id, "password reset");
    Ok(MessageResponse {
        message: "Password reset successful".into(),
    })
}
