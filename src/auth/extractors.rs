use std::marker::PhantomData;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::{error, warn};

use super::claims::TokenKind;
use super::repo_types::User;
use super::roles::{AdminGate, Gate, GardenerGate, SupervisorGate};
use crate::{error::AppError, state::AppState};

/// The authenticated principal, resolved from `Authorization: Bearer <token>`.
/// Secrets are stripped before it is attached.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // Already resolved by an earlier extractor on this request
        if let Some(user) = parts.extensions.get::<CurrentUser>() {
            return Ok(user.clone());
        }

        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer ").or_else(|| h.strip_prefix("bearer ")))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::Unauthenticated("Not authorized, no token".into()))?;

        let user_id = state.tokens.verify(token, TokenKind::Session).map_err(|_| {
            warn!("invalid or expired session token");
            token_failed()
        })?;

        let user = match state.users.find_by_id(user_id).await {
            Ok(Some(u)) => u,
            Ok(None) => {
                warn!(user_id = %user_id, "session token for unknown user");
                return Err(token_failed());
            }
            Err(e) => {
                error!(error = %e, user_id = %user_id, "user lookup failed during auth");
                return Err(token_failed());
            }
        };

        let current = CurrentUser(user.without_secrets());
        parts.extensions.insert(current.clone());
        Ok(current)
    }
}

fn token_failed() -> AppError {
    AppError::Unauthenticated("Not authorized, token failed".into())
}

/// An authenticated principal that passed gate `G`.
pub struct Authorized<G: Gate>(pub User, PhantomData<fn() -> G>);

pub type AdminUser = Authorized<AdminGate>;
pub type SupervisorUser = Authorized<SupervisorGate>;
pub type GardenerUser = Authorized<GardenerGate>;

impl<G: Gate> Authorized<G> {
    /// Applies the gate to an already-resolved principal.
    pub fn check(user: User) -> Result<Self, AppError> {
        if G::admits(user.standing()) {
            Ok(Self(user, PhantomData))
        } else {
            warn!(user_id = %user.id, role = %user.role, "role gate denied");
            Err(AppError::Unauthorized(G::DENIED.into()))
        }
    }
}

#[async_trait]
impl<G: Gate> FromRequestParts<AppState> for Authorized<G> {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        Self::check(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::roles::{Role, VerificationStatus};
    use axum::http::Request;
    use time::OffsetDateTime;

    async fn seeded(state: &AppState, role: Role, status: VerificationStatus) -> User {
        let mut user = User::new(
            "Fern".into(),
            "Glade".into(),
            format!("{}@garden.org", uuid::Uuid::new_v4().simple()),
            "hash".into(),
            role,
            OffsetDateTime::now_utc(),
        );
        user.admin_verification.status = status;
        state.users.insert(user).await.unwrap()
    }

    fn parts_with(header: Option<String>) -> Parts {
        let mut builder = Request::builder().uri("/");
        if let Some(h) = header {
            builder = builder.header(AUTHORIZATION, h);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn missing_header_is_unauthenticated() {
        let state = AppState::fake();
        let mut parts = parts_with(None);
        let err = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated(_)));
    }

    #[tokio::test]
    async fn reset_token_is_not_a_session() {
        let state = AppState::fake();
        let user = seeded(&state, Role::Normal, VerificationStatus::Pending).await;
        let reset = state.tokens.issue_reset(user.id).unwrap();
        let mut parts = parts_with(Some(format!("Bearer {reset}")));
        let err = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated(_)));
    }

    #[tokio::test]
    async fn valid_session_attaches_principal_without_secret() {
        let state = AppState::fake();
        let user = seeded(&state, Role::Gardener, VerificationStatus::Pending).await;
        let token = state.tokens.issue_session(user.id).unwrap();
        let mut parts = parts_with(Some(format!("Bearer {token}")));
        let CurrentUser(resolved) = CurrentUser::from_request_parts(&mut parts, &state)
            .await
            .expect("resolves");
        assert_eq!(resolved.id, user.id);
        assert!(resolved.password_hash.is_empty());
        assert!(parts.extensions.get::<CurrentUser>().is_some());
    }

    #[tokio::test]
    async fn token_for_missing_principal_is_unauthenticated() {
        let state = AppState::fake();
        let token = state.tokens.issue_session(uuid::Uuid::new_v4()).unwrap();
        let mut parts = parts_with(Some(format!("Bearer {token}")));
        let err = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated(_)));
    }

    #[tokio::test]
    async fn gates_reject_with_forbidden() {
        let state = AppState::fake();
        let pending_admin = seeded(&state, Role::Admin, VerificationStatus::Pending).await;
        let token = state.tokens.issue_session(pending_admin.id).unwrap();

        let mut parts = parts_with(Some(format!("Bearer {token}")));
        let err = AdminUser::from_request_parts(&mut parts, &state).await.err().unwrap();
        assert!(matches!(err, AppError::Unauthorized(_)));

        let supervisor = seeded(&state, Role::Supervisor, VerificationStatus::Pending).await;
        assert!(SupervisorUser::check(supervisor.clone()).is_ok());
        assert!(GardenerUser::check(supervisor.clone()).is_ok());
        assert!(AdminUser::check(supervisor).is_err());
    }
}
