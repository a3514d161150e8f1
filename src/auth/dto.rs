use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::{
    Address, GardenerProfile, GardenerProfilePatch, SupervisorProfile, SupervisorProfilePatch,
    User,
};
use super::roles::{Role, VerificationStatus};
use super::verification::AdminVerification;

/// Request body for user registration.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    #[serde(default, alias = "userType")]
    pub role: Option<Role>,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Partial profile update; omitted fields are left untouched.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub profile_picture: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<Address>,
    pub gardener_profile: Option<GardenerProfilePatch>,
    pub supervisor_profile: Option<SupervisorProfilePatch>,
}

/// Decision on a pending admin request. `status` stays a string so that
/// unknown values surface as `Invalid status`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessAdminRequest {
    pub status: String,
    pub rejection_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub password: String,
}

/// Returned by register, login and profile update.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: Role,
    pub is_admin: bool,
    pub token: String,
}

impl AuthResponse {
    pub fn new(user: &User, token: String) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            role: user.role,
            is_admin: user.is_effective_admin(),
            token,
        }
    }
}

/// Profile view; role-specific sections appear only for the matching role.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_verification: Option<AdminVerification>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gardener_profile: Option<GardenerProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supervisor_profile: Option<SupervisorProfile>,
    pub profile_picture: Option<String>,
    pub phone_number: Option<String>,
    pub address: Address,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_login: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<&User> for ProfileResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            role: user.role,
            admin_verification: (user.role == Role::Admin)
                .then(|| user.admin_verification.clone()),
            gardener_profile: (user.role == Role::Gardener).then(|| user.gardener_profile.clone()),
            supervisor_profile: (user.role == Role::Supervisor)
                .then(|| user.supervisor_profile.clone()),
            profile_picture: user.profile_picture.clone(),
            phone_number: user.phone_number.clone(),
            address: user.address.clone(),
            last_login: user.last_login,
            created_at: user.created_at,
        }
    }
}

/// Principal as listed to admins.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: Role,
    pub admin_verification: AdminVerification,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            role: user.role,
            admin_verification: user.admin_verification.clone(),
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RequestAdminResponse {
    pub message: String,
    pub status: VerificationStatus,
}

#[derive(Debug, Serialize)]
pub struct ProcessAdminResponse {
    pub message: String,
    pub user: UserSummary,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForgotPasswordResponse {
    pub message: String,
    pub reset_token: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> User {
        User::new(
            "Hazel".into(),
            "Birch".into(),
            "hazel@garden.org".into(),
            "$argon2id$secret-hash".into(),
            role,
            OffsetDateTime::now_utc(),
        )
    }

    #[test]
    fn profile_includes_only_matching_role_section() {
        let json = serde_json::to_value(ProfileResponse::from(&user(Role::Gardener))).unwrap();
        assert!(json.get("gardenerProfile").is_some());
        assert!(json.get("supervisorProfile").is_none());
        assert!(json.get("adminVerification").is_none());

        let json = serde_json::to_value(ProfileResponse::from(&user(Role::Admin))).unwrap();
        assert!(json.get("adminVerification").is_some());
        assert!(json.get("gardenerProfile").is_none());
    }

    #[test]
    fn responses_never_carry_the_credential() {
        let u = user(Role::Normal);
        let auth = serde_json::to_string(&AuthResponse::new(&u, "t".into())).unwrap();
        let profile = serde_json::to_string(&ProfileResponse::from(&u)).unwrap();
        let summary = serde_json::to_string(&UserSummary::from(&u)).unwrap();
        for body in [auth, profile, summary] {
            assert!(!body.contains("secret-hash"));
            assert!(!body.contains("password"));
        }
    }

    #[test]
    fn register_accepts_legacy_user_type_key() {
        let req: RegisterRequest = serde_json::from_str(
            r#"{"firstName":"A","lastName":"B","email":"a@b.org","password":"longenough","userType":"supervisor"}"#,
        )
        .unwrap();
        assert_eq!(req.role, Some(Role::Supervisor));
    }
}
