use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use time::OffsetDateTime;
use uuid::Uuid;

use super::roles::{Role, Standing, VerificationStatus};
use super::verification::AdminVerification;

/// Principal record as held by the credential store.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,                // lowercase, unique
    pub password_hash: String,        // Argon2 hash, never serialized
    pub role: Role,
    pub admin_verification: AdminVerification,
    pub supervisor_profile: SupervisorProfile,
    pub gardener_profile: GardenerProfile,
    pub profile_picture: Option<String>,
    pub phone_number: Option<String>,
    pub address: Address,
    pub reset_password_token: Option<String>,
    pub reset_password_expires: Option<OffsetDateTime>,
    pub last_login: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub version: i64,                 // optimistic concurrency token
}

impl User {
    pub fn new(
        first_name: String,
        last_name: String,
        email: String,
        password_hash: String,
        role: Role,
        now: OffsetDateTime,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            first_name,
            last_name,
            email,
            password_hash,
            role,
            admin_verification: AdminVerification::default(),
            supervisor_profile: SupervisorProfile::default(),
            gardener_profile: GardenerProfile::default(),
            profile_picture: None,
            phone_number: None,
            address: Address::default(),
            reset_password_token: None,
            reset_password_expires: None,
            last_login: None,
            created_at: now,
            updated_at: now,
            version: 1,
        }
    }

    pub fn standing(&self) -> Standing {
        Standing::of(self.role, self.admin_verification.status)
    }

    pub fn is_effective_admin(&self) -> bool {
        self.standing().is_effective_admin()
    }

    /// Projection attached to requests: no credential, no reset token.
    pub fn without_secrets(mut self) -> Self {
        self.password_hash.clear();
        self.reset_password_token = None;
        self.reset_password_expires = None;
        self
    }

    pub fn open_reset_window(&mut self, token: String, expires: OffsetDateTime) {
        self.reset_password_token = Some(token);
        self.reset_password_expires = Some(expires);
    }

    pub fn close_reset_window(&mut self) {
        self.reset_password_token = None;
        self.reset_password_expires = None;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub country: Option<String>,
}

impl Address {
    /// Shallow merge: supplied keys overwrite, absent keys are kept.
    pub fn merge(&mut self, patch: Address) {
        let Address {
            street,
            city,
            state,
            zip_code,
            country,
        } = patch;
        if street.is_some() {
            self.street = street;
        }
        if city.is_some() {
            self.city = city;
        }
        if state.is_some() {
            self.state = state;
        }
        if zip_code.is_some() {
            self.zip_code = zip_code;
        }
        if country.is_some() {
            self.country = country;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupervisorProfile {
    pub department: Option<String>,
    #[serde(default)]
    pub managed_areas: Vec<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub supervisor_since: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupervisorProfilePatch {
    pub department: Option<String>,
    pub managed_areas: Option<Vec<String>>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub supervisor_since: Option<OffsetDateTime>,
}

impl SupervisorProfile {
    pub fn merge(&mut self, patch: SupervisorProfilePatch) {
        if patch.department.is_some() {
            self.department = patch.department;
        }
        if let Some(areas) = patch.managed_areas {
            self.managed_areas = areas;
        }
        if patch.supervisor_since.is_some() {
            self.supervisor_since = patch.supervisor_since;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GardenerProfile {
    pub specialization: Option<String>,
    #[serde(default)]
    pub assigned_areas: Vec<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub gardener_since: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GardenerProfilePatch {
    pub specialization: Option<String>,
    pub assigned_areas: Option<Vec<String>>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub gardener_since: Option<OffsetDateTime>,
}

impl GardenerProfile {
    pub fn merge(&mut self, patch: GardenerProfilePatch) {
        if patch.specialization.is_some() {
            self.specialization = patch.specialization;
        }
        if let Some(areas) = patch.assigned_areas {
            self.assigned_areas = areas;
        }
        if patch.gardener_since.is_some() {
            self.gardener_since = patch.gardener_since;
        }
    }
}

/// Row shape of the `users` table.
#[derive(Debug, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub admin_status: String,
    pub admin_request_date: Option<OffsetDateTime>,
    pub admin_verified_by: Option<Uuid>,
    pub admin_verification_date: Option<OffsetDateTime>,
    pub admin_rejection_reason: Option<String>,
    pub supervisor_profile: Json<SupervisorProfile>,
    pub gardener_profile: Json<GardenerProfile>,
    pub profile_picture: Option<String>,
    pub phone_number: Option<String>,
    pub address: Json<Address>,
    pub reset_password_token: Option<String>,
    pub reset_password_expires: Option<OffsetDateTime>,
    pub last_login: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub version: i64,
}

impl TryFrom<UserRow> for User {
    type Error = anyhow::Error;

    fn try_from(r: UserRow) -> anyhow::Result<Self> {
        let role = Role::parse(&r.role)
            .ok_or_else(|| anyhow::anyhow!("unknown role {:?} for user {}", r.role, r.id))?;
        let status = VerificationStatus::parse(&r.admin_status).ok_or_else(|| {
            anyhow::anyhow!("unknown admin status {:?} for user {}", r.admin_status, r.id)
        })?;
        Ok(Self {
            id: r.id,
            first_name: r.first_name,
            last_name: r.last_name,
            email: r.email,
            password_hash: r.password_hash,
            role,
            admin_verification: AdminVerification {
                status,
                request_date: r.admin_request_date,
                verified_by: r.admin_verified_by,
                verification_date: r.admin_verification_date,
                rejection_reason: r.admin_rejection_reason,
            },
            supervisor_profile: r.supervisor_profile.0,
            gardener_profile: r.gardener_profile.0,
            profile_picture: r.profile_picture,
            phone_number: r.phone_number,
            address: r.address.0,
            reset_password_token: r.reset_password_token,
            reset_password_expires: r.reset_password_expires,
            last_login: r.last_login,
            created_at: r.created_at,
            updated_at: r.updated_at,
            version: r.version,
        })
    }
}
