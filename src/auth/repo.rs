use async_trait::async_trait;
use sqlx::{types::Json, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo_types::{User, UserRow};
use crate::auth::roles::{Role, VerificationStatus};
use crate::store::{is_unique_violation, StoreError, StoreResult};

/// Persistence seam for principals.
///
/// `update` is a compare-and-swap on `User::version`: it fails with
/// [`StoreError::Stale`] when the stored record moved on since it was read,
/// and returns the record with its version bumped otherwise. `last_login`
/// belongs to `record_login`; `update` keeps whatever is stored.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    /// Principal holding `token` whose reset window is still open at `now`.
    async fn find_by_reset_token(
        &self,
        token: &str,
        now: OffsetDateTime,
    ) -> StoreResult<Option<User>>;
    async fn find_pending_admin_requests(&self) -> StoreResult<Vec<User>>;
    async fn insert(&self, user: User) -> StoreResult<User>;
    async fn update(&self, user: User) -> StoreResult<User>;
    /// Stamps a successful login without touching `version`.
    async fn record_login(&self, id: Uuid, at: OffsetDateTime) -> StoreResult<()>;
}

const USER_COLUMNS: &str = r#"
    id, first_name, last_name, email, password_hash, role,
    admin_status, admin_request_date, admin_verified_by, admin_verification_date,
    admin_rejection_reason, supervisor_profile, gardener_profile,
    profile_picture, phone_number, address,
    reset_password_token, reset_password_expires, last_login,
    created_at, updated_at, version
"#;

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(row.map(User::try_from).transpose()?)
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(email)
            .fetch_optional(&self.db)
            .await?;
        Ok(row.map(User::try_from).transpose()?)
    }

    async fn find_by_reset_token(
        &self,
        token: &str,
        now: OffsetDateTime,
    ) -> StoreResult<Option<User>> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users \
             WHERE reset_password_token = $1 AND reset_password_expires > $2"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(token)
            .bind(now)
            .fetch_optional(&self.db)
            .await?;
        Ok(row.map(User::try_from).transpose()?)
    }

    async fn find_pending_admin_requests(&self) -> StoreResult<Vec<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE role = $1 AND admin_status = $2");
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .bind(Role::Admin.as_str())
            .bind(VerificationStatus::Pending.as_str())
            .fetch_all(&self.db)
            .await?;
        rows.into_iter()
            .map(|r| User::try_from(r).map_err(StoreError::from))
            .collect()
    }

    async fn insert(&self, user: User) -> StoreResult<User> {
        let sql = format!(
            r#"
            INSERT INTO users (
                id, first_name, last_name, email, password_hash, role,
                admin_status, admin_request_date, admin_verified_by, admin_verification_date,
                admin_rejection_reason, supervisor_profile, gardener_profile,
                profile_picture, phone_number, address,
                reset_password_token, reset_password_expires, last_login,
                created_at, updated_at, version
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11,
                    $12, $13, $14, $15, $16, $17, $18, $19, $20, $21, $22)
            RETURNING {USER_COLUMNS}
            "#
        );
        let v = &user.admin_verification;
        let result = sqlx::query_as::<_, UserRow>(&sql)
            .bind(user.id)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.role.as_str())
            .bind(v.status.as_str())
            .bind(v.request_date)
            .bind(v.verified_by)
            .bind(v.verification_date)
            .bind(&v.rejection_reason)
            .bind(Json(&user.supervisor_profile))
            .bind(Json(&user.gardener_profile))
            .bind(&user.profile_picture)
            .bind(&user.phone_number)
            .bind(Json(&user.address))
            .bind(&user.reset_password_token)
            .bind(user.reset_password_expires)
            .bind(user.last_login)
            .bind(user.created_at)
            .bind(user.updated_at)
            .bind(user.version)
            .fetch_one(&self.db)
            .await;

        match result {
            Ok(row) => Ok(User::try_from(row)?),
            Err(err) if is_unique_violation(&err) => Err(StoreError::DuplicateEmail),
            Err(err) => Err(err.into()),
        }
    }

    async fn update(&self, user: User) -> StoreResult<User> {
        let sql = format!(
            r#"
            UPDATE users SET
                first_name = $3, last_name = $4, email = $5, password_hash = $6, role = $7,
                admin_status = $8, admin_request_date = $9, admin_verified_by = $10,
                admin_verification_date = $11, admin_rejection_reason = $12,
                supervisor_profile = $13, gardener_profile = $14,
                profile_picture = $15, phone_number = $16, address = $17,
                reset_password_token = $18, reset_password_expires = $19,
                updated_at = $20, version = version + 1
            WHERE id = $1 AND version = $2
            RETURNING {USER_COLUMNS}
            "#
        );
        let v = &user.admin_verification;
        let result = sqlx::query_as::<_, UserRow>(&sql)
            .bind(user.id)
            .bind(user.version)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.role.as_str())
            .bind(v.status.as_str())
            .bind(v.request_date)
            .bind(v.verified_by)
            .bind(v.verification_date)
            .bind(&v.rejection_reason)
            .bind(Json(&user.supervisor_profile))
            .bind(Json(&user.gardener_profile))
            .bind(&user.profile_picture)
            .bind(&user.phone_number)
            .bind(Json(&user.address))
            .bind(&user.reset_password_token)
            .bind(user.reset_password_expires)
            .bind(user.updated_at)
            .fetch_optional(&self.db)
            .await;

        match result {
            Ok(Some(row)) => Ok(User::try_from(row)?),
            // Either the row is gone or another writer bumped the version.
            Ok(None) => Err(StoreError::Stale),
            Err(err) if is_unique_violation(&err) => Err(StoreError::DuplicateEmail),
            Err(err) => Err(err.into()),
        }
    }

    async fn record_login(&self, id: Uuid, at: OffsetDateTime) -> StoreResult<()> {
        let done = sqlx::query("UPDATE users SET last_login = $2, updated_at = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(&self.db)
            .await?;
        if done.rows_affected() == 0 {
            return Err(StoreError::Stale);
        }
        Ok(())
    }
}
