use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use super::claims::{Claims, TokenKind};
use crate::config::JwtConfig;

/// Every verification failure collapses into this one error.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("invalid or expired token")]
    InvalidOrExpired,
}

#[derive(Clone)]
struct ScopeKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl ScopeKeys {
    fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }
}

/// Issues and verifies session and reset tokens. Each kind is signed with
/// its own secret.
#[derive(Clone)]
pub struct TokenService {
    session: ScopeKeys,
    reset: ScopeKeys,
    issuer: String,
    audience: String,
}

impl TokenService {
    pub fn new(cfg: &JwtConfig) -> Self {
        Self {
            session: ScopeKeys::new(&cfg.session_secret, Duration::days(cfg.session_ttl_days)),
            reset: ScopeKeys::new(&cfg.reset_secret, Duration::minutes(cfg.reset_ttl_minutes)),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
        }
    }

    fn keys(&self, kind: TokenKind) -> &ScopeKeys {
        match kind {
            TokenKind::Session => &self.session,
            TokenKind::Reset => &self.reset,
        }
    }

    pub fn ttl(&self, kind: TokenKind) -> Duration {
        self.keys(kind).ttl
    }

    pub fn issue_at(
        &self,
        user_id: Uuid,
        kind: TokenKind,
        now: OffsetDateTime,
    ) -> anyhow::Result<String> {
        let keys = self.keys(kind);
        let exp = now + keys.ttl;
        let claims = Claims {
            sub: user_id,
            iat: now.unix_timestamp(),
            exp: exp.unix_timestamp(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            kind,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding)?;
        debug!(user_id = %user_id, kind = ?kind, "jwt signed");
        Ok(token)
    }

    pub fn issue_session(&self, user_id: Uuid) -> anyhow::Result<String> {
        self.issue_at(user_id, TokenKind::Session, OffsetDateTime::now_utc())
    }

    pub fn issue_reset(&self, user_id: Uuid) -> anyhow::Result<String> {
        self.issue_at(user_id, TokenKind::Reset, OffsetDateTime::now_utc())
    }

    /// Checks signature, issuer, audience, scope and expiry against `now`.
    pub fn verify_at(
        &self,
        token: &str,
        kind: TokenKind,
        now: OffsetDateTime,
    ) -> Result<Uuid, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        // Expiry is compared against the caller's clock below.
        validation.validate_exp = false;

        let data = decode::<Claims>(token, &self.keys(kind).decoding, &validation).map_err(|e| {
            debug!(error = %e, kind = ?kind, "jwt rejected");
            TokenError::InvalidOrExpired
        })?;
        let claims = data.claims;

        if claims.kind != kind {
            debug!(expected = ?kind, got = ?claims.kind, "jwt scope mismatch");
            return Err(TokenError::InvalidOrExpired);
        }
        if claims.exp <= now.unix_timestamp() {
            debug!(user_id = %claims.sub, kind = ?kind, "jwt expired");
            return Err(TokenError::InvalidOrExpired);
        }

        debug!(user_id = %claims.sub, kind = ?kind, "jwt verified");
        Ok(claims.sub)
    }

    pub fn verify(&self, token: &str, kind: TokenKind) -> Result<Uuid, TokenError> {
        self.verify_at(token, kind, OffsetDateTime::now_utc())
    }
}
