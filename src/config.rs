use serde::Deserialize;
use tracing::warn;

const DEV_SESSION_SECRET: &str = "dev-session-secret";
const DEV_RESET_SECRET: &str = "dev-reset-secret";

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub session_secret: String,
    pub reset_secret: String,
    pub issuer: String,
    pub audience: String,
    pub session_ttl_days: i64,
    pub reset_ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// When unset the service runs on in-memory stores.
    pub database_url: Option<String>,
    pub jwt: JwtConfig,
    pub server: ServerConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").filter(|v| !v.trim().is_empty());

        let session_secret = lookup("JWT_SECRET").unwrap_or_else(|| {
            warn!("JWT_SECRET not set; using development session secret");
            DEV_SESSION_SECRET.into()
        });
        let reset_secret = lookup("JWT_RESET_SECRET").unwrap_or_else(|| {
            warn!("JWT_RESET_SECRET not set; using development reset secret");
            DEV_RESET_SECRET.into()
        });
        anyhow::ensure!(
            session_secret != reset_secret,
            "JWT_SECRET and JWT_RESET_SECRET must differ"
        );

        let jwt = JwtConfig {
            session_secret,
            reset_secret,
            issuer: lookup("JWT_ISSUER").unwrap_or_else(|| "gardenhub".into()),
            audience: lookup("JWT_AUDIENCE").unwrap_or_else(|| "gardenhub-users".into()),
            session_ttl_days: lookup("JWT_SESSION_TTL_DAYS")
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(30),
            reset_ttl_minutes: lookup("JWT_RESET_TTL_MINUTES")
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60),
        };

        let port = match lookup("APP_PORT") {
            Some(v) => v.parse::<u16>()?,
            None => 8080,
        };
        let server = ServerConfig {
            host: lookup("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
        };

        Ok(Self {
            database_url,
            jwt,
            server,
        })
    }
}
