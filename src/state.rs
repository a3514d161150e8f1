use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

use crate::auth::jwt::TokenService;
use crate::auth::memory::MemoryUserStore;
use crate::auth::repo::{PgUserStore, UserStore};
use crate::config::{AppConfig, JwtConfig, ServerConfig};
use crate::plants::repo::{MemoryPlantStore, PgPlantStore, PlantStore};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub tokens: TokenService,
    pub users: Arc<dyn UserStore>,
    pub plants: Arc<dyn PlantStore>,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let config = Arc::new(config);

        let (users, plants) = match &config.database_url {
            Some(url) => {
                let db = PgPoolOptions::new()
                    .max_connections(10)
                    .connect(url)
                    .await
                    .context("connect to database")?;
                sqlx::migrate!("./migrations")
                    .run(&db)
                    .await
                    .context("run migrations")?;
                info!("using postgres stores");
                (
                    Arc::new(PgUserStore::new(db.clone())) as Arc<dyn UserStore>,
                    Arc::new(PgPlantStore::new(db)) as Arc<dyn PlantStore>,
                )
            }
            None => {
                warn!("DATABASE_URL not set; records live in memory and vanish on restart");
                (
                    Arc::new(MemoryUserStore::new()) as Arc<dyn UserStore>,
                    Arc::new(MemoryPlantStore::new()) as Arc<dyn PlantStore>,
                )
            }
        };

        Ok(Self::from_parts(config, users, plants))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        users: Arc<dyn UserStore>,
        plants: Arc<dyn PlantStore>,
    ) -> Self {
        let tokens = TokenService::new(&config.jwt);
        Self {
            config,
            tokens,
            users,
            plants,
        }
    }

    /// In-memory state with fixed secrets, for tests.
    pub fn fake() -> Self {
        let config = Arc::new(AppConfig {
            database_url: None,
            jwt: JwtConfig {
                session_secret: "test-session".into(),
                reset_secret: "test-reset".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                session_ttl_days: 30,
                reset_ttl_minutes: 60,
            },
            server: ServerConfig {
                host: "127.0.0.1".into(),
                port: 0,
            },
        });
        Self::from_parts(
            config,
            Arc::new(MemoryUserStore::new()),
            Arc::new(MemoryPlantStore::new()),
        )
    }
}
