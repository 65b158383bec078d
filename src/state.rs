use std::sync::Arc;

use anyhow::Context;

use crate::config::{AppConfig, StoreBackend};
use crate::db::{PgStore, Repo};
use crate::memory::MemoryStore;

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn Repo>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let repo = match config.store {
            StoreBackend::Postgres => {
                let url = config
                    .database_url
                    .as_deref()
                    .context("DATABASE_URL is not set")?;
                let store = PgStore::connect(url, config.max_connections).await?;
                store.migrate().await?;
                tracing::info!("database migrations applied");
                Arc::new(store) as Arc<dyn Repo>
            }
            StoreBackend::Memory => {
                tracing::warn!("using the in-memory store; data is lost on restart");
                Arc::new(MemoryStore::new()) as Arc<dyn Repo>
            }
        };

        Ok(Self::from_parts(repo, config))
    }

    pub fn from_parts(repo: Arc<dyn Repo>, config: Arc<AppConfig>) -> Self {
        Self { repo, config }
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        use time::UtcOffset;

        let config = Arc::new(AppConfig {
            store: StoreBackend::Memory,
            database_url: None,
            max_connections: 1,
            jwt: crate::config::JwtConfig {
                secret: "test".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_minutes: 5,
                refresh_ttl_minutes: 60,
            },
            utc_offset: UtcOffset::UTC,
        });

        Self::from_parts(Arc::new(MemoryStore::new()), config)
    }
}
