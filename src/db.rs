use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    auth::repo::UserRepo, notes::repo::NoteRepo, projects::repo::ProjectRepo,
    tasks::repo::TaskRepo,
};

/// Everything the handlers need from storage.
pub trait Repo: UserRepo + ProjectRepo + NoteRepo + TaskRepo {}

impl<T> Repo for T where T: UserRepo + ProjectRepo + NoteRepo + TaskRepo {}

/// Postgres-backed repository.
#[derive(Clone)]
pub struct PgStore {
    pub(crate) pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("connect to database")?;
        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("run migrations")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn migration_failures_are_reported() {
        let pool = PgPoolOptions::new()
            .acquire_timeout(Duration::from_millis(250))
            .connect_lazy("postgres://projectboard@127.0.0.1:1/projectboard")
            .unwrap();
        let store = PgStore { pool };

        let err = store.migrate().await.unwrap_err();
        assert!(format!("{err:#}").contains("run migrations"));
    }
}
