use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    db::PgStore,
    error::StoreResult,
    projects::repo_types::{Project, ProjectAttrs},
};

const PROJECT_COLUMNS: &str =
    "id, owner_id, name, description, due_on, completed, created_at, updated_at";

#[async_trait]
pub trait ProjectRepo: Send + Sync {
    /// Fails with `StoreError::UniqueViolation` when the owner already has a project of that name.
    async fn insert_project(&self, owner_id: Uuid, attrs: &ProjectAttrs) -> StoreResult<Project>;
    /// Overwrites the mutable columns; `None` when the project no longer exists.
    async fn update_project(&self, id: Uuid, attrs: &ProjectAttrs) -> StoreResult<Option<Project>>;
    /// Deletes the project together with its notes and tasks.
    async fn delete_project(&self, id: Uuid) -> StoreResult<bool>;
    async fn find_project(&self, id: Uuid) -> StoreResult<Option<Project>>;
    async fn list_projects_by_owner(&self, owner_id: Uuid) -> StoreResult<Vec<Project>>;
    async fn project_name_taken(
        &self,
        owner_id: Uuid,
        name: &str,
        except: Option<Uuid>,
    ) -> StoreResult<bool>;
    /// Number of projects, for one owner or across all owners.
    async fn count_projects(&self, owner_id: Option<Uuid>) -> StoreResult<i64>;
}

#[async_trait]
impl ProjectRepo for PgStore {
    async fn insert_project(&self, owner_id: Uuid, attrs: &ProjectAttrs) -> StoreResult<Project> {
        let project = sqlx::query_as::<_, Project>(&format!(
            r#"
            INSERT INTO projects (owner_id, name, description, due_on, completed)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {PROJECT_COLUMNS}
            "#
        ))
        .bind(owner_id)
        .bind(&attrs.name)
        .bind(&attrs.description)
        .bind(attrs.due_on)
        .bind(attrs.completed)
        .fetch_one(&self.pool)
        .await?;
        Ok(project)
    }

    async fn update_project(&self, id: Uuid, attrs: &ProjectAttrs) -> StoreResult<Option<Project>> {
        let project = sqlx::query_as::<_, Project>(&format!(
            r#"
            UPDATE projects
               SET name = $2, description = $3, due_on = $4, completed = $5, updated_at = now()
             WHERE id = $1
            RETURNING {PROJECT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&attrs.name)
        .bind(&attrs.description)
        .bind(attrs.due_on)
        .bind(attrs.completed)
        .fetch_optional(&self.pool)
        .await?;
        Ok(project)
    }

    async fn delete_project(&self, id: Uuid) -> StoreResult<bool> {
        // notes and tasks go with it through ON DELETE CASCADE
        let res = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn find_project(&self, id: Uuid) -> StoreResult<Option<Project>> {
        let project = sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(project)
    }

    async fn list_projects_by_owner(&self, owner_id: Uuid) -> StoreResult<Vec<Project>> {
        let rows = sqlx::query_as::<_, Project>(&format!(
            r#"
            SELECT {PROJECT_COLUMNS}
            FROM projects
            WHERE owner_id = $1
            ORDER BY due_on ASC NULLS LAST, name ASC
            "#
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn project_name_taken(
        &self,
        owner_id: Uuid,
        name: &str,
        except: Option<Uuid>,
    ) -> StoreResult<bool> {
        let taken: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM projects
                 WHERE owner_id = $1
                   AND name = $2
                   AND ($3::uuid IS NULL OR id <> $3)
            )
            "#,
        )
        .bind(owner_id)
        .bind(name)
        .bind(except)
        .fetch_one(&self.pool)
        .await?;
        Ok(taken)
    }

    async fn count_projects(&self, owner_id: Option<Uuid>) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM projects WHERE ($1::uuid IS NULL OR owner_id = $1)",
        )
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}
