use async_trait::async_trait;
use uuid::Uuid;

use crate::{db::PgStore, error::StoreResult, tasks::repo_types::Task};

#[async_trait]
pub trait TaskRepo: Send + Sync {
    async fn insert_task(&self, project_id: Uuid, name: &str) -> StoreResult<Task>;
    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>>;
    async fn list_tasks(&self, project_id: Uuid) -> StoreResult<Vec<Task>>;
    async fn set_task_completed(&self, id: Uuid, completed: bool) -> StoreResult<Option<Task>>;
    async fn delete_task(&self, id: Uuid) -> StoreResult<bool>;
}

#[async_trait]
impl TaskRepo for PgStore {
    async fn insert_task(&self, project_id: Uuid, name: &str) -> StoreResult<Task> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (project_id, name)
            VALUES ($1, $2)
            RETURNING id, project_id, name, completed, created_at
            "#,
        )
        .bind(project_id)
        .bind(name)
        .fetch_one(&self.pool)
        .await?;
        Ok(task)
    }

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>> {
        let task = sqlx::query_as::<_, Task>(
            "SELECT id, project_id, name, completed, created_at FROM tasks WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(task)
    }

    async fn list_tasks(&self, project_id: Uuid) -> StoreResult<Vec<Task>> {
        let rows = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, project_id, name, completed, created_at
            FROM tasks
            WHERE project_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn set_task_completed(&self, id: Uuid, completed: bool) -> StoreResult<Option<Task>> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks SET completed = $2
             WHERE id = $1
            RETURNING id, project_id, name, completed, created_at
            "#,
        )
        .bind(id)
        .bind(completed)
        .fetch_optional(&self.pool)
        .await?;
        Ok(task)
    }

    async fn delete_task(&self, id: Uuid) -> StoreResult<bool> {
        let res = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}
