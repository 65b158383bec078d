use async_trait::async_trait;
use uuid::Uuid;

use crate::{db::PgStore, error::StoreResult, notes::repo_types::Note};

#[async_trait]
pub trait NoteRepo: Send + Sync {
    async fn insert_note(&self, project_id: Uuid, user_id: Uuid, message: &str) -> StoreResult<Note>;
    async fn find_note(&self, id: Uuid) -> StoreResult<Option<Note>>;
    async fn list_notes(&self, project_id: Uuid) -> StoreResult<Vec<Note>>;
    /// Notes whose message contains `term`, ignoring case; optionally limited to one project.
    async fn search_notes(&self, project_id: Option<Uuid>, term: &str) -> StoreResult<Vec<Note>>;
    async fn delete_note(&self, id: Uuid) -> StoreResult<bool>;
}

/// Escapes LIKE metacharacters so the term matches literally.
pub(crate) fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

#[async_trait]
impl NoteRepo for PgStore {
    async fn insert_note(&self, project_id: Uuid, user_id: Uuid, message: &str) -> StoreResult<Note> {
        let note = sqlx::query_as::<_, Note>(
            r#"
            INSERT INTO notes (project_id, user_id, message)
            VALUES ($1, $2, $3)
            RETURNING id, project_id, user_id, message, created_at
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .bind(message)
        .fetch_one(&self.pool)
        .await?;
        Ok(note)
    }

    async fn find_note(&self, id: Uuid) -> StoreResult<Option<Note>> {
        let note = sqlx::query_as::<_, Note>(
            "SELECT id, project_id, user_id, message, created_at FROM notes WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(note)
    }

    async fn list_notes(&self, project_id: Uuid) -> StoreResult<Vec<Note>> {
        let rows = sqlx::query_as::<_, Note>(
            r#"
            SELECT id, project_id, user_id, message, created_at
            FROM notes
            WHERE project_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn search_notes(&self, project_id: Option<Uuid>, term: &str) -> StoreResult<Vec<Note>> {
        let rows = sqlx::query_as::<_, Note>(
            r#"
            SELECT id, project_id, user_id, message, created_at
            FROM notes
            WHERE message ILIKE $1 ESCAPE '\'
              AND ($2::uuid IS NULL OR project_id = $2)
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(like_pattern(term))
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn delete_note(&self, id: Uuid) -> StoreResult<bool> {
        let res = sqlx::query("DELETE FROM notes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::like_pattern;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("first"), "%first%");
        assert_eq!(like_pattern("100%"), "%100\\%%");
        assert_eq!(like_pattern("a_b\\c"), "%a\\_b\\\\c%");
        assert_eq!(like_pattern(""), "%%");
    }
}
