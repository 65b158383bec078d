use tracing::info;
use uuid::Uuid;

use crate::{
    auth::repo::UserRepo,
    error::ServiceError,
    notes::repo::NoteRepo,
    notes::repo_types::Note,
    projects::repo::ProjectRepo,
    validation::{is_blank, ValidationErrors, BLANK, MUST_EXIST},
};

/// A note as submitted; every reference is checked before anything is written.
#[derive(Debug, Clone, Default)]
pub struct NewNote {
    pub project_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub message: Option<String>,
}

pub async fn create_note<R>(repo: &R, new: &NewNote) -> Result<Note, ServiceError>
where
    R: NoteRepo + ProjectRepo + UserRepo + ?Sized,
{
    let mut errors = ValidationErrors::new();
    let message = new.message.as_deref().filter(|m| !is_blank(Some(m)));
    if message.is_none() {
        errors.add("message", BLANK);
    }

    let project_id = match new.project_id {
        Some(id) if repo.find_project(id).await?.is_some() => Some(id),
        _ => None,
    };
    if project_id.is_none() {
        errors.add("project", MUST_EXIST);
    }
    let user_id = match new.user_id {
        Some(id) if repo.find_user(id).await?.is_some() => Some(id),
        _ => None,
    };
    if user_id.is_none() {
        errors.add("user", MUST_EXIST);
    }
    let (Some(project_id), Some(user_id), Some(message)) = (project_id, user_id, message) else {
        return Err(errors.into());
    };
    let note = repo.insert_note(project_id, user_id, message).await?;
    info!(note_id = %note.id, %project_id, "note created");
    Ok(note)
}

pub async fn list_notes<R>(repo: &R, project_id: Uuid) -> Result<Vec<Note>, ServiceError>
where
    R: NoteRepo + ?Sized,
{
    Ok(repo.list_notes(project_id).await?)
}

/// Every note whose message contains `term`, ignoring case. An empty term matches all notes.
pub async fn search_notes<R>(repo: &R, term: &str) -> Result<Vec<Note>, ServiceError>
where
    R: NoteRepo + ?Sized,
{
    Ok(repo.search_notes(None, term).await?)
}

pub async fn search_project_notes<R>(
    repo: &R,
    project_id: Uuid,
    term: &str,
) -> Result<Vec<Note>, ServiceError>
where
    R: NoteRepo + ?Sized,
{
    Ok(repo.search_notes(Some(project_id), term).await?)
}

/// Deletes `note_id` if it belongs to `project_id`.
pub async fn delete_note<R>(repo: &R, project_id: Uuid, note_id: Uuid) -> Result<(), ServiceError>
where
    R: NoteRepo + ?Sized,
{
    match repo.find_note(note_id).await? {
        Some(note) if note.project_id == project_id => {}
        _ => return Err(ServiceError::NotFound),
    }
    if !repo.delete_note(note_id).await? {
        return Err(ServiceError::NotFound);
    }
    info!(%note_id, %project_id, "note deleted");
    Ok(())
}
