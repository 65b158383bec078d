use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::notes::repo_types::Note;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NoteParams {
    pub message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub term: Option<String>,
}

/// Notes of one project, optionally filtered by a search term.
#[derive(Debug, Serialize)]
pub struct NotesPage {
    pub notice: Option<&'static str>,
    pub project_id: Uuid,
    pub term: Option<String>,
    pub notes: Vec<Note>,
}
