use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    auth::{
        repo::UserRepo,
        repo_types::{NewUser, User},
    },
    error::{StoreError, StoreResult},
    notes::{repo::NoteRepo, repo_types::Note},
    projects::{
        repo::ProjectRepo,
        repo_types::{Project, ProjectAttrs},
    },
    tasks::{repo::TaskRepo, repo_types::Task},
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    projects: Vec<Project>,
    notes: Vec<Note>,
    tasks: Vec<Task>,
}

/// In-process repository with the same constraints as the Postgres schema.
///
/// All tables sit behind one lock, so unique checks and cascading deletes are atomic.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| anyhow::anyhow!("memory store lock poisoned").into())
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| anyhow::anyhow!("memory store lock poisoned").into())
    }
}

fn name_taken(projects: &[Project], owner_id: Uuid, name: &str, except: Option<Uuid>) -> bool {
    projects
        .iter()
        .any(|p| p.owner_id == owner_id && p.name == name && Some(p.id) != except)
}

#[async_trait]
impl UserRepo for MemoryStore {
    async fn insert_user(&self, new: &NewUser) -> StoreResult<User> {
        let mut t = self.write()?;
        if t.users.iter().any(|u| u.email == new.email) {
            return Err(StoreError::UniqueViolation("users_email_key".into()));
        }
        if t
            .users
            .iter()
            .any(|u| u.authentication_token == new.authentication_token)
        {
            return Err(StoreError::UniqueViolation(
                "users_authentication_token_key".into(),
            ));
        }
        let user = User {
            id: Uuid::new_v4(),
            email: new.email.clone(),
            first_name: new.first_name.clone(),
            last_name: new.last_name.clone(),
            password_hash: new.password_hash.clone(),
            authentication_token: new.authentication_token.clone(),
            created_at: OffsetDateTime::now_utc(),
        };
        t.users.push(user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.read()?.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self.read()?.users.iter().find(|u| u.email == email).cloned())
    }
}

#[async_trait]
impl ProjectRepo for MemoryStore {
    async fn insert_project(&self, owner_id: Uuid, attrs: &ProjectAttrs) -> StoreResult<Project> {
        let mut t = self.write()?;
        if !t.users.iter().any(|u| u.id == owner_id) {
            return Err(anyhow::anyhow!("projects.owner_id references a missing user").into());
        }
        if name_taken(&t.projects, owner_id, &attrs.name, None) {
            return Err(StoreError::UniqueViolation("projects_owner_id_name_key".into()));
        }
        let now = OffsetDateTime::now_utc();
        let project = Project {
            id: Uuid::new_v4(),
            owner_id,
            name: attrs.name.clone(),
            description: attrs.description.clone(),
            due_on: attrs.due_on,
            completed: attrs.completed,
            created_at: now,
            updated_at: now,
        };
        t.projects.push(project.clone());
        Ok(project)
    }

    async fn update_project(&self, id: Uuid, attrs: &ProjectAttrs) -> StoreResult<Option<Project>> {
        let mut t = self.write()?;
        let Some(owner_id) = t.projects.iter().find(|p| p.id == id).map(|p| p.owner_id) else {
            return Ok(None);
        };
        if name_taken(&t.projects, owner_id, &attrs.name, Some(id)) {
            return Err(StoreError::UniqueViolation("projects_owner_id_name_key".into()));
        }
        let Some(project) = t.projects.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        project.name = attrs.name.clone();
        project.description = attrs.description.clone();
        project.due_on = attrs.due_on;
        project.completed = attrs.completed;
        project.updated_at = OffsetDateTime::now_utc();
        Ok(Some(project.clone()))
    }

    async fn delete_project(&self, id: Uuid) -> StoreResult<bool> {
        let mut t = self.write()?;
        let before = t.projects.len();
        t.projects.retain(|p| p.id != id);
        if t.projects.len() == before {
            return Ok(false);
        }
        t.notes.retain(|n| n.project_id != id);
        t.tasks.retain(|task| task.project_id != id);
        Ok(true)
    }

    async fn find_project(&self, id: Uuid) -> StoreResult<Option<Project>> {
        Ok(self.read()?.projects.iter().find(|p| p.id == id).cloned())
    }

    async fn list_projects_by_owner(&self, owner_id: Uuid) -> StoreResult<Vec<Project>> {
        let mut rows: Vec<Project> = self
            .read()?
            .projects
            .iter()
            .filter(|p| p.owner_id == owner_id)
            .cloned()
            .collect();
        rows.sort_by(Project::listing_order);
        Ok(rows)
    }

    async fn project_name_taken(
        &self,
        owner_id: Uuid,
        name: &str,
        except: Option<Uuid>,
    ) -> StoreResult<bool> {
        Ok(name_taken(&self.read()?.projects, owner_id, name, except))
    }

    async fn count_projects(&self, owner_id: Option<Uuid>) -> StoreResult<i64> {
        let t = self.read()?;
        let count = t
            .projects
            .iter()
            .filter(|p| owner_id.map_or(true, |o| p.owner_id == o))
            .count();
        Ok(count as i64)
    }
}

#[async_trait]
impl NoteRepo for MemoryStore {
    async fn insert_note(&self, project_id: Uuid, user_id: Uuid, message: &str) -> StoreResult<Note> {
        let mut t = self.write()?;
        if !t.projects.iter().any(|p| p.id == project_id) {
            return Err(anyhow::anyhow!("notes.project_id references a missing project").into());
        }
        if !t.users.iter().any(|u| u.id == user_id) {
            return Err(anyhow::anyhow!("notes.user_id references a missing user").into());
        }
        let note = Note {
            id: Uuid::new_v4(),
            project_id,
            user_id,
            message: message.to_string(),
            created_at: OffsetDateTime::now_utc(),
        };
        t.notes.push(note.clone());
        Ok(note)
    }

    async fn find_note(&self, id: Uuid) -> StoreResult<Option<Note>> {
        Ok(self.read()?.notes.iter().find(|n| n.id == id).cloned())
    }

    async fn list_notes(&self, project_id: Uuid) -> StoreResult<Vec<Note>> {
        Ok(self
            .read()?
            .notes
            .iter()
            .filter(|n| n.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn search_notes(&self, project_id: Option<Uuid>, term: &str) -> StoreResult<Vec<Note>> {
        Ok(self
            .read()?
            .notes
            .iter()
            .filter(|n| project_id.map_or(true, |p| n.project_id == p))
            .filter(|n| n.matches(term))
            .cloned()
            .collect())
    }

    async fn delete_note(&self, id: Uuid) -> StoreResult<bool> {
        let mut t = self.write()?;
        let before = t.notes.len();
        t.notes.retain(|n| n.id != id);
        Ok(t.notes.len() != before)
    }
}

#[async_trait]
impl TaskRepo for MemoryStore {
    async fn insert_task(&self, project_id: Uuid, name: &str) -> StoreResult<Task> {
        let mut t = self.write()?;
        if !t.projects.iter().any(|p| p.id == project_id) {
            return Err(anyhow::anyhow!("tasks.project_id references a missing project").into());
        }
        let task = Task {
            id: Uuid::new_v4(),
            project_id,
            name: name.to_string(),
            completed: false,
            created_at: OffsetDateTime::now_utc(),
        };
        t.tasks.push(task.clone());
        Ok(task)
    }

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>> {
        Ok(self.read()?.tasks.iter().find(|task| task.id == id).cloned())
    }

    async fn list_tasks(&self, project_id: Uuid) -> StoreResult<Vec<Task>> {
        Ok(self
            .read()?
            .tasks
            .iter()
            .filter(|task| task.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn set_task_completed(&self, id: Uuid, completed: bool) -> StoreResult<Option<Task>> {
        let mut t = self.write()?;
        Ok(t.tasks.iter_mut().find(|task| task.id == id).map(|task| {
            task.completed = completed;
            task.clone()
        }))
    }

    async fn delete_task(&self, id: Uuid) -> StoreResult<bool> {
        let mut t = self.write()?;
        let before = t.tasks.len();
        t.tasks.retain(|task| task.id != id);
        Ok(t.tasks.len() != before)
    }
}
