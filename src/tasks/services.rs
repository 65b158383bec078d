use tracing::info;
use uuid::Uuid;

use crate::{
    error::ServiceError,
    projects::repo::ProjectRepo,
    tasks::{repo::TaskRepo, repo_types::Task},
    validation::{is_blank, ValidationErrors, BLANK, MUST_EXIST},
};

#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub project_id: Option<Uuid>,
    pub name: Option<String>,
}

/// Creates a task. A blank name and a missing project are reported together.
pub async fn create_task<R>(repo: &R, new: &NewTask) -> Result<Task, ServiceError>
where
    R: TaskRepo + ProjectRepo + ?Sized,
{
    let mut errors = ValidationErrors::new();
    let name = new.name.as_deref().filter(|n| !is_blank(Some(n)));
    if name.is_none() {
        errors.add("name", BLANK);
    }
    let project_id = match new.project_id {
        Some(id) if repo.find_project(id).await?.is_some() => Some(id),
        _ => None,
    };
    if project_id.is_none() {
        errors.add("project", MUST_EXIST);
    }

    let (Some(project_id), Some(name)) = (project_id, name) else {
        return Err(errors.into());
    };
    let task = repo.insert_task(project_id, name).await?;
    info!(task_id = %task.id, %project_id, "task created");
    Ok(task)
}

pub async fn list_tasks<R>(repo: &R, project_id: Uuid) -> Result<Vec<Task>, ServiceError>
where
    R: TaskRepo + ?Sized,
{
    Ok(repo.list_tasks(project_id).await?)
}

async fn task_in_project<R>(repo: &R, project_id: Uuid, task_id: Uuid) -> Result<Task, ServiceError>
where
    R: TaskRepo + ?Sized,
{
    repo.find_task(task_id)
        .await?
        .filter(|t| t.project_id == project_id)
        .ok_or(ServiceError::NotFound)
}

/// Flips the completion flag of a task in `project_id`.
pub async fn toggle_task<R>(repo: &R, project_id: Uuid, task_id: Uuid) -> Result<Task, ServiceError>
where
    R: TaskRepo + ?Sized,
{
    let task = task_in_project(repo, project_id, task_id).await?;
    let toggled = repo
        .set_task_completed(task.id, !task.completed)
        .await?
        .ok_or(ServiceError::NotFound)?;
    info!(%task_id, completed = toggled.completed, "task toggled");
    Ok(toggled)
}

pub async fn delete_task<R>(repo: &R, project_id: Uuid, task_id: Uuid) -> Result<(), ServiceError>
where
    R: TaskRepo + ?Sized,
{
    task_in_project(repo, project_id, task_id).await?;
    if !repo.delete_task(task_id).await? {
        return Err(ServiceError::NotFound);
    }
    info!(%task_id, %project_id, "task deleted");
    Ok(())
}
