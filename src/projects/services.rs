use time::{
    format_description::well_known::Rfc3339, macros::format_description, Date, OffsetDateTime,
    PrimitiveDateTime,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    error::{ServiceError, StoreError},
    projects::{
        dto::ProjectParams,
        repo::ProjectRepo,
        repo_types::{Project, ProjectAttrs},
    },
    validation::{is_blank, ValidationErrors, BLANK, INVALID_DATE, TAKEN},
};

/// Accepts a bare date, an RFC 3339 timestamp, or `YYYY-MM-DD HH:MM:SS` with an
/// optional `UTC` or `±HHMM` suffix. Timestamps keep only their date part.
fn parse_due_on(raw: &str) -> Result<Option<Date>, time::error::Parse> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    if let Ok(date) = Date::parse(raw, format_description!("[year]-[month]-[day]")) {
        return Ok(Some(date));
    }
    if let Ok(at) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Ok(Some(at.date()));
    }
    if let Ok(at) = OffsetDateTime::parse(
        raw,
        format_description!(
            "[year]-[month]-[day] [hour]:[minute]:[second] [offset_hour sign:mandatory][offset_minute]"
        ),
    ) {
        return Ok(Some(at.date()));
    }
    let local = raw.strip_suffix(" UTC").unwrap_or(raw);
    PrimitiveDateTime::parse(
        local,
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    )
    .map(|at| Some(at.date()))
}

fn non_blank(value: &str) -> Option<String> {
    (!value.trim().is_empty()).then(|| value.to_string())
}

/// Applies submitted params over `base`, recording unparseable input in `errors`.
fn merge(mut base: ProjectAttrs, params: &ProjectParams, errors: &mut ValidationErrors) -> ProjectAttrs {
    if let Some(name) = &params.name {
        base.name = name.clone();
    }
    if let Some(description) = &params.description {
        base.description = non_blank(description);
    }
    if let Some(raw) = &params.due_on {
        match parse_due_on(raw) {
            Ok(due_on) => base.due_on = due_on,
            Err(_) => errors.add("due_on", INVALID_DATE),
        }
    }
    base
}

/// Presence and per-owner uniqueness of `name`.
async fn validate<R>(
    repo: &R,
    owner_id: Uuid,
    attrs: &ProjectAttrs,
    except: Option<Uuid>,
    errors: &mut ValidationErrors,
) -> Result<(), ServiceError>
where
    R: ProjectRepo + ?Sized,
{
    if is_blank(Some(&attrs.name)) {
        errors.add("name", BLANK);
    } else if repo.project_name_taken(owner_id, &attrs.name, except).await? {
        errors.add("name", TAKEN);
    }
    Ok(())
}

/// Storage rejected a name the pre-check let through (concurrent write).
fn name_race(e: StoreError) -> ServiceError {
    match e {
        StoreError::UniqueViolation(constraint) => {
            warn!(%constraint, "project name claimed concurrently");
            ServiceError::Invalid(ValidationErrors::single("name", TAKEN))
        }
        other => other.into(),
    }
}

pub async fn find_project<R>(repo: &R, id: Uuid) -> Result<Project, ServiceError>
where
    R: ProjectRepo + ?Sized,
{
    repo.find_project(id).await?.ok_or(ServiceError::NotFound)
}

pub async fn list_projects<R>(repo: &R, owner_id: Uuid) -> Result<Vec<Project>, ServiceError>
where
    R: ProjectRepo + ?Sized,
{
    Ok(repo.list_projects_by_owner(owner_id).await?)
}

pub async fn create_project<R>(
    repo: &R,
    owner_id: Uuid,
    params: &ProjectParams,
) -> Result<Project, ServiceError>
where
    R: ProjectRepo + ?Sized,
{
    let mut errors = ValidationErrors::new();
    let blank = ProjectAttrs {
        name: String::new(),
        description: None,
        due_on: None,
        completed: false,
    };
    let attrs = merge(blank, params, &mut errors);
    validate(repo, owner_id, &attrs, None, &mut errors).await?;
    errors.into_result()?;

    let project = repo.insert_project(owner_id, &attrs).await.map_err(name_race)?;
    info!(project_id = %project.id, %owner_id, "project created");
    Ok(project)
}

/// Re-validates the merged attributes; the stored record is untouched on failure.
pub async fn update_project<R>(
    repo: &R,
    project: &Project,
    params: &ProjectParams,
) -> Result<Project, ServiceError>
where
    R: ProjectRepo + ?Sized,
{
    let mut errors = ValidationErrors::new();
    let attrs = merge(ProjectAttrs::from(project), params, &mut errors);
    validate(repo, project.owner_id, &attrs, Some(project.id), &mut errors).await?;
    errors.into_result()?;

    let updated = repo
        .update_project(project.id, &attrs)
        .await
        .map_err(name_race)?
        .ok_or(ServiceError::NotFound)?;
    info!(project_id = %updated.id, "project updated");
    Ok(updated)
}

/// Removes the project; its notes and tasks go with it.
pub async fn destroy_project<R>(repo: &R, project: &Project) -> Result<(), ServiceError>
where
    R: ProjectRepo + ?Sized,
{
    if !repo.delete_project(project.id).await? {
        return Err(ServiceError::NotFound);
    }
    info!(project_id = %project.id, "project deleted");
    Ok(())
}

/// Marks the project completed. Completing a completed project changes nothing.
pub async fn complete_project<R>(repo: &R, project: &Project) -> Result<Project, ServiceError>
where
    R: ProjectRepo + ?Sized,
{
    if project.completed {
        return Ok(project.clone());
    }
    let attrs = ProjectAttrs {
        completed: true,
        ..ProjectAttrs::from(project)
    };
    let updated = repo
        .update_project(project.id, &attrs)
        .await?
        .ok_or(ServiceError::NotFound)?;
    info!(project_id = %updated.id, "project completed");
    Ok(updated)
}
