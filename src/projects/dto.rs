use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::{
    notes::repo_types::Note, projects::repo_types::Project, tasks::repo_types::Task,
    validation::ValidationErrors,
};

/// Submitted project attributes, from the browser form or the JSON API.
///
/// On update an absent field keeps its stored value; a blank `description`
/// or `due_on` clears it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectParams {
    pub name: Option<String>,
    pub description: Option<String>,
    pub due_on: Option<String>,
}

/// Body of `POST /api/projects`.
#[derive(Debug, Deserialize)]
pub struct ApiProjectRequest {
    pub project: ProjectParams,
}

/// Form-encoded body of `POST /api/projects` (`project[name]=...`).
#[derive(Debug, Default, Deserialize)]
pub struct ApiProjectForm {
    #[serde(rename = "project[name]")]
    pub name: Option<String>,
    #[serde(rename = "project[description]")]
    pub description: Option<String>,
    #[serde(rename = "project[due_on]")]
    pub due_on: Option<String>,
}

impl From<ApiProjectForm> for ProjectParams {
    fn from(form: ApiProjectForm) -> Self {
        Self {
            name: form.name,
            description: form.description,
            due_on: form.due_on,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProjectView {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub due_on: Option<Date>,
    pub completed: bool,
    pub late: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl ProjectView {
    pub fn new(project: Project, today: Date) -> Self {
        let late = project.is_late(today);
        Self {
            id: project.id,
            owner_id: project.owner_id,
            name: project.name,
            description: project.description,
            due_on: project.due_on,
            completed: project.completed,
            late,
            created_at: project.created_at,
            updated_at: project.updated_at,
        }
    }
}

/// Dashboard and index listing.
#[derive(Debug, Serialize)]
pub struct ProjectsPage {
    pub notice: Option<&'static str>,
    pub projects: Vec<ProjectView>,
}

/// Detail view of one project for its owner.
#[derive(Debug, Serialize)]
pub struct ProjectPage {
    pub notice: Option<&'static str>,
    pub project: ProjectView,
    pub owner: String,
    pub completed_label: Option<&'static str>,
    /// Whether the "Complete" action is offered.
    pub can_complete: bool,
    pub notes: Vec<Note>,
    pub tasks: Vec<Task>,
}

#[derive(Debug, Default, Serialize)]
pub struct ProjectFields {
    pub name: String,
    pub description: String,
    pub due_on: String,
}

impl From<&Project> for ProjectFields {
    fn from(p: &Project) -> Self {
        Self {
            name: p.name.clone(),
            description: p.description.clone().unwrap_or_default(),
            due_on: p.due_on.map(|d| d.to_string()).unwrap_or_default(),
        }
    }
}

impl ProjectFields {
    /// Re-fills the form with what was submitted, on top of `base`.
    pub fn resubmitted(mut self, params: ProjectParams) -> Self {
        if let Some(name) = params.name {
            self.name = name;
        }
        if let Some(description) = params.description {
            self.description = description;
        }
        if let Some(due_on) = params.due_on {
            self.due_on = due_on;
        }
        self
    }
}

/// New/edit form, re-shown with errors after an invalid submission.
#[derive(Debug, Serialize)]
pub struct ProjectFormPage {
    pub title: &'static str,
    pub action: String,
    pub method: &'static str,
    pub submit: &'static str,
    pub fields: ProjectFields,
    pub errors: ValidationErrors,
}

impl ProjectFormPage {
    pub fn new_project(fields: ProjectFields, errors: ValidationErrors) -> Self {
        Self {
            title: "New Project",
            action: "/projects".into(),
            method: "post",
            submit: "Create Project",
            fields,
            errors,
        }
    }

    pub fn edit_project(id: Uuid, fields: ProjectFields, errors: ValidationErrors) -> Self {
        Self {
            title: "Edit Project",
            action: format!("/projects/{id}"),
            method: "patch",
            submit: "Update Project",
            fields,
            errors,
        }
    }
}
