use axum::{
    extract::{rejection::FormRejection, Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{extractors::CurrentUser, repo_types::User},
    error::ServiceError,
    notes::services::list_notes,
    projects::{
        access,
        dto::{ProjectFields, ProjectFormPage, ProjectPage, ProjectParams, ProjectView, ProjectsPage},
        repo_types::Project,
        services,
    },
    state::AppState,
    tasks::services::list_tasks,
    validation::ValidationErrors,
    web::{self, Flash, DASHBOARD_PATH, SIGN_IN_PATH},
};

pub fn web_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard))
        .route("/projects", get(index).post(create))
        .route("/projects/new", get(new_project))
        .route(
            "/projects/:id",
            get(show).patch(update).put(update).delete(destroy),
        )
        .route("/projects/:id/edit", get(edit))
        .route("/projects/:id/complete", post(complete))
}

/// The signed-in actor, or the redirect to the sign-in page.
pub(crate) fn signed_in(actor: Option<User>) -> Result<User, Response> {
    access::require_actor(actor).map_err(|_| web::found(SIGN_IN_PATH))
}

/// Loads a project for `actor`, redirecting to the dashboard when it belongs to someone else.
pub(crate) async fn owned_project(
    state: &AppState,
    actor: &User,
    id: Uuid,
) -> Result<Project, Response> {
    let project = services::find_project(&*state.repo, id)
        .await
        .map_err(IntoResponse::into_response)?;
    if let Err(redirect) = access::authorize(Some(actor.id), project.owner_id).ensure() {
        warn!(user_id = %actor.id, project_id = %id, "not the project owner; redirecting");
        return Err(redirect);
    }
    Ok(project)
}

pub(crate) fn project_path(id: Uuid) -> String {
    format!("/projects/{id}")
}

fn form_body(form: Result<Form<ProjectParams>, FormRejection>) -> Result<ProjectParams, Response> {
    form.map(|Form(params)| params)
        .map_err(IntoResponse::into_response)
}

fn unprocessable(page: ProjectFormPage) -> Response {
    (StatusCode::UNPROCESSABLE_ENTITY, Json(page)).into_response()
}

async fn projects_page(state: &AppState, actor: &User, headers: &HeaderMap) -> Result<Response, Response> {
    let today = state.config.today();
    let projects = services::list_projects(&*state.repo, actor.id)
        .await
        .map_err(IntoResponse::into_response)?
        .into_iter()
        .map(|p| ProjectView::new(p, today))
        .collect();
    let flash = Flash::pending(headers);
    let page = ProjectsPage {
        notice: flash.map(Flash::message),
        projects,
    };
    Ok(web::render_page(Json(page), flash))
}

#[instrument(skip(state, actor, headers))]
pub async fn dashboard(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    headers: HeaderMap,
) -> Result<Response, Response> {
    let actor = signed_in(actor)?;
    projects_page(&state, &actor, &headers).await
}

#[instrument(skip(state, actor, headers))]
pub async fn index(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    headers: HeaderMap,
) -> Result<Response, Response> {
    let actor = signed_in(actor)?;
    projects_page(&state, &actor, &headers).await
}

pub async fn new_project(CurrentUser(actor): CurrentUser) -> Result<Response, Response> {
    signed_in(actor)?;
    let page = ProjectFormPage::new_project(ProjectFields::default(), ValidationErrors::new());
    Ok(Json(page).into_response())
}

#[instrument(skip(state, actor, form))]
pub async fn create(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    form: Result<Form<ProjectParams>, FormRejection>,
) -> Result<Response, Response> {
    let actor = signed_in(actor)?;
    let params = form_body(form)?;

    match services::create_project(&*state.repo, actor.id, &params).await {
        Ok(project) => Ok(web::redirect_with_flash(
            &project_path(project.id),
            Flash::ProjectCreated,
        )),
        Err(ServiceError::Invalid(errors)) => {
            let fields = ProjectFields::default().resubmitted(params);
            Ok(unprocessable(ProjectFormPage::new_project(fields, errors)))
        }
        Err(e) => Err(e.into_response()),
    }
}

#[instrument(skip(state, actor, headers))]
pub async fn show(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Response, Response> {
    let actor = signed_in(actor)?;
    let project = owned_project(&state, &actor, id).await?;

    let repo = &*state.repo;
    let notes = list_notes(repo, project.id)
        .await
        .map_err(IntoResponse::into_response)?;
    let tasks = list_tasks(repo, project.id)
        .await
        .map_err(IntoResponse::into_response)?;

    let flash = Flash::pending(&headers);
    let completed = project.completed;
    let page = ProjectPage {
        notice: flash.map(Flash::message),
        owner: format!("Owner: {}", actor.name()),
        completed_label: completed.then_some("Completed"),
        can_complete: !completed && project.is_owned_by(actor.id),
        project: ProjectView::new(project, state.config.today()),
        notes,
        tasks,
    };
    Ok(web::render_page(Json(page), flash))
}

#[instrument(skip(state, actor))]
pub async fn edit(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Response, Response> {
    let actor = signed_in(actor)?;
    let project = owned_project(&state, &actor, id).await?;
    let page = ProjectFormPage::edit_project(
        project.id,
        ProjectFields::from(&project),
        ValidationErrors::new(),
    );
    Ok(Json(page).into_response())
}

#[instrument(skip(state, actor, form))]
pub async fn update(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<Uuid>,
    form: Result<Form<ProjectParams>, FormRejection>,
) -> Result<Response, Response> {
    let actor = signed_in(actor)?;
    let project = owned_project(&state, &actor, id).await?;
    let params = form_body(form)?;

    match services::update_project(&*state.repo, &project, &params).await {
        Ok(updated) => Ok(web::redirect_with_flash(
            &project_path(updated.id),
            Flash::ProjectUpdated,
        )),
        Err(ServiceError::Invalid(errors)) => {
            let fields = ProjectFields::from(&project).resubmitted(params);
            Ok(unprocessable(ProjectFormPage::edit_project(project.id, fields, errors)))
        }
        Err(e) => Err(e.into_response()),
    }
}

#[instrument(skip(state, actor))]
pub async fn destroy(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Response, Response> {
    let actor = signed_in(actor)?;
    let project = owned_project(&state, &actor, id).await?;
    services::destroy_project(&*state.repo, &project)
        .await
        .map_err(IntoResponse::into_response)?;
    Ok(web::redirect_with_flash(DASHBOARD_PATH, Flash::ProjectDeleted))
}

#[instrument(skip(state, actor))]
pub async fn complete(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Response, Response> {
    let actor = signed_in(actor)?;
    let project = owned_project(&state, &actor, id).await?;
    services::complete_project(&*state.repo, &project)
        .await
        .map_err(IntoResponse::into_response)?;
    Ok(web::redirect_with_flash(
        &project_path(project.id),
        Flash::ProjectCompleted,
    ))
}
