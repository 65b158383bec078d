use axum::{
    extract::{rejection::FormRejection, Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Form, Json, Router,
};
use serde_json::json;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::extractors::CurrentUser,
    error::ServiceError,
    projects::handlers::{owned_project, project_path, signed_in},
    state::AppState,
    tasks::{
        dto::{TaskParams, TasksPage},
        services::{self, NewTask},
    },
    web::{self, Flash},
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/projects/:id/tasks", get(index).post(create))
        .route("/projects/:id/tasks/:task_id", delete(destroy))
        .route("/projects/:id/tasks/:task_id/toggle", post(toggle))
}

#[instrument(skip(state, actor, headers))]
pub async fn index(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Response, Response> {
    let actor = signed_in(actor)?;
    let project = owned_project(&state, &actor, id).await?;
    let tasks = services::list_tasks(&*state.repo, project.id)
        .await
        .map_err(IntoResponse::into_response)?;

    let flash = Flash::pending(&headers);
    let page = TasksPage {
        notice: flash.map(Flash::message),
        project_id: project.id,
        tasks,
    };
    Ok(web::render_page(Json(page), flash))
}

#[instrument(skip(state, actor, form))]
pub async fn create(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<Uuid>,
    form: Result<Form<TaskParams>, FormRejection>,
) -> Result<Response, Response> {
    let actor = signed_in(actor)?;
    let project = owned_project(&state, &actor, id).await?;
    let Form(params) = form.map_err(IntoResponse::into_response)?;

    let new = NewTask {
        project_id: Some(project.id),
        name: params.name.clone(),
    };
    match services::create_task(&*state.repo, &new).await {
        Ok(_) => Ok(web::redirect_with_flash(&project_path(project.id), Flash::TaskCreated)),
        Err(ServiceError::Invalid(errors)) => Ok((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "name": params.name, "errors": errors })),
        )
            .into_response()),
        Err(e) => Err(e.into_response()),
    }
}

#[instrument(skip(state, actor))]
pub async fn toggle(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path((id, task_id)): Path<(Uuid, Uuid)>,
) -> Result<Response, Response> {
    let actor = signed_in(actor)?;
    let project = owned_project(&state, &actor, id).await?;
    services::toggle_task(&*state.repo, project.id, task_id)
        .await
        .map_err(IntoResponse::into_response)?;
    Ok(web::found(&project_path(project.id)))
}

#[instrument(skip(state, actor))]
pub async fn destroy(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path((id, task_id)): Path<(Uuid, Uuid)>,
) -> Result<Response, Response> {
    let actor = signed_in(actor)?;
    let project = owned_project(&state, &actor, id).await?;
    services::delete_task(&*state.repo, project.id, task_id)
        .await
        .map_err(IntoResponse::into_response)?;
    Ok(web::redirect_with_flash(&project_path(project.id), Flash::TaskDeleted))
}
