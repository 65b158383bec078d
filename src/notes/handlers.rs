use axum::{
    extract::{rejection::FormRejection, Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get},
    Form, Json, Router,
};
use serde_json::json;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::extractors::CurrentUser,
    error::ServiceError,
    notes::{
        dto::{NoteParams, NotesPage, SearchQuery},
        services::{self, NewNote},
    },
    projects::handlers::{owned_project, project_path, signed_in},
    state::AppState,
    web::{self, Flash},
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/projects/:id/notes", get(index).post(create))
        .route("/projects/:id/notes/:note_id", delete(destroy))
}

#[instrument(skip(state, actor, headers))]
pub async fn index(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Query(query): Query<SearchQuery>,
) -> Result<Response, Response> {
    let actor = signed_in(actor)?;
    let project = owned_project(&state, &actor, id).await?;

    let notes = match query.term.as_deref() {
        Some(term) => services::search_project_notes(&*state.repo, project.id, term).await,
        None => services::list_notes(&*state.repo, project.id).await,
    }
    .map_err(IntoResponse::into_response)?;

    let flash = Flash::pending(&headers);
    let page = NotesPage {
        notice: flash.map(Flash::message),
        project_id: project.id,
        term: query.term,
        notes,
    };
    Ok(web::render_page(Json(page), flash))
}

#[instrument(skip(state, actor, form))]
pub async fn create(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<Uuid>,
    form: Result<Form<NoteParams>, FormRejection>,
) -> Result<Response, Response> {
    let actor = signed_in(actor)?;
    let project = owned_project(&state, &actor, id).await?;
    let Form(params) = form.map_err(IntoResponse::into_response)?;

    let new = NewNote {
        project_id: Some(project.id),
        user_id: Some(actor.id),
        message: params.message.clone(),
    };
    match services::create_note(&*state.repo, &new).await {
        Ok(_) => Ok(web::redirect_with_flash(&project_path(project.id), Flash::NoteCreated)),
        Err(ServiceError::Invalid(errors)) => Ok((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "message": params.message, "errors": errors })),
        )
            .into_response()),
        Err(e) => Err(e.into_response()),
    }
}

#[instrument(skip(state, actor))]
pub async fn destroy(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path((id, note_id)): Path<(Uuid, Uuid)>,
) -> Result<Response, Response> {
    let actor = signed_in(actor)?;
    let project = owned_project(&state, &actor, id).await?;
    services::delete_note(&*state.repo, project.id, note_id)
        .await
        .map_err(IntoResponse::into_response)?;
    Ok(web::redirect_with_flash(&project_path(project.id), Flash::NoteDeleted))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{app::build_app, testing};
    use axum::{
        body::{to_bytes, Body},
        http::{
            header::{CONTENT_TYPE, COOKIE, LOCATION},
            Method, Request,
        },
    };
    use serde_json::Value;
    use tower::ServiceExt;

    async fn send(state: &AppState, method: Method, uri: &str, cookie: Option<&str>, form: Option<&str>) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(COOKIE, cookie);
        }
        let req = match form {
            Some(body) => builder
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        build_app(state.clone()).oneshot(req).await.unwrap()
    }

    async fn json_body(res: Response) -> Value {
        serde_json::from_slice(&to_bytes(res.into_body(), usize::MAX).await.unwrap()).unwrap()
    }

    #[tokio::test]
    async fn owner_adds_and_searches_notes() {
        let state = AppState::fake();
        let user = testing::create_user(&state, "Aaron", "Sumner").await;
        let project = testing::create_project(&state, &user, "Kitchen").await;
        let cookie = testing::session_cookie(&state, &user);
        let uri = format!("/projects/{}/notes", project.id);

        for message in ["This+is+the+first+note.", "Buy+eggs", "First%2C+preheat+the+oven."] {
            let res = send(&state, Method::POST, &uri, Some(&cookie), Some(&format!("message={message}"))).await;
            assert_eq!(res.status(), StatusCode::FOUND);
            assert_eq!(res.headers()[LOCATION], project_path(project.id).as_str());
        }

        let res = send(&state, Method::GET, &format!("{uri}?term=first"), Some(&cookie), None).await;
        assert_eq!(res.status(), StatusCode::OK);
        let page = json_body(res).await;
        let messages: Vec<_> = page["notes"]
            .as_array()
            .unwrap()
            .iter()
            .map(|n| n["message"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(messages, ["This is the first note.", "First, preheat the oven."]);

        let page = json_body(send(&state, Method::GET, &uri, Some(&cookie), None).await).await;
        assert_eq!(page["notes"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn blank_messages_are_rejected() {
        let state = AppState::fake();
        let user = testing::create_user(&state, "Aaron", "Sumner").await;
        let project = testing::create_project(&state, &user, "Kitchen").await;
        let cookie = testing::session_cookie(&state, &user);

        let res = send(
            &state,
            Method::POST,
            &format!("/projects/{}/notes", project.id),
            Some(&cookie),
            Some("message="),
        )
        .await;
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json_body(res).await["errors"]["message"][0], "can't be blank");
        assert!(state.repo.list_notes(project.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn notes_follow_the_project_gate() {
        let state = AppState::fake();
        let project = testing::create_project_with_notes(&state, 1).await;
        let note = state.repo.list_notes(project.id).await.unwrap().remove(0);
        let stranger = testing::create_user(&state, "ichi", "tatsu").await;
        let cookie = testing::session_cookie(&state, &stranger);
        let member = format!("/projects/{}/notes/{}", project.id, note.id);

        let res = send(&state, Method::DELETE, &member, None, None).await;
        assert_eq!(res.headers()[LOCATION], "/users/sign_in");
        let res = send(&state, Method::DELETE, &member, Some(&cookie), None).await;
        assert_eq!(res.status(), StatusCode::FOUND);
        assert_eq!(res.headers()[LOCATION], "/");
        assert_eq!(state.repo.list_notes(project.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn owner_deletes_a_note() {
        let state = AppState::fake();
        let project = testing::create_project_with_notes(&state, 2).await;
        let note = state.repo.list_notes(project.id).await.unwrap().remove(0);
        let owner = state.repo.find_user(project.owner_id).await.unwrap().unwrap();
        let cookie = testing::session_cookie(&state, &owner);

        let res = send(
            &state,
            Method::DELETE,
            &format!("/projects/{}/notes/{}", project.id, note.id),
            Some(&cookie),
            None,
        )
        .await;
        assert_eq!(res.status(), StatusCode::FOUND);
        assert_eq!(state.repo.list_notes(project.id).await.unwrap().len(), 1);

        let res = send(
            &state,
            Method::DELETE,
            &format!("/projects/{}/notes/{}", project.id, Uuid::new_v4()),
            Some(&cookie),
            None,
        )
        .await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }
}
