use axum::{
    async_trait,
    extract::{FromRequest, Path, Request, State},
    http::{header::CONTENT_TYPE, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Form, Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::extractors::ApiUser,
    error::ServiceError,
    projects::{
        dto::{ApiProjectForm, ApiProjectRequest, ProjectParams, ProjectView},
        services,
    },
    state::AppState,
};

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/api/projects", get(list).post(create))
        .route("/api/projects/:id", get(show))
}

/// Project attributes from either a JSON `{"project": {...}}` body or a
/// form-encoded `project[...]` body.
pub struct ProjectPayload(pub ProjectParams);

#[async_trait]
impl<S> FromRequest<S> for ProjectPayload
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_form = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));

        if is_form {
            let Form(form) = Form::<ApiProjectForm>::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;
            Ok(Self(form.into()))
        } else {
            let Json(body) = Json::<ApiProjectRequest>::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;
            Ok(Self(body.project))
        }
    }
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn list(
    State(state): State<AppState>,
    ApiUser(user): ApiUser,
) -> Result<Json<Vec<ProjectView>>, ServiceError> {
    let today = state.config.today();
    let projects = services::list_projects(&*state.repo, user.id).await?;
    Ok(Json(
        projects.into_iter().map(|p| ProjectView::new(p, today)).collect(),
    ))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    ApiUser(user): ApiUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ProjectView>, ServiceError> {
    let project = services::find_project(&*state.repo, id).await?;
    if !project.is_owned_by(user.id) {
        return Err(ServiceError::NotFound);
    }
    Ok(Json(ProjectView::new(project, state.config.today())))
}

#[instrument(skip(state, user, params), fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    ApiUser(user): ApiUser,
    ProjectPayload(params): ProjectPayload,
) -> Result<Response, ServiceError> {
    let project = services::create_project(&*state.repo, user.id, &params).await?;
    let view = ProjectView::new(project, state.config.today());
    Ok((StatusCode::CREATED, Json(view)).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{app::build_app, auth::repo_types::User, testing};
    use axum::{
        body::{to_bytes, Body},
        http::{Method, Request},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn credentials(user: &User) -> String {
        format!(
            "user_email={}&user_token={}",
            user.email, user.authentication_token
        )
    }

    async fn call(state: &AppState, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let req = match body {
            Some(body) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        send(state, req).await
    }

    async fn send(state: &AppState, req: Request<Body>) -> (StatusCode, Value) {
        let res = build_app(state.clone()).oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn lists_only_the_callers_projects() {
        let state = AppState::fake();
        let user = testing::create_user(&state, "Aaron", "Sumner").await;
        let other = testing::create_user(&state, "ichi", "tatsu").await;
        testing::create_project(&state, &user, "Sample Project").await;
        testing::create_project(&state, &other, "Someone else's").await;

        let (status, body) = call(
            &state,
            Method::GET,
            &format!("/api/projects?{}", credentials(&user)),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let list = body.as_array().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0]["name"], "Sample Project");
        assert_eq!(list[0]["late"], false);
    }

    #[tokio::test]
    async fn shows_an_owned_project_and_hides_others() {
        let state = AppState::fake();
        let user = testing::create_user(&state, "Aaron", "Sumner").await;
        let other = testing::create_user(&state, "ichi", "tatsu").await;
        let mine = testing::create_project(&state, &user, "Sample Project").await;
        let theirs = testing::create_project(&state, &other, "Hidden").await;

        let (status, body) = call(
            &state,
            Method::GET,
            &format!("/api/projects/{}?{}", mine.id, credentials(&user)),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], mine.id.to_string());
        assert_eq!(body["name"], "Sample Project");

        let (status, _) = call(
            &state,
            Method::GET,
            &format!("/api/projects/{}?{}", theirs.id, credentials(&user)),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn creates_a_project() {
        let state = AppState::fake();
        let user = testing::create_user(&state, "Aaron", "Sumner").await;

        let (status, body) = call(
            &state,
            Method::POST,
            &format!("/api/projects?{}", credentials(&user)),
            Some(json!({ "project": { "name": "Test Project", "due_on": "2026-12-01" } })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["name"], "Test Project");
        assert_eq!(body["due_on"], "2026-12-01");
        assert_eq!(state.repo.count_projects(Some(user.id)).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn creates_a_project_from_a_form_with_a_timestamp_due_date() {
        let state = AppState::fake();
        let user = testing::create_user(&state, "Aaron", "Sumner").await;

        let (status, body) = call(
            &state,
            Method::POST,
            &format!("/api/projects?{}", credentials(&user)),
            Some(json!({ "project": { "name": "Project 1", "due_on": "2026-10-23 10:00:00 UTC" } })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["due_on"], "2026-10-23");

        let req = Request::post(format!("/api/projects?{}", credentials(&user)))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(
                "project%5Bname%5D=Project+2&project%5Bdescription%5D=A+test+project.\
                 &project%5Bdue_on%5D=2026-10-23+10%3A00%3A00+UTC",
            ))
            .unwrap();
        let (status, body) = send(&state, req).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["name"], "Project 2");
        assert_eq!(body["description"], "A test project.");
        assert_eq!(body["due_on"], "2026-10-23");

        assert_eq!(state.repo.count_projects(Some(user.id)).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn invalid_create_reports_errors() {
        let state = AppState::fake();
        let user = testing::create_user(&state, "Aaron", "Sumner").await;

        let (status, body) = call(
            &state,
            Method::POST,
            &format!("/api/projects?{}", credentials(&user)),
            Some(json!({ "project": { "name": "" } })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["errors"]["name"][0], "can't be blank");
        assert_eq!(state.repo.count_projects(None).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn bad_credentials_are_unauthorized() {
        let state = AppState::fake();
        let user = testing::create_user(&state, "Aaron", "Sumner").await;

        for query in [
            format!("user_email={}&user_token=wrong", user.email),
            "user_email=nobody@example.com&user_token=abc".to_string(),
            String::new(),
        ] {
            let (status, _) = call(&state, Method::GET, &format!("/api/projects?{query}"), None).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{query}");
        }
    }
}
