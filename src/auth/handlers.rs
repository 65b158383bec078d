use axum::{
    extract::{FromRef, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Form, Json, Router,
};
use tracing::{error, info, instrument};

use crate::{
    auth::{
        dto::{
            AuthResponse, LoginRequest, PublicUser, RefreshRequest, RegisterRequest, SignInForm,
            SignInPage,
        },
        extractors::AuthUser,
        jwt::JwtKeys,
        repo_types::User,
        services::{authenticate, register_user, AuthError},
    },
    state::AppState,
    web::{self, Flash, SESSION_COOKIE, SIGN_IN_PATH},
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route(SIGN_IN_PATH, get(sign_in_page).post(sign_in))
        .route("/users/sign_out", delete(sign_out))
}

fn internal<E: std::fmt::Display>(e: E) -> (StatusCode, String) {
    error!(error = %e, "auth request failed");
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

fn issue_tokens(state: &AppState, user: &User) -> Result<AuthResponse, (StatusCode, String)> {
    let keys = JwtKeys::from_ref(state);
    let access_token = keys.sign_access(user.id).map_err(internal)?;
    let refresh_token = keys.sign_refresh(user.id).map_err(internal)?;
    Ok(AuthResponse {
        access_token,
        refresh_token,
        authentication_token: user.authentication_token.clone(),
        user: PublicUser::from(user),
    })
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), (StatusCode, String)> {
    let user = register_user(&*state.repo, payload)
        .await
        .map_err(|e| match e {
            AuthError::EmailTaken => (StatusCode::CONFLICT, "Email already registered".to_string()),
            AuthError::Internal(inner) => internal(inner),
            other => (StatusCode::BAD_REQUEST, other.to_string()),
        })?;
    Ok((StatusCode::CREATED, Json(issue_tokens(&state, &user)?)))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, (StatusCode, String)> {
    let user = authenticate(&*state.repo, &payload.email, &payload.password)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::UNAUTHORIZED, "Invalid credentials".to_string()))?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(Json(issue_tokens(&state, &user)?))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<AuthResponse>, (StatusCode, String)> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_refresh(&payload.refresh_token)
        .map_err(|e| (StatusCode::UNAUTHORIZED, e.to_string()))?;

    let user = state
        .repo
        .find_user(claims.sub)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::UNAUTHORIZED, "User not found".to_string()))?;

    Ok(Json(issue_tokens(&state, &user)?))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<PublicUser>, (StatusCode, String)> {
    let user = state
        .repo
        .find_user(user_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| {
            error!(user_id = %user_id, "user not found");
            (StatusCode::UNAUTHORIZED, "User not found".to_string())
        })?;

    Ok(Json(PublicUser::from(&user)))
}

fn sign_in_form(notice: Option<Flash>, alert: Option<&'static str>) -> SignInPage {
    SignInPage {
        action: SIGN_IN_PATH,
        fields: ["email", "password"],
        notice: notice.map(Flash::message),
        alert,
    }
}

pub async fn sign_in_page(headers: HeaderMap) -> Response {
    let flash = Flash::pending(&headers);
    web::render_page(Json(sign_in_form(flash, None)), flash)
}

#[instrument(skip(state, form))]
pub async fn sign_in(State(state): State<AppState>, Form(form): Form<SignInForm>) -> Response {
    let user = match authenticate(&*state.repo, &form.email, &form.password).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            return (
                StatusCode::UNAUTHORIZED,
                Json(sign_in_form(None, Some("Invalid Email or password."))),
            )
                .into_response()
        }
        Err(e) => return internal(e).into_response(),
    };

    let keys = JwtKeys::from_ref(&state);
    let token = match keys.sign_access(user.id) {
        Ok(t) => t,
        Err(e) => return internal(e).into_response(),
    };

    info!(user_id = %user.id, "browser session started");
    let mut response = web::redirect_with_flash(web::DASHBOARD_PATH, Flash::SignedIn);
    web::set_cookie(
        &mut response,
        SESSION_COOKIE,
        &token,
        Some(keys.access_ttl.as_secs() as i64),
    );
    response
}

pub async fn sign_out() -> Response {
    let mut response = web::redirect_with_flash(SIGN_IN_PATH, Flash::SignedOut);
    web::clear_cookie(&mut response, SESSION_COOKIE);
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{app::build_app, testing};
    use axum::{
        body::{to_bytes, Body},
        http::{
            header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE},
            Request,
        },
    };
    use tower::ServiceExt;

    #[test]
    fn public_user_serialization_hides_credentials() {
        let user = testing::user_record("test@example.com");
        let json = serde_json::to_string(&PublicUser::from(&user)).unwrap();
        assert!(json.contains("test@example.com"));
        assert!(json.contains("Aaron Sumner"));
        assert!(!json.contains(&user.authentication_token));
    }

    #[tokio::test]
    async fn register_returns_tokens_and_rejects_duplicates() {
        let state = AppState::fake();
        let body = r#"{"email":"new@example.com","password":"dottle-nouveau","first_name":"Ichi","last_name":"Tatsu"}"#;
        let req = || {
            Request::post("/auth/register")
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body))
                .unwrap()
        };

        let res = build_app(state.clone()).oneshot(req()).await.unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        let json: serde_json::Value =
            serde_json::from_slice(&to_bytes(res.into_body(), usize::MAX).await.unwrap()).unwrap();
        assert_eq!(json["user"]["name"], "Ichi Tatsu");
        assert_eq!(json["authentication_token"].as_str().unwrap().len(), 24);

        let res = build_app(state).oneshot(req()).await.unwrap();
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn browser_sign_in_sets_a_session_and_redirects_home() {
        let state = AppState::fake();
        let user = testing::create_user_with_password(&state, "tester@example.com", "dottle-nouveau").await;

        let res = build_app(state.clone())
            .oneshot(
                Request::post(SIGN_IN_PATH)
                    .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from("email=tester%40example.com&password=dottle-nouveau"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::FOUND);
        assert_eq!(res.headers()[LOCATION], "/");

        let session = res
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find(|c| c.starts_with("session="))
            .expect("session cookie");
        let token = session
            .trim_start_matches("session=")
            .split(';')
            .next()
            .unwrap();
        let keys = JwtKeys::from_ref(&state);
        assert_eq!(keys.verify_access(token).unwrap(), user.id);
    }

    #[tokio::test]
    async fn browser_sign_in_rejects_bad_passwords() {
        let state = AppState::fake();
        testing::create_user_with_password(&state, "tester@example.com", "dottle-nouveau").await;

        let res = build_app(state)
            .oneshot(
                Request::post(SIGN_IN_PATH)
                    .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from("email=tester%40example.com&password=nope"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert!(res.headers().get(SET_COOKIE).is_none());
    }

    #[tokio::test]
    async fn me_requires_a_bearer_token() {
        let state = AppState::fake();
        let user = testing::create_user(&state, "Aaron", "Sumner").await;
        let token = JwtKeys::from_ref(&state).sign_access(user.id).unwrap();

        let res = build_app(state.clone())
            .oneshot(Request::get("/me").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        let res = build_app(state)
            .oneshot(
                Request::get("/me")
                    .header("authorization", format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn sign_in_page_shows_and_clears_the_sign_out_notice() {
        let res = build_app(AppState::fake())
            .oneshot(
                Request::get(SIGN_IN_PATH)
                    .header(COOKIE, "flash=signed_out")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.headers()[SET_COOKIE].to_str().unwrap().contains("Max-Age=0"));
        let json: serde_json::Value =
            serde_json::from_slice(&to_bytes(res.into_body(), usize::MAX).await.unwrap()).unwrap();
        assert_eq!(json["notice"], "Signed out successfully.");
    }
}
