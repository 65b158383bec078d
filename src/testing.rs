//! Builders shared by the test modules, in the spirit of factories.

use axum::extract::FromRef;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    auth::{
        jwt::JwtKeys,
        repo_types::{NewUser, User},
        services::{generate_api_token, hash_password},
    },
    projects::repo_types::{Project, ProjectAttrs},
    state::AppState,
    web::SESSION_COOKIE,
};

/// An unsaved user, for code that only needs the shape.
pub fn user_record(email: &str) -> User {
    User {
        id: Uuid::new_v4(),
        email: email.to_string(),
        first_name: "Aaron".into(),
        last_name: "Sumner".into(),
        password_hash: "not-a-hash".into(),
        authentication_token: generate_api_token(),
        created_at: OffsetDateTime::now_utc(),
    }
}

async fn insert(state: &AppState, email: String, first: &str, last: &str, password_hash: String) -> User {
    state
        .repo
        .insert_user(&NewUser {
            email,
            first_name: first.into(),
            last_name: last.into(),
            password_hash,
            authentication_token: generate_api_token(),
        })
        .await
        .unwrap()
}

/// A stored user with a unique email and no usable password.
pub async fn create_user(state: &AppState, first: &str, last: &str) -> User {
    let email = format!("tester{}@example.com", Uuid::new_v4().simple());
    insert(state, email, first, last, "not-a-hash".into()).await
}

pub async fn create_user_with_password(state: &AppState, email: &str, password: &str) -> User {
    let hash = hash_password(password).unwrap();
    insert(state, email.to_string(), "Aaron", "Sumner", hash).await
}

/// `Cookie` header value carrying a session for `user`.
pub fn session_cookie(state: &AppState, user: &User) -> String {
    let token = JwtKeys::from_ref(state).sign_access(user.id).unwrap();
    format!("{SESSION_COOKIE}={token}")
}

pub async fn create_project(state: &AppState, owner: &User, name: &str) -> Project {
    let attrs = ProjectAttrs {
        name: name.to_string(),
        description: Some("A test project.".into()),
        due_on: None,
        completed: false,
    };
    state.repo.insert_project(owner.id, &attrs).await.unwrap()
}

/// A project for a fresh owner, with `count` notes by that owner.
pub async fn create_project_with_notes(state: &AppState, count: usize) -> Project {
    let owner = create_user(state, "Aaron", "Sumner").await;
    let project = create_project(state, &owner, "Test Project").await;
    for _ in 0..count {
        state
            .repo
            .insert_note(project.id, owner.id, "Test note")
            .await
            .unwrap();
    }
    project
}
