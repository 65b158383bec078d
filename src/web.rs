use axum::{
    http::{
        header::{COOKIE, LOCATION, SET_COOKIE},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
};

pub const SIGN_IN_PATH: &str = "/users/sign_in";
pub const DASHBOARD_PATH: &str = "/";

pub const SESSION_COOKIE: &str = "session";
pub const FLASH_COOKIE: &str = "flash";

/// `302 Found` with an empty body.
pub fn found(location: &str) -> Response {
    match HeaderValue::from_str(location) {
        Ok(value) => (StatusCode::FOUND, [(LOCATION, value)]).into_response(),
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

/// Returns the value of the named cookie from every `Cookie` header on the request.
pub fn read_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

pub fn set_cookie(response: &mut Response, name: &str, value: &str, max_age: Option<i64>) {
    let mut parts = vec![
        format!("{name}={value}"),
        "Path=/".to_string(),
        "HttpOnly".to_string(),
        "SameSite=Lax".to_string(),
    ];
    if let Some(secs) = max_age {
        parts.push(format!("Max-Age={secs}"));
    }
    if let Ok(header) = HeaderValue::from_str(&parts.join("; ")) {
        response.headers_mut().append(SET_COOKIE, header);
    }
}

pub fn clear_cookie(response: &mut Response, name: &str) {
    set_cookie(response, name, "", Some(0));
}

/// One-shot notice shown on the page a mutation redirects to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flash {
    ProjectCreated,
    ProjectUpdated,
    ProjectDeleted,
    ProjectCompleted,
    NoteCreated,
    NoteDeleted,
    TaskCreated,
    TaskDeleted,
    SignedIn,
    SignedOut,
}

impl Flash {
    const ALL: [Flash; 10] = [
        Flash::ProjectCreated,
        Flash::ProjectUpdated,
        Flash::ProjectDeleted,
        Flash::ProjectCompleted,
        Flash::NoteCreated,
        Flash::NoteDeleted,
        Flash::TaskCreated,
        Flash::TaskDeleted,
        Flash::SignedIn,
        Flash::SignedOut,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Flash::ProjectCreated => "project_created",
            Flash::ProjectUpdated => "project_updated",
            Flash::ProjectDeleted => "project_deleted",
            Flash::ProjectCompleted => "project_completed",
            Flash::NoteCreated => "note_created",
            Flash::NoteDeleted => "note_deleted",
            Flash::TaskCreated => "task_created",
            Flash::TaskDeleted => "task_deleted",
            Flash::SignedIn => "signed_in",
            Flash::SignedOut => "signed_out",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Flash::ProjectCreated => "Project was successfully created.",
            Flash::ProjectUpdated => "Project was successfully updated.",
            Flash::ProjectDeleted => "Project was successfully deleted.",
            Flash::ProjectCompleted => "Congratulations, this project is complete!",
            Flash::NoteCreated => "Note was successfully created.",
            Flash::NoteDeleted => "Note was successfully deleted.",
            Flash::TaskCreated => "Task was successfully created.",
            Flash::TaskDeleted => "Task was successfully deleted.",
            Flash::SignedIn => "Signed in successfully.",
            Flash::SignedOut => "Signed out successfully.",
        }
    }

    pub fn from_key(key: &str) -> Option<Flash> {
        Self::ALL.into_iter().find(|f| f.key() == key)
    }

    /// Reads the pending notice, if any, from the request cookies.
    pub fn pending(headers: &HeaderMap) -> Option<Flash> {
        read_cookie(headers, FLASH_COOKIE).and_then(Flash::from_key)
    }
}

/// Redirect that carries a notice to the next page.
pub fn redirect_with_flash(location: &str, flash: Flash) -> Response {
    let mut response = found(location);
    set_cookie(&mut response, FLASH_COOKIE, flash.key(), None);
    response
}

/// Renders `page` and consumes the pending notice, if one was shown.
pub fn render_page<T: IntoResponse>(page: T, shown: Option<Flash>) -> Response {
    let mut response = page.into_response();
    if shown.is_some() {
        clear_cookie(&mut response, FLASH_COOKIE);
    }
    response
}
