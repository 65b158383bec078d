//! Ownership gate for project-scoped requests.
//!
//! Authorization never fails a request with an error: a guest is sent to the
//! sign-in page and a signed-in user who does not own the project is sent back
//! to the dashboard. Handlers consult these functions before any lookup or
//! mutation that depends on the outcome.

use axum::response::Response;
use uuid::Uuid;

use crate::web::{found, DASHBOARD_PATH, SIGN_IN_PATH};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Proceed,
    RedirectSignIn,
    RedirectDashboard,
}

/// Decision for an action on a resource owned by `owner`.
pub fn authorize(actor: Option<Uuid>, owner: Uuid) -> Access {
    match actor {
        None => Access::RedirectSignIn,
        Some(id) if id == owner => Access::Proceed,
        Some(_) => Access::RedirectDashboard,
    }
}

/// Collection actions (index, new, create) only need a signed-in actor.
pub fn require_actor<T>(actor: Option<T>) -> Result<T, Access> {
    actor.ok_or(Access::RedirectSignIn)
}

impl Access {
    /// `Ok` to continue, otherwise the redirect that ends the request.
    pub fn ensure(self) -> Result<(), Response> {
        let location = match self {
            Access::Proceed => return Ok(()),
            Access::RedirectSignIn => SIGN_IN_PATH,
            Access::RedirectDashboard => DASHBOARD_PATH,
        };
        Err(found(location))
    }
}
