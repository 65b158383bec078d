use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Project {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub due_on: Option<Date>,
    pub completed: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Project {
    /// A project is late once its due date is strictly before `today`.
    ///
    /// Completion does not affect lateness; a project without a due date is never late.
    pub fn is_late(&self, today: Date) -> bool {
        self.due_on.is_some_and(|due| due < today)
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.owner_id == user_id
    }

    /// Listing order: due date ascending with undated projects last, then name.
    pub fn listing_order(a: &Project, b: &Project) -> Ordering {
        let by_due = match (a.due_on, b.due_on) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        by_due.then_with(|| a.name.cmp(&b.name))
    }
}

/// Validated attributes written on insert or update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectAttrs {
    pub name: String,
    pub description: Option<String>,
    pub due_on: Option<Date>,
    pub completed: bool,
}

impl From<&Project> for ProjectAttrs {
    fn from(p: &Project) -> Self {
        Self {
            name: p.name.clone(),
            description: p.description.clone(),
            due_on: p.due_on,
            completed: p.completed,
        }
    }
}
