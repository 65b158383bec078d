use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::tasks::repo_types::Task;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskParams {
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TasksPage {
    pub notice: Option<&'static str>,
    pub project_id: Uuid,
    pub tasks: Vec<Task>,
}
