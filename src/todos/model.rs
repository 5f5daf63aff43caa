// src/todos/model.rs

use serde::{Deserialize, Serialize};

/// A stored todo item. Keyed by (`user_id`, `todo_id`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoItem {
    pub user_id: String,
    pub todo_id: String,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
    pub name: String,
    pub due_date: String,
    pub done: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment_url: Option<String>,
}

/// Body of a create request.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTodoRequest {
    pub name: String,
    pub due_date: String,
}

/// Body of an update request.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTodoRequest {
    pub name: String,
    pub due_date: String,
    pub done: bool,
}

/// The fields an update overwrites.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoUpdate {
    pub name: String,
    pub due_date: String,
    pub done: bool,
}

impl From<UpdateTodoRequest> for TodoUpdate {
    fn from(request: UpdateTodoRequest) -> Self {
        Self {
            name: request.name,
            due_date: request.due_date,
            done: request.done,
        }
    }
}

impl TodoItem {
    pub(crate) fn apply(&mut self, update: &TodoUpdate) {
        self.name = update.name.clone();
        self.due_date = update.due_date.clone();
        self.done = update.done;
    }
}
