// src/todos/mod.rs

//! Todo item operations for an authorized user.
//!
//! The `user_id` passed to every call is the principal established by the
//! authorizer; items are never visible across users.

pub mod attachments;
pub mod model;
pub mod store;

pub use attachments::{attachment_key, UploadUrlIssuer};
pub use model::{CreateTodoRequest, TodoItem, TodoUpdate, UpdateTodoRequest};
pub use store::{InMemoryTodoStore, TodoStore};

use crate::config::AttachmentConfig;
use crate::error::{ConfigError, TodoError};
use chrono::{SecondsFormat, Utc};
use std::sync::Arc;
use tracing::{info, instrument};
use url::Url;
use uuid::Uuid;

/// Business operations on todo items.
#[derive(Clone)]
pub struct TodoService {
    store: Arc<dyn TodoStore>,
    uploads: Arc<dyn UploadUrlIssuer>,
    attachments: AttachmentConfig,
}

impl TodoService {
    pub fn new(
        store: Arc<dyn TodoStore>,
        uploads: Arc<dyn UploadUrlIssuer>,
        attachments: AttachmentConfig,
    ) -> Self {
        Self {
            store,
            uploads,
            attachments,
        }
    }

    /// Builds the service with its attachment settings read from the
    /// environment (see [`AttachmentConfig::from_env`]).
    pub fn from_env(
        store: Arc<dyn TodoStore>,
        uploads: Arc<dyn UploadUrlIssuer>,
    ) -> Result<Self, ConfigError> {
        Ok(Self::new(store, uploads, AttachmentConfig::from_env()?))
    }

    #[instrument(skip(self))]
    pub async fn get_todos_for_user(&self, user_id: &str) -> Result<Vec<TodoItem>, TodoError> {
        info!("Getting todos");
        self.store.query_by_user(user_id).await
    }

    #[instrument(skip(self, request))]
    pub async fn create_todo(
        &self,
        request: CreateTodoRequest,
        user_id: &str,
    ) -> Result<TodoItem, TodoError> {
        if request.name.trim().is_empty() {
            return Err(TodoError::InvalidRequest("name must not be empty".to_string()));
        }

        let todo_id = Uuid::new_v4().to_string();
        let item = TodoItem {
            user_id: user_id.to_string(),
            attachment_url: Some(self.attachments.object_url(&attachment_key(&todo_id))),
            todo_id,
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            name: request.name,
            due_date: request.due_date,
            done: false,
        };

        info!(todo_id = %item.todo_id, "Creating todo");
        self.store.put(item.clone()).await?;
        Ok(item)
    }

    #[instrument(skip(self, request))]
    pub async fn update_todo(
        &self,
        request: UpdateTodoRequest,
        todo_id: &str,
        user_id: &str,
    ) -> Result<TodoItem, TodoError> {
        if request.name.trim().is_empty() {
            return Err(TodoError::InvalidRequest("name must not be empty".to_string()));
        }
        info!("Updating todo");
        self.store.update(user_id, todo_id, &request.into()).await
    }

    #[instrument(skip(self))]
    pub async fn delete_todo(&self, todo_id: &str, user_id: &str) -> Result<(), TodoError> {
        info!("Deleting todo");
        self.store.delete(user_id, todo_id).await
    }

    /// A presigned URL the client uploads the item's attachment to.
    #[instrument(skip(self))]
    pub async fn create_attachment_upload_url(&self, todo_id: &str) -> Result<Url, TodoError> {
        self.uploads
            .issue_upload_url(&attachment_key(todo_id), self.attachments.url_expiration)
            .await
    }
}
