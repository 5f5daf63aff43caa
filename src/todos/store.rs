// src/todos/store.rs

use super::model::{TodoItem, TodoUpdate};
use crate::error::TodoError;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Key-value storage for todo items, partitioned by user.
#[async_trait]
pub trait TodoStore: Send + Sync {
    /// All items of `user_id`, newest `created_at` first.
    async fn query_by_user(&self, user_id: &str) -> Result<Vec<TodoItem>, TodoError>;

    /// Inserts or replaces an item.
    async fn put(&self, item: TodoItem) -> Result<(), TodoError>;

    /// Updates an existing item and returns the new version.
    ///
    /// Fails with [`TodoError::NotFound`] if the item does not exist.
    async fn update(
        &self,
        user_id: &str,
        todo_id: &str,
        update: &TodoUpdate,
    ) -> Result<TodoItem, TodoError>;

    /// Removes an item. Fails with [`TodoError::NotFound`] if it does not exist.
    async fn delete(&self, user_id: &str, todo_id: &str) -> Result<(), TodoError>;
}

/// A process-local [`TodoStore`] for tests and offline runs.
#[derive(Clone, Default)]
pub struct InMemoryTodoStore {
    items: Arc<RwLock<BTreeMap<(String, String), TodoItem>>>,
}

impl InMemoryTodoStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }
}

fn key(user_id: &str, todo_id: &str) -> (String, String) {
    (user_id.to_string(), todo_id.to_string())
}

#[async_trait]
impl TodoStore for InMemoryTodoStore {
    async fn query_by_user(&self, user_id: &str) -> Result<Vec<TodoItem>, TodoError> {
        let items = self.items.read().await;
        let mut found: Vec<TodoItem> = items
            .values()
            .filter(|item| item.user_id == user_id)
            .cloned()
            .collect();
        // RFC 3339 timestamps from one clock sort lexicographically.
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }

    async fn put(&self, item: TodoItem) -> Result<(), TodoError> {
        debug!(todo_id = %item.todo_id, "Storing todo");
        let mut items = self.items.write().await;
        items.insert(key(&item.user_id, &item.todo_id), item);
        Ok(())
    }

    async fn update(
        &self,
        user_id: &str,
        todo_id: &str,
        update: &TodoUpdate,
    ) -> Result<TodoItem, TodoError> {
        let mut items = self.items.write().await;
        let item = items
            .get_mut(&key(user_id, todo_id))
            .ok_or_else(|| TodoError::NotFound { todo_id: todo_id.to_string() })?;
        item.apply(update);
        Ok(item.clone())
    }

    async fn delete(&self, user_id: &str, todo_id: &str) -> Result<(), TodoError> {
        let mut items = self.items.write().await;
        items
            .remove(&key(user_id, todo_id))
            .map(|_| ())
            .ok_or_else(|| TodoError::NotFound { todo_id: todo_id.to_string() })
    }
}
