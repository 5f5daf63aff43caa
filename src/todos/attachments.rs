// src/todos/attachments.rs

use crate::error::TodoError;
use async_trait::async_trait;
use std::time::Duration;
use url::Url;

/// Issues time-limited upload URLs for an object store.
#[async_trait]
pub trait UploadUrlIssuer: Send + Sync {
    /// A URL that accepts one `PUT` of the object `key` for `ttl`.
    async fn issue_upload_url(&self, key: &str, ttl: Duration) -> Result<Url, TodoError>;
}

/// Object key an item's attachment is uploaded under.
pub fn attachment_key(todo_id: &str) -> String {
    format!("{}.jpg", todo_id)
}
