// src/lib.rs

pub mod authorizer;
pub mod config;
pub mod error;
pub mod telemetry;
pub mod todos;

/// The public prelude for the `todo-backend` crate.
///
/// This module re-exports the most commonly used types for convenience.
pub mod prelude {
    pub use crate::authorizer::{
        AuthorizerEvent, AuthorizerResponse, Authorizer, Claims, Effect,
    };
    pub use crate::config::{AttachmentConfig, AuthorizerConfig, ConfigBuilder};
    pub use crate::error::{AuthError, ConfigError, TodoError};
    pub use crate::todos::{
        CreateTodoRequest, InMemoryTodoStore, TodoItem, TodoService, TodoStore,
        UpdateTodoRequest, UploadUrlIssuer,
    };
    pub use jsonwebtoken::Algorithm;
}
