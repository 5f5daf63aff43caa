// src/authorizer/policy.rs

use serde::{Deserialize, Serialize};

/// IAM policy language version used in every decision.
pub const POLICY_VERSION: &str = "2012-10-17";
/// The action an ALLOW/DENY statement applies to.
pub const INVOKE_ACTION: &str = "execute-api:Invoke";
/// Principal reported on DENY, when no caller identity could be established.
pub const ANONYMOUS_PRINCIPAL: &str = "user";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    Allow,
    Deny,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Statement {
    pub action: String,
    pub effect: Effect,
    pub resource: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyDocument {
    pub version: String,
    pub statement: Vec<Statement>,
}

/// The decision returned to the API gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizerResponse {
    pub principal_id: String,
    pub policy_document: PolicyDocument,
}

impl AuthorizerResponse {
    /// Grants invocation rights to `principal_id` on every resource.
    pub fn allow(principal_id: impl Into<String>) -> Self {
        Self::with_effect(principal_id.into(), Effect::Allow)
    }

    /// Denies invocation rights to the anonymous principal.
    pub fn deny() -> Self {
        Self::with_effect(ANONYMOUS_PRINCIPAL.to_string(), Effect::Deny)
    }

    fn with_effect(principal_id: String, effect: Effect) -> Self {
        Self {
            principal_id,
            policy_document: PolicyDocument {
                version: POLICY_VERSION.to_string(),
                statement: vec![Statement {
                    action: INVOKE_ACTION.to_string(),
                    effect,
                    resource: "*".to_string(),
                }],
            },
        }
    }

    /// The effect of the single statement.
    pub fn effect(&self) -> Effect {
        self.policy_document
            .statement
            .first()
            .map(|statement| statement.effect)
            .unwrap_or(Effect::Deny)
    }

    pub fn is_allowed(&self) -> bool {
        self.effect() == Effect::Allow
    }
}
