use serde::{Deserialize, Serialize};

use crate::{LifecycleError, LifecycleResult};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Customer,
    Admin,
    Operator,
    System,
}

/// The acting principal for a lifecycle call. Identity is always passed
/// explicitly into each operation, never read from ambient state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub role: Role,
}

impl Identity {
    pub fn customer(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: Role::Customer,
        }
    }

    pub fn admin(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: Role::Admin,
        }
    }

    /// Identity under which verified gateway callbacks act.
    pub fn gateway() -> Self {
        Self {
            id: "payment-gateway".to_string(),
            role: Role::System,
        }
    }

    /// Every contract requires a resolved identity before any other check.
    pub fn require(identity: Option<Identity>) -> LifecycleResult<Identity> {
        identity.ok_or(LifecycleError::Authentication)
    }
}
