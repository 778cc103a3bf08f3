//! Role and status gates for permit transitions

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schemas::{Permit, PermitStatus};

use super::states::{rule_for, Actor, PermitAction};

/// Why a transition was refused
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Denial {
    /// The requester is not the participant the action needs
    InsufficientRole { action: PermitAction, required: Actor },
    /// The permit is not in the action's source status
    IllegalTransition { action: PermitAction, from: PermitStatus },
}

impl Denial {
    pub fn code(&self) -> &'static str {
        match self {
            Denial::InsufficientRole { .. } => "INSUFFICIENT_ROLE",
            Denial::IllegalTransition { .. } => "ILLEGAL_TRANSITION",
        }
    }

    /// Human-readable reason, distinct per denial kind
    pub fn reason(&self) -> String {
        match self {
            Denial::InsufficientRole { action, required } => format!(
                "insufficient role: {} requires the permit's {}",
                action, required
            ),
            Denial::IllegalTransition { action, from } => format!(
                "illegal transition from current status: {} is not allowed from {}",
                action, from
            ),
        }
    }
}

impl std::fmt::Display for Denial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.reason())
    }
}

/// Result of a validation check
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    /// Whether the validation passed
    pub valid: bool,

    /// Reason for failure (if valid is false)
    pub denial: Option<Denial>,
}

impl ValidationResult {
    pub fn success() -> Self {
        ValidationResult {
            valid: true,
            denial: None,
        }
    }

    pub fn failure(denial: Denial) -> Self {
        ValidationResult {
            valid: false,
            denial: Some(denial),
        }
    }
}

/// Whether `employee_id` occupies the participant slot `actor` on the permit
pub fn holds_actor(permit: &Permit, employee_id: Uuid, actor: Actor) -> bool {
    match actor {
        Actor::Executor => permit.is_executor(employee_id),
        Actor::Supervisor => permit.is_supervisor(employee_id),
    }
}

/// Role gate: submits need the permit's executor, decisions its supervisor.
pub fn check_role(permit: &Permit, employee_id: Uuid, action: PermitAction) -> ValidationResult {
    let required = rule_for(action).actor;
    if !holds_actor(permit, employee_id, required) {
        return ValidationResult::failure(Denial::InsufficientRole { action, required });
    }
    ValidationResult::success()
}

/// Status gate: each action is legal only from its source status.
pub fn check_status(current: PermitStatus, action: PermitAction) -> ValidationResult {
    if rule_for(action).from != current {
        return ValidationResult::failure(Denial::IllegalTransition {
            action,
            from: current,
        });
    }
    ValidationResult::success()
}

/// Validate a requested transition; the role gate is checked first.
pub fn validate_transition(permit: &Permit, employee_id: Uuid, action: PermitAction) -> ValidationResult {
    let role = check_role(permit, employee_id, action);
    if !role.valid {
        return role;
    }
    check_status(permit.status, action)
}
