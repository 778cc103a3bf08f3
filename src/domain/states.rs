//! Permit lifecycle definitions
//!
//! created → pending_start → in_progress → pending_completion → completed,
//! with two rejection edges back: pending_start → created and
//! pending_completion → in_progress.

use serde::{Deserialize, Serialize};

use crate::schemas::{PermitStatus, Phase};

/// The canonical ordering of permit statuses.
pub const PERMIT_STATUSES: &[PermitStatus] = &[
    PermitStatus::Created,
    PermitStatus::PendingStart,
    PermitStatus::InProgress,
    PermitStatus::PendingCompletion,
    PermitStatus::Completed,
];

/// An action a user can request on a permit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermitAction {
    SubmitStart,
    SubmitCompletion,
    ApproveStart,
    RejectStart,
    ApproveCompletion,
    RejectCompletion,
}

/// Every action, in table order.
pub const PERMIT_ACTIONS: &[PermitAction] = &[
    PermitAction::SubmitStart,
    PermitAction::SubmitCompletion,
    PermitAction::ApproveStart,
    PermitAction::RejectStart,
    PermitAction::ApproveCompletion,
    PermitAction::RejectCompletion,
];

impl PermitAction {
    /// Submit action for the given evidence phase
    pub fn submit(phase: Phase) -> Self {
        match phase {
            Phase::Start => PermitAction::SubmitStart,
            Phase::Completion => PermitAction::SubmitCompletion,
        }
    }

    pub fn approve(phase: Phase) -> Self {
        match phase {
            Phase::Start => PermitAction::ApproveStart,
            Phase::Completion => PermitAction::ApproveCompletion,
        }
    }

    pub fn reject(phase: Phase) -> Self {
        match phase {
            Phase::Start => PermitAction::RejectStart,
            Phase::Completion => PermitAction::RejectCompletion,
        }
    }

    /// The evidence phase this action concerns
    pub fn phase(self) -> Phase {
        match self {
            PermitAction::SubmitStart | PermitAction::ApproveStart | PermitAction::RejectStart => {
                Phase::Start
            }
            _ => Phase::Completion,
        }
    }

    pub fn is_submit(self) -> bool {
        matches!(self, PermitAction::SubmitStart | PermitAction::SubmitCompletion)
    }

    /// Display name shown to users
    pub fn label(self) -> &'static str {
        match self {
            PermitAction::SubmitStart => "Старт работ",
            PermitAction::SubmitCompletion => "Завершить работы",
            PermitAction::ApproveStart => "Согласовать начало",
            PermitAction::RejectStart => "Отклонить начало",
            PermitAction::ApproveCompletion => "Согласовать завершение",
            PermitAction::RejectCompletion => "Отклонить завершение",
        }
    }
}

impl std::fmt::Display for PermitAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PermitAction::SubmitStart => write!(f, "submit_start"),
            PermitAction::SubmitCompletion => write!(f, "submit_completion"),
            PermitAction::ApproveStart => write!(f, "approve_start"),
            PermitAction::RejectStart => write!(f, "reject_start"),
            PermitAction::ApproveCompletion => write!(f, "approve_completion"),
            PermitAction::RejectCompletion => write!(f, "reject_completion"),
        }
    }
}

impl std::str::FromStr for PermitAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PERMIT_ACTIONS
            .iter()
            .copied()
            .find(|a| a.to_string() == s)
            .ok_or_else(|| format!("Unknown action: {}", s))
    }
}

/// Which permit participant may perform an action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Actor {
    Executor,
    Supervisor,
}

impl std::fmt::Display for Actor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Actor::Executor => write!(f, "executor"),
            Actor::Supervisor => write!(f, "supervisor"),
        }
    }
}

/// One edge of the lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionRule {
    pub action: PermitAction,
    pub actor: Actor,
    pub from: PermitStatus,
    pub to: PermitStatus,
}

/// The complete transition table. No other edges exist.
pub const TRANSITION_TABLE: &[TransitionRule] = &[
    TransitionRule {
        action: PermitAction::SubmitStart,
        actor: Actor::Executor,
        from: PermitStatus::Created,
        to: PermitStatus::PendingStart,
    },
    TransitionRule {
        action: PermitAction::SubmitCompletion,
        actor: Actor::Executor,
        from: PermitStatus::InProgress,
        to: PermitStatus::PendingCompletion,
    },
    TransitionRule {
        action: PermitAction::ApproveStart,
        actor: Actor::Supervisor,
        from: PermitStatus::PendingStart,
        to: PermitStatus::InProgress,
    },
    TransitionRule {
        action: PermitAction::RejectStart,
        actor: Actor::Supervisor,
        from: PermitStatus::PendingStart,
        to: PermitStatus::Created,
    },
    TransitionRule {
        action: PermitAction::ApproveCompletion,
        actor: Actor::Supervisor,
        from: PermitStatus::PendingCompletion,
        to: PermitStatus::Completed,
    },
    TransitionRule {
        action: PermitAction::RejectCompletion,
        actor: Actor::Supervisor,
        from: PermitStatus::PendingCompletion,
        to: PermitStatus::InProgress,
    },
];

/// Look up the table row for an action.
pub fn rule_for(action: PermitAction) -> &'static TransitionRule {
    let index = match action {
        PermitAction::SubmitStart => 0,
        PermitAction::SubmitCompletion => 1,
        PermitAction::ApproveStart => 2,
        PermitAction::RejectStart => 3,
        PermitAction::ApproveCompletion => 4,
        PermitAction::RejectCompletion => 5,
    };
    &TRANSITION_TABLE[index]
}

/// Actions whose source status is `current`, regardless of who asks.
pub fn get_allowed_actions(current: PermitStatus) -> Vec<PermitAction> {
    TRANSITION_TABLE
        .iter()
        .filter(|rule| rule.from == current)
        .map(|rule| rule.action)
        .collect()
}

/// Statuses reachable from `current` in one step.
pub fn get_allowed_next_statuses(current: PermitStatus) -> Vec<PermitStatus> {
    TRANSITION_TABLE
        .iter()
        .filter(|rule| rule.from == current)
        .map(|rule| rule.to)
        .collect()
}

/// Check if a status is the terminal status (completed).
pub fn is_terminal_status(status: PermitStatus) -> bool {
    status == PermitStatus::Completed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_rule_per_action() {
        assert_eq!(TRANSITION_TABLE.len(), PERMIT_ACTIONS.len());
        for action in PERMIT_ACTIONS {
            let count = TRANSITION_TABLE.iter().filter(|r| r.action == *action).count();
            assert_eq!(count, 1, "{} must appear exactly once", action);
            assert_eq!(rule_for(*action).action, *action);
        }
    }

    #[test]
    fn test_get_allowed_actions() {
        assert_eq!(get_allowed_actions(PermitStatus::Created), vec![PermitAction::SubmitStart]);
        assert_eq!(
            get_allowed_actions(PermitStatus::PendingStart),
            vec![PermitAction::ApproveStart, PermitAction::RejectStart]
        );
        assert_eq!(
            get_allowed_actions(PermitStatus::InProgress),
            vec![PermitAction::SubmitCompletion]
        );
        assert_eq!(
            get_allowed_actions(PermitStatus::PendingCompletion),
            vec![PermitAction::ApproveCompletion, PermitAction::RejectCompletion]
        );
        assert!(get_allowed_actions(PermitStatus::Completed).is_empty());
    }

    #[test]
    fn test_rejection_edges() {
        assert_eq!(rule_for(PermitAction::RejectStart).to, PermitStatus::Created);
        assert_eq!(rule_for(PermitAction::RejectCompletion).to, PermitStatus::InProgress);
    }

    #[test]
    fn test_get_allowed_next_statuses() {
        assert_eq!(
            get_allowed_next_statuses(PermitStatus::PendingStart),
            vec![PermitStatus::InProgress, PermitStatus::Created]
        );
        assert!(get_allowed_next_statuses(PermitStatus::Completed).is_empty());
    }

    #[test]
    fn test_actor_per_action() {
        assert_eq!(rule_for(PermitAction::SubmitStart).actor, Actor::Executor);
        assert_eq!(rule_for(PermitAction::SubmitCompletion).actor, Actor::Executor);
        assert_eq!(rule_for(PermitAction::ApproveStart).actor, Actor::Supervisor);
        assert_eq!(rule_for(PermitAction::RejectCompletion).actor, Actor::Supervisor);
    }

    #[test]
    fn test_is_terminal_status() {
        for status in PERMIT_STATUSES {
            assert_eq!(is_terminal_status(*status), *status == PermitStatus::Completed);
        }
    }

    #[test]
    fn test_action_phase_helpers() {
        assert_eq!(PermitAction::submit(Phase::Start), PermitAction::SubmitStart);
        assert_eq!(PermitAction::approve(Phase::Completion), PermitAction::ApproveCompletion);
        assert_eq!(PermitAction::reject(Phase::Start), PermitAction::RejectStart);
        assert_eq!(PermitAction::RejectCompletion.phase(), Phase::Completion);
        assert!(PermitAction::SubmitCompletion.is_submit());
        assert!(!PermitAction::ApproveStart.is_submit());
    }

    #[test]
    fn test_action_parsing() {
        assert_eq!("approve_start".parse::<PermitAction>().unwrap(), PermitAction::ApproveStart);
        assert!("approve".parse::<PermitAction>().is_err());
    }
}
