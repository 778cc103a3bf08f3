//! Domain logic: permit lifecycle, gating rules and the evidence gate

mod evidence;
mod states;
mod transitions;
mod upload;
mod validation;


pub use evidence::{
    evidence_phase_for, ComplianceReport, ComplianceTally, ComplianceVerdict, IndeterminateCause,
    PhotoOutcome, PhotoVerdict,
};
pub use states::{
    get_allowed_actions, get_allowed_next_statuses, is_terminal_status, rule_for, Actor,
    PermitAction, TransitionRule, PERMIT_ACTIONS, PERMIT_STATUSES, TRANSITION_TABLE,
};
pub use transitions::{apply_transition, available_actions, TransitionDecision, TransitionResult};
pub use upload::UploadSession;
pub use validation::{
    check_role, check_status, holds_actor, validate_transition, Denial, ValidationResult,
};
