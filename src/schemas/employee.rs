//! Employee schema

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Organisational role of an employee.
///
/// Only executors and supervisors use the bot; the remaining roles exist on
/// permits but have no bot access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmployeeRole {
    /// Performs the work and submits evidence
    Executor,
    /// Approves or rejects submitted evidence
    Supervisor,
    /// Admits the crew to the site
    Approver,
    /// Observes the work
    Observer,
    /// Crew member
    Worker,
    /// Back-office administrator
    Administrator,
}

impl EmployeeRole {
    /// Whether this role may authenticate with the bot.
    pub fn has_bot_access(self) -> bool {
        matches!(self, EmployeeRole::Executor | EmployeeRole::Supervisor)
    }

    /// Display name shown to users
    pub fn label(self) -> &'static str {
        match self {
            EmployeeRole::Executor => "Производитель работ",
            EmployeeRole::Supervisor => "Руководитель работ",
            EmployeeRole::Approver => "Допускающий",
            EmployeeRole::Observer => "Наблюдающий",
            EmployeeRole::Worker => "Член бригады",
            EmployeeRole::Administrator => "Администратор",
        }
    }
}

impl std::fmt::Display for EmployeeRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmployeeRole::Executor => write!(f, "executor"),
            EmployeeRole::Supervisor => write!(f, "supervisor"),
            EmployeeRole::Approver => write!(f, "approver"),
            EmployeeRole::Observer => write!(f, "observer"),
            EmployeeRole::Worker => write!(f, "worker"),
            EmployeeRole::Administrator => write!(f, "administrator"),
        }
    }
}

/// An employee record. The identifier doubles as the access token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    /// Unique identifier and authentication token
    pub id: Uuid,

    /// Full display name
    pub full_name: String,

    /// Job position
    pub position: String,

    /// Organisational role
    pub role: EmployeeRole,

    /// Electrical safety group
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eb_group: Option<String>,

    /// Labour protection group
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ozp_group: Option<String>,

    /// Registration timestamp
    pub created_at: DateTime<Utc>,
}

impl Employee {
    /// Create a new employee with a fresh token
    pub fn new(full_name: impl Into<String>, position: impl Into<String>, role: EmployeeRole) -> Self {
        Employee {
            id: Uuid::new_v4(),
            full_name: full_name.into(),
            position: position.into(),
            role,
            eb_group: None,
            ozp_group: None,
            created_at: Utc::now(),
        }
    }

    /// Return the employee with the given safety groups
    pub fn with_groups(mut self, eb_group: Option<String>, ozp_group: Option<String>) -> Self {
        self.eb_group = eb_group;
        self.ozp_group = ozp_group;
        self
    }
}
