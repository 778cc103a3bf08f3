//! Permit schema - The work permit and its lifecycle status

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a permit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermitStatus {
    /// Initial state - permit issued, work not started
    Created,
    /// Start evidence submitted, waiting for the supervisor
    PendingStart,
    /// Start approved, work underway
    InProgress,
    /// Completion evidence submitted, waiting for the supervisor
    PendingCompletion,
    /// Completion approved
    Completed,
}

impl PermitStatus {
    /// Display name shown to users
    pub fn label(self) -> &'static str {
        match self {
            PermitStatus::Created => "Создано",
            PermitStatus::PendingStart => "Согласование начала",
            PermitStatus::InProgress => "В работе",
            PermitStatus::PendingCompletion => "Согласование завершения",
            PermitStatus::Completed => "Завершено",
        }
    }
}

impl std::fmt::Display for PermitStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PermitStatus::Created => write!(f, "created"),
            PermitStatus::PendingStart => write!(f, "pending_start"),
            PermitStatus::InProgress => write!(f, "in_progress"),
            PermitStatus::PendingCompletion => write!(f, "pending_completion"),
            PermitStatus::Completed => write!(f, "completed"),
        }
    }
}

impl std::str::FromStr for PermitStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(PermitStatus::Created),
            "pending_start" => Ok(PermitStatus::PendingStart),
            "in_progress" => Ok(PermitStatus::InProgress),
            "pending_completion" => Ok(PermitStatus::PendingCompletion),
            "completed" => Ok(PermitStatus::Completed),
            _ => Err(format!("Unknown permit status: {}", s)),
        }
    }
}

/// Stage of work an evidence photo documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Start,
    Completion,
}

impl Phase {
    pub fn label(self) -> &'static str {
        match self {
            Phase::Start => "начало работ",
            Phase::Completion => "завершение работ",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Start => write!(f, "start"),
            Phase::Completion => write!(f, "completion"),
        }
    }
}

impl std::str::FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(Phase::Start),
            "completion" => Ok(Phase::Completion),
            _ => Err(format!("Unknown phase: {} (expected start or completion)", s)),
        }
    }
}

/// Participant slot an employee can occupy on a permit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantRole {
    Supervisor,
    Approver,
    Executor,
    Observer,
}

impl ParticipantRole {
    pub fn label(self) -> &'static str {
        match self {
            ParticipantRole::Supervisor => "Руководитель работ",
            ParticipantRole::Approver => "Допускающий",
            ParticipantRole::Executor => "Производитель работ",
            ParticipantRole::Observer => "Наблюдающий",
        }
    }
}

/// Which participant slot a permit listing should match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleFilter {
    Supervisor,
    Executor,
    /// Supervisor or executor
    Any,
}

impl std::str::FromStr for RoleFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "supervisor" => Ok(RoleFilter::Supervisor),
            "executor" => Ok(RoleFilter::Executor),
            "any" => Ok(RoleFilter::Any),
            _ => Err(format!("Unknown role: {} (available: supervisor, executor)", s)),
        }
    }
}

/// A work permit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Permit {
    pub id: Uuid,

    /// Human-readable permit number, unique
    pub number: String,

    pub branch: String,

    pub department: String,

    pub work_type: String,

    pub task_description: String,

    /// Scheduled work window
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,

    /// Set when start evidence is submitted
    #[serde(default)]
    pub actual_start_at: Option<DateTime<Utc>>,

    /// Set when completion evidence is submitted
    #[serde(default)]
    pub actual_end_at: Option<DateTime<Utc>>,

    pub status: PermitStatus,

    #[serde(default)]
    pub supervisor: Option<Uuid>,

    #[serde(default)]
    pub approver: Option<Uuid>,

    #[serde(default)]
    pub executor: Option<Uuid>,

    #[serde(default)]
    pub observer: Option<Uuid>,

    #[serde(default)]
    pub crew_members: Vec<Uuid>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Permit {
    /// Create a new permit in the `created` status with no participants
    pub fn new(
        number: impl Into<String>,
        task_description: impl Into<String>,
        start_at: DateTime<Utc>,
        end_at: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();
        Permit {
            id: Uuid::new_v4(),
            number: number.into(),
            branch: String::new(),
            department: String::new(),
            work_type: String::new(),
            task_description: task_description.into(),
            start_at,
            end_at,
            actual_start_at: None,
            actual_end_at: None,
            status: PermitStatus::Created,
            supervisor: None,
            approver: None,
            executor: None,
            observer: None,
            crew_members: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    // ===== BUILDER METHODS =====

    pub fn with_status(mut self, status: PermitStatus) -> Self {
        self.status = status;
        self.touch_returning()
    }

    pub fn with_supervisor(mut self, id: Uuid) -> Self {
        self.supervisor = Some(id);
        self
    }

    pub fn with_executor(mut self, id: Uuid) -> Self {
        self.executor = Some(id);
        self
    }

    pub fn with_approver(mut self, id: Uuid) -> Self {
        self.approver = Some(id);
        self
    }

    pub fn with_observer(mut self, id: Uuid) -> Self {
        self.observer = Some(id);
        self
    }

    pub fn with_crew(mut self, crew: Vec<Uuid>) -> Self {
        self.crew_members = crew;
        self
    }

    /// Return the permit with its classifiers set
    pub fn with_classifiers(
        mut self,
        branch: impl Into<String>,
        department: impl Into<String>,
        work_type: impl Into<String>,
    ) -> Self {
        self.branch = branch.into();
        self.department = department.into();
        self.work_type = work_type.into();
        self
    }

    fn touch_returning(mut self) -> Self {
        self.updated_at = Utc::now();
        self
    }

    // ===== PARTICIPANTS =====

    pub fn is_supervisor(&self, employee_id: Uuid) -> bool {
        self.supervisor == Some(employee_id)
    }

    pub fn is_executor(&self, employee_id: Uuid) -> bool {
        self.executor == Some(employee_id)
    }

    /// Only the supervisor and the executor may view a permit.
    pub fn can_view(&self, employee_id: Uuid) -> bool {
        self.is_supervisor(employee_id) || self.is_executor(employee_id)
    }

    /// Whether the permit should appear in a listing with this filter
    pub fn matches(&self, employee_id: Uuid, filter: RoleFilter) -> bool {
        match filter {
            RoleFilter::Supervisor => self.is_supervisor(employee_id),
            RoleFilter::Executor => self.is_executor(employee_id),
            RoleFilter::Any => self.can_view(employee_id),
        }
    }

    /// The viewing roles the employee holds on this permit
    pub fn viewer_roles(&self, employee_id: Uuid) -> Vec<ParticipantRole> {
        let mut roles = Vec::new();
        if self.is_supervisor(employee_id) {
            roles.push(ParticipantRole::Supervisor);
        }
        if self.is_executor(employee_id) {
            roles.push(ParticipantRole::Executor);
        }
        roles
    }
}
