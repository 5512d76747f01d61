//! Row types for the coordination schema (spec §3 Agent/Task/Lock/SessionEvent).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AgentStatus {
    Active,
    Inactive,
}

impl AgentStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Inactive => "INACTIVE",
        }
    }

    #[must_use]
    pub fn from_str(s: &str) -> Self {
        if s == "ACTIVE" {
            Self::Active
        } else {
            Self::Inactive
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub agent_id: String,
    pub project_id: String,
    pub session_id: String,
    pub status: AgentStatus,
    pub focus: Option<String>,
    pub last_heartbeat: i64,
    pub created_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl TaskStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
        }
    }

    #[must_use]
    pub fn from_str(s: &str) -> Self {
        match s {
            "IN_PROGRESS" => Self::InProgress,
            "COMPLETED" => Self::Completed,
            "CANCELLED" => Self::Cancelled,
            _ => Self::Pending,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub project_id: String,
    pub title: String,
    pub description: Option<String>,
    pub from_project: Option<String>,
    pub from_agent: Option<String>,
    pub status: TaskStatus,
    pub claimed_by: Option<String>,
    pub claimed_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
    pub completed_at: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lock {
    pub resource: String,
    pub project_id: String,
    pub agent_id: String,
    pub acquired_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEvent {
    pub id: i64,
    pub project_id: String,
    pub session_id: String,
    pub agent_id: Option<String>,
    pub event_type: String,
    pub event_data: String,
    pub timestamp: i64,
}

/// Outcome of [`crate::CoordinationStore::create_external_task`] (spec §4.5
/// "Task deduplication on delegation").
#[derive(Debug, Clone)]
pub enum TaskCreationOutcome {
    Created(Task),
    Duplicate { existing_id: String, status: TaskStatus },
}
