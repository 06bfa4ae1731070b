//! Conclave error types and failure/recovery boundary records

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Errors surfaced to callers of the orchestration API
///
/// Per-agent failures inside a round are never surfaced this way; they
/// are substituted with zero-confidence placeholder responses and
/// reported out-of-band as [`ErrorRecord`]s. Only invalid calls are
/// rejected.
#[derive(Debug, Error)]
pub enum ConclaveError {
    /// Caller supplied invalid arguments
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The operation requires at least one active agent
    #[error("No active agents configured")]
    NoActiveAgents,

    /// Agent not found
    #[error("Agent not found: {0}")]
    AgentNotFound(String),
}

/// Failure classification carried on an [`ErrorRecord`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Agent computation failure
    Processing,
    /// Memory store failure
    Memory,
    /// Malformed or missing seed context
    Context,
    /// Backing service unreachable
    Network,
    /// Invocation exceeded its budget
    Timeout,
    /// Orchestrator invariant violation
    Internal,
    /// Invalid caller input
    User,
}

/// State of the external recovery workflow for a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RecoveryStatus {
    #[default]
    Pending,
    InProgress,
    Success,
    Failure,
    Skipped,
}

/// Kind of recovery action attempted for a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecoveryActionType {
    Retry,
    Fallback,
    Restart,
    Reconfigure,
    Notify,
    Escalate,
}

/// Outcome of a single recovery action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecoveryResult {
    Success,
    Failure,
    PartialSuccess,
    Skipped,
    Unknown,
}

/// One recovery attempt recorded against an [`ErrorRecord`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveryAction {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub action_type: RecoveryActionType,
    pub description: String,
    pub result: Option<RecoveryResult>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl RecoveryAction {
    pub fn new(action_type: RecoveryActionType, description: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            action_type,
            description: description.into(),
            result: None,
            metadata: HashMap::new(),
        }
    }

    pub fn with_result(mut self, result: RecoveryResult) -> Self {
        self.result = Some(result);
        self
    }
}

/// Boundary record describing one agent failure
///
/// Emitted by the orchestrator when an agent invocation fails and
/// consumed by an external recovery subsystem; the orchestrator itself
/// never drives recovery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// Identity of the failing agent
    pub agent: String,
    pub kind: ErrorKind,
    pub message: String,
    /// Context the agent was invoked with
    pub context: String,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    pub recovery_attempts: u32,
    pub recovery_status: RecoveryStatus,
    pub recovery_actions: Vec<RecoveryAction>,
}

impl ErrorRecord {
    pub fn new(
        agent: impl Into<String>,
        kind: ErrorKind,
        message: impl Into<String>,
        context: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            agent: agent.into(),
            kind,
            message: message.into(),
            context: context.into(),
            metadata: HashMap::new(),
            recovery_attempts: 0,
            recovery_status: RecoveryStatus::default(),
            recovery_actions: Vec::new(),
        }
    }

    pub fn with_action(mut self, action: RecoveryAction) -> Self {
        self.recovery_actions.push(action);
        self
    }
}
