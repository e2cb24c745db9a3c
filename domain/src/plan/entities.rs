//! Execution plan entities.

use serde::{Deserialize, Serialize};

use crate::role::entities::RoleId;

/// How the roles of a plan are run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// One role after another; the synthesis role (if present) runs last.
    #[default]
    Sequential,
    /// Multi-round negotiation among roles, then one synthesized answer.
    Discussion,
    /// Reserved. Never produced by the planner; the orchestrator runs it
    /// as [`Sequential`](Self::Sequential).
    Parallel,
}

impl ExecutionMode {
    pub fn as_str(&self) -> &str {
        match self {
            ExecutionMode::Sequential => "sequential",
            ExecutionMode::Discussion => "discussion",
            ExecutionMode::Parallel => "parallel",
        }
    }
}

impl std::fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Mode requested by the caller on the turn request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnMode {
    #[default]
    Standard,
    Discussion,
}

impl TurnMode {
    pub fn as_str(&self) -> &str {
        match self {
            TurnMode::Standard => "standard",
            TurnMode::Discussion => "discussion",
        }
    }

    pub fn execution_mode(&self) -> ExecutionMode {
        match self {
            TurnMode::Standard => ExecutionMode::Sequential,
            TurnMode::Discussion => ExecutionMode::Discussion,
        }
    }
}

impl std::str::FromStr for TurnMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "standard" => Ok(TurnMode::Standard),
            "discussion" => Ok(TurnMode::Discussion),
            other => Err(format!("unknown mode '{}'", other)),
        }
    }
}

/// Ordered role sequence and mode chosen for one turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionPlan {
    pub roles: Vec<RoleId>,
    pub mode: ExecutionMode,
    pub reason: String,
    /// True when the last role merges the output of the others.
    pub synthesized: bool,
}

impl ExecutionPlan {
    pub fn single(role: RoleId, mode: ExecutionMode) -> Self {
        Self {
            roles: vec![role],
            mode,
            reason: "single domain".to_string(),
            synthesized: false,
        }
    }

    pub fn is_single(&self) -> bool {
        self.roles.len() == 1
    }

    /// Roles that produce domain answers (everything except a trailing
    /// synthesis role).
    pub fn domain_roles(&self) -> &[RoleId] {
        if self.synthesized {
            &self.roles[..self.roles.len().saturating_sub(1)]
        } else {
            &self.roles
        }
    }

    /// The trailing synthesis role, if the plan has one.
    pub fn synthesis_role(&self) -> Option<&RoleId> {
        if self.synthesized {
            self.roles.last()
        } else {
            None
        }
    }
}
