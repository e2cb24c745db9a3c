//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and use domain types where appropriate.

mod llm;
mod orchestration;
mod roles;
mod store;
mod tools;

pub use llm::FileLlmConfig;
pub use orchestration::FileOrchestrationConfig;
pub use roles::{FileRoleConfig, build_catalog};
pub use store::{FileLoggingConfig, FileStoreConfig, StoreKind};
pub use tools::{FileKnowledgeConfig, FileNewsConfig, FileToolsConfig};

use roundtable_application::OrchestrationParams;
use roundtable_domain::{ConfigIssue, DomainError, RoleCatalog, ToolSpec};
use serde::{Deserialize, Serialize};

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Model transport
    pub llm: FileLlmConfig,
    /// Turn loop limits
    pub orchestration: FileOrchestrationConfig,
    /// Conversation store
    pub store: FileStoreConfig,
    /// Structured turn logs
    pub logging: FileLoggingConfig,
    /// Built-in tool settings
    pub tools: FileToolsConfig,
    /// Role overrides
    pub roles: Vec<FileRoleConfig>,
    /// Role answering when nothing else matches (default: purchase_consultant)
    pub default_role: Option<String>,
    /// Role merging specialist answers (default: purchase_consultant)
    pub synthesis_role: Option<String>,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    ///
    /// Warnings describe values that were clamped or replaced; errors
    /// describe settings that cannot work.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        issues.extend(self.llm.validate());
        issues.extend(self.orchestration.validate());
        issues.extend(self.tools.validate());
        issues.extend(roles::validate_roles(&self.roles, None));
        issues
    }

    /// Like [`validate`](Self::validate), also checking role tool lists
    /// against the registered tools.
    pub fn validate_against(&self, spec: &ToolSpec) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        issues.extend(self.llm.validate());
        issues.extend(self.orchestration.validate());
        issues.extend(self.tools.validate());
        issues.extend(roles::validate_roles(&self.roles, Some(spec)));
        issues
    }

    /// Application-level turn parameters.
    pub fn orchestration_params(&self) -> OrchestrationParams {
        self.orchestration.to_params(self.llm.temperature)
    }

    /// Role catalog with the `[[roles]]` overrides applied.
    pub fn role_catalog(&self) -> Result<RoleCatalog, DomainError> {
        build_catalog(
            &self.roles,
            self.default_role.as_deref(),
            self.synthesis_role.as_deref(),
        )
    }
}
