//! Role overrides from TOML (`[[roles]]` tables)
//!
//! Each table either patches the built-in role with the same `id` or,
//! when the id is new, adds a role. Fields left out keep the built-in
//! value. A new role needs at least `name`, `prompt` and `tools`.

use roundtable_domain::{
    ConfigIssue, ConfigIssueCode, DomainError, Role, RoleCatalog, RoleId, ToolSpec,
};
use serde::{Deserialize, Serialize};

/// # Example
///
/// ```toml
/// default_role = "purchase_consultant"
///
/// [[roles]]
/// id = "market_analyst"
/// keywords = ["market", "house price", "rent"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRoleConfig {
    pub id: String,
    pub name: Option<String>,
    pub icon: Option<String>,
    pub description: Option<String>,
    pub prompt: Option<String>,
    pub tools: Option<Vec<String>>,
    pub keywords: Option<Vec<String>>,
}

impl FileRoleConfig {
    fn apply(&self, mut role: Role) -> Role {
        if let Some(name) = &self.name {
            role.name = name.clone();
        }
        if let Some(icon) = &self.icon {
            role = role.with_icon(icon.clone());
        }
        if let Some(description) = &self.description {
            role = role.with_description(description.clone());
        }
        if let Some(prompt) = &self.prompt {
            role = role.with_prompt(prompt.clone());
        }
        if let Some(tools) = &self.tools {
            role = role.with_tools(tools.iter().cloned());
        }
        if let Some(keywords) = &self.keywords {
            role = role.with_keywords(keywords.iter().cloned());
        }
        role
    }
}

/// Build the role catalog: built-in roles patched by `overrides`.
pub fn build_catalog(
    overrides: &[FileRoleConfig],
    default_role: Option<&str>,
    synthesis_role: Option<&str>,
) -> Result<RoleCatalog, DomainError> {
    let builtin = RoleCatalog::home_purchase()?;
    let mut roles: Vec<Role> = builtin.iter().cloned().collect();

    for config in overrides {
        let id = RoleId::from(config.id.trim());
        match roles.iter_mut().find(|r| r.id == id) {
            Some(role) => *role = config.apply(role.clone()),
            None => {
                let base = Role::new(id.clone(), config.id.trim()).with_icon("🧑");
                roles.push(config.apply(base));
            }
        }
    }

    RoleCatalog::new(
        roles,
        default_role.map_or_else(|| builtin.default_role().clone(), RoleId::from),
        synthesis_role.map_or_else(|| builtin.synthesis_role().clone(), RoleId::from),
    )
}

/// Problems in the `[[roles]]` tables that loading would otherwise hide.
pub(super) fn validate_roles(overrides: &[FileRoleConfig], spec: Option<&ToolSpec>) -> Vec<ConfigIssue> {
    let mut issues = Vec::new();
    for config in overrides {
        if config.id.trim().is_empty() {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::InvalidValue,
                "[[roles]] entry without an id",
            ));
            continue;
        }
        if let (Some(tools), Some(spec)) = (&config.tools, spec) {
            if tools.is_empty() {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::InvalidValue,
                    format!("role '{}' has an empty tool list", config.id),
                ));
            }
            for tool in tools.iter().filter(|t| !spec.contains(t)) {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::UnknownTool,
                    format!("role '{}' references unknown tool '{}'", config.id, tool),
                ));
            }
        }
    }
    issues
}
