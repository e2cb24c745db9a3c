//! Role entities: identifiers, roles and the role catalog.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::core::error::DomainError;
use crate::tool::entities::ToolSpec;

/// Identifier of a role in the catalog (e.g. `"financial_advisor"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleId(String);

impl RoleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RoleId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for RoleId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for RoleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A persona with a fixed prompt and a restricted tool set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    /// Display name shown in events
    pub name: String,
    /// Display icon shown in `role_start`
    pub icon: String,
    /// One-line description used by the classifier and planner prompts
    pub description: String,
    /// System prompt template
    pub prompt: String,
    /// Allowed tool names, in preference order
    pub tools: Vec<String>,
    /// Trigger keywords, stored lowercase
    pub keywords: Vec<String>,
}

impl Role {
    pub fn new(id: impl Into<RoleId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            icon: String::new(),
            description: String::new(),
            prompt: String::new(),
            tools: Vec::new(),
            keywords: Vec::new(),
        }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    pub fn with_tools<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tools = tools.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords
            .into_iter()
            .map(|k| k.into().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        self
    }

    pub fn allows_tool(&self, name: &str) -> bool {
        self.tools.iter().any(|t| t == name)
    }

    /// True when any trigger keyword occurs in the already-lowercased text.
    pub fn matches(&self, normalized: &str) -> bool {
        self.keywords.iter().any(|k| normalized.contains(k.as_str()))
    }
}

/// Final text a role produced earlier in the same turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleOutput {
    pub role: RoleId,
    pub name: String,
    pub content: String,
    /// True when the role ran out of iterations and returned the
    /// fallback message
    pub degraded: bool,
}

/// Immutable, ordered catalog of roles.
///
/// Declaration order matters: keyword matches and the planner fallback
/// both use it. The catalog names a default general-advisory role (used
/// when nothing else applies) and a synthesis role (used to merge the
/// output of several roles). They may be the same role.
#[derive(Debug, Clone)]
pub struct RoleCatalog {
    roles: Vec<Role>,
    default_role: RoleId,
    synthesis_role: RoleId,
}

impl RoleCatalog {
    /// Build a catalog, rejecting duplicate ids and unknown default or
    /// synthesis roles.
    pub fn new(
        roles: Vec<Role>,
        default_role: impl Into<RoleId>,
        synthesis_role: impl Into<RoleId>,
    ) -> Result<Self, DomainError> {
        let default_role = default_role.into();
        let synthesis_role = synthesis_role.into();

        let mut seen = HashSet::new();
        for role in &roles {
            if !seen.insert(role.id.clone()) {
                return Err(DomainError::InvalidCatalog(format!(
                    "duplicate role id '{}'",
                    role.id
                )));
            }
        }
        for required in [&default_role, &synthesis_role] {
            if !seen.contains(required) {
                return Err(DomainError::UnknownRole(required.to_string()));
            }
        }

        Ok(Self {
            roles,
            default_role,
            synthesis_role,
        })
    }

    /// Check every role against the tool registry: the tool list must be
    /// non-empty and every name must resolve.
    pub fn validate_tools(&self, spec: &ToolSpec) -> Result<(), DomainError> {
        for role in &self.roles {
            if role.tools.is_empty() {
                return Err(DomainError::InvalidCatalog(format!(
                    "role '{}' has no tools",
                    role.id
                )));
            }
            if let Some(missing) = role.tools.iter().find(|t| !spec.contains(t)) {
                return Err(DomainError::InvalidCatalog(format!(
                    "role '{}' references unknown tool '{}'",
                    role.id, missing
                )));
            }
        }
        Ok(())
    }

    pub fn get(&self, id: &RoleId) -> Option<&Role> {
        self.roles.iter().find(|r| &r.id == id)
    }

    /// Look up a role by its raw id string.
    pub fn find(&self, id: &str) -> Option<&Role> {
        self.roles.iter().find(|r| r.id.as_str() == id)
    }

    pub fn contains(&self, id: &RoleId) -> bool {
        self.get(id).is_some()
    }

    /// Declaration index of a role, used for stable ordering.
    pub fn position(&self, id: &RoleId) -> Option<usize> {
        self.roles.iter().position(|r| &r.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Role> {
        self.roles.iter()
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    pub fn default_role(&self) -> &RoleId {
        &self.default_role
    }

    pub fn synthesis_role(&self) -> &RoleId {
        &self.synthesis_role
    }

    pub fn is_synthesis(&self, id: &RoleId) -> bool {
        &self.synthesis_role == id
    }

    /// Sort ids into declaration order, dropping unknown ones and duplicates.
    pub fn in_declaration_order(&self, ids: &[RoleId]) -> Vec<RoleId> {
        self.roles
            .iter()
            .filter(|r| ids.contains(&r.id))
            .map(|r| r.id.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::entities::ToolDefinition;

    fn sample() -> RoleCatalog {
        RoleCatalog::new(
            vec![
                Role::new("money", "Money").with_tools(["calc"]).with_keywords(["Loan", " TAX "]),
                Role::new("rules", "Rules").with_tools(["search"]).with_keywords(["policy"]),
                Role::new("general", "General").with_tools(["calc", "search"]),
            ],
            "general",
            "general",
        )
        .unwrap()
    }

    #[test]
    fn test_keywords_are_normalized() {
        let catalog = sample();
        let money = catalog.find("money").unwrap();
        assert_eq!(money.keywords, vec!["loan", "tax"]);
        assert!(money.matches("how big a loan can i get"));
        assert!(!money.matches("what is the policy"));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let result = RoleCatalog::new(
            vec![Role::new("a", "A"), Role::new("a", "A again")],
            "a",
            "a",
        );
        assert!(matches!(result, Err(DomainError::InvalidCatalog(_))));
    }

    #[test]
    fn test_unknown_default_rejected() {
        let result = RoleCatalog::new(vec![Role::new("a", "A")], "missing", "a");
        assert!(matches!(result, Err(DomainError::UnknownRole(id)) if id == "missing"));
    }

    #[test]
    fn test_validate_tools() {
        let catalog = sample();
        let full = ToolSpec::new()
            .with_tool(ToolDefinition::new("calc", "c"))
            .with_tool(ToolDefinition::new("search", "s"));
        assert!(catalog.validate_tools(&full).is_ok());

        let partial = ToolSpec::new().with_tool(ToolDefinition::new("calc", "c"));
        let err = catalog.validate_tools(&partial).unwrap_err();
        assert!(err.to_string().contains("unknown tool 'search'"));
    }

    #[test]
    fn test_declaration_order() {
        let catalog = sample();
        let ids = vec![RoleId::from("general"), RoleId::from("x"), RoleId::from("money")];
        assert_eq!(
            catalog.in_declaration_order(&ids),
            vec![RoleId::from("money"), RoleId::from("general")]
        );
        assert_eq!(catalog.position(&RoleId::from("rules")), Some(1));
        assert!(catalog.is_synthesis(&RoleId::from("general")));
    }
}
