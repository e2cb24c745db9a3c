//! Configuration issues reported while loading settings.
//!
//! Loading never fails on a questionable value: the value is clamped or
//! replaced by its default, and a [`ConfigIssue`] explains what happened.

/// Severity level of a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Fatal: the configuration cannot work at all.
    Error,
    /// Non-fatal: the configuration works but not as written.
    Warning,
}

/// Identifies a specific configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigIssueCode {
    /// A numeric value was out of range and has been clamped.
    OutOfRange,
    /// A value could not be parsed and the default is used instead.
    InvalidValue,
    /// A role override references a tool that is not registered.
    UnknownTool,
    /// `default_role` or `synthesis_role` names a role that does not exist.
    UnknownRole,
}

/// A detected issue in the configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigIssue {
    pub severity: Severity,
    pub code: ConfigIssueCode,
    pub message: String,
}

impl ConfigIssue {
    pub fn warning(code: ConfigIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
        }
    }

    pub fn error(code: ConfigIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl std::fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let level = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{}: {}", level, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_constructors() {
        let warn = ConfigIssue::warning(ConfigIssueCode::OutOfRange, "stall_threshold clamped");
        assert!(!warn.is_error());
        assert_eq!(warn.to_string(), "warning: stall_threshold clamped");

        let err = ConfigIssue::error(ConfigIssueCode::UnknownRole, "no role 'x'");
        assert!(err.is_error());
        assert_eq!(err.code, ConfigIssueCode::UnknownRole);
    }
}
