//! Tool domain traits
//!
//! Contains the pure validation boundary between raw model output and
//! tool bodies. The async execution port lives in the application layer.

use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

use super::args::{ArgValue, ValidatedArgs};
use super::entities::{ParamType, ToolCall, ToolDefinition, ToolParameter};

/// Why a requested tool call was rejected before execution.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Unknown tool '{0}'")]
    UnknownTool(String),

    #[error("Tool '{tool}' is not available to role '{role}'")]
    NotPermitted { tool: String, role: String },

    #[error("Missing required parameter '{param}' for tool '{tool}'")]
    MissingRequired { tool: String, param: String },

    #[error("Unknown parameter '{param}' for tool '{tool}'")]
    UnknownParameter { tool: String, param: String },

    #[error("Parameter '{param}' of tool '{tool}' must be {expected}, got {found}")]
    TypeMismatch {
        tool: String,
        param: String,
        expected: ParamType,
        found: &'static str,
    },

    #[error("Parameter '{param}' of tool '{tool}' must be one of {allowed:?}, got '{value}'")]
    NotInEnum {
        tool: String,
        param: String,
        value: String,
        allowed: Vec<String>,
    },
}

impl ValidationError {
    /// Structured description fed back to the model as the tool's result.
    pub fn to_feedback(&self) -> Value {
        serde_json::json!({
            "error": {
                "code": "INVALID_ARGUMENT",
                "message": self.to_string(),
            }
        })
    }
}

/// Validator for tool calls
///
/// This is a pure domain trait that checks tool calls against their
/// definitions without any I/O, producing typed arguments on success.
pub trait ToolValidator {
    /// Validate a tool call against its definition
    fn validate(
        &self,
        call: &ToolCall,
        definition: &ToolDefinition,
    ) -> Result<ValidatedArgs, ValidationError>;
}

/// Default implementation of ToolValidator
///
/// Rejects missing required parameters, unknown parameters, values of
/// the wrong JSON type and values outside a declared enum. An explicit
/// `null` for an optional parameter is treated as absent.
#[derive(Debug, Clone, Default)]
pub struct DefaultToolValidator;

impl ToolValidator for DefaultToolValidator {
    fn validate(
        &self,
        call: &ToolCall,
        definition: &ToolDefinition,
    ) -> Result<ValidatedArgs, ValidationError> {
        for arg_name in call.arguments.keys() {
            if definition.parameter(arg_name).is_none() {
                return Err(ValidationError::UnknownParameter {
                    tool: definition.name.clone(),
                    param: arg_name.clone(),
                });
            }
        }

        let mut values = BTreeMap::new();
        for param in &definition.parameters {
            match call.arguments.get(&param.name) {
                None | Some(Value::Null) => {
                    if param.required {
                        return Err(ValidationError::MissingRequired {
                            tool: definition.name.clone(),
                            param: param.name.clone(),
                        });
                    }
                }
                Some(raw) => {
                    let value = coerce(&definition.name, param, raw)?;
                    check_enum(&definition.name, param, &value)?;
                    values.insert(param.name.clone(), value);
                }
            }
        }

        Ok(ValidatedArgs::from_values(values))
    }
}

fn coerce(tool: &str, param: &ToolParameter, raw: &Value) -> Result<ArgValue, ValidationError> {
    let coerced = match (param.param_type, raw) {
        (ParamType::String, Value::String(s)) => Some(ArgValue::String(s.clone())),
        (ParamType::Boolean, Value::Bool(b)) => Some(ArgValue::Boolean(*b)),
        (ParamType::Number, Value::Number(n)) => n.as_f64().map(ArgValue::Number),
        (ParamType::Integer, Value::Number(n)) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        })
        .map(ArgValue::Integer),
        _ => None,
    };

    coerced.ok_or_else(|| ValidationError::TypeMismatch {
        tool: tool.to_string(),
        param: param.name.clone(),
        expected: param.param_type,
        found: json_type_name(raw),
    })
}

fn check_enum(tool: &str, param: &ToolParameter, value: &ArgValue) -> Result<(), ValidationError> {
    let Some(allowed) = &param.allowed else {
        return Ok(());
    };
    let rendered = match value {
        ArgValue::String(s) => s.clone(),
        ArgValue::Number(n) => n.to_string(),
        ArgValue::Integer(i) => i.to_string(),
        ArgValue::Boolean(b) => b.to_string(),
    };
    if allowed.iter().any(|a| *a == rendered) {
        Ok(())
    } else {
        Err(ValidationError::NotInEnum {
            tool: tool.to_string(),
            param: param.name.clone(),
            value: rendered,
            allowed: allowed.clone(),
        })
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn definition() -> ToolDefinition {
        ToolDefinition::new("calc_loan", "Loan calculator")
            .with_parameter(
                ToolParameter::new("price", "Total price", true).with_type(ParamType::Number),
            )
            .with_parameter(
                ToolParameter::new("years", "Loan term", true).with_type(ParamType::Integer),
            )
            .with_parameter(
                ToolParameter::new("method", "Repayment method", false)
                    .with_enum(["equal_payment", "equal_principal"]),
            )
            .with_parameter(
                ToolParameter::new("first_home", "First home", false)
                    .with_type(ParamType::Boolean),
            )
    }

    #[test]
    fn test_validator_missing_required() {
        let call = ToolCall::new("calc_loan").with_arg("years", 30);
        let err = DefaultToolValidator.validate(&call, &definition()).unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingRequired {
                tool: "calc_loan".to_string(),
                param: "price".to_string()
            }
        );
        assert!(err.to_string().contains("Missing required parameter"));
    }

    #[test]
    fn test_validator_unknown_param() {
        let call = ToolCall::new("calc_loan")
            .with_arg("price", 1)
            .with_arg("years", 1)
            .with_arg("colour", "red");
        let err = DefaultToolValidator.validate(&call, &definition()).unwrap_err();
        assert!(matches!(err, ValidationError::UnknownParameter { .. }));
    }

    #[test]
    fn test_validator_type_mismatch() {
        let call = ToolCall::new("calc_loan")
            .with_arg("price", "a lot")
            .with_arg("years", 30);
        let err = DefaultToolValidator.validate(&call, &definition()).unwrap_err();
        match err {
            ValidationError::TypeMismatch { param, expected, found, .. } => {
                assert_eq!(param, "price");
                assert_eq!(expected, ParamType::Number);
                assert_eq!(found, "string");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_validator_integer_rejects_fraction_accepts_whole_float() {
        let fractional = ToolCall::new("calc_loan")
            .with_arg("price", 1)
            .with_arg("years", 2.5);
        assert!(DefaultToolValidator.validate(&fractional, &definition()).is_err());

        let whole = ToolCall::new("calc_loan")
            .with_arg("price", 1)
            .with_arg("years", 30.0);
        let args = DefaultToolValidator.validate(&whole, &definition()).unwrap();
        assert_eq!(args.integer("years"), Some(30));
    }

    #[test]
    fn test_validator_enum_constraint() {
        let call = ToolCall::new("calc_loan")
            .with_arg("price", 1)
            .with_arg("years", 1)
            .with_arg("method", "balloon");
        let err = DefaultToolValidator.validate(&call, &definition()).unwrap_err();
        assert!(matches!(err, ValidationError::NotInEnum { .. }));
        assert_eq!(err.to_feedback()["error"]["code"], "INVALID_ARGUMENT");
    }

    #[test]
    fn test_validator_null_optional_is_absent() {
        let call = ToolCall::new("calc_loan")
            .with_arg("price", 900_000)
            .with_arg("years", 20)
            .with_arg("method", json!(null));
        let args = DefaultToolValidator.validate(&call, &definition()).unwrap();
        assert!(args.get("method").is_none());
        assert_eq!(args.number("price"), Some(900_000.0));
        assert_eq!(args.len(), 2);
    }

    #[test]
    fn test_validator_valid_call() {
        let call = ToolCall::new("calc_loan")
            .with_arg("price", 1_500_000.5)
            .with_arg("years", 25)
            .with_arg("method", "equal_principal")
            .with_arg("first_home", true);
        let args = DefaultToolValidator.validate(&call, &definition()).unwrap();
        assert_eq!(args.string("method"), Some("equal_principal"));
        assert_eq!(args.boolean("first_home"), Some(true));
    }
}
