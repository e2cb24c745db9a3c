//! Typed tool arguments.
//!
//! [`ValidatedArgs`] is the only argument type a tool body ever receives.
//! It can only be built by the validator (see [`super::traits`]), so a
//! value of this type proves that every required parameter is present,
//! every value has its declared type and every enum value is allowed.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;

use super::value_objects::ToolError;

/// A single argument value, already coerced to its declared type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ArgValue {
    String(String),
    Number(f64),
    Integer(i64),
    Boolean(bool),
}

impl ArgValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ArgValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ArgValue::Number(n) => Some(*n),
            ArgValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ArgValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ArgValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

/// Arguments that passed validation against a tool definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidatedArgs {
    values: BTreeMap<String, ArgValue>,
}

impl ValidatedArgs {
    pub(crate) fn from_values(values: BTreeMap<String, ArgValue>) -> Self {
        Self { values }
    }

    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.values.get(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn string(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(ArgValue::as_str)
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(ArgValue::as_f64)
    }

    pub fn integer(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(ArgValue::as_i64)
    }

    pub fn boolean(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(ArgValue::as_bool)
    }

    /// Deserialize into a tool-specific argument struct.
    ///
    /// Tools declare a `#[derive(Deserialize)]` struct mirroring their
    /// parameters and call this once at the top of `execute`.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, ToolError> {
        let value = serde_json::to_value(&self.values)
            .map_err(|e| ToolError::invalid_argument(e.to_string()))?;
        serde_json::from_value(value).map_err(|e| ToolError::invalid_argument(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct LoanArgs {
        price: f64,
        years: i64,
        #[serde(default)]
        method: Option<String>,
    }

    fn args() -> ValidatedArgs {
        let mut values = BTreeMap::new();
        values.insert("price".to_string(), ArgValue::Number(1_200_000.0));
        values.insert("years".to_string(), ArgValue::Integer(30));
        values.insert("first".to_string(), ArgValue::Boolean(true));
        ValidatedArgs::from_values(values)
    }

    #[test]
    fn test_typed_getters() {
        let args = args();
        assert_eq!(args.number("price"), Some(1_200_000.0));
        assert_eq!(args.number("years"), Some(30.0));
        assert_eq!(args.integer("years"), Some(30));
        assert_eq!(args.boolean("first"), Some(true));
        assert_eq!(args.string("price"), None);
    }

    #[test]
    fn test_parse_into_tool_struct() {
        let parsed: LoanArgs = args().parse().unwrap();
        assert_eq!(parsed.price, 1_200_000.0);
        assert_eq!(parsed.years, 30);
        assert!(parsed.method.is_none());
    }
}
