//! JSON Schema tool converter.
//!
//! Default implementation of [`ToolSchemaPort`] producing the function
//! format of OpenAI-compatible chat APIs.

use roundtable_application::ToolSchemaPort;
use roundtable_domain::ToolDefinition;
use serde_json::{Map, Value, json};

/// Produces `{"type": "function", "function": {name, description, parameters}}`.
///
/// Parameter types map one-to-one onto JSON Schema types; enum-restricted
/// parameters carry an `enum` list.
pub struct JsonSchemaToolConverter;

impl ToolSchemaPort for JsonSchemaToolConverter {
    fn tool_to_schema(&self, tool: &ToolDefinition) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for param in &tool.parameters {
            let mut prop = Map::new();
            prop.insert("type".to_string(), json!(param.param_type.as_str()));
            prop.insert("description".to_string(), json!(param.description));
            if let Some(allowed) = &param.allowed {
                prop.insert("enum".to_string(), json!(allowed));
            }
            properties.insert(param.name.clone(), Value::Object(prop));

            if param.required {
                required.push(json!(param.name));
            }
        }

        json!({
            "type": "function",
            "function": {
                "name": tool.name,
                "description": tool.description,
                "parameters": {
                    "type": "object",
                    "properties": properties,
                    "required": required,
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roundtable_domain::{ParamType, ToolParameter, ToolSpec};

    fn loan_tool() -> ToolDefinition {
        ToolDefinition::new("calc_loan", "Loan calculator")
            .with_parameter(
                ToolParameter::new("price", "House price", true).with_type(ParamType::Number),
            )
            .with_parameter(
                ToolParameter::new("years", "Term", true).with_type(ParamType::Integer),
            )
            .with_parameter(
                ToolParameter::new("method", "Repayment method", false)
                    .with_enum(["equal_payment", "equal_principal"]),
            )
    }

    #[test]
    fn test_tool_to_schema() {
        let schema = JsonSchemaToolConverter.tool_to_schema(&loan_tool());

        assert_eq!(schema["type"], "function");
        let function = &schema["function"];
        assert_eq!(function["name"], "calc_loan");
        assert_eq!(function["parameters"]["type"], "object");

        let props = &function["parameters"]["properties"];
        assert_eq!(props["price"]["type"], "number");
        assert_eq!(props["years"]["type"], "integer");
        assert_eq!(props["method"]["type"], "string");
        assert_eq!(props["method"]["enum"][1], "equal_principal");
        assert!(props["price"].get("enum").is_none());

        let required = function["parameters"]["required"].as_array().unwrap();
        assert_eq!(required, &vec![json!("price"), json!("years")]);
    }

    #[test]
    fn test_tools_schema_follows_requested_order_and_skips_unknown() {
        let spec = ToolSpec::new()
            .with_tool(loan_tool())
            .with_tool(ToolDefinition::new("search_faq", "FAQ search"));

        let names = vec![
            "search_faq".to_string(),
            "web_search".to_string(),
            "calc_loan".to_string(),
        ];
        let tools = JsonSchemaToolConverter.tools_schema(&spec, &names);
        assert_eq!(tools.len(), 2);
        assert_eq!(tools[0]["function"]["name"], "search_faq");
        assert_eq!(tools[1]["function"]["name"], "calc_loan");
    }
}
