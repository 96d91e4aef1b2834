//! @acp:module "Schema Validation"
//! @acp:summary "Validate flow files against the embedded JSON schema"
//! @acp:domain flow
//! @acp:layer validation

use std::sync::OnceLock;

use crate::error::{Result, ThriveError};

/// Embedded flow schema
pub const FLOW_SCHEMA: &str = include_str!("../../schemas/flow.schema.json");

fn flow_validator() -> Result<&'static jsonschema::Validator> {
    static VALIDATOR: OnceLock<jsonschema::Validator> = OnceLock::new();
    if let Some(validator) = VALIDATOR.get() {
        return Ok(validator);
    }

    let schema: serde_json::Value = serde_json::from_str(FLOW_SCHEMA)?;
    let validator = jsonschema::validator_for(&schema)
        .map_err(|e| ThriveError::Schema(format!("Invalid embedded flow schema: {}", e)))?;
    Ok(VALIDATOR.get_or_init(|| validator))
}

/// Validate a parsed flow document, collecting every violation
pub fn validate_flow(instance: &serde_json::Value) -> Result<()> {
    let validator = flow_validator()?;
    let errors: Vec<String> = validator
        .iter_errors(instance)
        .map(|e| e.to_string())
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ThriveError::Schema(errors.join("; ")))
    }
}

/// Validate flow source text; `yaml` selects the parser
pub fn validate_flow_str(content: &str, yaml: bool) -> Result<serde_json::Value> {
    let value: serde_json::Value = if yaml {
        serde_yaml::from_str(content)?
    } else {
        serde_json::from_str(content)?
    };
    validate_flow(&value)?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_flow_is_valid() {
        let content = include_str!("../../flows/onboarding.default.json");
        assert!(validate_flow_str(content, false).is_ok());
    }

    #[test]
    fn test_negative_deduction_rejected() {
        let content = r#"{"start": "a", "nodes": [
            {"id": "a", "prompt": "A?", "options": [{"label": "x", "deduction": -5}]}
        ]}"#;
        let err = validate_flow_str(content, false).unwrap_err();
        assert!(matches!(err, ThriveError::Schema(_)));
    }

    #[test]
    fn test_start_required_unless_extending() {
        assert!(validate_flow_str(r#"{"nodes": []}"#, false).is_err());
        assert!(validate_flow_str(r#"{"extends": "builtin"}"#, false).is_ok());
    }

    #[test]
    fn test_yaml_flow() {
        let content = r#"
start: a
nodes:
  - id: a
    prompt: "A?"
    options:
      - label: x
        deduction: 3
"#;
        assert!(validate_flow_str(content, true).is_ok());
    }
}
