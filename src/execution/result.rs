use super::error::StructuredError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outcome of one query execution: data, errors, or both.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<StructuredError>,
}

impl ExecutionResult {
    pub fn from_errors(errors: Vec<StructuredError>) -> Self {
        Self { data: None, errors }
    }

    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Pretty-printed JSON body.
    pub fn to_json_bytes(&self) -> Vec<u8> {
        serde_json::to_vec_pretty(self).unwrap_or_else(|e| {
            format!(
                "{{\"errors\":[{{\"message\":\"Failed to serialize result: {}\"}}]}}",
                e.to_string().replace('"', "'")
            )
            .into_bytes()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn omits_empty_parts() {
        let result = ExecutionResult {
            data: Some(json!({"a": 1})),
            errors: Vec::new(),
        };
        let body: Value = serde_json::from_slice(&result.to_json_bytes()).unwrap();
        assert_eq!(body, json!({"data": {"a": 1}}));

        let failed = ExecutionResult::from_errors(vec![StructuredError::validation("bad")]);
        let body: Value = serde_json::from_slice(&failed.to_json_bytes()).unwrap();
        assert!(body.get("data").is_none());
        assert!(!failed.is_ok());
    }
}
