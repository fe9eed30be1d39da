//! Request payloads accepted by the endpoint.

use serde_json::{Map, Value};
use std::collections::HashMap;

/// Why a payload (or one batch item) could not be read as a request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EnvelopeError {
    #[error("Bad JSON request")]
    Malformed(String),

    #[error("Bad JSON request")]
    UnsupportedShape,

    #[error("Request item is not an object")]
    NotAnObject,

    #[error("Query not specified")]
    MissingQuery,

    #[error("Invalid '{0}' field")]
    InvalidField(&'static str),
}

/// A single query submission.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestEnvelope {
    pub query: String,
    pub variables: Option<Map<String, Value>>,
    pub operation_name: Option<String>,
}

impl RequestEnvelope {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            variables: None,
            operation_name: None,
        }
    }

    pub fn with_variables(mut self, variables: Map<String, Value>) -> Self {
        self.variables = Some(variables);
        self
    }

    pub fn with_operation_name(mut self, operation_name: impl Into<String>) -> Self {
        self.operation_name = Some(operation_name.into());
        self
    }

    /// Read a request from a JSON object with `query`, `variables` and
    /// `operationName` members. `null` members count as absent; `variables`
    /// may also be a JSON-encoded string.
    pub fn from_json(value: Value) -> Result<Self, EnvelopeError> {
        let Value::Object(mut object) = value else {
            return Err(EnvelopeError::NotAnObject);
        };

        let query = match object.remove("query") {
            None | Some(Value::Null) => return Err(EnvelopeError::MissingQuery),
            Some(Value::String(query)) => query,
            Some(_) => return Err(EnvelopeError::InvalidField("query")),
        };

        let variables = match object.remove("variables") {
            None | Some(Value::Null) => None,
            Some(Value::Object(variables)) => Some(variables),
            Some(Value::String(encoded)) => parse_variables(&encoded)?,
            Some(_) => return Err(EnvelopeError::InvalidField("variables")),
        };

        let operation_name = match object.remove("operationName") {
            None | Some(Value::Null) => None,
            Some(Value::String(name)) if name.is_empty() => None,
            Some(Value::String(name)) => Some(name),
            Some(_) => return Err(EnvelopeError::InvalidField("operationName")),
        };

        Ok(Self {
            query,
            variables,
            operation_name,
        })
    }

    /// Read a request from URL query parameters.
    pub fn from_query_params(params: &HashMap<String, String>) -> Result<Self, EnvelopeError> {
        let query = params.get("query").ok_or(EnvelopeError::MissingQuery)?;

        let variables = match params.get("variables") {
            Some(encoded) => parse_variables(encoded)?,
            None => None,
        };

        Ok(Self {
            query: query.clone(),
            variables,
            operation_name: params
                .get("operationName")
                .filter(|name| !name.is_empty())
                .cloned(),
        })
    }
}

fn parse_variables(encoded: &str) -> Result<Option<Map<String, Value>>, EnvelopeError> {
    if encoded.trim().is_empty() {
        return Ok(None);
    }
    match serde_json::from_str(encoded) {
        Ok(Value::Object(variables)) => Ok(Some(variables)),
        Ok(Value::Null) => Ok(None),
        _ => Err(EnvelopeError::InvalidField("variables")),
    }
}

/// Items of a batched submission. Items that are not valid requests keep their
/// slot so results line up with the input.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatchEnvelope {
    pub items: Vec<Result<RequestEnvelope, EnvelopeError>>,
}

impl BatchEnvelope {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// A parsed request body.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Single(RequestEnvelope),
    Batch(BatchEnvelope),
}

impl Payload {
    pub fn parse(body: &[u8]) -> Result<Self, EnvelopeError> {
        let value: Value =
            serde_json::from_slice(body).map_err(|e| EnvelopeError::Malformed(e.to_string()))?;

        match value {
            Value::Array(items) => Ok(Payload::Batch(BatchEnvelope {
                items: items.into_iter().map(RequestEnvelope::from_json).collect(),
            })),
            object @ Value::Object(_) => RequestEnvelope::from_json(object).map(Payload::Single),
            _ => Err(EnvelopeError::UnsupportedShape),
        }
    }
}
