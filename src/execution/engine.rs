use super::context::ExecutionContext;
use super::error::StructuredError;
use super::request::RequestEnvelope;
use super::result::ExecutionResult;
use super::strategy::structure;
use crate::schema::builder::PropagatedFailure;
use crate::schema::ComposedSchema;
use crate::{log_query_debug, log_query_warn};
use async_graphql::parser::parse_query;
use async_graphql::{Request, Response, Variables};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Knobs applied to every execution.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecutionOptions {
    /// Deadline for one query; `None` lets queries run to completion.
    pub timeout: Option<Duration>,
    /// Keep stack traces of unexpected failures in the result.
    pub expose_detail: bool,
}

/// Runs requests against a composed schema.
#[derive(Debug, Clone)]
pub struct ExecutionEngine {
    schema: Arc<ComposedSchema>,
    options: ExecutionOptions,
}

impl ExecutionEngine {
    pub fn new(schema: Arc<ComposedSchema>, options: ExecutionOptions) -> Self {
        Self { schema, options }
    }

    pub fn schema(&self) -> &Arc<ComposedSchema> {
        &self.schema
    }

    pub fn options(&self) -> ExecutionOptions {
        self.options
    }

    /// Execute one request. Resolves once every field has settled (or the
    /// deadline passed).
    pub async fn execute(
        &self,
        envelope: RequestEnvelope,
        context: ExecutionContext,
    ) -> ExecutionResult {
        let document = parse_query(&envelope.query).ok();

        let mut request = Request::new(envelope.query).data(context);
        if let Some(variables) = envelope.variables {
            request = request.variables(Variables::from_json(Value::Object(variables)));
        }
        if let Some(operation_name) = envelope.operation_name {
            request = request.operation_name(operation_name);
        }

        let executable = self.schema.executable();
        let response = match self.options.timeout {
            Some(limit) => match tokio::time::timeout(limit, executable.execute(request)).await {
                Ok(response) => response,
                Err(_) => {
                    log_query_warn!("Query exceeded its {} ms deadline", limit.as_millis());
                    return ExecutionResult::from_errors(vec![StructuredError::timeout(
                        limit.as_millis(),
                    )]);
                }
            },
            None => executable.execute(request).await,
        };

        self.convert(response, document.as_ref())
    }

    fn convert(
        &self,
        response: Response,
        document: Option<&async_graphql::parser::types::ExecutableDocument>,
    ) -> ExecutionResult {
        let data = match response.data {
            async_graphql::Value::Null => None,
            data => data.into_json().ok(),
        };

        let errors = response
            .errors
            .into_iter()
            .filter(|error| error.source::<PropagatedFailure>().is_none())
            .map(|error| {
                let structured = structure(error, document);
                log_query_debug!(
                    "{} error: {}",
                    structured.kind(),
                    structured.message
                );
                if self.options.expose_detail {
                    structured
                } else {
                    structured.without_detail()
                }
            })
            .collect();

        ExecutionResult { data, errors }
    }
}

/// Execute with default options.
pub async fn execute(
    schema: Arc<ComposedSchema>,
    envelope: RequestEnvelope,
    context: ExecutionContext,
) -> ExecutionResult {
    ExecutionEngine::new(schema, ExecutionOptions::default())
        .execute(envelope, context)
        .await
}
