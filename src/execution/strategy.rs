//! Turns engine errors into [`StructuredError`]s.

use super::error::{PathSegment, SourceLocation, StructuredError};
use super::locate::path_at;
use crate::schema::ResolverError;
use async_graphql::parser::types::ExecutableDocument;
use async_graphql::ServerError;

/// Classify one engine error.
///
/// Errors raised by resolvers carry a [`ResolverError`] source. Other errors
/// with a path happened while completing a field value; errors without one
/// concern the request as a whole, and get a path from `document` when the
/// reported location points at a field.
pub fn structure(error: ServerError, document: Option<&ExecutableDocument>) -> StructuredError {
    let locations: Vec<SourceLocation> = error
        .locations
        .iter()
        .map(|pos| SourceLocation {
            line: pos.line,
            column: pos.column,
        })
        .collect();
    let path: Vec<PathSegment> = error
        .path
        .iter()
        .map(|segment| match segment {
            async_graphql::PathSegment::Field(name) => PathSegment::Field(name.clone()),
            async_graphql::PathSegment::Index(index) => PathSegment::Index(*index),
        })
        .collect();

    if let Some(failure) = error.source::<ResolverError>() {
        return match failure {
            ResolverError::Domain { code, message } => {
                StructuredError::domain(code.clone(), message.clone()).at(Some(path), locations)
            }
            ResolverError::Generic { message, trace } => {
                StructuredError::data_fetching(path, message, trace.clone()).at(None, locations)
            }
        };
    }

    if !path.is_empty() {
        return StructuredError::data_fetching(path, &error.message, None).at(None, locations);
    }

    let recovered = document.and_then(|document| {
        error
            .locations
            .first()
            .and_then(|pos| path_at(document, *pos))
    });
    StructuredError::validation(error.message).at(recovered, locations)
}
