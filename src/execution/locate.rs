//! Recovers the field path of a request-level error from its source position.

use super::error::PathSegment;
use async_graphql::parser::types::{ExecutableDocument, Selection, SelectionSet};
use async_graphql::{Name, Pos};
use std::collections::HashSet;

/// Response-key path of the field selection at `pos`, if any.
pub fn path_at(document: &ExecutableDocument, pos: Pos) -> Option<Vec<PathSegment>> {
    for (_, operation) in document.operations.iter() {
        let mut visited = HashSet::new();
        let mut prefix = Vec::new();
        if let Some(path) = search(
            document,
            &operation.node.selection_set.node,
            pos,
            &mut prefix,
            &mut visited,
        ) {
            return Some(path);
        }
    }
    None
}

fn search<'d>(
    document: &'d ExecutableDocument,
    selection_set: &'d SelectionSet,
    pos: Pos,
    prefix: &mut Vec<PathSegment>,
    visited: &mut HashSet<&'d Name>,
) -> Option<Vec<PathSegment>> {
    for selection in &selection_set.items {
        match &selection.node {
            Selection::Field(field) => {
                prefix.push(PathSegment::Field(
                    field.node.response_key().node.to_string(),
                ));

                let at_field = field.pos == pos
                    || field.node.name.pos == pos
                    || field
                        .node
                        .arguments
                        .iter()
                        .any(|(name, value)| name.pos == pos || value.pos == pos);
                if at_field {
                    return Some(prefix.clone());
                }

                let found = search(document, &field.node.selection_set.node, pos, prefix, visited);
                if found.is_some() {
                    return found;
                }
                prefix.pop();
            }
            Selection::InlineFragment(fragment) => {
                let found = search(
                    document,
                    &fragment.node.selection_set.node,
                    pos,
                    prefix,
                    visited,
                );
                if found.is_some() {
                    return found;
                }
            }
            Selection::FragmentSpread(spread) => {
                let name = &spread.node.fragment_name.node;
                if !visited.insert(name) {
                    continue;
                }
                if let Some(fragment) = document.fragments.get(name) {
                    let found = search(
                        document,
                        &fragment.node.selection_set.node,
                        pos,
                        prefix,
                        visited,
                    );
                    if found.is_some() {
                        return found;
                    }
                }
            }
        }
    }
    None
}
