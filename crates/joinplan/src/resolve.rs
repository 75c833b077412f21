//! Flattening of fields reachable through many-to-one relationships.

use crate::catalog::Catalog;
use crate::context::{ResolutionContext, Resolved, ResolveOptions};
use crate::schema::{RelationshipDef, Table, canonical_table_name};
use crate::types::ScalarType;
use serde::{Deserialize, Serialize};

/// Separator between relationship segments of a qualified name.
pub const SEGMENT_SEPARATOR: &str = "__";

/// A field of a related table, named by the relationship path that reaches it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedField {
    /// `rel__rel__column`.
    pub qualified_name: String,
    pub scalar_type: ScalarType,
    /// Always `false`: the related row may be absent.
    pub required: bool,
}

pub fn qualify(prefix: Option<&str>, segment: &str) -> String {
    match prefix {
        Some(prefix) if !prefix.is_empty() => format!("{prefix}{SEGMENT_SEPARATOR}{segment}"),
        _ => segment.to_string(),
    }
}

pub struct RelationshipResolver<'a> {
    catalog: &'a Catalog,
}

impl<'a> RelationshipResolver<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    /// Fields reachable from `current_table` through `relationships`, depth first, in
    /// declaration order.
    ///
    /// Termination is guaranteed by `cx.max_depth()`; the `(table, referenced, depth)` memo only
    /// keeps repeated sibling edges from being expanded twice at the same level.
    pub fn resolve(
        &self,
        cx: &mut ResolutionContext,
        relationships: &[RelationshipDef],
        current_table: &str,
        prefix: Option<&str>,
        depth: usize,
    ) -> Vec<ResolvedField> {
        if depth >= cx.max_depth {
            return Vec::new();
        }

        let mut out = Vec::new();
        for rel in relationships {
            let Some(edge) = rel.many_to_one() else {
                continue;
            };
            let referenced = canonical_table_name(edge.references_table);

            if cx.already_expanded(current_table, referenced, depth) {
                tracing::trace!(current_table, referenced, depth, "edge already expanded");
                continue;
            }

            let Some(target) = self.catalog.lookup(referenced) else {
                cx.dangling(edge.references_table, edge.name, depth);
                continue;
            };

            let current_prefix = qualify(prefix, edge.name);
            out.extend(target.fields.iter().map(|(field, def)| ResolvedField {
                qualified_name: qualify(Some(&current_prefix), field),
                scalar_type: def.scalar_type,
                required: false,
            }));
            cx.mark_expanded(current_table, referenced, depth);

            if !target.relationships.is_empty() && depth + 1 < cx.max_depth {
                let nested = self.resolve(
                    cx,
                    &target.relationships,
                    referenced,
                    Some(&current_prefix),
                    depth + 1,
                );
                out.extend(nested);
            }
        }
        out
    }
}

/// Every nested field of `table`, with a fresh resolution context.
pub fn resolve_nested_fields(
    catalog: &Catalog,
    table: &Table,
    options: &ResolveOptions,
) -> Resolved<Vec<ResolvedField>> {
    let mut cx = ResolutionContext::new(&table.name, options);
    let value =
        RelationshipResolver::new(catalog).resolve(&mut cx, &table.relationships, &table.name, None, 0);
    Resolved {
        value,
        issues: cx.into_issues(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qualify_joins_with_double_underscore() {
        assert_eq!(qualify(None, "author"), "author");
        assert_eq!(qualify(Some(""), "author"), "author");
        assert_eq!(qualify(Some("post__author"), "id"), "post__author__id");
    }
}
