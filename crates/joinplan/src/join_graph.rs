//! Join edges and per-alias column projections for many-to-one relationships.
//!
//! The traversal has the same shape as [`crate::resolve::RelationshipResolver`]: the same
//! relationships are followed, in the same order, up to the same depth. Instead of field
//! declarations it produces one [`JoinEdge`] per followed relationship plus the columns to
//! select from each joined alias.

use crate::catalog::Catalog;
use crate::context::{ResolutionContext, Resolved, ResolveOptions};
use crate::resolve::qualify;
use crate::schema::{JoinKind, RelationshipDef, Table, canonical_table_name};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One join step: `<kind> JOIN <referenced_table> <alias> ON <local_alias>.<local_column> = <alias>.<foreign_column>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinEdge {
    /// Unique within one root-table resolution.
    pub alias: String,
    /// Referenced table as written in the relationship.
    pub referenced_table: String,
    pub join_kind: JoinKind,
    pub local_alias: String,
    pub local_column: String,
    pub foreign_column: String,
    /// Relationship path from the root table, e.g. `department__company`.
    pub relationship: String,
    /// Number of hops from the root table, starting at 0.
    pub depth: usize,
}

/// `expression AS output_name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectedColumn {
    pub expression: String,
    pub output_name: String,
}

impl ProjectedColumn {
    pub fn new(expression: impl Into<String>, output_name: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            output_name: output_name.into(),
        }
    }

    /// `alias.column AS output_name`.
    pub fn column(alias: &str, column: &str, output_name: impl Into<String>) -> Self {
        Self::new(format!("{alias}.{column}"), output_name)
    }
}

impl fmt::Display for ProjectedColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} AS {}", self.expression, self.output_name)
    }
}

/// Columns projected from one joined alias.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasColumns {
    pub alias: String,
    pub columns: Vec<ProjectedColumn>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinGraph {
    pub edges: Vec<JoinEdge>,
    /// Ordered mapping alias -> projected columns.
    pub columns: Vec<AliasColumns>,
}

impl JoinGraph {
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn columns_for(&self, alias: &str) -> Option<&[ProjectedColumn]> {
        self.columns
            .iter()
            .find(|c| c.alias == alias)
            .map(|c| c.columns.as_slice())
    }

    /// All projected columns, in relationship declaration order.
    pub fn nested_columns(&self) -> impl Iterator<Item = &ProjectedColumn> {
        self.columns.iter().flat_map(|c| c.columns.iter())
    }

    /// The root-level edge created for relationship `name` on `foreign_key`.
    pub fn root_edge(&self, name: &str, foreign_key: &str) -> Option<&JoinEdge> {
        self.edges
            .iter()
            .find(|e| e.depth == 0 && e.relationship == name && e.local_column == foreign_key)
    }

    /// Fold a child graph built under relationship `rel_name` into this one.
    fn absorb(&mut self, rel_name: &str, child: JoinGraph) {
        self.edges.extend(child.edges.into_iter().map(|mut e| {
            e.relationship = qualify(Some(rel_name), &e.relationship);
            e
        }));
        self.columns.extend(child.columns.into_iter().map(|mut c| {
            for col in &mut c.columns {
                col.output_name = qualify(Some(rel_name), &col.output_name);
            }
            c
        }));
    }
}

pub struct JoinGraphBuilder<'a> {
    catalog: &'a Catalog,
}

impl<'a> JoinGraphBuilder<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    /// Join edges and projected columns for `relationships` of `table_name`, joined from
    /// `base_alias`.
    ///
    /// Every alias handed out is reserved in `cx` immediately, so siblings and descendants
    /// never reuse one.
    pub fn build(
        &self,
        cx: &mut ResolutionContext,
        table_name: &str,
        relationships: &[RelationshipDef],
        base_alias: &str,
        depth: usize,
    ) -> JoinGraph {
        let mut graph = JoinGraph::default();
        if depth >= cx.max_depth {
            return graph;
        }

        let mut counter = cx.aliases.len();
        for rel in relationships {
            let Some(edge) = rel.many_to_one() else {
                continue;
            };
            let Some(target) = self.catalog.lookup(edge.references_table) else {
                cx.dangling(edge.references_table, edge.name, depth);
                continue;
            };

            let alias = match rel.alias_override.as_deref() {
                Some(wanted) if !cx.aliases.contains(wanted) => wanted.to_string(),
                Some(wanted) => {
                    let alias = cx.aliases.next_synthetic(&mut counter);
                    tracing::debug!(table = table_name, wanted, alias = %alias, "alias already in use");
                    alias
                }
                None => cx.aliases.next_synthetic(&mut counter),
            };
            cx.aliases.reserve(&alias);
            tracing::trace!(table = table_name, relationship = edge.name, alias = %alias, depth, "join edge");

            graph.edges.push(JoinEdge {
                alias: alias.clone(),
                referenced_table: edge.references_table.to_string(),
                join_kind: rel.join_kind(),
                local_alias: base_alias.to_string(),
                local_column: edge.foreign_key.to_string(),
                foreign_column: edge.references_field.to_string(),
                relationship: edge.name.to_string(),
                depth,
            });
            graph.columns.push(AliasColumns {
                alias: alias.clone(),
                columns: target
                    .field_names()
                    .map(|field| ProjectedColumn::column(&alias, field, qualify(Some(edge.name), field)))
                    .collect(),
            });

            if !target.relationships.is_empty() && depth + 1 < cx.max_depth {
                let child = self.build(
                    cx,
                    canonical_table_name(edge.references_table),
                    &target.relationships,
                    &alias,
                    depth + 1,
                );
                graph.absorb(edge.name, child);
            }
        }
        graph
    }
}

/// The join graph of `table`, with a fresh resolution context.
pub fn build_join_graph(
    catalog: &Catalog,
    table: &Table,
    options: &ResolveOptions,
) -> Resolved<JoinGraph> {
    let mut cx = ResolutionContext::new(&table.name, options);
    let value = JoinGraphBuilder::new(catalog).build(
        &mut cx,
        &table.name,
        &table.relationships,
        &options.base_alias,
        0,
    );
    Resolved {
        value,
        issues: cx.into_issues(),
    }
}
