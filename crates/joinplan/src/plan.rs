//! Per-table aggregation of everything the code emitter needs.

use crate::catalog::Catalog;
use crate::context::{ResolutionContext, ResolveOptions};
use crate::error::{PlanError, PlanResult};
use crate::issue::{PlanIssue, merge_issues};
use crate::join_graph::{JoinEdge, JoinGraphBuilder};
use crate::projection::{FullProjection, SubstitutedProjection, full_from_graph, substituted_from_graph};
use crate::resolve::{RelationshipResolver, ResolvedField};
use crate::schema::{Literal, Table};
use crate::types::ScalarType;
use heck::ToUpperCamelCase;
use serde::{Deserialize, Serialize};

/// A column declared directly on the root table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldPlan {
    pub name: String,
    pub scalar_type: ScalarType,
    pub required: bool,
    pub primary_key: bool,
    pub auto_increment: bool,
    pub default: Option<Literal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TablePlan {
    /// Canonical table name.
    pub table: String,
    /// Table name as written in the schema document.
    pub source_table: String,
    pub model_name: String,
    pub max_join_depth: usize,
    pub base_alias: String,
    pub fields: Vec<FieldPlan>,
    pub nested_fields: Vec<ResolvedField>,
    pub joins: Vec<JoinEdge>,
    pub full_projection: FullProjection,
    pub substituted_projection: SubstitutedProjection,
    pub issues: Vec<PlanIssue>,
}

impl TablePlan {
    pub fn to_json(&self) -> PlanResult<String> {
        let mut out = serde_json::to_string_pretty(self)?;
        out.push('\n');
        Ok(out)
    }
}

/// Resolve one root table.
pub fn plan_table(catalog: &Catalog, name: &str, options: &ResolveOptions) -> PlanResult<TablePlan> {
    let table = catalog
        .lookup(name)
        .ok_or_else(|| PlanError::TableNotFound(name.to_string()))?;
    Ok(plan_for(catalog, table, options))
}

/// Resolve `selection` (or every table, in load order, when it is empty).
pub fn plan_catalog(
    catalog: &Catalog,
    options: &ResolveOptions,
    selection: &[String],
) -> PlanResult<Vec<TablePlan>> {
    if selection.is_empty() {
        return Ok(catalog.tables().map(|t| plan_for(catalog, t, options)).collect());
    }
    selection
        .iter()
        .map(|name| plan_table(catalog, name, options))
        .collect()
}

fn plan_for(catalog: &Catalog, table: &Table, options: &ResolveOptions) -> TablePlan {
    let span = tracing::debug_span!("plan_table", table = %table.name);
    let _enter = span.enter();

    // Each traversal gets its own context: neither memo nor alias numbering may leak.
    let mut field_cx = ResolutionContext::new(&table.name, options);
    let nested_fields = RelationshipResolver::new(catalog).resolve(
        &mut field_cx,
        &table.relationships,
        &table.name,
        None,
        0,
    );

    let mut join_cx = ResolutionContext::new(&table.name, options);
    let graph = JoinGraphBuilder::new(catalog).build(
        &mut join_cx,
        &table.name,
        &table.relationships,
        &options.base_alias,
        0,
    );

    let mut issues = field_cx.into_issues();
    merge_issues(&mut issues, join_cx.into_issues());

    let substituted_projection = substituted_from_graph(table, &options.base_alias, graph.clone());
    let full_projection = full_from_graph(table, &options.base_alias, graph);

    tracing::debug!(
        nested_fields = nested_fields.len(),
        joins = full_projection.joins.len(),
        issues = issues.len(),
        "table resolved"
    );

    TablePlan {
        table: table.name.clone(),
        source_table: table.source_name.clone(),
        model_name: model_name(&table.name),
        max_join_depth: options.max_join_depth,
        base_alias: options.base_alias.clone(),
        fields: table
            .fields
            .iter()
            .map(|(name, def)| FieldPlan {
                name: name.clone(),
                scalar_type: def.scalar_type,
                required: def.is_required(),
                primary_key: def.primary_key,
                auto_increment: def.auto_increment,
                default: def.default.clone(),
            })
            .collect(),
        nested_fields,
        joins: full_projection.joins.clone(),
        full_projection,
        substituted_projection,
        issues,
    }
}

/// `order_lines` -> `OrderLines`. Names without underscores that already start uppercase are
/// kept as written (`XMLHttpRequest`).
pub fn model_name(table: &str) -> String {
    if !table.contains('_') && table.starts_with(|c: char| c.is_uppercase()) {
        return table.to_string();
    }
    table.to_upper_camel_case()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_name_is_pascal_case() {
        assert_eq!(model_name("order_lines"), "OrderLines");
        assert_eq!(model_name("users"), "Users");
        assert_eq!(model_name("XMLHttpRequest"), "XMLHttpRequest");
    }
}
