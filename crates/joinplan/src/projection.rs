use crate::catalog::Catalog;
use crate::context::{Resolved, ResolveOptions};
use crate::join_graph::{JoinEdge, JoinGraph, ProjectedColumn, build_join_graph};
use crate::schema::Table;
use serde::{Deserialize, Serialize};

/// Separator placed between substituted columns.
const CONCAT_SEPARATOR: &str = " || ' ' || ";

/// Every column of the root table plus every reachable related column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FullProjection {
    pub base: Vec<ProjectedColumn>,
    pub nested: Vec<ProjectedColumn>,
    pub joins: Vec<JoinEdge>,
}

/// The root table's columns with foreign keys replaced by referenced columns where requested.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubstitutedProjection {
    pub columns: Vec<ProjectedColumn>,
    pub joins: Vec<JoinEdge>,
}

pub fn full_projection(
    catalog: &Catalog,
    table: &Table,
    options: &ResolveOptions,
) -> Resolved<FullProjection> {
    let Resolved { value: graph, issues } = build_join_graph(catalog, table, options);
    Resolved {
        value: full_from_graph(table, &options.base_alias, graph),
        issues,
    }
}

pub fn substituted_projection(
    catalog: &Catalog,
    table: &Table,
    options: &ResolveOptions,
) -> Resolved<SubstitutedProjection> {
    let Resolved { value: graph, issues } = build_join_graph(catalog, table, options);
    Resolved {
        value: substituted_from_graph(table, &options.base_alias, graph),
        issues,
    }
}

pub(crate) fn base_columns(table: &Table, base_alias: &str) -> Vec<ProjectedColumn> {
    table
        .field_names()
        .map(|field| ProjectedColumn::column(base_alias, field, field))
        .collect()
}

pub(crate) fn full_from_graph(table: &Table, base_alias: &str, graph: JoinGraph) -> FullProjection {
    FullProjection {
        base: base_columns(table, base_alias),
        nested: graph.nested_columns().cloned().collect(),
        joins: graph.edges,
    }
}

pub(crate) fn substituted_from_graph(
    table: &Table,
    base_alias: &str,
    graph: JoinGraph,
) -> SubstitutedProjection {
    let columns = table
        .field_names()
        .map(|field| substitute_column(table, base_alias, &graph, field))
        .collect();
    SubstitutedProjection {
        columns,
        joins: graph.edges,
    }
}

fn substitute_column(table: &Table, base_alias: &str, graph: &JoinGraph, field: &str) -> ProjectedColumn {
    // The first relationship on this foreign key that asks for a substitution wins.
    let Some((rel, replace_with)) = table.relationships.iter().find_map(|rel| {
        (rel.foreign_key.as_deref() == Some(field))
            .then(|| rel.substitution())
            .flatten()
            .map(|cols| (rel, cols))
    }) else {
        return ProjectedColumn::column(base_alias, field, field);
    };

    let output_name = rel.substitute_alias.as_deref().unwrap_or(field);

    // No join was produced (inert kind, dangling reference): keep the key itself.
    let Some(edge) = graph.root_edge(&rel.name, field) else {
        return ProjectedColumn::column(base_alias, field, output_name);
    };

    match replace_with {
        [single] => ProjectedColumn::column(&edge.alias, single, output_name),
        many => ProjectedColumn::new(
            many.iter()
                .map(|c| format!("{}.{c}", edge.alias))
                .collect::<Vec<_>>()
                .join(CONCAT_SEPARATOR),
            output_name,
        ),
    }
}
