//! joinplan
//!
//! Resolves declarative table schemas with many-to-one relationships into the structures a
//! data-access code generator needs:
//!
//! - **Nested fields**: every column reachable through relationships, named by its path
//!   (`department__company__name`).
//! - **Join graph**: the ordered join edges, with unique aliases, that fetch those columns.
//! - **Projections**: a full nested column list, and a variant where foreign keys are replaced
//!   by columns of the referenced row.
//!
//! Loading and resolving are two separate passes: build a [`Catalog`] from every document
//! first, then resolve tables against it. Schema problems never abort a batch; they come back
//! as [`PlanIssue`]s next to the (partial) result.
//!
//! # Example
//!
//! ```ignore
//! use joinplan::{Catalog, ResolveOptions, SchemaDocument, plan_table};
//!
//! let doc = SchemaDocument::from_path("schema/blog.yaml".as_ref())?;
//! let (catalog, issues) = Catalog::load(&[doc]);
//! let plan = plan_table(&catalog, "posts", &ResolveOptions::with_depth(2))?;
//! for f in &plan.nested_fields {
//!     println!("{} {}", f.qualified_name, f.scalar_type);
//! }
//! ```

pub mod catalog;
pub mod context;
pub mod error;
pub mod issue;
pub mod join_graph;
pub mod plan;
pub mod projection;
pub mod resolve;
pub mod schema;
pub mod types;


pub use catalog::Catalog;
pub use context::{
    AliasScope, DEFAULT_BASE_ALIAS, DEFAULT_MAX_JOIN_DEPTH, ResolutionContext, ResolveOptions,
    Resolved,
};
pub use error::{PlanError, PlanResult};
pub use issue::{IssueKind, IssueLevel, PlanIssue};
pub use join_graph::{
    AliasColumns, JoinEdge, JoinGraph, JoinGraphBuilder, ProjectedColumn, build_join_graph,
};
pub use plan::{FieldPlan, TablePlan, model_name, plan_catalog, plan_table};
pub use projection::{FullProjection, SubstitutedProjection, full_projection, substituted_projection};
pub use resolve::{RelationshipResolver, ResolvedField, SEGMENT_SEPARATOR, resolve_nested_fields};
pub use schema::{
    FieldDef, JoinKind, Literal, RelationshipDef, RelationshipKind, SchemaDocument, Table,
    canonical_table_name,
};
pub use types::ScalarType;
