//! Schema documents and the table model they describe.
//!
//! Documents are YAML with a top-level `tables` mapping:
//!
//! ```yaml
//! tables:
//!   posts_table:
//!     fields:
//!       id: { type: integer, primary_key: true, auto_increment: true }
//!       author_id: { type: integer, not_null: true }
//!     relationships:
//!       - name: author
//!         type: many_to_one
//!         foreign_key: author_id
//!         references_table: users
//!         references_field: id
//! ```
//!
//! Parsing is deliberately forgiving: a value of the wrong shape for a known key is reported as
//! an [`IssueKind::InvalidValue`] warning and the default is used.

use crate::error::{PlanError, PlanResult};
use crate::issue::{IssueKind, PlanIssue};
use crate::types::ScalarType;
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::path::Path;

/// One parsed schema document.
#[derive(Debug, Clone)]
pub struct SchemaDocument {
    /// Where the document came from (a path, or a label for in-memory documents).
    pub origin: String,
    root: Value,
}

impl SchemaDocument {
    pub fn from_yaml_str(origin: impl Into<String>, text: &str) -> PlanResult<Self> {
        let origin = origin.into();
        let root = serde_yaml::from_str(text).map_err(|source| PlanError::Yaml {
            origin: origin.clone(),
            source,
        })?;
        Ok(Self { origin, root })
    }

    pub fn from_path(path: &Path) -> PlanResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| PlanError::io(path, e))?;
        Self::from_yaml_str(path.display().to_string(), &text)
    }

    /// The raw `(name, definition)` entries of the `tables` mapping, in document order.
    pub(crate) fn table_entries(&self, issues: &mut Vec<PlanIssue>) -> Vec<(String, &Value)> {
        let tables = match &self.root {
            Value::Mapping(root) => root.get("tables"),
            Value::Null => None,
            _ => {
                PlanIssue::warning(
                    IssueKind::InvalidValue,
                    None,
                    format!("{}: document root must be a mapping", self.origin),
                )
                .report(issues);
                return Vec::new();
            }
        };

        let Some(tables) = tables else {
            tracing::debug!(origin = %self.origin, "document has no tables section");
            return Vec::new();
        };
        let Value::Mapping(tables) = tables else {
            PlanIssue::warning(
                IssueKind::InvalidValue,
                None,
                format!("{}: 'tables' must be a mapping of table name to definition", self.origin),
            )
            .report(issues);
            return Vec::new();
        };

        let mut out = Vec::with_capacity(tables.len());
        for (key, def) in tables {
            match key.as_str() {
                Some(name) => out.push((name.to_string(), def)),
                None => PlanIssue::warning(
                    IssueKind::InvalidValue,
                    None,
                    format!("{}: table names must be strings (got {key:?})", self.origin),
                )
                .report(issues),
            }
        }
        out
    }
}

/// A literal default value as written in the schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub scalar_type: ScalarType,
    pub primary_key: bool,
    pub not_null: bool,
    pub auto_increment: bool,
    pub default: Option<Literal>,
}

impl FieldDef {
    /// Primary keys are always required; other `not_null` columns are unless the store fills
    /// them in (`auto_increment`).
    pub fn is_required(&self) -> bool {
        self.primary_key || (self.not_null && !self.auto_increment)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipKind {
    ManyToOne,
    OneToMany,
    ManyToMany,
    /// No `type` key.
    Unspecified,
    Other(String),
}

impl RelationshipKind {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "many_to_one" => Self::ManyToOne,
            "one_to_many" => Self::OneToMany,
            "many_to_many" => Self::ManyToMany,
            other => Self::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinKind {
    Inner,
    #[default]
    Left,
}

impl JoinKind {
    /// `inner` / `left`, case-insensitive. Anything else is a left join.
    pub fn from_override(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("inner") => Self::Inner,
            _ => Self::Left,
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Self::Inner => "INNER",
            Self::Left => "LEFT",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipDef {
    pub name: String,
    pub kind: RelationshipKind,
    pub foreign_key: Option<String>,
    pub references_table: Option<String>,
    pub references_field: Option<String>,
    /// `as`: preferred join alias.
    pub alias_override: Option<String>,
    /// `join`: raw join kind override.
    pub join_kind_override: Option<String>,
    /// `replace_with`: referenced columns projected in place of the foreign key.
    pub substitute_columns: Option<Vec<String>>,
    /// `replace_as`: output name of the substituted projection.
    pub substitute_alias: Option<String>,
}

impl RelationshipDef {
    /// The many-to-one edge this relationship describes, or `None` for inert kinds.
    pub fn many_to_one(&self) -> Option<ManyToOne<'_>> {
        match self.kind {
            RelationshipKind::ManyToOne => Some(ManyToOne {
                name: &self.name,
                foreign_key: self.foreign_key.as_deref()?,
                references_table: self.references_table.as_deref()?,
                references_field: self.references_field.as_deref()?,
                def: self,
            }),
            RelationshipKind::OneToMany
            | RelationshipKind::ManyToMany
            | RelationshipKind::Unspecified
            | RelationshipKind::Other(_) => None,
        }
    }

    pub fn join_kind(&self) -> JoinKind {
        JoinKind::from_override(self.join_kind_override.as_deref())
    }

    pub fn substitution(&self) -> Option<&[String]> {
        self.substitute_columns
            .as_deref()
            .filter(|cols| !cols.is_empty())
    }
}

/// A fully specified many-to-one relationship.
#[derive(Debug, Clone, Copy)]
pub struct ManyToOne<'a> {
    pub name: &'a str,
    pub foreign_key: &'a str,
    pub references_table: &'a str,
    pub references_field: &'a str,
    pub def: &'a RelationshipDef,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    /// Canonical name (`_table` suffix stripped).
    pub name: String,
    /// Name as written in the document.
    pub source_name: String,
    /// Origin of the document that defined the table.
    pub source: String,
    pub fields: Vec<(String, FieldDef)>,
    pub relationships: Vec<RelationshipDef>,
}

impl Table {
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, f)| f)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }
}

/// Canonical table name: a trailing `_table` is stripped, nothing else changes.
pub fn canonical_table_name(name: &str) -> &str {
    name.strip_suffix("_table").unwrap_or(name)
}

/// Build a [`Table`] from its YAML definition.
///
/// Returns `None` (after reporting a [`IssueKind::StructuralSchema`] error) when the table has
/// no usable `fields` section.
pub(crate) fn parse_table(
    source_name: &str,
    def: &Value,
    origin: &str,
    issues: &mut Vec<PlanIssue>,
) -> Option<Table> {
    let name = canonical_table_name(source_name).to_string();
    let mut cx = ParseCx {
        table: &name,
        origin,
        issues,
    };

    let empty = Mapping::new();
    let def = match def {
        Value::Mapping(m) => m,
        Value::Null => &empty,
        other => {
            cx.structural(format!(
                "table '{source_name}' in {origin} must be a mapping (got {})",
                value_kind(other)
            ));
            return None;
        }
    };

    let fields = match def.get("fields") {
        Some(Value::Mapping(m)) if !m.is_empty() => m,
        _ => {
            cx.structural(format!(
                "table '{source_name}' in {origin} has no fields section"
            ));
            return None;
        }
    };

    let mut parsed_fields = Vec::with_capacity(fields.len());
    for (key, field_def) in fields {
        let Some(field_name) = key.as_str() else {
            cx.invalid(format!("field names must be strings (got {key:?})"));
            continue;
        };
        parsed_fields.push((field_name.to_string(), cx.field(field_name, field_def)));
    }

    let relationships = match def.get("relationships") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Sequence(seq)) => seq
            .iter()
            .enumerate()
            .filter_map(|(i, rel)| cx.relationship(i, rel))
            .collect(),
        Some(other) => {
            cx.invalid(format!(
                "'relationships' must be a list (got {}); ignoring it",
                value_kind(other)
            ));
            Vec::new()
        }
    };

    Some(Table {
        name,
        source_name: source_name.to_string(),
        source: origin.to_string(),
        fields: parsed_fields,
        relationships,
    })
}

struct ParseCx<'a> {
    table: &'a str,
    origin: &'a str,
    issues: &'a mut Vec<PlanIssue>,
}

impl ParseCx<'_> {
    fn structural(&mut self, message: String) {
        PlanIssue::error(IssueKind::StructuralSchema, Some(self.table), message).report(self.issues);
    }

    fn invalid(&mut self, message: String) {
        PlanIssue::warning(
            IssueKind::InvalidValue,
            Some(self.table),
            format!("{}: {message}", self.origin),
        )
        .report(self.issues);
    }

    fn field(&mut self, field_name: &str, def: &Value) -> FieldDef {
        let def = match def {
            Value::Mapping(m) => m,
            Value::Null => return FieldDef::default(),
            other => {
                self.invalid(format!(
                    "field '{field_name}' must be a mapping (got {}); treating it as a string column",
                    value_kind(other)
                ));
                return FieldDef::default();
            }
        };

        let scalar_type = match self.string(def, "type", field_name) {
            Some(raw) => ScalarType::parse(&raw).unwrap_or_else(|| {
                tracing::debug!(table = self.table, field = field_name, ty = %raw, "unknown type, using string");
                ScalarType::String
            }),
            None => ScalarType::String,
        };

        FieldDef {
            scalar_type,
            primary_key: self.flag(def, "primary_key", field_name),
            not_null: self.flag(def, "not_null", field_name),
            auto_increment: self.flag(def, "auto_increment", field_name),
            default: self.literal(def, "default", field_name),
        }
    }

    fn relationship(&mut self, index: usize, rel: &Value) -> Option<RelationshipDef> {
        let Value::Mapping(rel) = rel else {
            self.invalid(format!(
                "relationship #{index} must be a mapping (got {}); skipping it",
                value_kind(rel)
            ));
            return None;
        };
        let what = format!("relationship #{index}");

        let kind = match self.string(rel, "type", &what) {
            Some(raw) => RelationshipKind::parse(&raw),
            None => RelationshipKind::Unspecified,
        };
        let foreign_key = self.string(rel, "foreign_key", &what);
        let references_table = self.string(rel, "references_table", &what);
        let references_field = self.string(rel, "references_field", &what);
        let name = self
            .string(rel, "name", &what)
            .or_else(|| references_table.clone())
            .unwrap_or_default();

        let substitute_columns = match rel.get("replace_with") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(vec![s.clone()]),
            Some(Value::Sequence(seq)) => Some(
                seq.iter()
                    .filter_map(|v| match scalar_to_string(v) {
                        Some(s) => Some(s),
                        None => {
                            self.invalid(format!(
                                "{what}: 'replace_with' entries must be column names (got {})",
                                value_kind(v)
                            ));
                            None
                        }
                    })
                    .collect(),
            ),
            Some(other) => {
                self.invalid(format!(
                    "{what}: 'replace_with' must be a column name or a list (got {})",
                    value_kind(other)
                ));
                None
            }
        };

        let def = RelationshipDef {
            name,
            kind,
            foreign_key,
            references_table,
            references_field,
            alias_override: self.string(rel, "as", &what),
            join_kind_override: self.string(rel, "join", &what),
            substitute_columns,
            substitute_alias: self.string(rel, "replace_as", &what),
        };

        match &def.kind {
            RelationshipKind::ManyToOne if def.many_to_one().is_none() => {
                self.invalid(format!(
                    "many_to_one relationship '{}' needs foreign_key, references_table and references_field; it will be ignored",
                    def.name
                ));
            }
            RelationshipKind::ManyToOne => {}
            other => {
                tracing::debug!(table = self.table, relationship = %def.name, kind = ?other, "relationship kind is not resolved");
            }
        }

        Some(def)
    }

    fn string(&mut self, map: &Mapping, key: &str, what: &str) -> Option<String> {
        match map.get(key) {
            None | Some(Value::Null) => None,
            Some(v) => match scalar_to_string(v) {
                Some(s) => Some(s),
                None => {
                    self.invalid(format!(
                        "{what}: '{key}' must be a string (got {}); ignoring it",
                        value_kind(v)
                    ));
                    None
                }
            },
        }
    }

    fn flag(&mut self, map: &Mapping, key: &str, what: &str) -> bool {
        match map.get(key) {
            None | Some(Value::Null) => false,
            Some(Value::Bool(b)) => *b,
            Some(v) => {
                self.invalid(format!(
                    "{what}: '{key}' must be a boolean (got {}); using false",
                    value_kind(v)
                ));
                false
            }
        }
    }

    fn literal(&mut self, map: &Mapping, key: &str, what: &str) -> Option<Literal> {
        match map.get(key)? {
            Value::Null => None,
            Value::Bool(b) => Some(Literal::Bool(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Some(Literal::Integer(i)),
                None => n.as_f64().map(Literal::Float),
            },
            Value::String(s) => Some(Literal::String(s.clone())),
            v => {
                self.invalid(format!(
                    "{what}: '{key}' must be a scalar literal (got {}); ignoring it",
                    value_kind(v)
                ));
                None
            }
        }
    }
}

/// Strings pass through; numbers and booleans are accepted in their YAML spelling.
fn scalar_to_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn value_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
