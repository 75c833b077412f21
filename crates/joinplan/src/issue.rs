use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueLevel {
    Error,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// A table has no usable `fields` section. The table is skipped.
    StructuralSchema,
    /// A relationship references a table the catalog does not know.
    DanglingReference,
    /// A configuration value was out of range and has been clamped.
    Configuration,
    /// A known key carried a value of the wrong shape; the default was used instead.
    InvalidValue,
}

/// A non-fatal problem found while loading or resolving a schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanIssue {
    pub level: IssueLevel,
    pub kind: IssueKind,
    /// Canonical name of the table the issue belongs to, if any.
    pub table: Option<String>,
    pub message: String,
}

impl PlanIssue {
    pub fn error(kind: IssueKind, table: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            level: IssueLevel::Error,
            kind,
            table: table.map(str::to_string),
            message: message.into(),
        }
    }

    pub fn warning(kind: IssueKind, table: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            level: IssueLevel::Warning,
            kind,
            table: table.map(str::to_string),
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == IssueLevel::Error
    }

    /// Log the issue and append it to `sink`.
    pub(crate) fn report(self, sink: &mut Vec<PlanIssue>) {
        match self.level {
            IssueLevel::Error => tracing::error!(kind = ?self.kind, table = ?self.table, "{}", self.message),
            IssueLevel::Warning => tracing::warn!(kind = ?self.kind, table = ?self.table, "{}", self.message),
        }
        sink.push(self);
    }
}

impl fmt::Display for PlanIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.level {
            IssueLevel::Error => "ERROR",
            IssueLevel::Warning => "WARN",
        };
        match &self.table {
            Some(table) => write!(f, "[{level}] {table}: {}", self.message),
            None => write!(f, "[{level}] {}", self.message),
        }
    }
}

/// Append `issues` to `sink`, skipping ones already present.
///
/// The field resolver and the join builder walk the same relationships, so a dangling
/// reference is seen by both.
pub(crate) fn merge_issues(sink: &mut Vec<PlanIssue>, issues: Vec<PlanIssue>) {
    for issue in issues {
        if !sink.contains(&issue) {
            sink.push(issue);
        }
    }
}
