use crate::issue::{IssueKind, PlanIssue};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const DEFAULT_MAX_JOIN_DEPTH: usize = 3;
pub const DEFAULT_BASE_ALIAS: &str = "our";

/// Knobs shared by every resolution of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveOptions {
    /// Maximum number of relationship hops followed from the root table. Always `>= 1`.
    pub max_join_depth: usize,
    /// Alias of the root table in generated projections and join edges.
    pub base_alias: String,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            max_join_depth: DEFAULT_MAX_JOIN_DEPTH,
            base_alias: DEFAULT_BASE_ALIAS.to_string(),
        }
    }
}

impl ResolveOptions {
    /// Options with the given depth, clamped up to 1.
    pub fn with_depth(max_join_depth: usize) -> Self {
        Self {
            max_join_depth: max_join_depth.max(1),
            ..Self::default()
        }
    }

    /// Options from an untrusted depth value. Values below 1 are clamped and reported.
    pub fn clamped(max_join_depth: i64) -> (Self, Option<PlanIssue>) {
        if max_join_depth >= 1 {
            let depth = usize::try_from(max_join_depth).unwrap_or(usize::MAX);
            return (Self::with_depth(depth), None);
        }
        let issue = PlanIssue::warning(
            IssueKind::Configuration,
            None,
            format!("max_join_depth must be at least 1 (got {max_join_depth}); using 1"),
        );
        (Self::with_depth(1), Some(issue))
    }

    pub fn base_alias(mut self, alias: impl Into<String>) -> Self {
        self.base_alias = alias.into();
        self
    }
}

/// Aliases already handed out within one root-table resolution.
#[derive(Debug, Clone, Default)]
pub struct AliasScope {
    used: HashSet<String>,
}

impl AliasScope {
    /// A scope that already reserves the root table's alias.
    pub fn with_base(base_alias: &str) -> Self {
        let mut scope = Self::default();
        scope.reserve(base_alias);
        scope
    }

    pub fn contains(&self, alias: &str) -> bool {
        self.used.contains(alias)
    }

    /// Returns `false` if the alias was already taken.
    pub fn reserve(&mut self, alias: &str) -> bool {
        self.used.insert(alias.to_string())
    }

    pub fn len(&self) -> usize {
        self.used.len()
    }

    pub fn is_empty(&self) -> bool {
        self.used.is_empty()
    }

    /// The first free `t<N>` with `N >= *counter`. Advances `counter` past it.
    pub fn next_synthetic(&self, counter: &mut usize) -> String {
        let mut n = *counter;
        let mut alias = format!("t{n}");
        while self.contains(&alias) {
            n += 1;
            alias = format!("t{n}");
        }
        *counter = n + 1;
        alias
    }
}

/// A resolution result together with the issues raised while producing it.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<T> {
    pub value: T,
    pub issues: Vec<PlanIssue>,
}

/// Mutable state of a single root-table resolution.
///
/// Create one per root table and drop it afterwards; alias numbering and the cycle memo are
/// only meaningful within one run.
#[derive(Debug)]
pub struct ResolutionContext {
    pub(crate) max_depth: usize,
    pub(crate) aliases: AliasScope,
    /// `(current table, referenced table, depth)` triples already expanded.
    visited: HashSet<(String, String, usize)>,
    pub(crate) issues: Vec<PlanIssue>,
    root: String,
}

impl ResolutionContext {
    pub fn new(root_table: &str, options: &ResolveOptions) -> Self {
        Self {
            max_depth: options.max_join_depth.max(1),
            aliases: AliasScope::with_base(&options.base_alias),
            visited: HashSet::new(),
            issues: Vec::new(),
            root: root_table.to_string(),
        }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn aliases(&self) -> &AliasScope {
        &self.aliases
    }

    pub fn issues(&self) -> &[PlanIssue] {
        &self.issues
    }

    pub fn into_issues(self) -> Vec<PlanIssue> {
        self.issues
    }

    pub(crate) fn already_expanded(&self, current: &str, referenced: &str, depth: usize) -> bool {
        self.visited
            .contains(&(current.to_string(), referenced.to_string(), depth))
    }

    pub(crate) fn mark_expanded(&mut self, current: &str, referenced: &str, depth: usize) {
        self.visited
            .insert((current.to_string(), referenced.to_string(), depth));
    }

    pub(crate) fn dangling(&mut self, referenced: &str, relationship: &str, depth: usize) {
        PlanIssue::warning(
            IssueKind::DanglingReference,
            Some(self.root.as_str()),
            format!(
                "relationship '{relationship}' references table '{referenced}' which was not found (depth {depth})"
            ),
        )
        .report(&mut self.issues);
    }
}
