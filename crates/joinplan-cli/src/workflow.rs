use crate::config::{ProjectConfig, resolve_options};
use crate::documents::{expand_inputs, load_documents};
use joinplan::{Catalog, IssueLevel, PlanIssue, ResolveOptions};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, Default)]
pub struct IssueSummary {
    pub errors: usize,
    pub warnings: usize,
}

impl IssueSummary {
    /// Print each issue to stderr as a `[WARN]`/`[ERROR]` line and count it.
    pub fn report<'a>(&mut self, issues: impl IntoIterator<Item = &'a PlanIssue>) {
        for issue in issues {
            match issue.level {
                IssueLevel::Error => self.errors += 1,
                IssueLevel::Warning => self.warnings += 1,
            }
            eprintln!("{issue}");
        }
    }

    pub fn had_error(&self) -> bool {
        self.errors > 0
    }
}

/// Everything a command needs after the load pass.
#[derive(Debug)]
pub struct Workspace {
    pub project: Option<ProjectConfig>,
    pub catalog: Catalog,
    pub options: ResolveOptions,
}

/// Load the config (when present), every schema document, and the catalog.
///
/// `files` replace the configured documents. Without a config file they are required.
pub fn load_workspace(
    config: &Path,
    files: &[PathBuf],
    depth: Option<i64>,
    summary: &mut IssueSummary,
) -> anyhow::Result<Workspace> {
    let project = if config.exists() {
        Some(ProjectConfig::load(config)?)
    } else {
        tracing::debug!(config = %config.display(), "no config file, using defaults");
        None
    };

    let (base, inputs): (PathBuf, Vec<String>) = if !files.is_empty() {
        (
            PathBuf::from("."),
            files.iter().map(|f| f.to_string_lossy().into_owned()).collect(),
        )
    } else if let Some(project) = &project {
        if project.file.schema.documents.is_empty() {
            anyhow::bail!(
                "no schema documents: set [schema].documents in {} or pass FILES",
                config.display()
            );
        }
        (project.config_dir.clone(), project.file.schema.documents.clone())
    } else {
        anyhow::bail!(
            "no schema documents: pass FILES or create {} (joinplan init)",
            config.display()
        );
    };

    let paths = expand_inputs(&base, &inputs)?;
    tracing::info!(documents = paths.len(), "loading schema documents");
    let documents = load_documents(&paths)?;

    let (catalog, load_issues) = Catalog::load(&documents);
    summary.report(&load_issues);
    tracing::info!(tables = catalog.len(), "catalog loaded");

    let (options, clamp_issue) = resolve_options(project.as_ref(), depth);
    summary.report(clamp_issue.as_ref());

    Ok(Workspace {
        project,
        catalog,
        options,
    })
}
