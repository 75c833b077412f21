use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    pub path: PathBuf,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    #[default]
    Write,
    /// Report what would change without touching the filesystem.
    DryRun,
    /// Fail if anything would change.
    Check,
}

impl WriteMode {
    pub fn from_flags(dry_run: bool, check: bool) -> Self {
        match (dry_run, check) {
            (_, true) => Self::Check,
            (true, false) => Self::DryRun,
            (false, false) => Self::Write,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum PlanChange {
    /// New or different content.
    Write(PathBuf),
    /// A `<table>.json` whose table is gone from the catalog.
    Remove(PathBuf),
}

impl PlanChange {
    pub fn path(&self) -> &Path {
        match self {
            Self::Write(p) | Self::Remove(p) => p,
        }
    }

    fn verb(&self, mode: WriteMode) -> &'static str {
        match (self, mode) {
            (Self::Write(_), WriteMode::Write) => "wrote",
            (Self::Write(_), WriteMode::DryRun) => "would write",
            (Self::Write(_), WriteMode::Check) => "out of date",
            (Self::Remove(_), WriteMode::Write) => "removed",
            (Self::Remove(_), WriteMode::DryRun) => "would remove",
            (Self::Remove(_), WriteMode::Check) => "stale",
        }
    }
}

/// Bring the plan directory `dir` in line with `files`.
///
/// With `prune`, other `*.json` files directly inside `dir` are removed; only pass it when every
/// table of the catalog was planned.
pub fn sync_plan_dir(
    dir: &Path,
    files: &[OutputFile],
    prune: bool,
    mode: WriteMode,
) -> anyhow::Result<Vec<PlanChange>> {
    let mut changes: Vec<PlanChange> = files
        .iter()
        .filter(|f| std::fs::read_to_string(&f.path).ok().as_deref() != Some(f.content.as_str()))
        .map(|f| PlanChange::Write(f.path.clone()))
        .collect();

    if prune {
        let keep: BTreeSet<&Path> = files.iter().map(|f| f.path.as_path()).collect();
        changes.extend(
            existing_plans(dir)?
                .into_iter()
                .filter(|p| !keep.contains(p.as_path()))
                .map(PlanChange::Remove),
        );
    }
    changes.sort();

    match mode {
        WriteMode::DryRun => {
            for c in &changes {
                println!("{} {}", c.verb(mode), c.path().display());
            }
        }
        WriteMode::Check => {
            if !changes.is_empty() {
                for c in &changes {
                    eprintln!("[ERROR] {}: {}", c.verb(mode), c.path().display());
                }
                anyhow::bail!("plan files are out of date ({} change(s))", changes.len());
            }
        }
        WriteMode::Write => {
            for c in &changes {
                match c {
                    PlanChange::Write(path) => {
                        let content = files
                            .iter()
                            .find(|f| &f.path == path)
                            .map(|f| f.content.as_str())
                            .unwrap_or_default();
                        write_atomic(path, content)?;
                    }
                    PlanChange::Remove(path) => std::fs::remove_file(path).map_err(|e| {
                        anyhow::anyhow!("failed to remove {}: {e}", path.display())
                    })?,
                }
                println!("{} {}", c.verb(mode), c.path().display());
            }
        }
    }

    Ok(changes)
}

fn existing_plans(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let root = dir
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("invalid directory path: {}", dir.display()))?;
    let pattern = format!("{}/*.json", glob::Pattern::escape(root));

    let mut out = Vec::new();
    for entry in glob::glob(&pattern).map_err(|e| anyhow::anyhow!("invalid glob {pattern}: {e}"))? {
        let path = entry.map_err(|e| anyhow::anyhow!("glob error for {pattern}: {e}"))?;
        if path.is_file() {
            out.push(path);
        }
    }
    Ok(out)
}

/// Write through a sibling `.tmp` file so readers never see a half-written plan.
fn write_atomic(path: &Path, content: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| anyhow::anyhow!("failed to create directory {}: {e}", parent.display()))?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    std::fs::write(&tmp, content)
        .map_err(|e| anyhow::anyhow!("failed to write {}: {e}", tmp.display()))?;
    std::fs::rename(&tmp, path).map_err(|e| {
        anyhow::anyhow!("failed to rename {} -> {}: {e}", tmp.display(), path.display())
    })
}
