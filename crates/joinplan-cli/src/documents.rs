use joinplan::SchemaDocument;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Expand schema inputs into a de-duplicated file list.
///
/// Inputs are taken in order; matches inside one input are sorted. A later document redefines
/// tables of an earlier one, so the order is part of the result.
pub fn expand_inputs(base: &Path, inputs: &[String]) -> anyhow::Result<Vec<PathBuf>> {
    let mut seen: BTreeSet<PathBuf> = BTreeSet::new();
    let mut files = Vec::new();

    for input in inputs {
        let path = resolve(base, input);
        let matched = if path.is_dir() {
            scan_dir(&path)?
        } else if path.is_file() {
            vec![path]
        } else {
            expand_glob(&path)?
        };

        if matched.is_empty() {
            anyhow::bail!("schema input matched no files: {input}");
        }
        for f in matched {
            if seen.insert(f.clone()) {
                files.push(f);
            }
        }
    }

    Ok(files)
}

pub fn load_documents(files: &[PathBuf]) -> anyhow::Result<Vec<SchemaDocument>> {
    files
        .iter()
        .map(|f| SchemaDocument::from_path(f).map_err(anyhow::Error::from))
        .collect()
}

fn resolve(base: &Path, input: &str) -> PathBuf {
    let p = Path::new(input);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base.join(p)
    }
}

/// Every `*.yaml` / `*.yml` below `dir`, at any depth.
fn scan_dir(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let root = dir
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("invalid directory path: {}", dir.display()))?;
    let root = glob::Pattern::escape(root);

    let mut files = BTreeSet::new();
    for ext in ["yaml", "yml"] {
        collect_glob(&format!("{root}/**/*.{ext}"), &mut files)?;
    }
    Ok(files.into_iter().collect())
}

fn expand_glob(pattern: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let pattern = pattern
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("invalid glob pattern: {}", pattern.display()))?;

    let mut files = BTreeSet::new();
    collect_glob(pattern, &mut files)?;
    Ok(files.into_iter().collect())
}

fn collect_glob(pattern: &str, files: &mut BTreeSet<PathBuf>) -> anyhow::Result<()> {
    for entry in glob::glob(pattern).map_err(|e| anyhow::anyhow!("invalid glob {pattern}: {e}"))? {
        let path = entry.map_err(|e| anyhow::anyhow!("glob error for {pattern}: {e}"))?;
        if path.is_file() {
            files.insert(path);
        }
    }
    Ok(())
}
