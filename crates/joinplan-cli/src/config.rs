use joinplan::{DEFAULT_BASE_ALIAS, DEFAULT_MAX_JOIN_DEPTH, PlanIssue, ResolveOptions};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct ProjectConfig {
    pub config_dir: PathBuf,
    pub file: ConfigFile,
}

impl ProjectConfig {
    pub fn load(config_path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(config_path).map_err(|e| {
            anyhow::anyhow!("failed to read config file {}: {e}", config_path.display())
        })?;
        let mut project = Self::parse(&raw, config_path)?;
        project.config_dir = config_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();
        Ok(project)
    }

    fn parse(raw: &str, origin: &Path) -> anyhow::Result<Self> {
        let mut file: ConfigFile = toml::from_str(raw).map_err(|e| {
            anyhow::anyhow!("failed to parse config file {}: {e}", origin.display())
        })?;

        file.expand_env()?;
        file.validate()?;

        Ok(Self {
            config_dir: PathBuf::from("."),
            file,
        })
    }

    /// Relative paths are taken relative to the directory holding the config file.
    pub fn resolve_path(&self, p: impl AsRef<Path>) -> PathBuf {
        let p = p.as_ref();
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.config_dir.join(p)
        }
    }

    pub fn out_dir(&self) -> Option<PathBuf> {
        self.file.plan.out.as_deref().map(|out| self.resolve_path(out))
    }
}

/// Resolution options from the (optional) config plus a command-line depth override.
pub fn resolve_options(
    project: Option<&ProjectConfig>,
    depth_override: Option<i64>,
) -> (ResolveOptions, Option<PlanIssue>) {
    let depth = depth_override
        .or(project.map(|p| p.file.plan.max_join_depth))
        .unwrap_or(DEFAULT_MAX_JOIN_DEPTH as i64);
    let (options, issue) = ResolveOptions::clamped(depth);
    match project {
        Some(p) => (options.base_alias(p.file.plan.base_alias.clone()), issue),
        None => (options, issue),
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,

    #[serde(default)]
    pub schema: SchemaConfig,

    #[serde(default)]
    pub plan: PlanConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SchemaConfig {
    /// Glob patterns of YAML schema documents.
    #[serde(default)]
    pub documents: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlanConfig {
    #[serde(default = "default_max_join_depth")]
    pub max_join_depth: i64,
    #[serde(default = "default_base_alias")]
    pub base_alias: String,
    /// Output directory for `<table>.json` plans. Plans go to stdout when unset.
    pub out: Option<String>,
    /// Tables to plan; empty means all.
    #[serde(default)]
    pub tables: Vec<String>,
}

fn default_max_join_depth() -> i64 {
    DEFAULT_MAX_JOIN_DEPTH as i64
}

fn default_base_alias() -> String {
    DEFAULT_BASE_ALIAS.to_string()
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            max_join_depth: default_max_join_depth(),
            base_alias: default_base_alias(),
            out: None,
            tables: Vec::new(),
        }
    }
}

impl ConfigFile {
    fn expand_env(&mut self) -> anyhow::Result<()> {
        for d in &mut self.schema.documents {
            *d = expand_env_vars(d)?;
        }
        if let Some(out) = self.plan.out.as_mut() {
            *out = expand_env_vars(out)?;
        }
        Ok(())
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.version.trim() != "1" {
            anyhow::bail!("unsupported config version: {}", self.version);
        }

        // Depth is clamped later, not rejected here.

        let alias = self.plan.base_alias.trim();
        if alias.is_empty() {
            anyhow::bail!("plan.base_alias must not be empty");
        }
        if !alias
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            anyhow::bail!("plan.base_alias must be a plain identifier: {alias}");
        }

        if let Some(out) = &self.plan.out {
            if out.trim().is_empty() {
                anyhow::bail!("plan.out must not be empty when set");
            }
        }

        if self.schema.documents.iter().any(|d| d.trim().is_empty()) {
            anyhow::bail!("schema.documents must not contain empty patterns");
        }

        Ok(())
    }
}

/// Replace `${NAME}` with the value of environment variable `NAME`.
fn expand_env_vars(input: &str) -> anyhow::Result<String> {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            anyhow::bail!("unterminated env var reference: ${{{after}");
        };
        let key = &after[..end];
        if key.is_empty() {
            anyhow::bail!("invalid env var reference: ${{}}");
        }
        let v = std::env::var(key)
            .map_err(|_| anyhow::anyhow!("missing env var for config expansion: {key}"))?;
        out.push_str(&v);
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    Ok(out)
}
