use crate::cli::InitArgs;
use std::path::Path;

pub fn run(args: InitArgs) -> anyhow::Result<()> {
    write_template(&args.config)
}

const TEMPLATE: &str = r#"
version = "1"

[schema]
# YAML schema documents, relative to this file. Later documents redefine
# tables of earlier ones.
documents = ["schema/**/*.yaml"]

[plan]
# Relationship levels followed from each root table (values below 1 become 1).
max_join_depth = 3
# Alias of the root table in joins and projections.
base_alias = "our"
# One <table>.json plan per table. Remove to print plans to stdout.
out = "generated/plans"
# If empty, plan every table.
tables = []
"#;

fn write_template(path: &Path) -> anyhow::Result<()> {
    if path.exists() {
        anyhow::bail!("refusing to overwrite existing file: {}", path.display());
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                anyhow::anyhow!("failed to create directory {}: {e}", parent.display())
            })?;
        }
    }

    std::fs::write(path, TEMPLATE.trim_start_matches('\n'))
        .map_err(|e| anyhow::anyhow!("failed to write {}: {e}", path.display()))?;

    println!("wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProjectConfig;

    #[test]
    fn template_is_a_valid_config_and_is_not_overwritten() {
        let dir = std::env::temp_dir().join(format!("joinplan-init-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("nested/joinplan.toml");

        write_template(&path).unwrap();
        let project = ProjectConfig::load(&path).unwrap();
        assert_eq!(project.file.plan.max_join_depth, 3);
        assert_eq!(project.file.plan.base_alias, "our");
        assert_eq!(project.out_dir(), Some(dir.join("nested/generated/plans")));

        let err = write_template(&path).unwrap_err();
        assert!(err.to_string().contains("refusing to overwrite"));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
