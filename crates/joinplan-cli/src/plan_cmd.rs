use crate::cli::PlanArgs;
use crate::config::ProjectConfig;
use crate::workflow::{IssueSummary, load_workspace};
use crate::write::{OutputFile, WriteMode, sync_plan_dir};
use joinplan::{TablePlan, plan_catalog};
use std::path::{Component, Path};

pub fn run(args: PlanArgs) -> anyhow::Result<()> {
    let mut summary = IssueSummary::default();
    let ws = load_workspace(&args.config, &args.files, args.depth, &mut summary)?;

    let selection = if args.tables.is_empty() {
        ws.project
            .as_ref()
            .map(|p| p.file.plan.tables.clone())
            .unwrap_or_default()
    } else {
        args.tables.clone()
    };

    let plans = plan_catalog(&ws.catalog, &ws.options, &selection)?;
    for plan in &plans {
        summary.report(&plan.issues);
    }
    tracing::info!(
        tables = plans.len(),
        max_join_depth = ws.options.max_join_depth,
        "tables planned"
    );

    let mode = WriteMode::from_flags(args.dry_run, args.check);
    match ws.project.as_ref().and_then(ProjectConfig::out_dir) {
        Some(out) => {
            let files = render_files(&out, &plans)?;
            // Stale plans are only detectable when every table was planned.
            sync_plan_dir(&out, &files, selection.is_empty(), mode)?;
        }
        None => {
            if mode != WriteMode::Write {
                anyhow::bail!("--dry-run and --check need [plan].out in the config file");
            }
            println!("{}", serde_json::to_string_pretty(&plans)?);
        }
    }

    if summary.had_error() {
        anyhow::bail!(
            "schema has {} error(s) and {} warning(s)",
            summary.errors,
            summary.warnings
        );
    }
    Ok(())
}

fn render_files(out: &Path, plans: &[TablePlan]) -> anyhow::Result<Vec<OutputFile>> {
    plans
        .iter()
        .map(|plan| {
            if !is_plain_file_stem(&plan.table) {
                anyhow::bail!(
                    "table name {:?} cannot be used as a plan file name under {}",
                    plan.table,
                    out.display()
                );
            }
            Ok(OutputFile {
                path: out.join(format!("{}.json", plan.table)),
                content: plan.to_json()?,
            })
        })
        .collect()
}

/// A single normal path component with no separators of any platform.
fn is_plain_file_stem(name: &str) -> bool {
    if name.contains(['/', '\\']) {
        return false;
    }
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const SCHEMA: &str = r#"
tables:
  companies:
    fields:
      id: { type: integer, primary_key: true, auto_increment: true }
      name: { type: string, not_null: true }
  users_table:
    fields:
      id: { type: integer, primary_key: true }
      name: { type: varchar(64) }
      company_id: { type: integer }
    relationships:
      - name: company
        type: many_to_one
        foreign_key: company_id
        references_table: companies
        references_field: id
        replace_with: name
"#;

    fn project(name: &str, config: Option<&str>) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("joinplan-plan-{name}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(dir.join("schema")).unwrap();
        std::fs::write(dir.join("schema/app.yaml"), SCHEMA).unwrap();
        if let Some(config) = config {
            std::fs::write(dir.join("joinplan.toml"), config).unwrap();
        }
        dir
    }

    fn args(dir: &Path) -> PlanArgs {
        PlanArgs {
            config: dir.join("joinplan.toml"),
            depth: None,
            tables: Vec::new(),
            dry_run: false,
            check: false,
            files: Vec::new(),
        }
    }

    const CONFIG: &str = r#"
version = "1"

[schema]
documents = ["schema/*.yaml"]

[plan]
max_join_depth = 2
out = "plans"
"#;

    #[test]
    fn writes_one_plan_per_table() {
        let dir = project("write", Some(CONFIG));
        run(args(&dir)).unwrap();

        let users = std::fs::read_to_string(dir.join("plans/users.json")).unwrap();
        let plan: TablePlan = serde_json::from_str(&users).unwrap();
        assert_eq!(plan.model_name, "Users");
        assert_eq!(plan.source_table, "users_table");
        assert_eq!(plan.max_join_depth, 2);
        assert_eq!(plan.joins.len(), 1);
        assert_eq!(
            plan.substituted_projection.columns[2].to_string(),
            "t1.name AS company_id"
        );
        assert!(dir.join("plans/companies.json").exists());

        // Second run leaves everything up to date.
        let mut check = args(&dir);
        check.check = true;
        run(check).unwrap();
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn table_selection_limits_output() {
        let dir = project("select", Some(CONFIG));
        let mut a = args(&dir);
        a.tables = vec!["companies".to_string()];
        run(a).unwrap();
        assert!(dir.join("plans/companies.json").exists());
        assert!(!dir.join("plans/users.json").exists());

        let mut unknown = args(&dir);
        unknown.tables = vec!["ghosts".to_string()];
        assert!(run(unknown).is_err());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn check_fails_before_first_write() {
        let dir = project("stale", Some(CONFIG));
        let mut a = args(&dir);
        a.check = true;
        assert!(run(a).is_err());
        assert!(!dir.join("plans").exists());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn files_without_config_print_to_stdout() {
        let dir = project("stdout", None);
        let mut a = args(&dir);
        a.files = vec![dir.join("schema")];
        run(a).unwrap();

        let mut dry = args(&dir);
        dry.files = vec![dir.join("schema")];
        dry.dry_run = true;
        assert!(run(dry).is_err());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn table_names_must_stay_inside_the_output_directory() {
        assert!(is_plain_file_stem("users"));
        assert!(is_plain_file_stem("order_lines"));
        for bad in ["../x", "a/b", "a\\b", "..", ".", "", "/etc/passwd"] {
            assert!(!is_plain_file_stem(bad), "{bad:?} accepted");
        }

        let dir = project("escape", Some(CONFIG));
        std::fs::write(
            dir.join("schema/zz_escape.yaml"),
            "tables:\n  \"../escaped\":\n    fields:\n      id: { type: integer }\n",
        )
        .unwrap();

        let err = run(args(&dir)).unwrap_err();
        assert!(err.to_string().contains("plan file name"));
        assert!(!dir.join("escaped.json").exists());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn full_runs_remove_plans_of_dropped_tables() {
        let dir = project("prune", Some(CONFIG));
        std::fs::create_dir_all(dir.join("plans")).unwrap();
        std::fs::write(dir.join("plans/legacy.json"), "{}\n").unwrap();

        let mut selected = args(&dir);
        selected.tables = vec!["users".to_string()];
        run(selected).unwrap();
        assert!(dir.join("plans/legacy.json").exists());

        run(args(&dir)).unwrap();
        assert!(!dir.join("plans/legacy.json").exists());
        assert!(dir.join("plans/users.json").exists());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn no_inputs_is_an_error() {
        let dir = project("empty", None);
        assert!(run(args(&dir)).is_err());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn structural_errors_fail_after_writing() {
        let dir = project("broken", Some(CONFIG));
        std::fs::write(
            dir.join("schema/zz_broken.yaml"),
            "tables:\n  orphans:\n    relationships: []\n",
        )
        .unwrap();

        let err = run(args(&dir)).unwrap_err();
        assert!(err.to_string().contains("1 error(s)"));
        assert!(dir.join("plans/users.json").exists());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
