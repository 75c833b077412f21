use crate::cli::FieldsArgs;
use crate::workflow::{IssueSummary, load_workspace};
use joinplan::{ResolvedField, resolve_nested_fields};

pub fn run(args: FieldsArgs) -> anyhow::Result<()> {
    let mut summary = IssueSummary::default();
    let ws = load_workspace(&args.config, &args.files, args.depth, &mut summary)?;

    let table = ws
        .catalog
        .lookup(&args.table)
        .ok_or_else(|| anyhow::anyhow!("table not found: {}", args.table))?;

    let resolved = resolve_nested_fields(&ws.catalog, table, &ws.options);
    summary.report(&resolved.issues);
    print!("{}", render_fields(&resolved.value));

    if summary.had_error() {
        anyhow::bail!("schema has {} error(s)", summary.errors);
    }
    Ok(())
}

fn render_fields(fields: &[ResolvedField]) -> String {
    let name_width = fields
        .iter()
        .map(|f| f.qualified_name.len())
        .max()
        .unwrap_or(0);
    let type_width = fields
        .iter()
        .map(|f| f.scalar_type.as_str().len())
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    for f in fields {
        let required = if f.required { "required" } else { "optional" };
        out.push_str(&format!(
            "{:<name_width$}  {:<type_width$}  {required}\n",
            f.qualified_name,
            f.scalar_type.as_str(),
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use joinplan::ScalarType;

    fn field(name: &str, scalar_type: ScalarType) -> ResolvedField {
        ResolvedField {
            qualified_name: name.to_string(),
            scalar_type,
            required: false,
        }
    }

    #[test]
    fn renders_aligned_columns() {
        let out = render_fields(&[
            field("author__id", ScalarType::Integer),
            field("author__company__name", ScalarType::String),
        ]);
        assert_eq!(
            out,
            "author__id             integer  optional\n\
             author__company__name  string   optional\n"
        );
    }

    #[test]
    fn empty_list_renders_nothing() {
        assert_eq!(render_fields(&[]), "");
    }
}
