use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use joinplan::{Catalog, ResolveOptions, SchemaDocument, plan_table, resolve_nested_fields};

/// `n` tables, each with a relationship to the next two (wrapping around), so every table sits
/// on several cycles.
fn cyclic_schema(n: usize) -> Catalog {
    let mut yaml = String::from("tables:\n");
    for i in 0..n {
        yaml.push_str(&format!("  t_{i}:\n    fields:\n"));
        yaml.push_str("      id: { type: integer, primary_key: true }\n");
        yaml.push_str("      label: { type: string }\n");
        yaml.push_str("      next_id: { type: integer }\n");
        yaml.push_str("      skip_id: { type: integer }\n");
        yaml.push_str("    relationships:\n");
        for (name, fk, target) in [("next", "next_id", (i + 1) % n), ("skip", "skip_id", (i + 2) % n)] {
            yaml.push_str(&format!(
                "      - {{ name: {name}, type: many_to_one, foreign_key: {fk}, references_table: t_{target}, references_field: id }}\n"
            ));
        }
    }

    let doc = SchemaDocument::from_yaml_str("bench.yaml", &yaml).expect("valid bench schema");
    Catalog::load(&[doc]).0
}

fn bench_nested_fields(c: &mut Criterion) {
    let catalog = cyclic_schema(16);
    let root = catalog.lookup("t_0").expect("root table");
    let mut group = c.benchmark_group("resolve/nested_fields");

    for depth in [1, 2, 4, 6, 8] {
        let options = ResolveOptions::with_depth(depth);
        group.bench_with_input(BenchmarkId::from_parameter(depth), &options, |b, options| {
            b.iter(|| black_box(resolve_nested_fields(&catalog, root, options)));
        });
    }

    group.finish();
}

fn bench_plan_table(c: &mut Criterion) {
    let catalog = cyclic_schema(16);
    let mut group = c.benchmark_group("resolve/plan_table");

    for depth in [1, 2, 4, 6] {
        let options = ResolveOptions::with_depth(depth);
        group.bench_with_input(BenchmarkId::from_parameter(depth), &options, |b, options| {
            b.iter(|| black_box(plan_table(&catalog, "t_0", options).expect("plan")));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_nested_fields, bench_plan_table);
criterion_main!(benches);
