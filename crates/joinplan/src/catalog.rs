use crate::issue::PlanIssue;
use crate::schema::{SchemaDocument, Table, canonical_table_name, parse_table};
use std::collections::HashMap;

/// All tables of a batch of schema documents, keyed by canonical name.
///
/// Built once by [`Catalog::load`] and read-only afterwards, so a `&Catalog` can be shared by
/// any number of resolutions.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    tables: Vec<Table>,
    index: HashMap<String, usize>,
}

impl Catalog {
    /// Collect every table of every document.
    ///
    /// Tables without fields are reported and skipped; the rest of the batch still loads. When
    /// two documents define the same canonical name, the later one wins.
    pub fn load(documents: &[SchemaDocument]) -> (Self, Vec<PlanIssue>) {
        let mut catalog = Self::default();
        let mut issues = Vec::new();

        for doc in documents {
            for (name, def) in doc.table_entries(&mut issues) {
                if let Some(table) = parse_table(&name, def, &doc.origin, &mut issues) {
                    catalog.insert(table);
                }
            }
        }

        tracing::debug!(
            tables = catalog.len(),
            documents = documents.len(),
            "schema catalog loaded"
        );
        (catalog, issues)
    }

    pub fn lookup(&self, name: &str) -> Option<&Table> {
        self.index
            .get(canonical_table_name(name))
            .map(|&i| &self.tables[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(canonical_table_name(name))
    }

    /// Tables in first-seen order.
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.iter()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    fn insert(&mut self, table: Table) {
        match self.index.get(&table.name) {
            Some(&i) => {
                tracing::debug!(
                    table = %table.name,
                    previous = %self.tables[i].source,
                    replacement = %table.source,
                    "duplicate table definition, keeping the later one"
                );
                self.tables[i] = table;
            }
            None => {
                self.index.insert(table.name.clone(), self.tables.len());
                self.tables.push(table);
            }
        }
    }
}
