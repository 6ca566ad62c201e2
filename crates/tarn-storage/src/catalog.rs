//! Process-wide table registry.

use crate::heap::HeapFile;
use crate::schema::{Column, Schema};
use crate::types::FieldType;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tarn_common::{Result, TarnError};

struct TableEntry {
    file: Arc<HeapFile>,
    name: String,
    primary_key: String,
}

/// Registry mapping table ids to heap files, schemas, and primary keys,
/// plus table names to ids.
///
/// Registering a table under an existing name replaces the prior entry.
#[derive(Default)]
pub struct Catalog {
    inner: RwLock<CatalogInner>,
}

#[derive(Default)]
struct CatalogInner {
    tables: HashMap<u32, TableEntry>,
    names: HashMap<String, u32>,
}

impl Catalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a table under the given name.
    pub fn add_table(&self, file: Arc<HeapFile>, name: impl Into<String>, primary_key: impl Into<String>) {
        let name = name.into();
        let table_id = file.table_id();

        let mut inner = self.inner.write();
        if let Some(old_id) = inner.names.insert(name.clone(), table_id) {
            inner.tables.remove(&old_id);
        }
        log::info!("catalog: registered table '{}' as {}", name, table_id);
        inner.tables.insert(
            table_id,
            TableEntry {
                file,
                name,
                primary_key: primary_key.into(),
            },
        );
    }

    /// Returns the id of the named table.
    pub fn table_id(&self, name: &str) -> Result<u32> {
        self.inner
            .read()
            .names
            .get(name)
            .copied()
            .ok_or_else(|| TarnError::NoSuchTable(name.to_string()))
    }

    /// Returns the heap file backing a table.
    pub fn file(&self, table_id: u32) -> Result<Arc<HeapFile>> {
        self.inner
            .read()
            .tables
            .get(&table_id)
            .map(|e| e.file.clone())
            .ok_or_else(|| TarnError::NoSuchTable(format!("id {}", table_id)))
    }

    /// Returns a table's schema.
    pub fn schema(&self, table_id: u32) -> Result<Arc<Schema>> {
        Ok(self.file(table_id)?.schema().clone())
    }

    /// Returns a table's primary key column name.
    pub fn primary_key(&self, table_id: u32) -> Result<String> {
        self.inner
            .read()
            .tables
            .get(&table_id)
            .map(|e| e.primary_key.clone())
            .ok_or_else(|| TarnError::NoSuchTable(format!("id {}", table_id)))
    }

    /// Returns a table's registered name.
    pub fn table_name(&self, table_id: u32) -> Result<String> {
        self.inner
            .read()
            .tables
            .get(&table_id)
            .map(|e| e.name.clone())
            .ok_or_else(|| TarnError::NoSuchTable(format!("id {}", table_id)))
    }

    /// Returns all registered table names.
    pub fn table_names(&self) -> Vec<String> {
        self.inner.read().names.keys().cloned().collect()
    }

    /// Loads table definitions from a catalog text file.
    ///
    /// Each non-comment line reads
    /// `path name (col type, col type pk, ...)`
    /// with types `int` and `string` and an optional trailing `pk` marker
    /// naming the primary key column. Relative paths resolve against the
    /// catalog file's directory. Returns the names of the loaded tables.
    pub fn load_schema(&self, catalog_path: impl AsRef<Path>) -> Result<Vec<String>> {
        let catalog_path = catalog_path.as_ref();
        let base = catalog_path.parent().unwrap_or_else(|| Path::new("."));
        let text = std::fs::read_to_string(catalog_path)?;

        let mut loaded = Vec::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (head, cols) = parse_entry(line)?;
            let mut tokens = head.split_whitespace();
            let path = tokens
                .next()
                .ok_or_else(|| TarnError::BadCatalogEntry(line.to_string()))?;
            let name = tokens
                .next()
                .ok_or_else(|| TarnError::BadCatalogEntry(line.to_string()))?;

            let mut columns = Vec::new();
            let mut primary_key = String::new();
            for col in cols.split(',') {
                let mut parts = col.split_whitespace();
                let col_name = parts
                    .next()
                    .ok_or_else(|| TarnError::BadCatalogEntry(line.to_string()))?;
                let ty = parts
                    .next()
                    .and_then(FieldType::parse)
                    .ok_or_else(|| TarnError::BadCatalogEntry(line.to_string()))?;
                if parts.next() == Some("pk") {
                    primary_key = col_name.to_string();
                }
                columns.push(Column::new(col_name, ty));
            }
            if columns.is_empty() {
                return Err(TarnError::BadCatalogEntry(line.to_string()));
            }

            let file_path = if Path::new(path).is_absolute() {
                Path::new(path).to_path_buf()
            } else {
                base.join(path)
            };
            let schema = Arc::new(Schema::new(columns));
            let file = Arc::new(HeapFile::open(file_path, schema)?);
            self.add_table(file, name, primary_key);
            loaded.push(name.to_string());
        }
        Ok(loaded)
    }
}

/// Splits `head (cols)` into its two parts.
fn parse_entry(line: &str) -> Result<(&str, &str)> {
    let open = line
        .find('(')
        .ok_or_else(|| TarnError::BadCatalogEntry(line.to_string()))?;
    let close = line
        .rfind(')')
        .filter(|&c| c > open)
        .ok_or_else(|| TarnError::BadCatalogEntry(line.to_string()))?;
    Ok((line[..open].trim(), &line[open + 1..close]))
}
