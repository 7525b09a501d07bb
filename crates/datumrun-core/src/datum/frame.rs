//! Dataframe datums: lazily loaded columnar tables.

use std::fs;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::datum::{locate_single_file, DatumDefinition};
use crate::error::{CommitError, DatumError};

/// Fixed file name dataframe datums write their table under.
pub const TABLE_FILE_NAME: &str = "data.table.json";

/// One named column of a [`Table`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub values: Vec<Value>,
}

/// Minimal columnar table exchanged through dataframe datums.
///
/// The engine does not interpret cell values; they are neutral JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<Column>,
}

impl Table {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to append a column.
    pub fn with_column(mut self, name: impl Into<String>, values: Vec<Value>) -> Self {
        self.columns.push(Column {
            name: name.into(),
            values,
        });
        self
    }

    /// Number of columns.
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Number of rows, taken from the first column.
    pub fn num_rows(&self) -> usize {
        self.columns.first().map_or(0, |c| c.values.len())
    }

    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// A datum holding one columnar table file.
#[derive(Debug)]
pub struct DataFrameDatum {
    pub(super) definition: DatumDefinition,
    pub(super) committed: bool,
    table: Option<Table>,
}

impl DataFrameDatum {
    pub(super) fn new(definition: DatumDefinition) -> Self {
        Self {
            definition,
            committed: false,
            table: None,
        }
    }

    /// Decode the located table file; cached after the first read.
    pub fn get(&mut self) -> Result<Table, DatumError> {
        if let Some(table) = &self.table {
            return Ok(table.clone());
        }
        let table = self.load()?;
        self.table = Some(table.clone());
        Ok(table)
    }

    /// Serialize a table to disk under the fixed table file name.
    ///
    /// Legal pre-commit only. Does NOT mark the datum committed: commit
    /// timing for dataframes belongs to the caller, unlike object
    /// datums which commit on write.
    pub fn set(&mut self, table: Table) -> Result<(), DatumError> {
        if self.committed {
            return Err(CommitError::new(&self.definition.path).into());
        }
        let dir = &self.definition.path;
        fs::create_dir_all(dir).map_err(|e| DatumError::io(dir, e))?;
        let file_path = dir.join(TABLE_FILE_NAME);
        let bytes = serde_json::to_vec(&table).map_err(|e| DatumError::codec(&file_path, e))?;
        fs::write(&file_path, bytes).map_err(|e| DatumError::io(&file_path, e))?;
        self.table = Some(table);
        Ok(())
    }

    /// Drop the cached table; the file is untouched.
    pub fn clear(&mut self) {
        self.table = None;
    }

    fn load(&self) -> Result<Table, DatumError> {
        let dir = &self.definition.path;
        let file_name = locate_single_file(dir)?.ok_or_else(|| DatumError::missing_file(dir))?;
        let file_path = dir.join(file_name);
        let bytes = fs::read(&file_path).map_err(|e| DatumError::io(&file_path, e))?;
        serde_json::from_slice(&bytes).map_err(|e| DatumError::codec(&file_path, e))
    }
}
