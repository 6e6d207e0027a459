//! Tabular payloads
//!
//! A minimal columnar table: a typed index plus typed columns of equal length.
//! Tables travel inside leaf payloads as `bincode`-encoded bytes and are decoded
//! lazily by the leaf that owns them.

use crate::error::DataError;
use serde::{Deserialize, Serialize};

/// Type descriptor for an index or a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Bool,
    Int64,
    Float64,
    Utf8,
}

/// A single table value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Cell {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

/// A named, typed column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub data_type: DataType,
    pub values: Vec<Cell>,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: DataType, values: Vec<Cell>) -> Self {
        Self {
            name: name.into(),
            data_type,
            values,
        }
    }
}

/// Decoded tabular data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub index_type: DataType,
    pub index: Vec<Cell>,
    pub columns: Vec<Column>,
}

impl Table {
    pub fn new(index_type: DataType, index: Vec<Cell>, columns: Vec<Column>) -> Self {
        Self {
            index_type,
            index,
            columns,
        }
    }

    /// A table with no rows and no columns.
    pub fn empty() -> Self {
        Self::new(DataType::Int64, Vec::new(), Vec::new())
    }

    pub fn num_rows(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.num_rows() == 0
    }

    /// Decode a table from its wire bytes, validating column lengths.
    pub fn decode(bytes: &[u8]) -> Result<Self, DataError> {
        let table: Table =
            bincode::deserialize(bytes).map_err(|e| DataError::Decode(e.to_string()))?;
        for column in &table.columns {
            if column.values.len() != table.index.len() {
                return Err(DataError::Decode(format!(
                    "column '{}' has {} values but the index has {}",
                    column.name,
                    column.values.len(),
                    table.index.len()
                )));
            }
        }
        Ok(table)
    }

    pub fn encode(&self) -> Result<Vec<u8>, DataError> {
        bincode::serialize(self).map_err(|e| DataError::Encode(e.to_string()))
    }

    /// Concatenate `other`'s rows after this table's rows.
    ///
    /// Empty operands short-circuit; otherwise the index and column types must
    /// match position by position.
    pub fn add_rows(&self, other: &Table) -> Result<Table, DataError> {
        if self.is_empty() {
            return Ok(other.clone());
        }
        if other.is_empty() {
            return Ok(self.clone());
        }

        self.check_compatible(other)?;

        let mut index = self.index.clone();
        index.extend(other.index.iter().cloned());

        let columns = self
            .columns
            .iter()
            .zip(&other.columns)
            .map(|(mine, theirs)| {
                let mut values = mine.values.clone();
                values.extend(theirs.values.iter().cloned());
                Column {
                    name: mine.name.clone(),
                    data_type: mine.data_type,
                    values,
                }
            })
            .collect();

        Ok(Table {
            index_type: self.index_type,
            index,
            columns,
        })
    }

    fn check_compatible(&self, other: &Table) -> Result<(), DataError> {
        if self.index_type != other.index_type {
            return Err(DataError::IncompatibleSchema(format!(
                "index types differ: {:?} vs {:?}",
                self.index_type, other.index_type
            )));
        }

        if self.columns.len() != other.columns.len() {
            return Err(DataError::IncompatibleSchema(format!(
                "column counts differ: {} vs {}",
                self.columns.len(),
                other.columns.len()
            )));
        }

        for (position, (mine, theirs)) in self.columns.iter().zip(&other.columns).enumerate() {
            if mine.data_type != theirs.data_type {
                return Err(DataError::IncompatibleSchema(format!(
                    "column {} ('{}') types differ: {:?} vs {:?}",
                    position, mine.name, mine.data_type, theirs.data_type
                )));
            }
        }

        Ok(())
    }
}
