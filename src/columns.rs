//! Column Registry Module
//!
//! Resolves user-supplied column names against the canonical header list and
//! orders flattened rows by one column, comparing numeric columns as integers
//! and everything else as text.

use crate::error::{DmarcError, Result};
use crate::flatten::Row;
use crate::schema::ColumnSchema;
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum SortKey {
    Number(u64),
    Text(String),
}

#[derive(Debug, Clone)]
pub struct ColumnRegistry<'a> {
    schema: &'a ColumnSchema,
    headers: Vec<&'static str>,
}

impl<'a> ColumnRegistry<'a> {
    pub fn new(schema: &'a ColumnSchema) -> Self {
        Self {
            schema,
            headers: schema.headers(true),
        }
    }

    /// Canonical headers including the signing-result columns.
    pub fn headers(&self) -> &[&'static str] {
        &self.headers
    }

    /// Finds the position of `name` (exact, case-sensitive match).
    pub fn resolve(&self, name: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|header| *header == name)
            .ok_or_else(|| DmarcError::UnknownColumn {
                name: name.to_string(),
                accepted: self.headers.join(", "),
            })
    }

    pub fn is_numeric(&self, column: usize) -> bool {
        self.headers
            .get(column)
            .is_some_and(|header| self.schema.is_numeric(header))
    }

    /// Stable sort of `rows` by `column`; equal keys keep their incoming order
    /// in both directions.
    ///
    /// # Errors
    ///
    /// Fails when a row is too short for `column` or when a numeric column holds
    /// a value that is not an integer.
    pub fn sort_rows(&self, rows: Vec<Row>, column: usize, reverse: bool) -> Result<Vec<Row>> {
        let mut keyed = rows
            .into_iter()
            .map(|row| Ok((self.sort_key(&row, column)?, row)))
            .collect::<Result<Vec<_>>>()?;

        keyed.sort_by(|(a, _), (b, _)| {
            let ordering: Ordering = a.cmp(b);
            if reverse {
                ordering.reverse()
            } else {
                ordering
            }
        });
        Ok(keyed.into_iter().map(|(_, row)| row).collect())
    }

    fn sort_key(&self, row: &Row, column: usize) -> Result<SortKey> {
        let header = self.headers.get(column).copied().unwrap_or("?");
        let cell = row.get(column).ok_or_else(|| {
            DmarcError::Format(format!("Row has no value for column {}", header))
        })?;
        if self.is_numeric(column) {
            cell.trim()
                .parse::<u64>()
                .map(SortKey::Number)
                .map_err(|_| DmarcError::invalid_number(header, cell.as_str()))
        } else {
            Ok(SortKey::Text(cell.clone()))
        }
    }
}
