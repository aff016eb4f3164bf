//! Validated component catalogues.
//!
//! Catalogue rows arrive from the loading collaborator as raw text cells in
//! fixed column positions (index 0 = name, 1 = price, then a schema-specific
//! block). Each row is converted exactly once into a named-field record by
//! [`CatalogRecord::from_row`], which checks the column count, parses every
//! numeric cell and applies the unit scaling of the schema. Nothing
//! downstream of this module touches column positions.

use serde::Serialize;

use crate::error::DesignError;

/// A record type that can be built from one catalogue row.
pub trait CatalogRecord: Sized {
    /// Human-readable catalogue kind used in error messages.
    const KIND: &'static str;

    /// Column headers in their fixed positions, with catalogue units.
    const COLUMNS: &'static [&'static str];

    /// Validate one row and convert it to SI units.
    ///
    /// `index` is the zero-based position of the row within its catalogue
    /// and is only used for error reporting.
    fn from_row(index: usize, cells: &[String]) -> Result<Self, DesignError>;

    /// Part name. Not required to be unique.
    fn name(&self) -> &str;

    /// Unit price in the catalogue's currency.
    fn price(&self) -> f64;
}

/// Cursor over the cells of a single row, producing [`DesignError::Data`]
/// errors that name the catalogue, row and part.
pub(crate) struct RowReader<'a> {
    kind: &'static str,
    index: usize,
    cells: &'a [String],
    columns: &'static [&'static str],
}

impl<'a> RowReader<'a> {
    pub(crate) fn new(
        kind: &'static str,
        columns: &'static [&'static str],
        index: usize,
        cells: &'a [String],
    ) -> Result<Self, DesignError> {
        let reader = Self {
            kind,
            index,
            cells,
            columns,
        };
        if cells.len() < columns.len() {
            return Err(reader.error(format!(
                "expected {} columns, found {}",
                columns.len(),
                cells.len()
            )));
        }
        if reader.name().is_empty() {
            return Err(reader.error("part name is empty"));
        }
        Ok(reader)
    }

    pub(crate) fn name(&self) -> &str {
        self.cells.first().map(|c| c.trim()).unwrap_or("")
    }

    pub(crate) fn text(&self, column: usize) -> String {
        self.cells[column].trim().to_string()
    }

    /// Parse a non-negative finite number from `column`.
    pub(crate) fn number(&self, column: usize) -> Result<f64, DesignError> {
        let raw = self.cells[column].trim();
        let value: f64 = raw.parse().map_err(|_| {
            self.error(format!(
                "column {} ({}) is not a number: '{}'",
                column, self.columns[column], raw
            ))
        })?;
        if !value.is_finite() || value < 0.0 {
            return Err(self.error(format!(
                "column {} ({}) must be finite and non-negative, got {}",
                column, self.columns[column], value
            )));
        }
        Ok(value)
    }

    pub(crate) fn error(&self, message: impl Into<String>) -> DesignError {
        DesignError::Data {
            catalog: self.kind,
            index: self.index,
            name: self.name().to_string(),
            message: message.into(),
        }
    }
}

/// A non-empty, homogeneous, ordered catalogue of validated records.
#[derive(Debug, Clone, Serialize)]
pub struct Catalog<T> {
    records: Vec<T>,
}

impl<T: CatalogRecord> Catalog<T> {
    /// Wrap already-validated records. An empty catalogue has no minimum and
    /// is rejected as a configuration error.
    pub fn new(records: Vec<T>) -> Result<Self, DesignError> {
        if records.is_empty() {
            return Err(DesignError::config(format!("{} catalog is empty", T::KIND)));
        }
        Ok(Self { records })
    }

    /// Validate raw rows in order and build the catalogue. The first
    /// malformed row aborts the load.
    pub fn from_rows<I>(rows: I) -> Result<Self, DesignError>
    where
        I: IntoIterator,
        I::Item: AsRef<[String]>,
    {
        let records = rows
            .into_iter()
            .enumerate()
            .map(|(index, row)| T::from_row(index, row.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(records)
    }

    pub fn records(&self) -> &[T] {
        &self.records
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.records.get(index)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.records.iter()
    }
}

impl<'a, T> IntoIterator for &'a Catalog<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
