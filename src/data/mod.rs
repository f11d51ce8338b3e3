//! Columnar data access for training and prediction.
//!
//! The engine consumes data through the narrow read-only [`DataView`] trait:
//! column count, row count, per-column name and kind, and a typed
//! value-or-missing per cell. The surrounding table library is expected to
//! implement this trait over its own storage; [`Frame`] is a small owned
//! implementation so the engine is usable and testable standalone, and
//! [`FrameSlice`] is a zero-copy row-range view over a frame.
//!
//! # Missing Values
//!
//! Every cell is an `Option` at the storage level and surfaces as
//! [`Value::Missing`]. Missing feature values hash to a dedicated sentinel
//! (they are a legitimate category); missing target values exclude the row
//! from training.

use crate::error::FtrlError;

// =============================================================================
// Value and ColumnKind
// =============================================================================

/// A single typed cell value, borrowed from the underlying view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value<'a> {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(&'a str),
    Missing,
}

impl Value<'_> {
    /// Returns `true` for [`Value::Missing`].
    #[inline]
    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }
}

/// The declared type of a column.
///
/// [`ColumnKind::Void`] is the fully-missing column: it has a length but no
/// value type, and every cell reads as [`Value::Missing`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Bool,
    Int,
    Float,
    Str,
    Void,
}

// =============================================================================
// DataView
// =============================================================================

/// Read-only columnar view consumed by the engine.
///
/// Implementations must be cheap to index by `(row, col)`; the engine never
/// mutates a view and never holds one beyond a single `fit`/`predict` call.
pub trait DataView: Sync {
    /// Number of rows.
    fn n_rows(&self) -> usize;

    /// Number of columns.
    fn n_cols(&self) -> usize;

    /// Name of the given column.
    fn col_name(&self, col: usize) -> &str;

    /// Declared kind of the given column.
    fn col_kind(&self, col: usize) -> ColumnKind;

    /// Typed value at `(row, col)`, or [`Value::Missing`].
    fn value(&self, row: usize, col: usize) -> Value<'_>;
}

// =============================================================================
// Column
// =============================================================================

/// A single named, typed column.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Bool {
        name: String,
        values: Vec<Option<bool>>,
    },
    Int {
        name: String,
        values: Vec<Option<i64>>,
    },
    Float {
        name: String,
        values: Vec<Option<f64>>,
    },
    Str {
        name: String,
        values: Vec<Option<String>>,
    },
    /// A fully-missing column: no value type, every cell is missing.
    Void { name: String, len: usize },
}

impl Column {
    /// Boolean column with missing entries allowed.
    pub fn bools(name: &str, values: Vec<Option<bool>>) -> Self {
        Column::Bool {
            name: name.into(),
            values,
        }
    }

    /// Integer column with missing entries allowed.
    pub fn ints(name: &str, values: Vec<Option<i64>>) -> Self {
        Column::Int {
            name: name.into(),
            values,
        }
    }

    /// Float column with missing entries allowed.
    pub fn floats(name: &str, values: Vec<Option<f64>>) -> Self {
        Column::Float {
            name: name.into(),
            values,
        }
    }

    /// String column with missing entries allowed.
    pub fn strs(name: &str, values: Vec<Option<String>>) -> Self {
        Column::Str {
            name: name.into(),
            values,
        }
    }

    /// Fully-missing column of the given length.
    pub fn void(name: &str, len: usize) -> Self {
        Column::Void {
            name: name.into(),
            len,
        }
    }

    /// Dense boolean column.
    pub fn from_bools(name: &str, values: Vec<bool>) -> Self {
        Self::bools(name, values.into_iter().map(Some).collect())
    }

    /// Dense integer column.
    pub fn from_ints(name: &str, values: Vec<i64>) -> Self {
        Self::ints(name, values.into_iter().map(Some).collect())
    }

    /// Dense float column.
    pub fn from_floats(name: &str, values: Vec<f64>) -> Self {
        Self::floats(name, values.into_iter().map(Some).collect())
    }

    /// Dense string column.
    pub fn from_strs(name: &str, values: Vec<&str>) -> Self {
        Self::strs(name, values.into_iter().map(|s| Some(s.to_owned())).collect())
    }

    /// Column name.
    pub fn name(&self) -> &str {
        match self {
            Column::Bool { name, .. }
            | Column::Int { name, .. }
            | Column::Float { name, .. }
            | Column::Str { name, .. }
            | Column::Void { name, .. } => name,
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        match self {
            Column::Bool { values, .. } => values.len(),
            Column::Int { values, .. } => values.len(),
            Column::Float { values, .. } => values.len(),
            Column::Str { values, .. } => values.len(),
            Column::Void { len, .. } => *len,
        }
    }

    /// Returns `true` if the column has no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Declared kind of the column.
    pub fn kind(&self) -> ColumnKind {
        match self {
            Column::Bool { .. } => ColumnKind::Bool,
            Column::Int { .. } => ColumnKind::Int,
            Column::Float { .. } => ColumnKind::Float,
            Column::Str { .. } => ColumnKind::Str,
            Column::Void { .. } => ColumnKind::Void,
        }
    }

    /// Typed value at `row`.
    pub fn get(&self, row: usize) -> Value<'_> {
        match self {
            Column::Bool { values, .. } => match values[row] {
                Some(v) => Value::Bool(v),
                None => Value::Missing,
            },
            Column::Int { values, .. } => match values[row] {
                Some(v) => Value::Int(v),
                None => Value::Missing,
            },
            Column::Float { values, .. } => match values[row] {
                Some(v) => Value::Float(v),
                None => Value::Missing,
            },
            Column::Str { values, .. } => match &values[row] {
                Some(v) => Value::Str(v),
                None => Value::Missing,
            },
            Column::Void { .. } => Value::Missing,
        }
    }
}

// =============================================================================
// Frame
// =============================================================================

/// An owned columnar frame: a list of equally-sized named columns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Frame {
    columns: Vec<Column>,
}

impl Frame {
    /// Create a frame from columns.
    ///
    /// # Errors
    ///
    /// Returns [`FtrlError::ColumnLengthMismatch`] if columns disagree on
    /// row count.
    pub fn new(columns: Vec<Column>) -> Result<Self, FtrlError> {
        if let Some(first) = columns.first() {
            let expected = first.len();
            for col in &columns[1..] {
                if col.len() != expected {
                    return Err(FtrlError::ColumnLengthMismatch {
                        column: col.name().to_owned(),
                        expected,
                        got: col.len(),
                    });
                }
            }
        }
        Ok(Self { columns })
    }

    /// A frame with no columns.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Frame with a single column.
    pub fn single(column: Column) -> Self {
        Self {
            columns: vec![column],
        }
    }

    /// Number of rows.
    pub fn n_rows(&self) -> usize {
        self.columns.first().map(Column::len).unwrap_or(0)
    }

    /// Number of columns.
    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    /// Borrow a column by index.
    pub fn column(&self, col: usize) -> &Column {
        &self.columns[col]
    }

    /// Borrow a column by name.
    pub fn column_named(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    /// Column names in order.
    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name()).collect()
    }

    /// A zero-copy view over rows `start..start + len`.
    ///
    /// # Panics
    ///
    /// Panics if the range is out of bounds.
    pub fn slice(&self, start: usize, len: usize) -> FrameSlice<'_> {
        assert!(
            start + len <= self.n_rows(),
            "slice [{}..{}] out of bounds for frame with {} rows",
            start,
            start + len,
            self.n_rows()
        );
        FrameSlice {
            frame: self,
            start,
            len,
        }
    }
}

impl DataView for Frame {
    fn n_rows(&self) -> usize {
        Frame::n_rows(self)
    }

    fn n_cols(&self) -> usize {
        Frame::n_cols(self)
    }

    fn col_name(&self, col: usize) -> &str {
        self.columns[col].name()
    }

    fn col_kind(&self, col: usize) -> ColumnKind {
        self.columns[col].kind()
    }

    fn value(&self, row: usize, col: usize) -> Value<'_> {
        self.columns[col].get(row)
    }
}

// =============================================================================
// FrameSlice
// =============================================================================

/// A contiguous row-range view over a [`Frame`].
///
/// Values are read through to the parent frame; training on a slice and on
/// an equivalent materialized frame produces bit-identical models.
#[derive(Debug, Clone, Copy)]
pub struct FrameSlice<'a> {
    frame: &'a Frame,
    start: usize,
    len: usize,
}

impl FrameSlice<'_> {
    /// Number of rows in the slice.
    pub fn n_rows(&self) -> usize {
        self.len
    }

    /// Number of columns.
    pub fn n_cols(&self) -> usize {
        self.frame.n_cols()
    }

    /// Materialize the slice into an owned frame.
    pub fn to_frame(&self) -> Frame {
        let columns = (0..self.frame.n_cols())
            .map(|c| {
                let src = self.frame.column(c);
                let name = src.name();
                let range = self.start..self.start + self.len;
                match src {
                    Column::Bool { values, .. } => Column::bools(name, values[range].to_vec()),
                    Column::Int { values, .. } => Column::ints(name, values[range].to_vec()),
                    Column::Float { values, .. } => Column::floats(name, values[range].to_vec()),
                    Column::Str { values, .. } => Column::strs(name, values[range].to_vec()),
                    Column::Void { .. } => Column::void(name, self.len),
                }
            })
            .collect();
        Frame { columns }
    }
}

impl DataView for FrameSlice<'_> {
    fn n_rows(&self) -> usize {
        FrameSlice::n_rows(self)
    }

    fn n_cols(&self) -> usize {
        FrameSlice::n_cols(self)
    }

    fn col_name(&self, col: usize) -> &str {
        self.frame.col_name(col)
    }

    fn col_kind(&self, col: usize) -> ColumnKind {
        self.frame.col_kind(col)
    }

    fn value(&self, row: usize, col: usize) -> Value<'_> {
        self.frame.value(self.start + row, col)
    }
}
