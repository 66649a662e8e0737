//! Grid value types: the host's native representation.
//!
//! A [`GridValue`] is a rectangular, non-empty 2-D matrix of [`Cell`]s.
//! It is the only value shape ever returned to the host, and the shape
//! invariant is enforced by construction rather than assumed.

use serde::{Deserialize, Serialize};

/// One cell of a grid value.
///
/// Dates are not a cell type at this boundary; they are encoded as
/// spreadsheet serial numbers when flowing outward (see
/// [`codec::date_to_serial`](crate::codec::date_to_serial)).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    /// Boolean cell. Listed before `Number` so untagged deserialization
    /// does not coerce JSON booleans.
    Bool(bool),
    /// Numeric cell (integers and floats share one representation).
    Number(f64),
    /// Text cell.
    Text(String),
    /// Blank cell, `null` on the wire.
    Empty,
}

impl Cell {
    /// Render the cell as a JSON value (used when marshaling arguments).
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Cell::Bool(b) => serde_json::Value::Bool(*b),
            Cell::Number(n) => serde_json::json!(n),
            Cell::Text(s) => serde_json::Value::String(s.clone()),
            Cell::Empty => serde_json::Value::Null,
        }
    }
}

/// The matrix handed to [`GridValue::from_rows`] violated the shape
/// invariant (empty, ragged, or containing empty rows).
#[derive(Debug, Clone, thiserror::Error)]
#[error("Invalid grid shape: {0}")]
pub struct GridShapeError(pub String);

/// A rectangular, non-empty 2-D matrix of cells.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct GridValue {
    rows: Vec<Vec<Cell>>,
}

impl GridValue {
    /// Build a grid from rows, validating the shape invariant.
    ///
    /// Rules:
    /// - At least one row.
    /// - Every row has the same, non-zero length.
    pub fn from_rows(rows: Vec<Vec<Cell>>) -> Result<Self, GridShapeError> {
        let Some(first) = rows.first() else {
            return Err(GridShapeError("grid must have at least one row".to_string()));
        };
        let width = first.len();
        if width == 0 {
            return Err(GridShapeError("grid rows must not be empty".to_string()));
        }
        for (i, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(GridShapeError(format!(
                    "row {i} has length {} but row 0 has length {width}",
                    row.len()
                )));
            }
        }
        Ok(Self { rows })
    }

    /// Build a 1×1 grid holding a single cell.
    pub fn scalar(cell: Cell) -> Self {
        Self {
            rows: vec![vec![cell]],
        }
    }

    /// The rows of the grid, row-major.
    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns (equal for every row).
    pub fn col_count(&self) -> usize {
        self.rows[0].len()
    }

    /// The single cell of a 1×1 grid, or `None` for larger grids.
    pub fn single_cell(&self) -> Option<&Cell> {
        if self.rows.len() == 1 && self.rows[0].len() == 1 {
            Some(&self.rows[0][0])
        } else {
            None
        }
    }
}

/// One positional argument's full grid payload.
///
/// `None` means the positional argument was omitted by the caller.
pub type ArgumentSlot = Option<GridValue>;

/// The ordered argument slots passed with a task.
pub type ArgumentSlots = Vec<ArgumentSlot>;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
