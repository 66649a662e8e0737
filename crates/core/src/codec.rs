//! Bidirectional conversion between grid values and script values.
//!
//! Inbound, [`marshal_argument`] turns the caller's argument slots into
//! the JSON payload bound as `arg1..argN` in the worker. Outbound,
//! [`convert_result`] validates whatever the script returned and
//! produces the only legal result shape: a rectangular grid of scalars.
//! Both directions are total and strict — there is no silent truncation
//! or padding anywhere in this module.

use chrono::{Datelike, NaiveDateTime};
use serde_json::Value;

use crate::error::ScriptError;
use crate::grid::{ArgumentSlots, Cell, GridValue};
use crate::wire::ScriptValue;

/// Days from the Common Era to 1970-01-01 (`NaiveDate::num_days_from_ce`).
const UNIX_EPOCH_DAYS_FROM_CE: i64 = 719_163;

/// Offset between the Unix epoch and the spreadsheet day-zero, so whole
/// calendar days map to consecutive integers in the host's date display.
const SERIAL_EPOCH_OFFSET_DAYS: i64 = 25_569;

/// Message for a script that returned `None` or nothing at all.
pub const MSG_NONE_RESULT: &str =
    "Your function returned None. If you wanted a blank cell, return an empty string ('') instead.";

/// Message for a script that returned an empty list.
pub const MSG_EMPTY_LIST: &str = "Result cannot be an empty list";

/// Message for a result shape the grid cannot render at all.
pub const MSG_UNSUPPORTED: &str =
    "Result must be a scalar or 2D list. Other types including dicts are not supported.";

/// Message for a sequence mixing scalars and nested sequences.
pub const MSG_NOT_2D: &str = "Result must be a valid 2D list";

// ---------------------------------------------------------------------------
// Inbound: argument marshaling
// ---------------------------------------------------------------------------

/// Marshal the full argument payload of a task.
///
/// `None` means the caller passed no arguments at all (distinct from an
/// empty slot list), and the worker binds nothing.
pub fn marshal_argument(argument: Option<&ArgumentSlots>) -> Option<Vec<Value>> {
    argument.map(|slots| slots.iter().map(|slot| marshal_slot(slot.as_ref())).collect())
}

/// Marshal one argument slot.
///
/// - Omitted slot → JSON `null` (Python `None`).
/// - Single-cell slot holding a blank, text, or boolean → the scalar.
/// - Single-cell numeric slot → materialized as a full 1×1 table and
///   then unwrapped, so numeric values take the same coercion path
///   whether they arrive as one cell or as part of a larger range
///   (numeric cells can carry date provenance).
/// - Multi-cell slot → row-major 2-D array, cell types preserved.
pub fn marshal_slot(slot: Option<&GridValue>) -> Value {
    let Some(grid) = slot else {
        return Value::Null;
    };
    if let Some(cell) = grid.single_cell() {
        return match cell {
            Cell::Number(_) => {
                let table = grid_to_json(grid);
                unwrap_single(table)
            }
            other => other.to_json(),
        };
    }
    grid_to_json(grid)
}

/// Render a grid as a row-major 2-D JSON array.
fn grid_to_json(grid: &GridValue) -> Value {
    Value::Array(
        grid.rows()
            .iter()
            .map(|row| Value::Array(row.iter().map(Cell::to_json).collect()))
            .collect(),
    )
}

/// Extract the single element of a 1×1 tabular JSON value.
fn unwrap_single(table: Value) -> Value {
    match table {
        Value::Array(mut rows) if rows.len() == 1 => match rows.remove(0) {
            Value::Array(mut cells) if cells.len() == 1 => cells.remove(0),
            other => other,
        },
        other => other,
    }
}

// ---------------------------------------------------------------------------
// Outbound: result conversion
// ---------------------------------------------------------------------------

/// Encode a date as a spreadsheet serial number.
///
/// Whole days since 1970-01-01 plus [`SERIAL_EPOCH_OFFSET_DAYS`];
/// time-of-day is truncated. 1970-01-01 encodes to 25569.
pub fn date_to_serial(dt: &NaiveDateTime) -> i64 {
    i64::from(dt.date().num_days_from_ce()) - UNIX_EPOCH_DAYS_FROM_CE + SERIAL_EPOCH_OFFSET_DAYS
}

/// Validate and convert a script result into a grid value.
///
/// Rules, applied in strict priority order:
/// 1. `None` → [`ScriptError::EmptyResult`].
/// 2. Date → serial number, wrapped 1×1.
/// 3. Scalar number/string/boolean → wrapped 1×1.
/// 4. Flat list → single row; every element must be a scalar after
///    per-element date encoding, and the list must not be empty.
/// 5. List of lists → table; every row must match the first row's
///    length, every element must satisfy the scalar rule.
/// 6. Anything else → [`ScriptError::UnsupportedResultType`].
pub fn convert_result(value: &ScriptValue) -> Result<GridValue, ScriptError> {
    match value {
        ScriptValue::None => Err(ScriptError::EmptyResult(MSG_NONE_RESULT.to_string())),
        ScriptValue::Date(dt) => Ok(GridValue::scalar(Cell::Number(date_to_serial(dt) as f64))),
        ScriptValue::Number(n) => Ok(GridValue::scalar(Cell::Number(*n))),
        ScriptValue::Text(s) => Ok(GridValue::scalar(Cell::Text(s.clone()))),
        ScriptValue::Bool(b) => Ok(GridValue::scalar(Cell::Bool(*b))),
        ScriptValue::List(items) => convert_list(items),
        ScriptValue::Opaque(_) => {
            Err(ScriptError::UnsupportedResultType(MSG_UNSUPPORTED.to_string()))
        }
    }
}

/// Convert a returned list: either one row of scalars or a full table.
fn convert_list(items: &[ScriptValue]) -> Result<GridValue, ScriptError> {
    if items.is_empty() {
        return Err(ScriptError::EmptyResult(MSG_EMPTY_LIST.to_string()));
    }

    let has_nested = items.iter().any(|item| matches!(item, ScriptValue::List(_)));
    if !has_nested {
        let row = items.iter().map(scalar_cell).collect::<Result<Vec<_>, _>>()?;
        return GridValue::from_rows(vec![row])
            .map_err(|e| ScriptError::UnsupportedResultType(e.to_string()));
    }

    // A sequence mixing scalars and sequences is neither a row nor a table.
    let mut rows = Vec::with_capacity(items.len());
    for item in items {
        match item {
            ScriptValue::List(cells) => rows.push(cells),
            _ => return Err(ScriptError::UnsupportedResultType(MSG_NOT_2D.to_string())),
        }
    }

    let width = rows[0].len();
    if width == 0 {
        return Err(ScriptError::EmptyResult(MSG_EMPTY_LIST.to_string()));
    }
    // Shape is validated for the whole table before any element is
    // inspected, so a ragged table always reports its shape problem.
    if rows.iter().any(|row| row.len() != width) {
        return Err(ScriptError::RowLengthMismatch);
    }

    let mut grid_rows = Vec::with_capacity(rows.len());
    for row in rows {
        let cells = row.iter().map(scalar_cell).collect::<Result<Vec<_>, _>>()?;
        grid_rows.push(cells);
    }
    GridValue::from_rows(grid_rows).map_err(|e| ScriptError::UnsupportedResultType(e.to_string()))
}

/// Convert one sequence element to a cell, encoding dates as serials.
fn scalar_cell(value: &ScriptValue) -> Result<Cell, ScriptError> {
    match value {
        ScriptValue::Number(n) => Ok(Cell::Number(*n)),
        ScriptValue::Text(s) => Ok(Cell::Text(s.clone())),
        ScriptValue::Bool(b) => Ok(Cell::Bool(*b)),
        ScriptValue::Date(dt) => Ok(Cell::Number(date_to_serial(dt) as f64)),
        _ => Err(ScriptError::InvalidElementType),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::{NaiveDate, NaiveTime};
    use serde_json::json;

    fn scalar_grid(cell: Cell) -> GridValue {
        GridValue::scalar(cell)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_time(NaiveTime::MIN)
    }

    // -- inbound --------------------------------------------------------------

    #[test]
    fn omitted_slot_marshals_to_null() {
        assert_eq!(marshal_slot(None), Value::Null);
    }

    #[test]
    fn single_text_cell_passes_through_as_scalar() {
        let grid = scalar_grid(Cell::Text("hello".to_string()));
        assert_eq!(marshal_slot(Some(&grid)), json!("hello"));
    }

    #[test]
    fn single_bool_cell_passes_through_as_scalar() {
        let grid = scalar_grid(Cell::Bool(false));
        assert_eq!(marshal_slot(Some(&grid)), json!(false));
    }

    #[test]
    fn single_empty_cell_passes_through_as_null() {
        let grid = scalar_grid(Cell::Empty);
        assert_eq!(marshal_slot(Some(&grid)), json!(null));
    }

    #[test]
    fn single_numeric_cell_unwraps_through_tabular_path() {
        let grid = scalar_grid(Cell::Number(42.5));
        assert_eq!(marshal_slot(Some(&grid)), json!(42.5));
    }

    #[test]
    fn numeric_round_trip_through_echo() {
        // Marshal a numeric single cell, pretend the script echoed it
        // back unmodified, and convert outward again.
        let grid = scalar_grid(Cell::Number(1234.25));
        let wire = marshal_slot(Some(&grid));
        let echoed = ScriptValue::from_wire(&wire);
        let back = convert_result(&echoed).unwrap();
        assert_eq!(back, grid);
    }

    #[test]
    fn multi_cell_slot_never_collapses() {
        let grid = GridValue::from_rows(vec![
            vec![Cell::Number(1.0), Cell::Number(2.0)],
            vec![Cell::Number(3.0), Cell::Number(4.0)],
        ])
        .unwrap();
        let marshaled = marshal_slot(Some(&grid));
        assert_eq!(marshaled, json!([[1.0, 2.0], [3.0, 4.0]]));
    }

    #[test]
    fn mixed_type_table_preserves_cell_types() {
        let grid = GridValue::from_rows(vec![vec![
            Cell::Text("a".to_string()),
            Cell::Bool(true),
            Cell::Empty,
        ]])
        .unwrap();
        assert_eq!(marshal_slot(Some(&grid)), json!([["a", true, null]]));
    }

    #[test]
    fn marshal_argument_preserves_slot_order_and_omissions() {
        let slots: ArgumentSlots = vec![
            Some(scalar_grid(Cell::Number(1.0))),
            None,
            Some(scalar_grid(Cell::Text("x".to_string()))),
        ];
        let payload = marshal_argument(Some(&slots)).unwrap();
        assert_eq!(payload, vec![json!(1.0), json!(null), json!("x")]);
        assert_eq!(marshal_argument(None), None);
    }

    // -- outbound: scalars and dates -------------------------------------------

    #[test]
    fn none_result_fails_with_empty_result() {
        let err = convert_result(&ScriptValue::None).unwrap_err();
        assert_matches!(err, ScriptError::EmptyResult(msg) => {
            assert_eq!(msg, MSG_NONE_RESULT);
        });
    }

    #[test]
    fn scalar_results_wrap_as_single_cell() {
        assert_eq!(
            convert_result(&ScriptValue::Number(3.5)).unwrap(),
            scalar_grid(Cell::Number(3.5))
        );
        assert_eq!(
            convert_result(&ScriptValue::Text("ok".to_string())).unwrap(),
            scalar_grid(Cell::Text("ok".to_string()))
        );
        assert_eq!(
            convert_result(&ScriptValue::Bool(true)).unwrap(),
            scalar_grid(Cell::Bool(true))
        );
    }

    #[test]
    fn unix_epoch_encodes_to_25569() {
        assert_eq!(date_to_serial(&date(1970, 1, 1)), 25569);
    }

    #[test]
    fn day_after_epoch_encodes_to_25570() {
        assert_eq!(date_to_serial(&date(1970, 1, 2)), 25570);
    }

    #[test]
    fn serial_truncates_time_of_day() {
        let noon = NaiveDate::from_ymd_opt(1970, 1, 1)
            .unwrap()
            .and_hms_opt(12, 30, 0)
            .unwrap();
        assert_eq!(date_to_serial(&noon), 25569);
    }

    #[test]
    fn date_result_wraps_as_serial_cell() {
        let grid = convert_result(&ScriptValue::Date(date(1970, 1, 2))).unwrap();
        assert_eq!(grid, scalar_grid(Cell::Number(25570.0)));
    }

    // -- outbound: sequences ----------------------------------------------------

    #[test]
    fn flat_list_wraps_as_single_row() {
        let grid = convert_result(&ScriptValue::List(vec![
            ScriptValue::Number(1.0),
            ScriptValue::Text("b".to_string()),
            ScriptValue::Bool(false),
        ]))
        .unwrap();
        assert_eq!(grid.row_count(), 1);
        assert_eq!(grid.col_count(), 3);
    }

    #[test]
    fn dates_inside_lists_encode_per_element() {
        let grid = convert_result(&ScriptValue::List(vec![
            ScriptValue::Date(date(1970, 1, 1)),
            ScriptValue::Date(date(1970, 1, 2)),
        ]))
        .unwrap();
        assert_eq!(
            grid.rows()[0],
            vec![Cell::Number(25569.0), Cell::Number(25570.0)]
        );
    }

    #[test]
    fn empty_list_fails_with_empty_result() {
        let err = convert_result(&ScriptValue::List(vec![])).unwrap_err();
        assert_matches!(err, ScriptError::EmptyResult(msg) => {
            assert_eq!(msg, MSG_EMPTY_LIST);
        });
    }

    #[test]
    fn flat_list_with_none_element_fails() {
        let err = convert_result(&ScriptValue::List(vec![
            ScriptValue::Number(1.0),
            ScriptValue::None,
        ]))
        .unwrap_err();
        assert_matches!(err, ScriptError::InvalidElementType);
    }

    #[test]
    fn table_passes_through_unchanged() {
        let table = ScriptValue::List(vec![
            ScriptValue::List(vec![ScriptValue::Number(1.0), ScriptValue::Number(2.0)]),
            ScriptValue::List(vec![ScriptValue::Number(3.0), ScriptValue::Number(4.0)]),
        ]);
        let grid = convert_result(&table).unwrap();
        let expected = GridValue::from_rows(vec![
            vec![Cell::Number(1.0), Cell::Number(2.0)],
            vec![Cell::Number(3.0), Cell::Number(4.0)],
        ])
        .unwrap();
        assert_eq!(grid, expected);
    }

    #[test]
    fn conversion_is_idempotent_on_valid_tables() {
        // Converting a well-formed table and converting its re-encoding
        // yields the same grid.
        let table = ScriptValue::List(vec![
            ScriptValue::List(vec![
                ScriptValue::Text("a".to_string()),
                ScriptValue::Number(2.0),
            ]),
            ScriptValue::List(vec![
                ScriptValue::Text("b".to_string()),
                ScriptValue::Number(4.0),
            ]),
        ]);
        let once = convert_result(&table).unwrap();
        let rewired = ScriptValue::from_wire(&serde_json::to_value(&once).unwrap());
        let twice = convert_result(&rewired).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn ragged_table_fails_with_row_length_mismatch() {
        let table = ScriptValue::List(vec![
            ScriptValue::List(vec![ScriptValue::Number(1.0), ScriptValue::Number(2.0)]),
            ScriptValue::List(vec![ScriptValue::Number(3.0)]),
        ]);
        let err = convert_result(&table).unwrap_err();
        assert_matches!(err, ScriptError::RowLengthMismatch);
    }

    #[test]
    fn ragged_table_reports_shape_before_element_types() {
        // Both defects present: row lengths win.
        let table = ScriptValue::List(vec![
            ScriptValue::List(vec![
                ScriptValue::Opaque("dict".to_string()),
                ScriptValue::Number(2.0),
            ]),
            ScriptValue::List(vec![ScriptValue::Number(3.0)]),
        ]);
        let err = convert_result(&table).unwrap_err();
        assert_matches!(err, ScriptError::RowLengthMismatch);
    }

    #[test]
    fn table_with_invalid_element_fails() {
        let table = ScriptValue::List(vec![ScriptValue::List(vec![
            ScriptValue::Number(1.0),
            ScriptValue::Opaque("dict".to_string()),
        ])]);
        let err = convert_result(&table).unwrap_err();
        assert_matches!(err, ScriptError::InvalidElementType);
    }

    #[test]
    fn mixed_scalars_and_rows_fail_as_unsupported() {
        let mixed = ScriptValue::List(vec![
            ScriptValue::List(vec![ScriptValue::Number(1.0)]),
            ScriptValue::Number(2.0),
        ]);
        let err = convert_result(&mixed).unwrap_err();
        assert_matches!(err, ScriptError::UnsupportedResultType(msg) => {
            assert_eq!(msg, MSG_NOT_2D);
        });
    }

    #[test]
    fn empty_first_row_fails_with_empty_result() {
        let table = ScriptValue::List(vec![ScriptValue::List(vec![])]);
        let err = convert_result(&table).unwrap_err();
        assert_matches!(err, ScriptError::EmptyResult(_));
    }

    #[test]
    fn dict_result_fails_as_unsupported() {
        let err = convert_result(&ScriptValue::Opaque("dict".to_string())).unwrap_err();
        assert_matches!(err, ScriptError::UnsupportedResultType(msg) => {
            assert_eq!(msg, MSG_UNSUPPORTED);
        });
    }
}
