//! Export a browsed table to CSV.
//!
//! Columns are written in server order. Strings and numbers are written as
//! plain text, `null` as an empty field, arrays and objects as JSON text.

use std::path::Path;

use crate::domain::TableData;
use crate::error::AppError;
use crate::report::cell_text;

pub fn write_table_csv(path: &Path, table: &TableData) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::usage(format!("Failed to create export CSV '{}': {e}", path.display())))?;

    writer
        .write_record(&table.columns)
        .map_err(|e| AppError::usage(format!("Failed to write export CSV header: {e}")))?;

    for row in &table.rows {
        let record = table.columns.iter().map(|col| cell_text(row.get(col)));
        writer
            .write_record(record)
            .map_err(|e| AppError::usage(format!("Failed to write export CSV row: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::usage(format!("Failed to flush export CSV '{}': {e}", path.display())))
}
