use crate::domain::model::Table;
use crate::utils::error::{ChurnError, Result};
use std::io::Read;

/// Reads a comma-separated file with a header row. Cells are kept verbatim.
pub fn read_csv<R: Read>(reader: R) -> Result<Table> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(reader);

    let columns = rdr.headers()?.iter().map(str::to_string).collect();
    let mut table = Table::new(columns);

    for record in rdr.records() {
        let record = record?;
        table.rows.push(record.iter().map(str::to_string).collect());
    }

    tracing::debug!(
        "Read CSV with {} columns and {} rows",
        table.columns.len(),
        table.len()
    );
    Ok(table)
}

/// Serialises a table as UTF-8 CSV with its header and no index column.
pub fn to_csv_bytes(table: &Table) -> Result<Vec<u8>> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(&table.columns)?;
    for row in &table.rows {
        wtr.write_record(row)?;
    }
    wtr.into_inner()
        .map_err(|e| ChurnError::IoError(e.into_error()))
}
