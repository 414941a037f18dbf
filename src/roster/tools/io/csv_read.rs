use std::path::Path;

use crate::roster::tools::error::Result;
use crate::roster::tools::io::ColumnMap;
use crate::roster::tools::model::MemberRecord;

/// Reads roster rows from a comma-separated file with a header row.
pub fn read_members(path: &Path) -> Result<Vec<MemberRecord>> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let columns = ColumnMap::from_headers(&headers)?;

    let mut records = Vec::new();
    for (index, row) in reader.records().enumerate() {
        let row = row?;
        let line = row
            .position()
            .map(|position| position.line() as usize)
            .unwrap_or(index + 2);
        let cell = |col: usize| row.get(col).unwrap_or_default().to_string();
        if let Some(record) = columns.record(line, cell) {
            records.push(record);
        }
    }
    Ok(records)
}
