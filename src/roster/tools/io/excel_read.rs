use std::path::Path;

use calamine::{DataType, Range, Reader, Xlsx, open_workbook};

use crate::roster::tools::error::{Result, ToolError};
use crate::roster::tools::io::ColumnMap;
use crate::roster::tools::model::MemberRecord;

/// Reads roster rows from an Excel workbook.
///
/// The first row of the sheet is the header; data rows are numbered from
/// line 2 to match what a spreadsheet application shows.
pub fn read_members(path: &Path, sheet: Option<&str>) -> Result<Vec<MemberRecord>> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;
    let range = read_sheet(&mut workbook, sheet)?;
    members_from_range(&range)
}

fn read_sheet<R: std::io::Read + std::io::Seek>(
    workbook: &mut Xlsx<R>,
    name: Option<&str>,
) -> Result<Range<DataType>> {
    let name = match name {
        Some(name) => name.to_string(),
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| ToolError::InvalidWorkbook("workbook has no sheets".into()))?,
    };
    let range_result = workbook
        .worksheet_range(&name)
        .ok_or_else(|| ToolError::InvalidWorkbook(format!("missing sheet '{name}'")))?;
    let range = range_result.map_err(ToolError::from)?;
    Ok(range)
}

fn members_from_range(range: &Range<DataType>) -> Result<Vec<MemberRecord>> {
    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(first_row) => first_row
            .iter()
            .map(|cell| cell_to_string(Some(cell)))
            .collect(),
        None => return Err(ToolError::InvalidWorkbook("sheet is empty".into())),
    };
    let columns = ColumnMap::from_headers(&headers)?;

    // Ranges start at the first used cell, which is not always A1.
    let first_line = range.start().map(|(row, _)| row as usize + 1).unwrap_or(1);

    let mut records = Vec::new();
    for (index, row) in rows.enumerate() {
        let line = first_line + index + 1;
        if let Some(record) = columns.record(line, |col| cell_to_string(row.get(col))) {
            records.push(record);
        }
    }
    Ok(records)
}

fn cell_to_string(cell: Option<&DataType>) -> String {
    match cell {
        Some(DataType::String(value)) => value.clone(),
        Some(DataType::Float(value)) if value.fract() == 0.0 && value.abs() < 1e15 => {
            format!("{}", *value as i64)
        }
        Some(DataType::Float(value)) => value.to_string(),
        Some(DataType::Int(value)) => value.to_string(),
        Some(DataType::Bool(value)) => value.to_string(),
        Some(DataType::Empty) | None => String::new(),
        Some(other) => other.to_string(),
    }
}
