//! Roster readers. Both formats share [`ColumnMap`] so header handling is
//! identical regardless of where the rows come from.

pub mod csv_read;
pub mod excel_read;

use std::path::Path;

use tracing::{info, instrument};

use crate::roster::tools::error::{Result, ToolError};
use crate::roster::tools::model::{MemberRecord, USERNAME_PLACEHOLDER};

pub const EMAIL_COLUMN: &str = "email address";
pub const TEAM_COLUMN: &str = "group";
pub const ID_COLUMN: &str = "id number";
pub const LAST_NAME_COLUMN: &str = "surname";
pub const FIRST_NAME_COLUMN: &str = "first name";
pub const USERNAME_COLUMN: &str = "github user name";

/// Reads roster rows from an `.xlsx`/`.xlsm` workbook or a `.csv` file.
///
/// `sheet` selects a worksheet by name; the first sheet is used otherwise.
/// It is ignored for CSV input.
#[instrument(level = "info", skip_all, fields(input = %path.display()))]
pub fn read_members(path: &Path, sheet: Option<&str>) -> Result<Vec<MemberRecord>> {
    if !path.exists() {
        return Err(ToolError::MissingInput(path.to_path_buf()));
    }
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    let records = match extension.as_deref() {
        Some("xlsx") | Some("xlsm") => excel_read::read_members(path, sheet)?,
        Some("csv") => csv_read::read_members(path)?,
        _ => return Err(ToolError::UnsupportedFormat(path.to_path_buf())),
    };
    info!(row_count = records.len(), "read roster rows");
    Ok(records)
}

/// Column positions of the required fields, resolved once from the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    email: usize,
    team: usize,
    id: usize,
    last_name: usize,
    first_name: usize,
    username: usize,
}

impl ColumnMap {
    /// Builds the map from raw header cells. Headers are compared after
    /// trimming and ASCII lowercasing.
    pub fn from_headers<S: AsRef<str>>(headers: &[S]) -> Result<Self> {
        let normalized: Vec<String> = headers
            .iter()
            .map(|header| header.as_ref().trim().to_ascii_lowercase())
            .collect();
        let find = |name: &str| {
            normalized
                .iter()
                .position(|header| header == name)
                .ok_or_else(|| ToolError::InvalidWorkbook(format!("missing column '{name}'")))
        };

        Ok(Self {
            email: find(EMAIL_COLUMN)?,
            team: find(TEAM_COLUMN)?,
            id: find(ID_COLUMN)?,
            last_name: find(LAST_NAME_COLUMN)?,
            first_name: find(FIRST_NAME_COLUMN)?,
            username: find(USERNAME_COLUMN)?,
        })
    }

    /// Builds a record from one data row.
    ///
    /// `cell` returns the text of a column, or an empty string for blank or
    /// missing cells. Returns `None` when every mapped cell is blank.
    pub fn record<F>(&self, line: usize, cell: F) -> Option<MemberRecord>
    where
        F: Fn(usize) -> String,
    {
        let value = |index: usize| normalize_optional(cell(index));

        let record = MemberRecord {
            line,
            external_id: value(self.id),
            email: value(self.email),
            last_name: value(self.last_name),
            first_name: value(self.first_name),
            username: value(self.username).unwrap_or_else(|| USERNAME_PLACEHOLDER.to_string()),
            team_field: value(self.team),
        };

        let blank = record.external_id.is_none()
            && record.email.is_none()
            && record.last_name.is_none()
            && record.first_name.is_none()
            && record.team_field.is_none()
            && record.username == USERNAME_PLACEHOLDER;
        (!blank).then_some(record)
    }
}

fn normalize_optional(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
