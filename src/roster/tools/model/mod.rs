use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Value stored in the username column when the roster leaves it blank.
pub const USERNAME_PLACEHOLDER: &str = "<null>";

/// Default team label prefix for the current course year.
pub const DEFAULT_TEAM_PREFIX: &str = "SoftEng22-";

/// One roster row as read from the input file.
///
/// Optional fields are `None` when the cell was blank. The username is never
/// absent: readers substitute [`USERNAME_PLACEHOLDER`] for empty cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberRecord {
    /// 1-based line in the source file. The header occupies line 1.
    pub line: usize,
    /// Institutional identifier used for de-duplication.
    pub external_id: Option<String>,
    pub email: Option<String>,
    pub last_name: Option<String>,
    pub first_name: Option<String>,
    /// Handle used to look the member up on the remote host.
    pub username: String,
    /// Team label exactly as it appeared in the file.
    pub team_field: Option<String>,
}

impl MemberRecord {
    /// Human-readable `last first <email>` label used in diagnostics.
    pub fn label(&self) -> String {
        format!(
            "{} {} <{}>",
            self.last_name.as_deref().unwrap_or_default(),
            self.first_name.as_deref().unwrap_or_default(),
            self.email.as_deref().unwrap_or_default()
        )
    }
}

/// Reason a raw team label could not be turned into a [`TeamId`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TeamFieldError {
    #[error("team field empty")]
    Empty,
    #[error("invalid team '{0}'")]
    Invalid(String),
}

/// Canonical team identifier of the form `<PREFIX><NN>`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct TeamId(String);

impl TeamId {
    /// Parses a raw team label.
    ///
    /// The label must be `prefix` followed by one or more ASCII digits. The
    /// numeric part is re-rendered without leading zeros and padded to at
    /// least two digits, so `SoftEng22-7` and `SoftEng22-007` both become
    /// `SoftEng22-07`.
    pub fn parse(raw: Option<&str>, prefix: &str) -> Result<Self, TeamFieldError> {
        let raw = match raw {
            Some(value) if !value.is_empty() => value,
            _ => return Err(TeamFieldError::Empty),
        };
        let digits = raw
            .strip_prefix(prefix)
            .filter(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()))
            .ok_or_else(|| TeamFieldError::Invalid(raw.to_string()))?;

        let number = digits.trim_start_matches('0');
        Ok(Self(format!("{prefix}{number:0>2}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A student group mapped one-to-one onto a remote repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Team {
    pub id: TeamId,
    /// Raw label of the first row that mapped onto this team.
    pub display_name: String,
    /// Members in source row order.
    pub members: Vec<MemberRecord>,
    /// False when the size bound or any member check failed.
    pub valid: bool,
}
