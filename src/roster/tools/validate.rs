//! Row-level checks applied to every member of a team once the roster has
//! been grouped.

use thiserror::Error;

use crate::roster::tools::model::MemberRecord;

/// Shortest handle the remote host accepts.
pub const USERNAME_MIN_LEN: usize = 4;
/// Longest handle the remote host accepts.
pub const USERNAME_MAX_LEN: usize = 39;

/// First failing check for a roster row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RowError {
    #[error("email probably empty")]
    EmailEmpty,
    #[error("team name probably empty")]
    TeamEmpty,
    #[error("institutional ID probably empty")]
    IdEmpty,
    #[error("lastname probably empty")]
    LastNameEmpty,
    #[error("firstname probably empty")]
    FirstNameEmpty,
    #[error("username probably empty")]
    UsernameEmpty,
    #[error("username is not valid")]
    UsernameInvalid,
}

/// Checks a row for required fields and a well-formed username.
///
/// Checks run in a fixed order and the first failure wins. The
/// [`USERNAME_PLACEHOLDER`](crate::roster::tools::model::USERNAME_PLACEHOLDER)
/// left by readers for a blank cell is a
/// well-formed handle here; it fails later, at user lookup, for that member
/// alone.
pub fn validate_row(record: &MemberRecord) -> Option<RowError> {
    let checks = [
        (&record.email, RowError::EmailEmpty),
        (&record.team_field, RowError::TeamEmpty),
        (&record.external_id, RowError::IdEmpty),
        (&record.last_name, RowError::LastNameEmpty),
        (&record.first_name, RowError::FirstNameEmpty),
    ];
    if let Some((_, error)) = checks.into_iter().find(|(field, _)| is_blank(field)) {
        return Some(error);
    }

    if record.username.trim().is_empty() {
        return Some(RowError::UsernameEmpty);
    }
    if !is_valid_username(&record.username) {
        return Some(RowError::UsernameInvalid);
    }
    None
}

/// A username is a single whitespace-free token of 4 to 39 characters.
pub fn is_valid_username(username: &str) -> bool {
    let mut tokens = username.split_whitespace();
    let single_token = tokens.next().is_some() && tokens.next().is_none();
    let length = username.chars().count();
    single_token && (USERNAME_MIN_LEN..=USERNAME_MAX_LEN).contains(&length)
}

fn is_blank(field: &Option<String>) -> bool {
    field.as_deref().is_none_or(|value| value.trim().is_empty())
}
