//! Groups roster rows into teams.
//!
//! Aggregation runs in two phases that can be exercised separately:
//! [`collect`] de-duplicates rows by institutional identity and groups them by
//! canonical [`TeamId`], then [`finalize`] computes each team's validity.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use tracing::{info, instrument, warn};

use crate::roster::tools::model::{MemberRecord, Team, TeamFieldError, TeamId};
use crate::roster::tools::validate::{RowError, validate_row};

/// Smallest team accepted for reconciliation.
pub const MIN_TEAM_SIZE: usize = 1;
/// Largest team accepted for reconciliation.
pub const MAX_TEAM_SIZE: usize = 6;

/// Something noteworthy that happened while aggregating the roster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AggregateEvent {
    /// Row dropped because its identity was already used on `first_line`.
    Duplicate {
        line: usize,
        external_id: String,
        first_line: usize,
    },
    /// Row carries no institutional identity.
    NoIdentity { line: usize },
    /// Row skipped because its team label did not parse.
    BadTeam {
        line: usize,
        external_id: String,
        error: TeamFieldError,
    },
    /// Team size outside the accepted bounds.
    TeamSize {
        team: TeamId,
        name: String,
        count: usize,
    },
    /// A team member failed row validation.
    InvalidMember {
        team: TeamId,
        line: usize,
        member: String,
        error: RowError,
    },
}

impl fmt::Display for AggregateEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggregateEvent::Duplicate {
                line,
                external_id,
                first_line,
            } => write!(
                f,
                "Skipping line {line}: {external_id} was already seen in line {first_line}"
            ),
            AggregateEvent::NoIdentity { line } => {
                write!(f, "Skipping line {line}: no institutional identity")
            }
            AggregateEvent::BadTeam {
                line,
                external_id,
                error,
            } => write!(f, "Skipping line {line}: {error} for {external_id}"),
            AggregateEvent::TeamSize { team, name, count } => write!(
                f,
                "Team {team} ({name}) has {count} member(s), skipping team"
            ),
            AggregateEvent::InvalidMember {
                team,
                line,
                member,
                error,
            } => write!(
                f,
                "Team {team}: invalid member information on line {line}: '{member}' ({error})"
            ),
        }
    }
}

/// Accumulates rows for a single team in source order.
#[derive(Debug, Clone)]
pub struct TeamBuilder {
    id: TeamId,
    display_name: String,
    members: Vec<MemberRecord>,
}

impl TeamBuilder {
    pub fn new(id: TeamId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            members: Vec::new(),
        }
    }

    pub fn push(&mut self, record: MemberRecord) {
        self.members.push(record);
    }

    /// Computes validity and freezes the team.
    fn build(self, events: &mut Vec<AggregateEvent>) -> Team {
        let mut valid = true;
        let count = self.members.len();
        if !(MIN_TEAM_SIZE..=MAX_TEAM_SIZE).contains(&count) {
            record_event(
                events,
                AggregateEvent::TeamSize {
                    team: self.id.clone(),
                    name: self.display_name.clone(),
                    count,
                },
            );
            valid = false;
        }

        for member in &self.members {
            if let Some(error) = validate_row(member) {
                record_event(
                    events,
                    AggregateEvent::InvalidMember {
                        team: self.id.clone(),
                        line: member.line,
                        member: member.label(),
                        error,
                    },
                );
                valid = false;
            }
        }

        Team {
            id: self.id,
            display_name: self.display_name,
            members: self.members,
            valid,
        }
    }
}

/// Output of the collection phase: grouped but not yet validated teams.
#[derive(Debug, Clone, Default)]
pub struct Collected {
    pub teams: BTreeMap<TeamId, TeamBuilder>,
    pub events: Vec<AggregateEvent>,
}

/// Aggregated roster, iterated in ascending team id order.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    pub teams: BTreeMap<TeamId, Team>,
    pub events: Vec<AggregateEvent>,
}

impl Roster {
    pub fn get(&self, id: &TeamId) -> Option<&Team> {
        self.teams.get(id)
    }

    pub fn teams(&self) -> impl Iterator<Item = &Team> {
        self.teams.values()
    }

    pub fn valid_teams(&self) -> impl Iterator<Item = &Team> {
        self.teams.values().filter(|team| team.valid)
    }

    /// Resolves the teams to reconcile.
    ///
    /// With no explicit request every valid team is returned. Requested ids
    /// are canonicalized with `prefix` first, so `SoftEng22-7` selects
    /// `SoftEng22-07`. Unknown ids are reported and skipped; invalid teams are
    /// returned when asked for by name, with a warning.
    pub fn select(&self, requested: &[String], prefix: &str) -> Vec<&Team> {
        if requested.is_empty() {
            return self.valid_teams().collect();
        }

        let mut selected = Vec::new();
        for raw in requested {
            let team = TeamId::parse(Some(raw.as_str()), prefix)
                .ok()
                .and_then(|id| self.teams.get(&id))
                .or_else(|| self.teams.values().find(|team| team.id.as_str() == raw));
            match team {
                Some(team) => {
                    if !team.valid {
                        warn!(team = %team.id, "team has validation errors, processing it on request");
                    }
                    selected.push(team);
                }
                None => warn!(team = %raw, "unknown team requested, skipping"),
            }
        }
        selected
    }
}

/// Runs both aggregation phases.
#[instrument(level = "info", skip_all, fields(rows = records.len()))]
pub fn aggregate(records: Vec<MemberRecord>, prefix: &str) -> Roster {
    info!("Parsing the teams");
    finalize(collect(records, prefix))
}

/// De-duplicates rows and groups them by team.
///
/// Rows whose identity repeats an earlier row are dropped before their team
/// label is looked at. Rows with no identity are reported but still grouped.
pub fn collect(records: Vec<MemberRecord>, prefix: &str) -> Collected {
    let mut collected = Collected::default();
    let mut seen: HashMap<String, usize> = HashMap::new();

    for record in records {
        let identity = record
            .external_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string);

        match &identity {
            Some(id) => {
                if let Some(first_line) = seen.get(id) {
                    record_event(
                        &mut collected.events,
                        AggregateEvent::Duplicate {
                            line: record.line,
                            external_id: id.clone(),
                            first_line: *first_line,
                        },
                    );
                    continue;
                }
                seen.insert(id.clone(), record.line);
            }
            None => record_event(
                &mut collected.events,
                AggregateEvent::NoIdentity { line: record.line },
            ),
        }

        match TeamId::parse(record.team_field.as_deref(), prefix) {
            Ok(id) => {
                let name = record.team_field.clone().unwrap_or_default();
                collected
                    .teams
                    .entry(id.clone())
                    .or_insert_with(|| TeamBuilder::new(id, name))
                    .push(record);
            }
            Err(error) => {
                if let Some(external_id) = identity {
                    record_event(
                        &mut collected.events,
                        AggregateEvent::BadTeam {
                            line: record.line,
                            external_id,
                            error,
                        },
                    );
                }
            }
        }
    }

    collected
}

/// Computes validity for every collected team.
pub fn finalize(collected: Collected) -> Roster {
    let Collected { teams, mut events } = collected;
    let teams = teams
        .into_iter()
        .map(|(id, builder)| (id, builder.build(&mut events)))
        .collect();
    Roster { teams, events }
}

fn record_event(events: &mut Vec<AggregateEvent>, event: AggregateEvent) {
    info!("{event}");
    events.push(event);
}
