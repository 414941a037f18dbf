use std::fs;
use std::path::Path;

use roster_tools::ToolError;
use roster_tools::aggregate::{self, AggregateEvent};
use roster_tools::io;
use roster_tools::model::{MemberRecord, TeamFieldError, TeamId, USERNAME_PLACEHOLDER};
use roster_tools::report;
use roster_tools::validate::RowError;
use rust_xlsxwriter::Workbook;
use tempfile::tempdir;

const PREFIX: &str = "SoftEng22-";
const HEADERS: [&str; 6] = [
    "Email address",
    "Group",
    "ID number",
    "Surname",
    "First name",
    "github user name",
];

fn write_xlsx(path: &Path, sheet: &str, rows: &[[&str; 6]]) {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet).expect("sheet named");
    for (col, header) in HEADERS.iter().enumerate() {
        worksheet
            .write_string(0, col as u16, *header)
            .expect("header written");
    }
    for (row_idx, row) in rows.iter().enumerate() {
        for (col, cell) in row.iter().enumerate() {
            if !cell.is_empty() {
                worksheet
                    .write_string((row_idx + 1) as u32, col as u16, *cell)
                    .expect("cell written");
            }
        }
    }
    workbook.save(path).expect("workbook saved");
}

fn record(line: usize, id: Option<&str>, team: Option<&str>, username: &str) -> MemberRecord {
    MemberRecord {
        line,
        external_id: id.map(str::to_string),
        email: Some(format!("{username}@example.com")),
        last_name: Some("Doe".into()),
        first_name: Some("Jane".into()),
        username: username.to_string(),
        team_field: team.map(str::to_string),
    }
}

fn team_id(raw: &str) -> TeamId {
    TeamId::parse(Some(raw), PREFIX).expect("valid team id")
}

#[test]
fn team_ids_are_canonical_and_stable() {
    assert_eq!(team_id("SoftEng22-7").as_str(), "SoftEng22-07");
    assert_eq!(team_id("SoftEng22-07").as_str(), "SoftEng22-07");
    assert_eq!(team_id("SoftEng22-007").as_str(), "SoftEng22-07");
    assert_eq!(team_id("SoftEng22-0").as_str(), "SoftEng22-00");
    assert_eq!(team_id("SoftEng22-123").as_str(), "SoftEng22-123");

    let canonical = team_id("SoftEng22-3");
    assert_eq!(team_id(canonical.as_str()), canonical);
}

#[test]
fn malformed_team_fields_are_rejected() {
    assert_eq!(TeamId::parse(None, PREFIX), Err(TeamFieldError::Empty));
    assert_eq!(TeamId::parse(Some(""), PREFIX), Err(TeamFieldError::Empty));
    for raw in ["SoftEng22-", "SoftEng22-x1", "SoftEng21-01", "SoftEng22- 1", "Team 1"] {
        assert_eq!(
            TeamId::parse(Some(raw), PREFIX),
            Err(TeamFieldError::Invalid(raw.to_string())),
            "{raw} should be rejected"
        );
    }
}

#[test]
fn duplicate_identities_keep_the_first_row() {
    let roster = aggregate::aggregate(
        vec![
            record(2, Some("031001"), Some("SoftEng22-1"), "first-user"),
            record(3, Some("031001"), Some("SoftEng22-2"), "second-user"),
            record(4, Some(" 031001 "), Some("SoftEng22-1"), "third-user"),
        ],
        PREFIX,
    );

    assert_eq!(roster.teams.len(), 1);
    let team = roster.get(&team_id("SoftEng22-01")).expect("team present");
    assert_eq!(team.members.len(), 1);
    assert_eq!(team.members[0].username, "first-user");
    assert_eq!(
        roster.events,
        vec![
            AggregateEvent::Duplicate {
                line: 3,
                external_id: "031001".into(),
                first_line: 2
            },
            AggregateEvent::Duplicate {
                line: 4,
                external_id: "031001".into(),
                first_line: 2
            },
        ]
    );
    assert_eq!(
        roster.events[0].to_string(),
        "Skipping line 3: 031001 was already seen in line 2"
    );
}

#[test]
fn rows_without_identity_still_join_their_team() {
    let roster = aggregate::aggregate(
        vec![
            record(2, None, Some("SoftEng22-04"), "no-id-user"),
            record(3, Some("031002"), Some("SoftEng22-04"), "with-id"),
        ],
        PREFIX,
    );

    let team = roster.get(&team_id("SoftEng22-04")).expect("team present");
    assert_eq!(team.members.len(), 2);
    assert!(!team.valid, "member without identity fails validation");
    assert!(roster.events.contains(&AggregateEvent::NoIdentity { line: 2 }));
    assert!(roster.events.contains(&AggregateEvent::InvalidMember {
        team: team_id("SoftEng22-04"),
        line: 2,
        member: "Doe Jane <no-id-user@example.com>".into(),
        error: RowError::IdEmpty,
    }));
}

#[test]
fn unparseable_team_is_logged_only_with_identity() {
    let roster = aggregate::aggregate(
        vec![
            record(2, Some("031003"), Some("Group 5"), "lost-user"),
            record(3, None, None, "anonymous"),
        ],
        PREFIX,
    );

    assert!(roster.teams.is_empty());
    assert_eq!(
        roster.events,
        vec![
            AggregateEvent::BadTeam {
                line: 2,
                external_id: "031003".into(),
                error: TeamFieldError::Invalid("Group 5".into())
            },
            AggregateEvent::NoIdentity { line: 3 },
        ]
    );
}

#[test]
fn team_size_bounds() {
    let rows = |count: usize, team: &str| -> Vec<MemberRecord> {
        (0..count)
            .map(|i| {
                record(
                    i + 2,
                    Some(&format!("{team}-{i}")),
                    Some(team),
                    &format!("member{i}"),
                )
            })
            .collect()
    };

    let mut records = rows(6, "SoftEng22-1");
    records.extend(rows(7, "SoftEng22-2"));
    records.extend(rows(1, "SoftEng22-3"));
    let roster = aggregate::aggregate(records, PREFIX);

    assert!(roster.get(&team_id("SoftEng22-01")).expect("six").valid);
    assert!(!roster.get(&team_id("SoftEng22-02")).expect("seven").valid);
    assert!(roster.get(&team_id("SoftEng22-03")).expect("one").valid);
    assert!(roster.events.iter().any(|event| matches!(
        event,
        AggregateEvent::TeamSize { count: 7, .. }
    )));

    let valid: Vec<_> = roster.valid_teams().map(|team| team.id.to_string()).collect();
    assert_eq!(valid, vec!["SoftEng22-01", "SoftEng22-03"]);
}

#[test]
fn member_without_username_keeps_team_valid() {
    let roster = aggregate::aggregate(
        vec![
            record(2, Some("1"), Some("SoftEng22-4"), "alice-gh"),
            record(3, Some("2"), Some("SoftEng22-4"), USERNAME_PLACEHOLDER),
        ],
        PREFIX,
    );

    let valid: Vec<_> = roster.valid_teams().map(|team| team.id.to_string()).collect();
    assert_eq!(valid, vec!["SoftEng22-04"]);
    assert!(
        !roster
            .events
            .iter()
            .any(|event| matches!(event, AggregateEvent::InvalidMember { .. }))
    );
    let selected = roster.select(&[], PREFIX);
    assert_eq!(selected.len(), 1);
    assert_eq!(selected[0].members[1].username, USERNAME_PLACEHOLDER);
}

#[test]
fn collect_and_finalize_run_independently() {
    let collected = aggregate::collect(
        vec![
            record(2, Some("1"), Some("SoftEng22-2"), "bad"),
            record(3, Some("2"), Some("SoftEng22-1"), "good-user"),
        ],
        PREFIX,
    );
    assert_eq!(collected.teams.len(), 2);
    assert!(collected.events.is_empty());

    let roster = aggregate::finalize(collected);
    let ids: Vec<_> = roster.teams().map(|team| team.id.to_string()).collect();
    assert_eq!(ids, vec!["SoftEng22-01", "SoftEng22-02"]);
    assert!(!roster.get(&team_id("SoftEng22-02")).expect("team").valid);
}

#[test]
fn select_canonicalizes_and_allows_requested_invalid_teams() {
    let roster = aggregate::aggregate(
        vec![
            record(2, Some("1"), Some("SoftEng22-1"), "good-user"),
            record(3, Some("2"), Some("SoftEng22-2"), "bad"),
        ],
        PREFIX,
    );

    let default: Vec<_> = roster.select(&[], PREFIX).iter().map(|t| t.id.to_string()).collect();
    assert_eq!(default, vec!["SoftEng22-01"]);

    let requested = vec!["SoftEng22-2".to_string(), "SoftEng22-99".to_string()];
    let chosen: Vec<_> = roster
        .select(&requested, PREFIX)
        .iter()
        .map(|t| t.id.to_string())
        .collect();
    assert_eq!(chosen, vec!["SoftEng22-02"]);
}

#[test]
fn delimited_report_matches_expected_layout() {
    let mut member = record(2, Some("1"), Some("Team Alpha"), "jdoe");
    member.email = Some("j@x.com".into());
    member.first_name = Some("John".into());
    let roster = aggregate::finalize(aggregate::Collected {
        teams: [(
            team_id("SoftEng22-01"),
            {
                let mut builder = aggregate::TeamBuilder::new(team_id("SoftEng22-01"), "Team Alpha");
                builder.push(member);
                builder
            },
        )]
        .into_iter()
        .collect(),
        events: Vec::new(),
    });

    assert_eq!(
        report::format_roster_delimited(&roster),
        "teamID; teamName; username; email; lastname; firstname\n\
         SoftEng22-01; Team Alpha; jdoe; j@x.com; Doe; John\n"
    );
    assert_eq!(
        report::format_roster(&roster),
        "\nTeam SoftEng22-01: Team Alpha\n  John Doe <j@x.com> jdoe\n"
    );
}

#[test]
fn reads_roster_from_workbook() {
    let dir = tempdir().expect("temporary directory");
    let path = dir.path().join("teams.xlsx");
    write_xlsx(
        &path,
        "Responses",
        &[
            ["a@x.com", "SoftEng22-3", "031001", "Alpha", "Ann", "ann-gh"],
            ["", "", "", "", "", ""],
            ["b@x.com", "SoftEng22-03", "031002", "Beta", "Bob", ""],
        ],
    );

    let records = io::read_members(&path, Some("Responses")).expect("workbook read");
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].line, 2);
    assert_eq!(records[0].username, "ann-gh");
    assert_eq!(records[1].line, 4);
    assert_eq!(records[1].username, USERNAME_PLACEHOLDER);

    let roster = aggregate::aggregate(records, PREFIX);
    let team = roster.get(&team_id("SoftEng22-03")).expect("team");
    assert_eq!(team.display_name, "SoftEng22-3");
    assert_eq!(team.members.len(), 2);
    assert!(team.valid, "placeholder username is checked at lookup, not here");
    assert_eq!(roster.valid_teams().count(), 1);
}

#[test]
fn first_sheet_is_used_by_default() {
    let dir = tempdir().expect("temporary directory");
    let path = dir.path().join("teams.xlsx");
    write_xlsx(
        &path,
        "Sheet1",
        &[["a@x.com", "SoftEng22-1", "031001", "Alpha", "Ann", "ann-gh"]],
    );

    let records = io::read_members(&path, None).expect("workbook read");
    assert_eq!(records.len(), 1);

    let missing = io::read_members(&path, Some("Nope")).expect_err("unknown sheet");
    assert!(matches!(missing, ToolError::InvalidWorkbook(_)));
}

#[test]
fn reads_roster_from_csv_with_loose_headers() {
    let dir = tempdir().expect("temporary directory");
    let path = dir.path().join("teams.csv");
    fs::write(
        &path,
        " github user name ,EMAIL ADDRESS,Group,ID number,Surname,First name\n\
         ann-gh,a@x.com,SoftEng22-1,031001,Alpha,Ann\n\
         ,b@x.com,SoftEng22-1,031002,Beta,Bob\n",
    )
    .expect("csv written");

    let records = io::read_members(&path, None).expect("csv read");
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].email.as_deref(), Some("a@x.com"));
    assert_eq!(records[0].line, 2);
    assert_eq!(records[1].username, USERNAME_PLACEHOLDER);
    assert_eq!(records[1].line, 3);
}

#[test]
fn missing_column_is_reported() {
    let dir = tempdir().expect("temporary directory");
    let path = dir.path().join("teams.csv");
    fs::write(&path, "Email address,Group,Surname\n").expect("csv written");

    let error = io::read_members(&path, None).expect_err("missing columns");
    assert!(error.to_string().contains("id number"), "got: {error}");
}

#[test]
fn unsupported_or_missing_inputs_are_errors() {
    let dir = tempdir().expect("temporary directory");
    let missing = dir.path().join("absent.xlsx");
    assert!(matches!(
        io::read_members(&missing, None),
        Err(ToolError::MissingInput(_))
    ));

    let odd = dir.path().join("teams.ods");
    fs::write(&odd, b"").expect("file written");
    assert!(matches!(
        io::read_members(&odd, None),
        Err(ToolError::UnsupportedFormat(_))
    ));
}
