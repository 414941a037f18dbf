use crate::roster::tools::aggregate::Roster;
use crate::roster::tools::model::{MemberRecord, Team};

/// Header line of the delimited-text report.
pub const DELIMITED_HEADER: &str = "teamID; teamName; username; email; lastname; firstname";

const SEPARATOR: &str = "; ";

/// Renders one team for operator review.
pub fn format_team(team: &Team) -> String {
    let mut out = format!("Team {}: {}\n", team.id, team.display_name);
    for member in &team.members {
        out.push_str(&format_member(member));
        out.push('\n');
    }
    out
}

/// Renders a single member line as shown under a team heading.
pub fn format_member(member: &MemberRecord) -> String {
    format!(
        "  {} {} <{}> {}",
        field(&member.first_name),
        field(&member.last_name),
        field(&member.email),
        member.username
    )
}

/// Renders every team, valid or not, each preceded by a blank line.
pub fn format_roster(roster: &Roster) -> String {
    let mut out = String::new();
    for team in roster.teams() {
        out.push('\n');
        out.push_str(&format_team(team));
    }
    out
}

/// Renders every team as `; `-separated rows, one per member.
pub fn format_roster_delimited(roster: &Roster) -> String {
    let mut out = format!("{DELIMITED_HEADER}\n");
    for team in roster.teams() {
        for member in &team.members {
            let row = [
                team.id.as_str(),
                team.display_name.as_str(),
                member.username.as_str(),
                field(&member.email),
                field(&member.last_name),
                field(&member.first_name),
            ];
            out.push_str(&row.join(SEPARATOR));
            out.push('\n');
        }
    }
    out
}

fn field(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or_default()
}
