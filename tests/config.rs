use std::fs;
use std::path::Path;

use roster_tools::ToolError;
use roster_tools::config::{Config, DEFAULT_API_URL};
use tempfile::tempdir;

#[test]
fn parses_full_configuration() {
    let config = Config::parse(
        r#"
workbook = "teams.xlsx"
sheet = "Responses"
team_prefix = "SoftEng23-"
organization = "softeng-ntua"
admin_team = "admins"
template = "/srv/template"
branch = "trunk"
instructors = ["nickie", "vvescoukis"]
token = "from-file"
"#,
        Path::new("roster.toml"),
    )
    .expect("configuration parsed");

    assert_eq!(config.team_prefix(), "SoftEng23-");
    assert_eq!(config.branch(), "trunk");
    assert_eq!(config.api_url(), DEFAULT_API_URL);
    assert_eq!(config.organization().expect("organization"), "softeng-ntua");
    assert_eq!(config.instructors, vec!["nickie", "vvescoukis"]);
    assert_eq!(
        config.token_from(Some("from-env".into())).expect("token"),
        "from-env"
    );
    assert_eq!(config.token_from(Some("  ".into())).expect("token"), "from-file");
}

#[test]
fn defaults_apply_to_empty_configuration() {
    let config = Config::parse("", Path::new("roster.toml")).expect("empty is fine");
    assert_eq!(config.team_prefix(), "SoftEng22-");
    assert_eq!(config.branch(), "main");
    assert!(matches!(
        config.token_from(None),
        Err(ToolError::MissingSetting("token"))
    ));
    assert!(matches!(
        config.workbook(),
        Err(ToolError::MissingSetting("workbook"))
    ));
}

#[test]
fn unknown_keys_are_rejected_with_path() {
    let error = Config::parse("organisation = \"typo\"", Path::new("conf/roster.toml"))
        .expect_err("unknown key");
    assert!(matches!(error, ToolError::Config { .. }));
    assert!(error.to_string().contains("conf/roster.toml"));
}

#[test]
fn missing_default_file_is_tolerated_but_explicit_is_not() {
    let dir = tempdir().expect("temporary directory");
    let path = dir.path().join("roster.toml");

    assert_eq!(Config::load(&path, false).expect("defaults"), Config::default());
    assert!(matches!(
        Config::load(&path, true),
        Err(ToolError::MissingInput(_))
    ));

    fs::write(&path, "organization = \"softeng-ntua\"\n").expect("config written");
    let config = Config::load(&path, true).expect("loaded");
    assert_eq!(config.organization.as_deref(), Some("softeng-ntua"));
}
