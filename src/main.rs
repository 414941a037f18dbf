use std::path::PathBuf;

use clap::Parser;
use roster_tools::aggregate::{self, Roster};
use roster_tools::config::{Config, DEFAULT_CONFIG_FILE};
use roster_tools::io;
use roster_tools::prompt::{AssumeYes, Confirm, TerminalPrompt};
use roster_tools::reconcile::{Mode, ReconcileOptions, ReconcileStatus, Reconciler};
use roster_tools::remote::{GithubHost, Session};
use roster_tools::report;
use roster_tools::shell::ProcessRunner;
use roster_tools::{Result, ToolError};
use tracing::{error, info};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    if let Err(error) = init_logging(cli.quiet) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
    if let Err(error) = run(cli) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn init_logging(quiet: bool) -> Result<()> {
    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(quiet, env.as_deref())?)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| ToolError::Logging(err.to_string()))
}

/// Builds the subscriber filter from `RUST_LOG` (default `info`). `--quiet`
/// caps the default level at `warn` even when `RUST_LOG` is set; per-target
/// directives from the environment still apply.
fn log_filter(quiet: bool, env: Option<&str>) -> Result<EnvFilter> {
    let filter = match env.filter(|directives| !directives.trim().is_empty()) {
        Some(directives) => EnvFilter::try_new(directives)
            .map_err(|err| ToolError::Logging(format!("invalid RUST_LOG: {err}")))?,
        None => EnvFilter::new("info"),
    };
    Ok(if quiet {
        filter.add_directive(LevelFilter::WARN.into())
    } else {
        filter
    })
}

fn run(cli: Cli) -> Result<()> {
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    let config = Config::load(&config_path, cli.config.is_some())?;

    let input = match &cli.input {
        Some(path) => path.clone(),
        None => config.workbook()?.to_path_buf(),
    };
    let records = io::read_members(&input, config.sheet.as_deref())?;
    let roster = aggregate::aggregate(records, config.team_prefix());

    if cli.list_teams {
        print!("{}", report::format_roster(&roster));
        return Ok(());
    }
    if cli.list_csv {
        println!();
        print!("{}", report::format_roster_delimited(&roster));
        return Ok(());
    }

    reconcile_all(&cli, &config, &roster)
}

fn reconcile_all(cli: &Cli, config: &Config, roster: &Roster) -> Result<()> {
    let host = GithubHost::new(config.api_url(), config.token()?);
    info!("Logging in to GitHub");
    let session = Session::connect(host, config.organization()?, config.admin_team.as_deref())?;

    let options = ReconcileOptions {
        mode: cli.mode(),
        members_only: cli.members,
        template: config.template.clone(),
        branch: config.branch().to_string(),
        instructors: config.instructors.clone(),
    };
    let runner = ProcessRunner;
    let reconciler = Reconciler::new(&session, &runner, &options);

    let mut operator: Box<dyn Confirm> = match options.mode {
        Mode::Confirm => Box::new(TerminalPrompt::stdio()),
        Mode::Apply | Mode::DryRun => Box::new(AssumeYes),
    };

    let mut failed = 0usize;
    for team in roster.select(&cli.teams, config.team_prefix()) {
        println!();
        match reconciler.reconcile(team, operator.as_mut()) {
            Ok(outcome) if outcome.status == ReconcileStatus::Declined => {
                info!(team = %team.id, "skipped at operator request");
            }
            Ok(outcome) => {
                info!(team = %team.id, actions = outcome.actions.len(), "team reconciled");
            }
            Err(err) => {
                failed += 1;
                error!(team = %team.id, "{err}");
            }
        }
    }
    if failed > 0 {
        error!(failed, "some teams could not be reconciled; fix the cause and re-run");
    }
    Ok(())
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Create and populate one private repository per student team."
)]
struct Cli {
    /// Do not take any real action with GitHub.
    #[arg(short = 'n', long, conflicts_with = "yes")]
    dry_run: bool,

    /// Assume 'yes' to all confirmation questions.
    #[arg(short = 'y', long)]
    yes: bool,

    /// Just parse and print the teams.
    #[arg(short = 't', long = "teams")]
    list_teams: bool,

    /// Just parse and print the teams as delimited text.
    #[arg(short = 'c', long = "csv")]
    list_csv: bool,

    /// Silence informational messages.
    #[arg(short = 'q', long)]
    quiet: bool,

    /// Only update team members; skip the template push.
    #[arg(short = 'm', long)]
    members: bool,

    /// Configuration file (default: roster.toml in the current directory).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Roster file, overriding the configured workbook.
    #[arg(long)]
    input: Option<PathBuf>,

    /// Teams to work with (default: all valid teams).
    teams: Vec<String>,
}

impl Cli {
    fn mode(&self) -> Mode {
        if self.dry_run {
            Mode::DryRun
        } else if self.yes {
            Mode::Apply
        } else {
            Mode::Confirm
        }
    }
}
