//! Converges one team's remote state towards its roster entry.
//!
//! Every step first observes remote state and only mutates when something is
//! missing, so re-running against an unchanged roster issues no further
//! mutations. Nothing is ever removed: repositories, organization members and
//! collaborators are only added.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::roster::tools::model::{Team, TeamId};
use crate::roster::tools::prompt::Confirm;
use crate::roster::tools::remote::{
    OrgRole, Permission, RemoteError, RemoteHost, RemoteUser, Repository, Session,
};
use crate::roster::tools::report::{format_member, format_team};
use crate::roster::tools::shell::{CommandRunner, ShellCommand};

/// How mutating steps are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Ask the operator once per team before touching anything.
    #[default]
    Confirm,
    /// Mutate without asking.
    Apply,
    /// Only read; mutating steps are logged and skipped.
    DryRun,
}

impl Mode {
    fn applies(self) -> bool {
        self != Mode::DryRun
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReconcileOptions {
    pub mode: Mode,
    /// Skip the template push and only update membership.
    pub members_only: bool,
    /// Checkout whose history seeds new repositories.
    pub template: Option<PathBuf>,
    /// Branch pushed from the template checkout.
    pub branch: String,
    /// Handles invited as organization owners.
    pub instructors: Vec<String>,
}

/// Result of one template-push command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Not run because of dry-run mode.
    Skipped,
    Succeeded,
    Failed(i32),
    Signaled,
    LaunchFailed(String),
}

/// A step taken (or planned, when `applied` is false) for a team.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    CreatedRepository { name: String },
    ReusedRepository { name: String },
    WouldCreateRepository { name: String },
    GrantedAdminTeam { team: String, applied: bool },
    InvitedToOrganization {
        login: String,
        role: OrgRole,
        applied: bool,
    },
    AddedCollaborator { login: String, applied: bool },
    UserNotFound { handle: String, reason: Option<String> },
    TemplateCommand {
        command: String,
        outcome: CommandOutcome,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileStatus {
    /// The operator declined at the confirmation prompt.
    Declined,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    pub team: TeamId,
    pub status: ReconcileStatus,
    pub actions: Vec<Action>,
}

impl ReconcileReport {
    fn new(team: &TeamId) -> Self {
        Self {
            team: team.clone(),
            status: ReconcileStatus::Completed,
            actions: Vec::new(),
        }
    }
}

/// Failure that stops processing of the current team only.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("repository {team} could not be created ({create}) nor fetched ({})", fetch_reason(.fetch))]
    RepositoryUnavailable {
        team: TeamId,
        create: RemoteError,
        fetch: Option<RemoteError>,
    },

    #[error("team {team}: {step} failed: {source}")]
    Remote {
        team: TeamId,
        step: &'static str,
        #[source]
        source: RemoteError,
    },
}

fn fetch_reason(fetch: &Option<RemoteError>) -> String {
    match fetch {
        Some(error) => error.to_string(),
        None => "not found".to_string(),
    }
}

impl fmt::Display for CommandOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandOutcome::Skipped => write!(f, "skipped"),
            CommandOutcome::Succeeded => write!(f, "ok"),
            CommandOutcome::Failed(code) => write!(f, "returned {code}"),
            CommandOutcome::Signaled => write!(f, "terminated by signal"),
            CommandOutcome::LaunchFailed(reason) => write!(f, "execution failed: {reason}"),
        }
    }
}

/// Applies roster state to the remote organization, one team at a time.
pub struct Reconciler<'a, H> {
    session: &'a Session<H>,
    runner: &'a dyn CommandRunner,
    options: &'a ReconcileOptions,
}

impl<'a, H: RemoteHost> Reconciler<'a, H> {
    pub fn new(
        session: &'a Session<H>,
        runner: &'a dyn CommandRunner,
        options: &'a ReconcileOptions,
    ) -> Self {
        Self {
            session,
            runner,
            options,
        }
    }

    /// Reconciles a single team.
    ///
    /// Member lookups that fail and template commands that fail are logged
    /// and skipped. Repository acquisition failures and failed mutations end
    /// this team with an error.
    #[instrument(level = "info", skip_all, fields(team = %team.id))]
    pub fn reconcile(
        &self,
        team: &Team,
        operator: &mut dyn Confirm,
    ) -> Result<ReconcileReport, ReconcileError> {
        let mut report = ReconcileReport::new(&team.id);
        operator.show(&format_team(team));
        if self.options.mode == Mode::Confirm && !operator.confirm("Create?") {
            report.status = ReconcileStatus::Declined;
            return Ok(report);
        }

        info!(
            "Creating repository for team {}: {}",
            team.id, team.display_name
        );
        let repo = self.acquire_repository(team, &mut report)?;
        self.grant_admin_team(team, repo.as_ref(), &mut report)?;

        for member in &team.members {
            info!("{}", format_member(member));
            let Some(user) = self.resolve_user(team, &member.username, &mut report) else {
                continue;
            };
            self.ensure_access(team, &user, repo.as_ref(), &mut report)?;
        }

        if !self.options.members_only {
            self.push_template(team, repo.as_ref(), &mut report);
        }
        Ok(report)
    }

    /// Returns the team repository, creating it when needed. Under dry-run a
    /// missing repository yields `None`.
    fn acquire_repository(
        &self,
        team: &Team,
        report: &mut ReconcileReport,
    ) -> Result<Option<Repository>, ReconcileError> {
        let host = &self.session.host;
        let org = &self.session.organization;
        let name = team.id.as_str();

        if !self.options.mode.applies() {
            let existing = host
                .get_repo(org, name)
                .map_err(|source| remote_error(team, "repository lookup", source))?;
            return Ok(match existing {
                Some(repo) => {
                    info!("  Repository {name} already exists.");
                    report.actions.push(Action::ReusedRepository { name: repo.name.clone() });
                    Some(repo)
                }
                None => {
                    info!("  [dry-run] Repository {name} would be created.");
                    report.actions.push(Action::WouldCreateRepository { name: name.to_string() });
                    None
                }
            });
        }

        match host.create_repo(org, name) {
            Ok(repo) => {
                info!("  Done.");
                report.actions.push(Action::CreatedRepository { name: repo.name.clone() });
                Ok(Some(repo))
            }
            Err(create) => match host.get_repo(org, name) {
                Ok(Some(repo)) => {
                    info!("  Repository {name} already exists.");
                    report.actions.push(Action::ReusedRepository { name: repo.name.clone() });
                    Ok(Some(repo))
                }
                Ok(None) => Err(ReconcileError::RepositoryUnavailable {
                    team: team.id.clone(),
                    create,
                    fetch: None,
                }),
                Err(fetch) => Err(ReconcileError::RepositoryUnavailable {
                    team: team.id.clone(),
                    create,
                    fetch: Some(fetch),
                }),
            },
        }
    }

    fn grant_admin_team(
        &self,
        team: &Team,
        repo: Option<&Repository>,
        report: &mut ReconcileReport,
    ) -> Result<(), ReconcileError> {
        let Some(admin) = &self.session.admin_team else {
            return Ok(());
        };
        let host = &self.session.host;
        let org = &self.session.organization;

        let has_access = match repo {
            Some(repo) => host
                .team_has_repo(org, admin, repo)
                .map_err(|source| remote_error(team, "administrator team lookup", source))?,
            None => false,
        };
        if has_access {
            return Ok(());
        }

        let applied = self.options.mode.applies();
        if let (true, Some(repo)) = (applied, repo) {
            host.add_team_repo(org, admin, repo)
                .map_err(|source| remote_error(team, "administrator team grant", source))?;
            host.set_team_repo_permission(org, admin, repo, Permission::Admin)
                .map_err(|source| remote_error(team, "administrator permission", source))?;
        }
        info!("  Added administrator team.");
        report.actions.push(Action::GrantedAdminTeam {
            team: admin.slug.clone(),
            applied,
        });
        Ok(())
    }

    fn resolve_user(
        &self,
        team: &Team,
        handle: &str,
        report: &mut ReconcileReport,
    ) -> Option<RemoteUser> {
        let reason = match self.session.host.find_user(handle) {
            Ok(Some(user)) => return Some(user),
            Ok(None) => None,
            Err(error) => Some(error.to_string()),
        };
        match &reason {
            Some(reason) => warn!(
                "  [ATTENTION] GitHub user {handle} not found for team with id={}! ({reason})",
                team.id
            ),
            None => warn!(
                "  [ATTENTION] GitHub user {handle} not found for team with id={}!",
                team.id
            ),
        }
        report.actions.push(Action::UserNotFound {
            handle: handle.to_string(),
            reason,
        });
        None
    }

    /// Invites non-members to the organization; adds existing members as
    /// repository collaborators.
    fn ensure_access(
        &self,
        team: &Team,
        user: &RemoteUser,
        repo: Option<&Repository>,
        report: &mut ReconcileReport,
    ) -> Result<(), ReconcileError> {
        let host = &self.session.host;
        let org = &self.session.organization;
        let applied = self.options.mode.applies();

        let is_member = host
            .has_member(org, user)
            .map_err(|source| remote_error(team, "membership lookup", source))?;
        if !is_member {
            let role = if self.options.instructors.contains(&user.login) {
                OrgRole::Owner
            } else {
                OrgRole::Member
            };
            if applied {
                host.add_member(org, user, role)
                    .map_err(|source| remote_error(team, "organization invitation", source))?;
            }
            info!(
                "  [ATTENTION] User {} is invited to join organization {} (team={})",
                user.login, org.login, team.id
            );
            report.actions.push(Action::InvitedToOrganization {
                login: user.login.clone(),
                role,
                applied,
            });
            return Ok(());
        }

        let is_collaborator = match repo {
            Some(repo) => host
                .has_collaborator(repo, user)
                .map_err(|source| remote_error(team, "collaborator lookup", source))?,
            None => false,
        };
        if is_collaborator {
            return Ok(());
        }
        if let (true, Some(repo)) = (applied, repo) {
            host.add_collaborator(repo, user, Permission::Push)
                .map_err(|source| remote_error(team, "collaborator addition", source))?;
        }
        info!("  User {} added", user.login);
        report.actions.push(Action::AddedCollaborator {
            login: user.login.clone(),
            applied,
        });
        Ok(())
    }

    /// Pushes the template history into the repository. Every command is
    /// best-effort; failures are logged and the next command still runs.
    fn push_template(&self, team: &Team, repo: Option<&Repository>, report: &mut ReconcileReport) {
        let Some(template) = &self.options.template else {
            return;
        };
        let Some(repo) = repo else {
            info!("  Template push skipped until the repository exists.");
            return;
        };

        let remote = team.id.as_str();
        let commands = [
            ShellCommand::git_remote_add(remote, &repo.ssh_url, template),
            ShellCommand::git_push(remote, &self.options.branch, template),
            ShellCommand::git_remote_rm(remote, template),
        ];
        for command in commands {
            info!("  {command}");
            let outcome = if self.options.mode.applies() {
                self.run_best_effort(&command)
            } else {
                CommandOutcome::Skipped
            };
            report.actions.push(Action::TemplateCommand {
                command: command.to_string(),
                outcome,
            });
        }
    }

    fn run_best_effort(&self, command: &ShellCommand) -> CommandOutcome {
        let outcome = match self.runner.run(command) {
            Ok(Some(0)) => CommandOutcome::Succeeded,
            Ok(Some(code)) => CommandOutcome::Failed(code),
            Ok(None) => CommandOutcome::Signaled,
            Err(error) => CommandOutcome::LaunchFailed(error.to_string()),
        };
        if outcome != CommandOutcome::Succeeded {
            warn!(command = %command, "  {outcome}");
        }
        outcome
    }
}

fn remote_error(team: &Team, step: &'static str, source: RemoteError) -> ReconcileError {
    ReconcileError::Remote {
        team: team.id.clone(),
        step,
        source,
    }
}
