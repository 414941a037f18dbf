//! Remote hosting collaborator.
//!
//! [`RemoteHost`] is the narrow surface the reconciler needs from the code
//! host. Lookups that can legitimately miss return `Ok(None)` instead of an
//! error so the fallback and skip paths stay visible at the call site.

pub mod github;

use std::fmt;

use thiserror::Error;
use tracing::info;

pub use github::GithubHost;

/// Failure talking to the remote host.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The request never produced an HTTP response.
    #[error("transport failure for {url}: {message}")]
    Transport { url: String, message: String },

    /// The host answered with an unexpected status code.
    #[error("{method} {url} returned {code}: {message}")]
    Status {
        method: &'static str,
        url: String,
        code: u16,
        message: String,
    },

    /// The response body did not match the expected payload.
    #[error("could not decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: std::io::Error,
    },
}

/// Account on the remote host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteUser {
    pub id: u64,
    pub login: String,
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Organization {
    pub id: u64,
    pub login: String,
    pub name: Option<String>,
}

/// Remote group granted administrative access to every team repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminTeam {
    pub id: u64,
    pub slug: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    pub name: String,
    pub owner: String,
    /// URL used to push the template history.
    pub ssh_url: String,
}

/// Role granted when adding a user to the organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrgRole {
    Owner,
    Member,
}

impl fmt::Display for OrgRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrgRole::Owner => write!(f, "owner"),
            OrgRole::Member => write!(f, "member"),
        }
    }
}

/// Repository permission levels used by the reconciler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Push,
    Admin,
}

impl Permission {
    pub fn as_str(self) -> &'static str {
        match self {
            Permission::Push => "push",
            Permission::Admin => "admin",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operations the reconciler performs against the code host.
pub trait RemoteHost {
    /// The authenticated account.
    fn current_user(&self) -> Result<RemoteUser, RemoteError>;

    fn organization(&self, name: &str) -> Result<Organization, RemoteError>;

    /// Resolves a user handle; `None` when no such account exists.
    fn find_user(&self, handle: &str) -> Result<Option<RemoteUser>, RemoteError>;

    fn has_member(&self, org: &Organization, user: &RemoteUser) -> Result<bool, RemoteError>;

    fn add_member(
        &self,
        org: &Organization,
        user: &RemoteUser,
        role: OrgRole,
    ) -> Result<(), RemoteError>;

    fn team_by_slug(&self, org: &Organization, slug: &str) -> Result<AdminTeam, RemoteError>;

    fn team_has_repo(
        &self,
        org: &Organization,
        team: &AdminTeam,
        repo: &Repository,
    ) -> Result<bool, RemoteError>;

    /// Gives the team access to the repository with the host's default permission.
    fn add_team_repo(
        &self,
        org: &Organization,
        team: &AdminTeam,
        repo: &Repository,
    ) -> Result<(), RemoteError>;

    fn set_team_repo_permission(
        &self,
        org: &Organization,
        team: &AdminTeam,
        repo: &Repository,
        permission: Permission,
    ) -> Result<(), RemoteError>;

    /// Creates a private repository. Fails if it already exists.
    fn create_repo(&self, org: &Organization, name: &str) -> Result<Repository, RemoteError>;

    /// Fetches an existing repository; `None` when it does not exist.
    fn get_repo(&self, org: &Organization, name: &str) -> Result<Option<Repository>, RemoteError>;

    fn has_collaborator(&self, repo: &Repository, user: &RemoteUser) -> Result<bool, RemoteError>;

    fn add_collaborator(
        &self,
        repo: &Repository,
        user: &RemoteUser,
        permission: Permission,
    ) -> Result<(), RemoteError>;
}

/// Handles resolved once at startup and shared by every reconciliation.
#[derive(Debug)]
pub struct Session<H> {
    pub host: H,
    pub user: RemoteUser,
    pub organization: Organization,
    pub admin_team: Option<AdminTeam>,
}

impl<H: RemoteHost> Session<H> {
    /// Resolves the current user, the organization, and the optional
    /// administrator team.
    pub fn connect(
        host: H,
        organization: &str,
        admin_team: Option<&str>,
    ) -> Result<Self, RemoteError> {
        let user = host.current_user()?;
        info!(
            id = user.id,
            login = %user.login,
            name = user.name.as_deref().unwrap_or_default(),
            email = user.email.as_deref().unwrap_or_default(),
            "authenticated"
        );

        let organization = host.organization(organization)?;
        info!(
            id = organization.id,
            login = %organization.login,
            name = organization.name.as_deref().unwrap_or_default(),
            "organization resolved"
        );

        let admin_team = match admin_team {
            Some(slug) => {
                let team = host.team_by_slug(&organization, slug)?;
                info!(id = team.id, name = %team.name, "administrator team resolved");
                Some(team)
            }
            None => None,
        };

        Ok(Self {
            host,
            user,
            organization,
            admin_team,
        })
    }
}
