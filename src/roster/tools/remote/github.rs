//! [`RemoteHost`] backed by the GitHub REST API.
//!
//! Only the endpoints the reconciler needs are wrapped. Requests are
//! blocking, issued once, and never retried.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::debug;
use url::Url;

use crate::roster::tools::remote::{
    AdminTeam, OrgRole, Organization, Permission, RemoteError, RemoteHost, RemoteUser, Repository,
};

const ACCEPT: &str = "application/vnd.github+json";
const API_VERSION: &str = "2022-11-28";
const USER_AGENT: &str = concat!("roster-tools/", env!("CARGO_PKG_VERSION"));

/// Authenticated GitHub API client.
pub struct GithubHost {
    agent: ureq::Agent,
    base_url: String,
    token: String,
}

impl std::fmt::Debug for GithubHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GithubHost")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[derive(Deserialize)]
struct UserPayload {
    id: u64,
    login: String,
    name: Option<String>,
    email: Option<String>,
}

#[derive(Deserialize)]
struct OrganizationPayload {
    id: u64,
    login: String,
    name: Option<String>,
}

#[derive(Deserialize)]
struct TeamPayload {
    id: u64,
    slug: String,
    name: String,
}

#[derive(Deserialize)]
struct OwnerPayload {
    login: String,
}

#[derive(Deserialize)]
struct RepositoryPayload {
    name: String,
    owner: OwnerPayload,
    ssh_url: String,
}

impl From<UserPayload> for RemoteUser {
    fn from(payload: UserPayload) -> Self {
        Self {
            id: payload.id,
            login: payload.login,
            name: payload.name,
            email: payload.email,
        }
    }
}

impl From<RepositoryPayload> for Repository {
    fn from(payload: RepositoryPayload) -> Self {
        Self {
            name: payload.name,
            owner: payload.owner.login,
            ssh_url: payload.ssh_url,
        }
    }
}

impl GithubHost {
    /// Creates a client for `base_url` (e.g. `https://api.github.com`)
    /// authenticating with `token`.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().user_agent(USER_AGENT).build(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    /// Joins `segments` onto the base URL. Each segment is percent-encoded,
    /// so `/`, `?` and `#` in a handle stay inside its own segment.
    fn url(&self, segments: &[&str]) -> Result<Url, RemoteError> {
        let invalid = |message: String| RemoteError::Transport {
            url: self.base_url.clone(),
            message,
        };
        let mut url = Url::parse(&self.base_url).map_err(|err| invalid(err.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| invalid("base URL cannot carry a path".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Issues a request. Every non-2xx answer, 404 included, is a
    /// [`RemoteError::Status`] carrying the host's message.
    fn send(
        &self,
        method: &'static str,
        segments: &[&str],
        body: Option<Value>,
    ) -> Result<ureq::Response, RemoteError> {
        let url = self.url(segments)?.to_string();
        debug!(%method, %url, "github request");
        let request = self
            .agent
            .request(method, &url)
            .set("Accept", ACCEPT)
            .set("X-GitHub-Api-Version", API_VERSION)
            .set("Authorization", &format!("Bearer {}", self.token));
        let result = match body {
            Some(body) => request.send_json(body),
            None => request.call(),
        };

        match result {
            Ok(response) => Ok(response),
            Err(ureq::Error::Status(code, response)) => Err(RemoteError::Status {
                method,
                url,
                code,
                message: error_message(response),
            }),
            Err(ureq::Error::Transport(transport)) => Err(RemoteError::Transport {
                url,
                message: transport.to_string(),
            }),
        }
    }

    /// Issues a GET whose target may be missing.
    fn lookup(&self, segments: &[&str]) -> Result<Option<ureq::Response>, RemoteError> {
        match self.send("GET", segments, None) {
            Ok(response) => Ok(Some(response)),
            Err(RemoteError::Status { code: 404, .. }) => Ok(None),
            Err(error) => Err(error),
        }
    }

    fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<Option<T>, RemoteError> {
        match self.lookup(segments)? {
            Some(response) => decode(response).map(Some),
            None => Ok(None),
        }
    }

    fn require_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, RemoteError> {
        decode(self.send("GET", segments, None)?)
    }

    /// Checks an endpoint that answers 204 when the relation holds.
    fn exists(&self, segments: &[&str]) -> Result<bool, RemoteError> {
        Ok(self
            .lookup(segments)?
            .is_some_and(|response| (200..300).contains(&response.status())))
    }

    fn team_repo_path<'a>(
        org: &'a Organization,
        team: &'a AdminTeam,
        repo: &'a Repository,
    ) -> [&'a str; 7] {
        [
            "orgs",
            &org.login,
            "teams",
            &team.slug,
            "repos",
            &repo.owner,
            &repo.name,
        ]
    }
}

fn decode<T: DeserializeOwned>(response: ureq::Response) -> Result<T, RemoteError> {
    let url = response.get_url().to_string();
    response
        .into_json()
        .map_err(|source| RemoteError::Decode { url, source })
}

/// Extracts the `message` field of an error body, falling back to the raw
/// text.
fn error_message(response: ureq::Response) -> String {
    match response.into_string() {
        Ok(text) => serde_json::from_str::<Value>(&text)
            .ok()
            .and_then(|body| body.get("message").and_then(Value::as_str).map(str::to_string))
            .unwrap_or(text),
        Err(err) => format!("unreadable response body: {err}"),
    }
}

impl RemoteHost for GithubHost {
    fn current_user(&self) -> Result<RemoteUser, RemoteError> {
        self.require_json::<UserPayload>(&["user"]).map(RemoteUser::from)
    }

    fn organization(&self, name: &str) -> Result<Organization, RemoteError> {
        let payload: OrganizationPayload = self.require_json(&["orgs", name])?;
        Ok(Organization {
            id: payload.id,
            login: payload.login,
            name: payload.name,
        })
    }

    fn find_user(&self, handle: &str) -> Result<Option<RemoteUser>, RemoteError> {
        Ok(self
            .get_json::<UserPayload>(&["users", handle])?
            .map(RemoteUser::from))
    }

    fn has_member(&self, org: &Organization, user: &RemoteUser) -> Result<bool, RemoteError> {
        self.exists(&["orgs", &org.login, "members", &user.login])
    }

    fn add_member(
        &self,
        org: &Organization,
        user: &RemoteUser,
        role: OrgRole,
    ) -> Result<(), RemoteError> {
        let role = match role {
            OrgRole::Owner => "admin",
            OrgRole::Member => "member",
        };
        self.send(
            "PUT",
            &["orgs", &org.login, "memberships", &user.login],
            Some(json!({ "role": role })),
        )?;
        Ok(())
    }

    fn team_by_slug(&self, org: &Organization, slug: &str) -> Result<AdminTeam, RemoteError> {
        let payload: TeamPayload = self.require_json(&["orgs", &org.login, "teams", slug])?;
        Ok(AdminTeam {
            id: payload.id,
            slug: payload.slug,
            name: payload.name,
        })
    }

    fn team_has_repo(
        &self,
        org: &Organization,
        team: &AdminTeam,
        repo: &Repository,
    ) -> Result<bool, RemoteError> {
        self.exists(&Self::team_repo_path(org, team, repo))
    }

    fn add_team_repo(
        &self,
        org: &Organization,
        team: &AdminTeam,
        repo: &Repository,
    ) -> Result<(), RemoteError> {
        self.send("PUT", &Self::team_repo_path(org, team, repo), Some(json!({})))?;
        Ok(())
    }

    fn set_team_repo_permission(
        &self,
        org: &Organization,
        team: &AdminTeam,
        repo: &Repository,
        permission: Permission,
    ) -> Result<(), RemoteError> {
        self.send(
            "PUT",
            &Self::team_repo_path(org, team, repo),
            Some(json!({ "permission": permission.as_str() })),
        )?;
        Ok(())
    }

    fn create_repo(&self, org: &Organization, name: &str) -> Result<Repository, RemoteError> {
        let response = self.send(
            "POST",
            &["orgs", &org.login, "repos"],
            Some(json!({ "name": name, "private": true })),
        )?;
        decode::<RepositoryPayload>(response).map(Repository::from)
    }

    fn get_repo(&self, org: &Organization, name: &str) -> Result<Option<Repository>, RemoteError> {
        Ok(self
            .get_json::<RepositoryPayload>(&["repos", &org.login, name])?
            .map(Repository::from))
    }

    fn has_collaborator(&self, repo: &Repository, user: &RemoteUser) -> Result<bool, RemoteError> {
        self.exists(&[
            "repos",
            &repo.owner,
            &repo.name,
            "collaborators",
            &user.login,
        ])
    }

    fn add_collaborator(
        &self,
        repo: &Repository,
        user: &RemoteUser,
        permission: Permission,
    ) -> Result<(), RemoteError> {
        self.send(
            "PUT",
            &[
                "repos",
                &repo.owner,
                &repo.name,
                "collaborators",
                &user.login,
            ],
            Some(json!({ "permission": permission.as_str() })),
        )?;
        Ok(())
    }
}
