use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::roster::tools::error::{Result, ToolError};
use crate::roster::tools::model::DEFAULT_TEAM_PREFIX;

/// Default location of the configuration file.
pub const DEFAULT_CONFIG_FILE: &str = "roster.toml";
/// Environment variable that overrides the configured access token.
pub const TOKEN_ENV: &str = "GITHUB_TOKEN";
/// Base URL of the public GitHub REST API.
pub const DEFAULT_API_URL: &str = "https://api.github.com";
/// Branch pushed from the template repository.
pub const DEFAULT_BRANCH: &str = "main";

/// Settings loaded from the TOML configuration file.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Roster spreadsheet (`.xlsx` or `.csv`).
    pub workbook: Option<PathBuf>,
    /// Worksheet holding the roster; the first sheet when absent.
    pub sheet: Option<String>,
    /// Team label prefix, e.g. `SoftEng22-`.
    pub team_prefix: Option<String>,
    /// Organization owning the team repositories.
    pub organization: Option<String>,
    /// Slug of the administrator team granted admin access to every repository.
    pub admin_team: Option<String>,
    /// Local git checkout whose history seeds new repositories.
    pub template: Option<PathBuf>,
    /// Branch pushed from the template checkout.
    pub branch: Option<String>,
    /// Handles invited as organization owners instead of members.
    pub instructors: Vec<String>,
    pub api_url: Option<String>,
    pub token: Option<String>,
}

impl Config {
    /// Loads the configuration from `path`.
    ///
    /// A missing file is only an error when it was named explicitly; the
    /// default location falls back to empty settings so listing commands
    /// work with `--input` alone.
    pub fn load(path: &Path, explicit: bool) -> Result<Self> {
        if !path.exists() {
            if explicit {
                return Err(ToolError::MissingInput(path.to_path_buf()));
            }
            return Ok(Self::default());
        }
        let source = fs::read_to_string(path)?;
        Self::parse(&source, path)
    }

    /// Parses configuration text; `origin` is only used in error messages.
    pub fn parse(source: &str, origin: &Path) -> Result<Self> {
        toml::from_str(source).map_err(|source| ToolError::Config {
            path: origin.to_path_buf(),
            source,
        })
    }

    pub fn team_prefix(&self) -> &str {
        self.team_prefix.as_deref().unwrap_or(DEFAULT_TEAM_PREFIX)
    }

    pub fn branch(&self) -> &str {
        self.branch.as_deref().unwrap_or(DEFAULT_BRANCH)
    }

    pub fn api_url(&self) -> &str {
        self.api_url.as_deref().unwrap_or(DEFAULT_API_URL)
    }

    pub fn workbook(&self) -> Result<&Path> {
        self.workbook
            .as_deref()
            .ok_or(ToolError::MissingSetting("workbook"))
    }

    pub fn organization(&self) -> Result<&str> {
        self.organization
            .as_deref()
            .ok_or(ToolError::MissingSetting("organization"))
    }

    /// Resolves the access token, preferring the environment.
    pub fn token(&self) -> Result<String> {
        self.token_from(std::env::var(TOKEN_ENV).ok())
    }

    /// Same as [`Config::token`] with the environment value passed in.
    pub fn token_from(&self, env_value: Option<String>) -> Result<String> {
        env_value
            .filter(|token| !token.trim().is_empty())
            .or_else(|| self.token.clone())
            .ok_or(ToolError::MissingSetting("token"))
    }
}
