//! External commands used to seed a new repository from the template checkout.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

/// A program invocation with its working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellCommand {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
}

impl ShellCommand {
    pub fn new<I, S>(program: &str, args: I, cwd: &Path) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.to_string(),
            args: args.into_iter().map(Into::into).collect(),
            cwd: cwd.to_path_buf(),
        }
    }

    /// `git remote add <name> <url>`
    pub fn git_remote_add(name: &str, url: &str, cwd: &Path) -> Self {
        Self::new("git", ["remote", "add", name, url], cwd)
    }

    /// `git push <remote> <branch>`
    pub fn git_push(remote: &str, branch: &str, cwd: &Path) -> Self {
        Self::new("git", ["push", remote, branch], cwd)
    }

    /// `git remote rm <name>`
    pub fn git_remote_rm(name: &str, cwd: &Path) -> Self {
        Self::new("git", ["remote", "rm", name], cwd)
    }
}

impl fmt::Display for ShellCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Runs commands and reports how they ended.
pub trait CommandRunner {
    /// Returns the exit code, or `None` when the process was killed by a
    /// signal. Launch failures surface as `Err`.
    fn run(&self, command: &ShellCommand) -> io::Result<Option<i32>>;
}

/// Spawns real processes, inheriting stdio so git can prompt and report.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    fn run(&self, command: &ShellCommand) -> io::Result<Option<i32>> {
        let status = Command::new(&command.program)
            .args(&command.args)
            .current_dir(&command.cwd)
            .status()?;
        Ok(status.code())
    }
}
