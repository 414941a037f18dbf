pub mod aggregate;
pub mod config;
pub mod error;
pub mod io;
pub mod model;
pub mod prompt;
pub mod reconcile;
pub mod remote;
pub mod report;
pub mod shell;
pub mod validate;

pub use error::{Result, ToolError};
