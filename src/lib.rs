//! Core library for the roster-tools command line application.
//!
//! The library reconciles a spreadsheet roster of student teams against a
//! code-hosting organization. Responsibilities are kept narrow: IO adapters
//! live under [`roster::tools::io`], data representations inside
//! [`roster::tools::model`], row checks in [`roster::tools::validate`], team
//! grouping in [`roster::tools::aggregate`], and the remote convergence logic
//! under [`roster::tools::reconcile`].

pub mod roster;

pub use roster::tools::{
    Result, ToolError, aggregate, config, error, io, model, prompt, reconcile, remote, report,
    shell, validate,
};
