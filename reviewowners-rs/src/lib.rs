//! Request pull request reviewers from a review-ownership file.
//!
//! A review-ownership file looks like a CODEOWNERS file:
//!
//! ```text
//! # comment
//! *.go        @alice @acme/backend
//! /docs/      @acme/docs
//! ```
//!
//! Every rule whose pattern matches a changed file contributes its targets.
//! Team targets are either requested as teams or expanded into their members,
//! and the pull request's author is never asked to review their own change.
//!
//! ```
//! use reviewowners_rs::{parser, RuleSet};
//!
//! let ruleset = RuleSet::new(parser::parse("*.go @alice @acme/backend\n"));
//! let targets = ruleset.targets("cmd/server/main.go");
//! assert_eq!(targets.len(), 2);
//! ```

pub mod aggregate;
pub mod assign;
mod error;
pub mod host;
pub mod parser;
pub mod patternset;
pub mod resolve;
mod ruleset;

use std::{io, path::Path};

pub use aggregate::{aggregate, ResolvedMatch, ReviewRequest};
pub use assign::{Assignment, Config, Outcome};
pub use error::{Error, Result};
pub use host::{
    FsRuleSource, HostError, PullRequestHost, PullRequestRef, Repository, RuleSource,
    TeamDirectory,
};
pub use resolve::{GroupStrategy, Resolver, Reviewer};
pub use ruleset::{Rule, RuleSet, Target};

/// Read and compile the rules file at `path`.
pub fn from_path(path: impl AsRef<Path>) -> io::Result<RuleSet> {
    let rules = parser::parse_file(path.as_ref())?;
    Ok(RuleSet::new(rules))
}
