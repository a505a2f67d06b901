//! Interfaces to the world outside the rule engine: where the rules file comes
//! from, and the code-hosting service that knows about pull requests and
//! teams.

use std::{fmt, io, path::Path, str::FromStr};

use async_trait::async_trait;
use thiserror::Error;

use crate::aggregate::ReviewRequest;

/// Identifies one pull request in one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestRef {
    pub owner: String,
    pub repo: String,
    pub number: u64,
}

impl PullRequestRef {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>, number: u64) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            number,
        }
    }
}

impl fmt::Display for PullRequestRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}#{}", self.owner, self.repo, self.number)
    }
}

/// A repository given as `owner/name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    pub owner: String,
    pub name: String,
}

impl Repository {
    pub fn pull_request(&self, number: u64) -> PullRequestRef {
        PullRequestRef::new(&self.owner, &self.name, number)
    }
}

impl FromStr for Repository {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().split_once('/') {
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
                Ok(Repository {
                    owner: owner.to_owned(),
                    name: name.to_owned(),
                })
            }
            _ => Err(format!("expected a repository as owner/name, got `{}`", s)),
        }
    }
}

/// Failure of a call to the code-hosting service.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("not found")]
    NotFound,

    #[error("forbidden")]
    Forbidden,

    #[error("unexpected response: HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("request failed")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Where the rules text comes from.
#[async_trait]
pub trait RuleSource: Send + Sync {
    async fn read_rules(&self, path: &Path) -> io::Result<String>;
}

/// Reads rules from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsRuleSource;

#[async_trait]
impl RuleSource for FsRuleSource {
    async fn read_rules(&self, path: &Path) -> io::Result<String> {
        tokio::fs::read_to_string(path).await
    }
}

/// The pull-request side of the code-hosting service.
#[async_trait]
pub trait PullRequestHost: Send + Sync {
    /// Repository-relative paths of every file the pull request touches.
    async fn changed_files(&self, pr: &PullRequestRef) -> Result<Vec<String>, HostError>;

    /// Login of the pull request's author.
    async fn author(&self, pr: &PullRequestRef) -> Result<String, HostError>;

    async fn request_reviewers(
        &self,
        pr: &PullRequestRef,
        request: &ReviewRequest,
    ) -> Result<(), HostError>;
}

/// Team membership lookups.
#[async_trait]
pub trait TeamDirectory: Send + Sync {
    async fn team_members(&self, org: &str, slug: &str) -> Result<Vec<String>, HostError>;
}
