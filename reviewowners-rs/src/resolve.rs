use std::collections::HashMap;

use tracing::{debug, warn};

use crate::{
    host::TeamDirectory,
    ruleset::{Rule, Target},
};

/// A concrete identity to request a review from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Reviewer {
    User(String),
    Team { org: String, slug: String },
}

impl Reviewer {
    pub fn user(handle: impl Into<String>) -> Self {
        Reviewer::User(handle.into())
    }

    pub fn team(org: impl Into<String>, slug: impl Into<String>) -> Self {
        Reviewer::Team {
            org: org.into(),
            slug: slug.into(),
        }
    }
}

/// How team targets are turned into reviewers. Chosen once per run.
#[derive(Clone, Copy)]
pub enum GroupStrategy<'a> {
    /// Request the team itself.
    PassThrough,
    /// Request each of the team's current members individually.
    Expand(&'a dyn TeamDirectory),
}

impl std::fmt::Debug for GroupStrategy<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GroupStrategy::PassThrough => write!(f, "PassThrough"),
            GroupStrategy::Expand(_) => write!(f, "Expand"),
        }
    }
}

/// Turns rule targets into reviewers. Team memberships are looked up at most
/// once per resolver.
pub struct Resolver<'a> {
    strategy: GroupStrategy<'a>,
    team_members: HashMap<(String, String), Vec<String>>,
}

impl<'a> Resolver<'a> {
    pub fn new(strategy: GroupStrategy<'a>) -> Self {
        Self {
            strategy,
            team_members: HashMap::new(),
        }
    }

    /// Resolve every target of `rule`, in order. A team whose members can't
    /// be fetched is logged and contributes no reviewers.
    pub async fn resolve(&mut self, rule: &Rule) -> Vec<Reviewer> {
        let mut reviewers = Vec::with_capacity(rule.targets.len());
        for target in &rule.targets {
            match target {
                Target::User(handle) => reviewers.push(Reviewer::user(handle)),
                Target::Team { org, slug } => {
                    reviewers.extend(self.resolve_team(org, slug).await);
                }
            }
        }
        reviewers
    }

    async fn resolve_team(&mut self, org: &str, slug: &str) -> Vec<Reviewer> {
        let directory = match self.strategy {
            GroupStrategy::PassThrough => return vec![Reviewer::team(org, slug)],
            GroupStrategy::Expand(directory) => directory,
        };

        let key = (org.to_owned(), slug.to_owned());
        if let Some(members) = self.team_members.get(&key) {
            return members.iter().map(Reviewer::user).collect();
        }

        let members = match directory.team_members(org, slug).await {
            Ok(members) => {
                debug!(org, team = slug, count = members.len(), "expanded team");
                members
            }
            Err(err) => {
                warn!(org, team = slug, "skipping team, failed to list members: {}", err);
                Vec::new()
            }
        };
        let reviewers = members.iter().map(Reviewer::user).collect();
        self.team_members.insert(key, members);
        reviewers
    }
}
