use std::{collections::HashSet, fmt};

use serde::Serialize;
use tracing::debug;

use crate::resolve::Reviewer;

/// The reviewers a rule contributed for one changed file.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedMatch<'a> {
    pub path: &'a str,
    /// Index of the matching rule in its rule set.
    pub rule: usize,
    pub reviewers: &'a [Reviewer],
}

/// The final review request: users and team slugs, each listed once, in the
/// order they were first seen. Serializes to the body of GitHub's
/// request-reviewers call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReviewRequest {
    pub reviewers: Vec<String>,
    pub team_reviewers: Vec<String>,
}

impl ReviewRequest {
    pub fn is_empty(&self) -> bool {
        self.reviewers.is_empty() && self.team_reviewers.is_empty()
    }
}

impl fmt::Display for ReviewRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let users = self.reviewers.iter().map(|r| format!("@{}", r));
        let teams = self.team_reviewers.iter().map(|t| format!("team:{}", t));
        let all = users.chain(teams).collect::<Vec<_>>();
        if all.is_empty() {
            write!(f, "(none)")
        } else {
            write!(f, "{}", all.join(" "))
        }
    }
}

// Logins and team slugs are case-insensitive on the hosting side, so identity
// comparisons are too. Users and teams share one key space so a name is only
// ever requested once, as whichever kind came first.
fn identity(reviewer: &Reviewer) -> String {
    match reviewer {
        Reviewer::User(handle) => handle.to_ascii_lowercase(),
        Reviewer::Team { slug, .. } => slug.to_ascii_lowercase(),
    }
}

/// Fold the reviewers of every (file, rule) match into a single request.
/// Duplicates are dropped keeping the first occurrence, the pull request's
/// author is never requested, and teams are reduced to their slug.
pub fn aggregate<'a>(
    matches: impl IntoIterator<Item = ResolvedMatch<'a>>,
    author: &str,
) -> ReviewRequest {
    let mut seen = HashSet::new();
    let mut request = ReviewRequest::default();

    for reviewer in matches.into_iter().flat_map(|m| m.reviewers) {
        if !seen.insert(identity(reviewer)) {
            continue;
        }
        match reviewer {
            Reviewer::User(handle) if handle.eq_ignore_ascii_case(author) => {
                debug!(author, "not requesting a review from the author");
            }
            Reviewer::User(handle) => request.reviewers.push(handle.clone()),
            Reviewer::Team { slug, .. } => request.team_reviewers.push(slug.clone()),
        }
    }

    request
}
