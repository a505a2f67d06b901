//! Runs one review assignment end to end: read the rules, look at what the
//! pull request changed, work out who should review it, and ask for those
//! reviews.

use std::{collections::HashMap, path::PathBuf};

use tracing::{debug, info};

use crate::{
    aggregate::{aggregate, ResolvedMatch, ReviewRequest},
    error::{Error, Result},
    host::{PullRequestHost, PullRequestRef, RuleSource, TeamDirectory},
    parser,
    resolve::{GroupStrategy, Resolver, Reviewer},
    ruleset::RuleSet,
};

/// Settings for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub rules_path: PathBuf,
    /// Replace team targets with the team's members rather than requesting
    /// the team.
    pub expand_groups: bool,
    /// Work out the request but don't submit it.
    pub dry_run: bool,
}

impl Config {
    pub fn new(rules_path: impl Into<PathBuf>) -> Self {
        Self {
            rules_path: rules_path.into(),
            expand_groups: true,
            dry_run: false,
        }
    }
}

/// How a run that didn't fail ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// No rule produced an eligible reviewer; nothing was submitted.
    NoReviewers,
    /// The request was computed but not submitted.
    DryRun(ReviewRequest),
    Requested(ReviewRequest),
}

pub struct Assignment<'a> {
    config: Config,
    rules: &'a dyn RuleSource,
    host: &'a dyn PullRequestHost,
    directory: &'a dyn TeamDirectory,
}

impl<'a> Assignment<'a> {
    pub fn new(
        config: Config,
        rules: &'a dyn RuleSource,
        host: &'a dyn PullRequestHost,
        directory: &'a dyn TeamDirectory,
    ) -> Self {
        Self {
            config,
            rules,
            host,
            directory,
        }
    }

    pub async fn run(&self, pr: &PullRequestRef) -> Result<Outcome> {
        let source = self
            .rules
            .read_rules(&self.config.rules_path)
            .await
            .map_err(|source| Error::ReadRules {
                path: self.config.rules_path.clone(),
                source,
            })?;

        let files = self
            .host
            .changed_files(pr)
            .await
            .map_err(Error::remote("list changed files", pr))?;
        let author = self
            .host
            .author(pr)
            .await
            .map_err(Error::remote("look up the author", pr))?;

        let ruleset = RuleSet::new(parser::parse(&source));
        info!(
            %pr,
            rules = ruleset.rules().len(),
            files = files.len(),
            %author,
            "assigning reviewers"
        );

        let strategy = if self.config.expand_groups {
            GroupStrategy::Expand(self.directory)
        } else {
            GroupStrategy::PassThrough
        };
        let mut resolver = Resolver::new(strategy);
        let request = review_request(&ruleset, &files, &author, &mut resolver).await;

        if request.is_empty() {
            info!(%pr, "no reviewers to request");
            return Ok(Outcome::NoReviewers);
        }
        if self.config.dry_run {
            info!(%pr, "dry run, would request {}", request);
            return Ok(Outcome::DryRun(request));
        }

        self.host
            .request_reviewers(pr, &request)
            .await
            .map_err(Error::remote("request reviewers", pr))?;
        info!(%pr, "requested {}", request);
        Ok(Outcome::Requested(request))
    }
}

/// Match every changed file against every rule, resolve the rules that
/// matched, and fold the result into a single request. Each matching rule is
/// resolved once no matter how many files it matches.
pub async fn review_request(
    ruleset: &RuleSet,
    files: &[String],
    author: &str,
    resolver: &mut Resolver<'_>,
) -> ReviewRequest {
    let mut resolved: HashMap<usize, Vec<Reviewer>> = HashMap::new();
    let mut matches = Vec::new();

    for path in files {
        for (idx, rule) in ruleset.matching_rules(path) {
            debug!(path = %path, line = rule.line, pattern = %rule.pattern, "rule matches");
            if !resolved.contains_key(&idx) {
                let reviewers = resolver.resolve(rule).await;
                resolved.insert(idx, reviewers);
            }
            matches.push((path.as_str(), idx));
        }
    }

    aggregate(
        matches.into_iter().map(|(path, rule)| ResolvedMatch {
            path,
            rule,
            reviewers: resolved.get(&rule).map(Vec::as_slice).unwrap_or_default(),
        }),
        author,
    )
}
