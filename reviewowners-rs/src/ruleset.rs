use std::fmt;

use tracing::warn;

use crate::patternset;

/// A rule maps a pattern to the reviewers that should be requested when a
/// matching file changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub pattern: String,
    pub targets: Vec<Target>,
    /// 1-based line number in the source file.
    pub line: usize,
}

/// A reviewer reference on the right-hand side of a rule: either a single
/// user (`@handle`) or a team (`@org/slug`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    User(String),
    Team { org: String, slug: String },
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::User(handle) => write!(f, "@{}", handle),
            Target::Team { org, slug } => write!(f, "@{}/{}", org, slug),
        }
    }
}

/// A compiled set of rules. Every rule that matches a path applies to it;
/// later rules add to earlier ones rather than replacing them.
#[derive(Clone)]
pub struct RuleSet {
    rules: Vec<Rule>,
    matcher: patternset::Matcher,
}

impl RuleSet {
    /// Construct a `RuleSet` from a `Vec` of `Rule`s. Patterns that can't be
    /// compiled are logged and never match.
    pub fn new(rules: Vec<Rule>) -> Self {
        let mut builder = patternset::Builder::new();
        for rule in &rules {
            if let Err(err) = builder.add(&rule.pattern) {
                warn!(line = rule.line, "ignoring rule: {}", err);
            }
        }
        Self {
            matcher: builder.build(),
            rules,
        }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Return every rule that matches `path`, paired with its index, in the
    /// order the rules appear in the file.
    pub fn matching_rules(&self, path: &str) -> Vec<(usize, &Rule)> {
        self.matcher
            .matching_patterns(path)
            .into_iter()
            .map(|idx| (idx, &self.rules[idx]))
            .collect()
    }

    /// Return the union of the targets of every rule matching `path`, in
    /// first-seen order.
    pub fn targets(&self, path: &str) -> Vec<&Target> {
        let mut targets: Vec<&Target> = Vec::new();
        for (_, rule) in self.matching_rules(path) {
            for target in &rule.targets {
                if !targets.contains(&target) {
                    targets.push(target);
                }
            }
        }
        targets
    }
}

impl From<Vec<Rule>> for RuleSet {
    fn from(rules: Vec<Rule>) -> Self {
        Self::new(rules)
    }
}
