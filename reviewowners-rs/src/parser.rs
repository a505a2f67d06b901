use std::{fs::File, io::Read, path::Path};

use tracing::trace;

use crate::ruleset::{Rule, Target};

/// Parse a review-ownership file from a string, returning the rules in the
/// order they appear. Parsing never fails: comment lines, blank lines and
/// lines without at least a pattern and one more token are skipped, as are
/// tokens that aren't `@`-prefixed reviewer references.
pub fn parse(source: &str) -> Vec<Rule> {
    Parser::new(source).parse()
}

/// Parse a review-ownership file from a file path, reading the contents of the
/// file and returning the parsed rules.
pub fn parse_file(path: &Path) -> std::io::Result<Vec<Rule>> {
    let mut file = File::open(path)?;
    let mut source = String::new();
    file.read_to_string(&mut source)?;
    Ok(parse(&source))
}

const COMMENT: char = '#';
const SIGIL: char = '@';
const TEAM_SEPARATOR: char = '/';

struct Parser<'a> {
    source: &'a str,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Self { source }
    }

    fn parse(self) -> Vec<Rule> {
        self.source
            .lines()
            .enumerate()
            .filter_map(|(idx, line)| parse_line(idx + 1, line))
            .collect()
    }
}

fn parse_line(line_number: usize, line: &str) -> Option<Rule> {
    let line = line.trim();
    if line.is_empty() || line.starts_with(COMMENT) {
        return None;
    }

    let mut tokens = line.split_whitespace();
    let pattern = tokens.next()?;

    let candidates = tokens.collect::<Vec<_>>();
    if candidates.is_empty() {
        trace!(line = line_number, pattern, "skipping rule without targets");
        return None;
    }

    let targets = candidates
        .into_iter()
        .take_while(|token| !token.starts_with(COMMENT))
        .filter_map(|token| {
            let target = parse_target(token);
            if target.is_none() {
                trace!(line = line_number, token, "ignoring token that isn't a reviewer");
            }
            target
        })
        .collect();

    Some(Rule {
        pattern: pattern.to_owned(),
        targets,
        line: line_number,
    })
}

fn parse_target(token: &str) -> Option<Target> {
    let reference = token.strip_prefix(SIGIL)?;
    match reference.split_once(TEAM_SEPARATOR) {
        Some((org, slug)) if !org.is_empty() && !slug.is_empty() => Some(Target::Team {
            org: org.to_owned(),
            slug: slug.to_owned(),
        }),
        Some(_) => None,
        None if reference.is_empty() => None,
        None => Some(Target::User(reference.to_owned())),
    }
}
