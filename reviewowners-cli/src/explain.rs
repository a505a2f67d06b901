use std::{
    io::{self, Write},
    path::{Component, Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::Args;
use reviewowners_rs::RuleSet;

#[derive(Args, Debug)]
pub struct ExplainArgs {
    /// Path to the review-ownership rules file
    #[arg(short = 'f', long, env = "REVIEWOWNERS_FILE")]
    pub rules_file: PathBuf,

    /// Files or directories to explain. Run from the repository root: absolute
    /// paths are made relative to the working directory, and paths that don't
    /// exist locally are matched as given.
    pub paths: Vec<PathBuf>,

    /// Show the line and pattern of every matching rule
    #[arg(long)]
    pub all_matching_rules: bool,
}

impl ExplainArgs {
    fn root_paths(&self) -> Vec<PathBuf> {
        if self.paths.is_empty() {
            vec![PathBuf::from(".")]
        } else {
            self.paths.clone()
        }
    }
}

/// Print the targets each path would pick up, without talking to GitHub.
pub fn run(args: &ExplainArgs) -> Result<()> {
    let ruleset = reviewowners_rs::from_path(&args.rules_file)
        .with_context(|| format!("failed to read rules file {}", args.rules_file.display()))?;

    let repo_root = std::env::current_dir().context("failed to read the working directory")?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for root_path in args.root_paths() {
        if root_path.is_dir() {
            for path in walk_files(&repo_root, &root_path) {
                explain_path(&mut out, &ruleset, &path, args.all_matching_rules)?;
            }
        } else {
            let path = repo_path(&repo_root, &root_path);
            explain_path(&mut out, &ruleset, &path, args.all_matching_rules)?;
        }
    }
    Ok(())
}

fn explain_path(
    out: &mut impl Write,
    ruleset: &RuleSet,
    path: &str,
    all_matching_rules: bool,
) -> io::Result<()> {
    if all_matching_rules {
        let rules = ruleset.matching_rules(path);
        if rules.is_empty() {
            return writeln!(out, "{:<70}  (no matching rules)", path);
        }
        writeln!(out, "{}", path)?;
        for (_, rule) in rules {
            let targets = rule
                .targets
                .iter()
                .map(|t| t.to_string())
                .collect::<Vec<_>>();
            writeln!(
                out,
                "  line {:<4} {:<40}  {}",
                rule.line,
                rule.pattern,
                targets.join(" ")
            )?;
        }
        return Ok(());
    }

    let targets = ruleset.targets(path);
    if targets.is_empty() {
        writeln!(out, "{:<70}  (no reviewers)", path)
    } else {
        let targets = targets.iter().map(|t| t.to_string()).collect::<Vec<_>>();
        writeln!(out, "{:<70}  {}", path, targets.join(" "))
    }
}

fn walk_files<'a>(repo_root: &'a Path, root: &Path) -> impl Iterator<Item = String> + 'a {
    walkdir::WalkDir::new(root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.file_name() != ".git")
        .filter_map(|e| e.ok())
        .filter(|entry| !entry.file_type().is_dir())
        .map(move |entry| repo_path(repo_root, entry.path()))
}

// Absolute paths inside the repository are made relative to its root.
fn repo_path(repo_root: &Path, path: &Path) -> String {
    relative_path(path.strip_prefix(repo_root).unwrap_or(path))
}

// Rules are written with `/` separators relative to the repository root.
fn relative_path(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(segment) => Some(segment.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
