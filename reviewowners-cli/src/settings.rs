use std::{fs, path::PathBuf};

use clap::{ArgAction, Args};
use reviewowners_rs::{Config, Error, PullRequestRef, Repository};
use serde::Deserialize;

pub const DEFAULT_API_URL: &str = "https://api.github.com";

#[derive(Args, Debug)]
pub struct AssignArgs {
    /// Path to the review-ownership rules file
    #[arg(short = 'f', long, env = "REVIEWOWNERS_FILE")]
    pub rules_file: Option<PathBuf>,

    /// Request each member of a team instead of the team itself
    #[arg(
        long,
        env = "REVIEWOWNERS_EXPAND_GROUPS",
        default_value_t = true,
        action = ArgAction::Set,
        value_name = "BOOL"
    )]
    pub expand_groups: bool,

    /// GitHub token used for every API call
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Repository as owner/name
    #[arg(long, env = "GITHUB_REPOSITORY")]
    pub repository: Option<String>,

    /// Pull request number. Read from the Actions event payload when omitted.
    #[arg(long = "pr", env = "REVIEWOWNERS_PR")]
    pub pull_request: Option<u64>,

    /// Path to a GitHub Actions event payload
    #[arg(long, env = "GITHUB_EVENT_PATH", hide = true)]
    pub event_path: Option<PathBuf>,

    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Print the reviewers that would be requested without requesting them
    #[arg(long)]
    pub dry_run: bool,
}

/// Everything an `assign` run needs, checked up front so a run never starts
/// half-configured.
#[derive(Debug)]
pub struct Settings {
    pub config: Config,
    pub token: String,
    pub pull_request: PullRequestRef,
    pub api_url: String,
}

impl Settings {
    pub fn from_args(args: AssignArgs) -> Result<Settings, Error> {
        let rules_path = args
            .rules_file
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or_else(|| missing("rules file (--rules-file or REVIEWOWNERS_FILE)"))?;
        let token = args
            .token
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| missing("GitHub token (--token or GITHUB_TOKEN)"))?;
        let repository = args
            .repository
            .ok_or_else(|| missing("repository (--repository or GITHUB_REPOSITORY)"))?
            .parse::<Repository>()
            .map_err(Error::Config)?;
        let number = match args.pull_request {
            Some(number) => number,
            None => pull_request_from_event(args.event_path)?,
        };

        Ok(Settings {
            config: Config {
                rules_path,
                expand_groups: args.expand_groups,
                dry_run: args.dry_run,
            },
            token,
            pull_request: repository.pull_request(number),
            api_url: args.api_url,
        })
    }
}

fn missing(what: &str) -> Error {
    Error::Config(format!("missing {}", what))
}

#[derive(Deserialize)]
struct Event {
    pull_request: Option<EventPullRequest>,
    number: Option<u64>,
}

#[derive(Deserialize)]
struct EventPullRequest {
    number: u64,
}

// `pull_request` and `pull_request_target` events nest the number under
// `pull_request`; some other events only carry a top-level `number`.
fn pull_request_from_event(event_path: Option<PathBuf>) -> Result<u64, Error> {
    let path =
        event_path.ok_or_else(|| missing("pull request number (--pr or REVIEWOWNERS_PR)"))?;
    let payload = fs::read_to_string(&path).map_err(|err| {
        Error::Config(format!(
            "can't read event payload {}: {}",
            path.display(),
            err
        ))
    })?;
    let event: Event = serde_json::from_str(&payload).map_err(|err| {
        Error::Config(format!(
            "can't parse event payload {}: {}",
            path.display(),
            err
        ))
    })?;

    event
        .pull_request
        .map(|pr| pr.number)
        .or(event.number)
        .ok_or_else(|| {
            Error::Config(format!(
                "event payload {} is not a pull request event",
                path.display()
            ))
        })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn complete_args() -> AssignArgs {
        AssignArgs {
            rules_file: Some(PathBuf::from(".github/REVIEWERS")),
            expand_groups: true,
            token: Some("t0ken".into()),
            repository: Some("acme/widgets".into()),
            pull_request: Some(12),
            event_path: None,
            api_url: DEFAULT_API_URL.into(),
            dry_run: false,
        }
    }

    fn config_error(args: AssignArgs) -> String {
        match Settings::from_args(args) {
            Err(Error::Config(msg)) => msg,
            other => panic!("expected a configuration error, got {:?}", other),
        }
    }

    #[test]
    fn test_complete_settings() {
        let settings = Settings::from_args(complete_args()).unwrap();
        assert_eq!(settings.pull_request, PullRequestRef::new("acme", "widgets", 12));
        assert_eq!(settings.config, Config::new(".github/REVIEWERS"));
        assert_eq!(settings.token, "t0ken");
    }

    #[test]
    fn test_missing_settings() {
        let msg = config_error(AssignArgs {
            rules_file: None,
            ..complete_args()
        });
        assert!(msg.contains("rules file"), "{}", msg);

        let msg = config_error(AssignArgs {
            token: Some("  ".into()),
            ..complete_args()
        });
        assert!(msg.contains("GitHub token"), "{}", msg);

        let msg = config_error(AssignArgs {
            repository: None,
            ..complete_args()
        });
        assert!(msg.contains("repository"), "{}", msg);

        let msg = config_error(AssignArgs {
            repository: Some("widgets".into()),
            ..complete_args()
        });
        assert!(msg.contains("owner/name"), "{}", msg);

        let msg = config_error(AssignArgs {
            pull_request: None,
            ..complete_args()
        });
        assert!(msg.contains("pull request number"), "{}", msg);
    }

    #[test]
    fn test_pull_request_from_event() {
        let dir = tempfile::tempdir().unwrap();

        let pr_event = dir.path().join("pr.json");
        fs::write(&pr_event, r#"{"action":"opened","pull_request":{"number":34}}"#).unwrap();
        let settings = Settings::from_args(AssignArgs {
            pull_request: None,
            event_path: Some(pr_event),
            ..complete_args()
        })
        .unwrap();
        assert_eq!(settings.pull_request.number, 34);

        let push_event = dir.path().join("push.json");
        fs::write(&push_event, r#"{"ref":"refs/heads/main"}"#).unwrap();
        let msg = config_error(AssignArgs {
            pull_request: None,
            event_path: Some(push_event),
            ..complete_args()
        });
        assert!(msg.contains("not a pull request event"), "{}", msg);

        let msg = config_error(AssignArgs {
            pull_request: None,
            event_path: Some(dir.path().join("missing.json")),
            ..complete_args()
        });
        assert!(msg.contains("can't read event payload"), "{}", msg);
    }
}
