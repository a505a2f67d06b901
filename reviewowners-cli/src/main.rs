use std::process::ExitCode;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use reviewowners_rs::{Assignment, FsRuleSource, Outcome};
use tracing_subscriber::EnvFilter;

mod explain;
mod github;
mod settings;

use explain::ExplainArgs;
use github::GitHubClient;
use settings::{AssignArgs, Settings};

#[derive(Parser)]
#[command(version, about = "Request pull request reviewers from review-ownership rules")]
struct Cli {
    /// Log more detail to stderr (repeat for trace output)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Request reviewers on a pull request
    Assign(AssignArgs),
    /// Show which reviewers local paths would pick up
    Explain(ExplainArgs),
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Command::Assign(args) => assign(args).await,
        Command::Explain(args) => explain::run(&args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

async fn assign(args: AssignArgs) -> Result<()> {
    let settings = Settings::from_args(args)?;
    let client = GitHubClient::new(&settings.api_url, &settings.token)?;

    let assignment = Assignment::new(settings.config, &FsRuleSource, &client, &client);
    match assignment.run(&settings.pull_request).await? {
        Outcome::NoReviewers => println!("no reviewers to request"),
        Outcome::DryRun(request) => println!("would request {}", request),
        Outcome::Requested(request) => println!("requested {}", request),
    }
    Ok(())
}
