use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use clap::{CommandFactory, Parser, Subcommand};
use miette::{IntoDiagnostic, Result};

use docscout_agent::{llm::LlmClient, DocsOrchestrator, RunDependencies};
use docscout_core::{analyze_changes, DocscoutConfig, PullRequestRef, RunConfig};
use docscout_github::GitHubClient;
use docscout_report::{post_comments, render_artifact, PullRequestThread};
use docscout_wiki::ConfluenceClient;

#[derive(Parser)]
#[command(
    name = "docscout",
    version,
    about = "Find the Confluence pages a pull request makes stale",
    long_about = "docscout reads a pull request's changed files, lets an LLM agent explore\n\
                   Confluence with read-only tools, and turns its plan into PR comments.\n\n\
                   Examples:\n  \
                     docscout analyze                  Analyze the PR described by the environment\n  \
                     docscout render                   Post the analysis as PR comments\n  \
                     docscout render --dry-run         Print the comments instead of posting\n  \
                     docscout init                     Write a default .docscout.toml"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to configuration file (default: .docscout.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging (overridden by DOCSCOUT_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze a pull request and write the documentation plan
    #[command(long_about = "Analyze a pull request and write the documentation plan.\n\n\
        Reads OPENAI_API_KEY, CONFLUENCE_URL, CONFLUENCE_USERNAME, CONFLUENCE_API_TOKEN,\n\
        GITHUB_TOKEN, PR_NUMBER, REPO_NAME and PR_TITLE (PR_BODY is optional) from the\n\
        environment. Exits non-zero without writing the artifact if the file list\n\
        cannot be fetched or the agent fails.")]
    Analyze {
        /// Artifact path (default: [output] path, confluence_actions.json)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Post the documentation plan as pull request comments
    #[command(long_about = "Post the documentation plan as pull request comments.\n\n\
        Reads GITHUB_TOKEN, PR_NUMBER and REPO_NAME from the environment. A missing or\n\
        broken artifact is reported with a fallback comment instead of failing.\n\
        Bodies longer than the comment limit are split into numbered parts.")]
    Render {
        /// Artifact path (default: [output] path, confluence_actions.json)
        #[arg(long)]
        input: Option<PathBuf>,

        /// Print the comments to stdout instead of posting them
        #[arg(long)]
        dry_run: bool,
    },
    /// Create a default .docscout.toml configuration file
    #[command(long_about = "Create a default .docscout.toml configuration file.\n\n\
        Generates a commented-out template with all available options.\n\
        Fails if .docscout.toml already exists.")]
    Init,
    /// Generate shell completion scripts
    #[command(hide = true)]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

const DEFAULT_CONFIG: &str = r#"# docscout configuration
# Secrets and pull request coordinates come from the environment.

# [llm]
# model = "gpt-4.1"
# base_url = "https://api.openai.com"  # any OpenAI-compatible endpoint
# max_retries = 3                       # per tool, and for the final answer
# max_turns = 16
# temperature = 0.1

# [analyzer]
# significant_additions = 20
# significant_deletions = 10

# [wiki]
# space_limit = 50
# search_limit = 25
# page_limit = 25
# preview_chars = 1000

# [http]
# timeout_secs = 60

# [output]
# path = "confluence_actions.json"
# comment_char_limit = 60000           # at least 1000

# [github]
# api_url = "https://api.github.com"
"#;

fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_env("DOCSCOUT_LOG")
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<DocscoutConfig> {
    match path {
        Some(path) => Ok(DocscoutConfig::from_file(path)?),
        None => {
            let default_path = Path::new(".docscout.toml");
            if default_path.exists() {
                Ok(DocscoutConfig::from_file(default_path)?)
            } else {
                Ok(DocscoutConfig::default())
            }
        }
    }
}

fn http_client(config: &DocscoutConfig) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.http.timeout_secs))
        .user_agent(concat!("docscout/", env!("CARGO_PKG_VERSION")))
        .build()
        .into_diagnostic()
}

fn spinner(message: &str) -> Option<indicatif::ProgressBar> {
    if !std::io::stderr().is_terminal() {
        return None;
    }
    let pb = indicatif::ProgressBar::new_spinner();
    if let Ok(style) = indicatif::ProgressStyle::with_template("{spinner:.cyan} {msg} ({elapsed})")
    {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(120));
    Some(pb)
}

async fn run_analyze(config: &DocscoutConfig, output: &Path) -> Result<()> {
    let run = RunConfig::from_lookup(|name| std::env::var(name).ok())?;
    let pr = &run.pull_request;
    tracing::info!(pr = pr.number, repo = %pr.repo, title = %run.pr_title, "analyzing pull request");

    let http = http_client(config)?;

    let github = GitHubClient::new(http.clone(), &pr.github_token, &config.github.api_url)?;
    let files = github.pr_files(&pr.repo, pr.number).await?;
    if files.is_empty() {
        miette::bail!(
            help = "check GITHUB_TOKEN permissions and that PR_NUMBER and REPO_NAME point at an existing pull request",
            "could not retrieve the changed files of PR #{} in {}; aborting",
            pr.number,
            pr.repo
        );
    }

    let summary = analyze_changes(&files, &config.analyzer);
    tracing::info!(
        files = summary.total_files,
        added = summary.files_added,
        removed = summary.files_removed,
        significant = summary.significant_changes.len(),
        "summarized change set"
    );

    let wiki = ConfluenceClient::new(
        http.clone(),
        &run.confluence_url,
        &run.confluence_username,
        &run.confluence_api_token,
        config.wiki,
    );
    let deps = RunDependencies {
        http: http.clone(),
        wiki: Arc::new(wiki),
        pr_number: pr.number,
        repo: pr.repo.clone(),
        pr_title: run.pr_title.clone(),
        pr_body: run.pr_body.clone(),
        summary,
    };

    let llm = LlmClient::new(http, &run.openai_api_key, &config.llm);
    tracing::debug!(model = llm.model(), "using model");
    let orchestrator = DocsOrchestrator::new(&llm, &config.llm, &config.wiki);

    let progress = spinner("Analyzing documentation impact...");
    let mut result = match orchestrator.run(&deps).await {
        Ok(result) => result,
        Err(e) => {
            if let Some(pb) = &progress {
                pb.finish_with_message("Failed");
            }
            tracing::error!(error = %e, "documentation analysis failed");
            return Err(e.into());
        }
    };
    if let Some(pb) = progress {
        pb.finish_with_message("Done");
    }

    result.generated_at = Some(Utc::now());
    let json = serde_json::to_string_pretty(&result).into_diagnostic()?;
    std::fs::write(output, json).into_diagnostic()?;
    tracing::info!(
        path = %output.display(),
        actions = result.total_actions,
        "wrote analysis artifact"
    );
    Ok(())
}

async fn run_render(config: &DocscoutConfig, input: &Path, dry_run: bool) -> Result<()> {
    let bodies = render_artifact(input, config.output.comment_char_limit);

    if dry_run {
        let total = bodies.len();
        for (i, body) in bodies.iter().enumerate() {
            if total > 1 {
                println!("<!-- comment {}/{total} -->", i + 1);
            }
            println!("{body}");
        }
        return Ok(());
    }

    let pr = PullRequestRef::from_lookup(|name| std::env::var(name).ok())?;
    let (owner, repo) = pr.owner_and_name()?;
    let github = GitHubClient::new(http_client(config)?, &pr.github_token, &config.github.api_url)?;
    let thread = PullRequestThread::new(&github, owner, repo, pr.number);

    let posted = post_comments(&thread, &bodies).await?;
    tracing::info!(comments = posted, pr = pr.number, "posted documentation analysis");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .into_diagnostic()?;
    human_panic::setup_panic!();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Analyze { ref output } => {
            let config = load_config(cli.config.as_deref())?;
            let output = output.clone().unwrap_or_else(|| config.output.path.clone());
            run_analyze(&config, &output).await?;
        }
        Command::Render {
            ref input,
            dry_run,
        } => {
            let config = load_config(cli.config.as_deref())?;
            let input = input.clone().unwrap_or_else(|| config.output.path.clone());
            run_render(&config, &input, dry_run).await?;
        }
        Command::Init => {
            let path = Path::new(".docscout.toml");
            if path.exists() {
                miette::bail!(".docscout.toml already exists");
            }
            std::fs::write(path, DEFAULT_CONFIG).into_diagnostic()?;
            println!("Created .docscout.toml with default configuration");
        }
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "docscout", &mut std::io::stdout());
        }
    }

    Ok(())
}
