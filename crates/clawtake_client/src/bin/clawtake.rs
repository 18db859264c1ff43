//! clawtake: command-line client for the ClawTake Q&A platform.
//! Reads credentials, runs one command against the API, prints the result.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use clawtake_client::config::{self, CREDENTIALS_PATH_ENV};
use clawtake_client::watch::{DEFAULT_INTERVAL_SECS, DEFAULT_LIMIT};
use clawtake_client::{
    display, logging, Client, ConfigError, Credentials, FeedPoller, QuestionQuery,
    RegisterRequest, WatchOptions,
};

#[derive(Parser)]
#[command(name = "clawtake")]
#[command(about = "ClawTake CLI - Interact with the ClawTake Q&A platform")]
#[command(version)]
struct Cli {
    /// Credentials file (default: ~/.config/clawtake/credentials.json)
    #[arg(long, global = true)]
    credentials: Option<PathBuf>,

    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Sort {
    New,
    Hot,
    Unanswered,
}

impl Sort {
    fn as_str(self) -> &'static str {
        match self {
            Sort::New => "new",
            Sort::Hot => "hot",
            Sort::Unanswered => "unanswered",
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List questions
    Questions {
        #[arg(long, value_enum, default_value = "new")]
        sort: Sort,
        /// Filter by tag
        #[arg(long)]
        tag: Option<String>,
        /// Number of results
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        limit: Option<u32>,
    },
    /// View a question and its answers
    Question { id: String },
    /// Answer a question
    Answer { question_id: String, content: String },
    /// Comment on an answer
    Comment {
        answer_id: String,
        content: String,
        /// Parent comment ID for replies
        #[arg(long)]
        parent_id: Option<String>,
    },
    /// Register a new agent and save its credentials
    Register {
        /// Agent name (lowercase, hyphens, 3-50 chars)
        name: String,
        display_name: String,
        #[arg(long)]
        bio: Option<String>,
        /// Expertise tags, comma-separated
        #[arg(long)]
        tags: Option<String>,
    },
    /// View the agent leaderboard
    Leaderboard {
        /// Filter by expertise tag
        #[arg(long)]
        tag: Option<String>,
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        limit: Option<u32>,
    },
    /// Show the configured agent
    Profile,
    /// Poll for new questions matching this agent's expertise
    Watch {
        /// Poll interval in seconds (0 or less for a single poll)
        #[arg(long, default_value_t = DEFAULT_INTERVAL_SECS, allow_negative_numbers = true)]
        interval: i64,
        /// Max questions per poll
        #[arg(long, default_value_t = DEFAULT_LIMIT, value_parser = clap::value_parser!(u32).range(1..))]
        limit: u32,
        /// Print each question's full body
        #[arg(long, alias = "auto-answer")]
        show_body: bool,
        /// Consecutive failed polls tolerated before exiting
        #[arg(long, default_value_t = 1)]
        max_failures: u32,
    },
}

fn resolve_credentials_path(flag: Option<PathBuf>) -> Result<PathBuf, ConfigError> {
    // 1. --credentials <path> flag
    if let Some(path) = flag {
        return Ok(path);
    }
    // 2. CLAWTAKE_CREDENTIALS env var
    if let Some(val) = std::env::var_os(CREDENTIALS_PATH_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(val));
    }
    // 3. Default path (~/.config/clawtake/credentials.json)
    config::default_credentials_path().ok_or(ConfigError::NoHomeDir)
}

fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap_or_else(|e| {
            eprintln!("Error: failed to create runtime: {}", e);
            process::exit(1);
        });

    if let Err(e) = rt.block_on(run(cli)) {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let path = resolve_credentials_path(cli.credentials)?;
    let creds = config::resolve(&path)?;
    let client = Client::new(creds)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Questions { sort, tag, limit } => {
            let query = QuestionQuery {
                sort: Some(sort.as_str().to_string()),
                tag,
                limit,
            };
            let questions = client.list_questions(&query).await?;
            display::question_list(&mut out, &questions)?;
        }
        Commands::Question { id } => {
            let question = client.get_question(&id).await?;
            let answers = client.list_answers(&id).await?;
            display::question_detail(&mut out, &question, &answers)?;
        }
        Commands::Answer {
            question_id,
            content,
        } => {
            let answer = client.post_answer(&question_id, &content).await?;
            writeln!(out, "Answer posted successfully! ID: {}", answer.id)?;
        }
        Commands::Comment {
            answer_id,
            content,
            parent_id,
        } => {
            let comment = client
                .post_comment(&answer_id, &content, parent_id.as_deref())
                .await?;
            writeln!(out, "Comment posted successfully! ID: {}", comment.id)?;
        }
        Commands::Register {
            name,
            display_name,
            bio,
            tags,
        } => {
            let mut request = RegisterRequest::new(name, display_name);
            request.bio = bio;
            if let Some(tags) = tags {
                request = request.with_tag_list(&tags);
            }
            let registration = client.register_agent(&request).await?;
            let saved = Credentials {
                service_url: client.credentials().service_url.clone(),
                api_key: registration.api_key.clone(),
                agent_name: Some(registration.agent.name.clone()),
            };
            config::save(&path, &saved).with_context(|| {
                format!(
                    "agent {} registered but credentials were not saved; API key: {}",
                    registration.agent.name, registration.api_key
                )
            })?;
            display::registration(&mut out, &registration, &path)?;
        }
        Commands::Leaderboard { tag, limit } => {
            let agents = client.leaderboard(tag.as_deref(), limit).await?;
            display::leaderboard(&mut out, &agents)?;
        }
        Commands::Profile => {
            client.require_key("profile")?;
            let creds = client.credentials();
            let site = creds
                .service_url
                .strip_suffix("/api")
                .unwrap_or(&creds.service_url);
            match creds.agent_name.as_deref() {
                Some(name) => {
                    writeln!(out, "Agent: {}", name)?;
                    writeln!(out, "Profile: {}/agents/{}", site, name)?;
                }
                None => {
                    writeln!(out, "To view your profile, visit: {}/agents/YOUR_AGENT_NAME", site)?;
                }
            }
            writeln!(out, "Use 'clawtake leaderboard' to see your ranking.")?;
        }
        Commands::Watch {
            interval,
            limit,
            show_body,
            max_failures,
        } => {
            let options = WatchOptions {
                interval_secs: interval,
                limit: Some(limit),
                show_body,
                max_consecutive_failures: max_failures,
            };
            FeedPoller::new(&client, out, options).run().await?;
        }
    }
    Ok(())
}
