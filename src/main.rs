//! `mail-digest` -- classify and summarize recent email with a local LLM.
//!
//! Subcommands:
//!
//! - `digest` -- write and print the daily markdown digest.
//! - `summary` -- print a period report of recent email.
//! - `important` -- print important emails with their summaries.
//! - `analyze` -- print a detailed analysis of each important email.
//! - `all` -- digest, summary, then important (the default).

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;

use mail_digest::config::MailAgentConfig;
use mail_digest::error::Error;
use mail_digest::llm::{LlmBackend, LlmConfig, create_provider};
use mail_digest::mail::{GmailApi, MailFetcher};
use mail_digest::pipeline::{ClassifiedEmail, DigestWriter, MailAgent};
use mail_digest::store::FileStore;

/// Mail digest CLI.
#[derive(Parser)]
#[command(name = "mail-digest", about = "Classify and summarize recent email", version)]
struct Cli {
    /// Time window in hours.
    #[arg(long, default_value_t = 24, value_parser = clap::value_parser!(u32).range(1..))]
    hours: u32,

    /// Ignore cached messages and classifications.
    #[arg(long)]
    no_cache: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Clone, Copy)]
enum Command {
    /// Generate the daily digest.
    Digest,
    /// Summarize the period.
    Summary,
    /// List important emails.
    Important,
    /// Analyze each important email in detail.
    Analyze,
    /// Digest, summary and important emails.
    All,
}

fn build_agent(config: &MailAgentConfig) -> mail_digest::error::Result<MailAgent> {
    let llm = create_provider(&LlmConfig {
        backend: LlmBackend::Ollama,
        base_url: config.ollama_host.clone(),
        model: config.model.clone(),
        timeout: config.llm_timeout,
    })?;

    let store = Arc::new(FileStore::new(config.data_dir.clone()));
    let api = Arc::new(GmailApi::new(
        &config.gmail_api_base,
        config.gmail_token.clone(),
        config.max_messages,
    ));
    let source = Arc::new(MailFetcher::new(api, store.clone()));

    Ok(MailAgent::new(
        source,
        llm,
        store,
        DigestWriter::new(config.digest_dir.clone()),
    ))
}

fn print_record(record: &ClassifiedEmail) {
    let c = &record.classification;
    println!("Subject: {}", record.message.subject);
    println!("From: {}", record.message.sender);
    println!(
        "Category: {} | Priority: {} | Importance: {:.2}",
        c.category, c.priority_level, c.importance_score
    );
    println!(
        "Action required: {}",
        if c.requires_action { "Yes" } else { "No" }
    );
    if let Some(action) = &c.suggested_action {
        println!("Suggested action: {action}");
    }
    if let Some(deadline) = &c.deadline {
        println!("Deadline: {deadline}");
    }
    println!(
        "Summary: {}",
        record.summary.as_deref().unwrap_or("No summary available")
    );
    println!();
}

async fn run_step(agent: &MailAgent, command: Command, hours: u32, allow_cache: bool) {
    match command {
        Command::Digest => {
            println!("{}", agent.generate_daily_digest(hours, allow_cache).await);
        }
        Command::Summary => {
            println!("{}", agent.process_recent(hours, allow_cache).await);
        }
        Command::Important => {
            let important = agent.get_important(hours, allow_cache).await;
            if important.is_empty() {
                println!("No important emails in the last {hours} hours.");
            }
            for record in &important {
                print_record(record);
            }
        }
        Command::Analyze => {
            for record in agent.get_important(hours, allow_cache).await {
                println!("# {}", record.message.subject);
                println!();
                println!("{}", agent.analyze_email(&record).await);
                println!();
            }
        }
        Command::All => {}
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = MailAgentConfig::from_env().map_err(Error::from)?;

    info!(
        model = %config.model,
        ollama = %config.ollama_host,
        hours = cli.hours,
        allow_cache = !cli.no_cache,
        "Starting mail digest"
    );
    if config.gmail_token.is_none() {
        info!("GMAIL_ACCESS_TOKEN not set, only cached mail is available");
    }

    let agent = build_agent(&config)?;
    let command = cli.command.unwrap_or(Command::All);
    let steps = match command {
        Command::All => vec![Command::Digest, Command::Summary, Command::Important],
        single => vec![single],
    };
    for step in steps {
        run_step(&agent, step, cli.hours, !cli.no_cache).await;
    }
    Ok(())
}
