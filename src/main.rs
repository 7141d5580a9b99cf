mod ai;
mod command;
mod config;
mod constants;
mod credentials;
mod mail;

use anyhow::{Context, Result};
use std::env;
use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::ai::{ChatContext, LlmError, LlmService, OpenRouterClient};
use crate::command::{Input, ParsedCommand, available_commands, parse_command};
use crate::config::Config;
use crate::credentials::CredentialStore;

/// Exit code for "try again later" (sysexits EX_TEMPFAIL)
const EXIT_UNAVAILABLE: i32 = 75;

fn setup_logging() {
    use std::fs::OpenOptions;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,mailagent=debug"));

    // Try to create a log file in the config directory
    let log_file = Config::config_dir()
        .ok()
        .and_then(|dir| fs::create_dir_all(&dir).ok().map(|_| dir))
        .map(|dir| dir.join("mailagent.log"))
        .and_then(|path| {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .ok()
        });

    if let Some(file) = log_file {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::sync::Mutex::new(file))
                    .with_ansi(false),
            )
            .init();
    } else {
        // Fallback to stderr if file logging fails
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn print_usage() {
    eprintln!("mailagent - LLM email assistant\n\nUsage: mailagent <command>\n\nCommands:");
    for cmd in available_commands() {
        eprintln!("    {:<66} {}", cmd.name, cmd.description);
    }
    eprintln!(
        "\nConfiguration file: ~/.config/mailagent/config.toml\n\
         API key: MAILAGENT_API_KEY or OPENAI_API_KEY, the system keyring, or 'mailagent setup'"
    );
}

fn read_input(input: &Input) -> Result<String> {
    match input {
        Input::Stdin => {
            let mut content = String::new();
            io::stdin()
                .read_to_string(&mut content)
                .context("Failed to read email from stdin")?;
            Ok(content)
        }
        Input::File(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read email file: {}", path.display())),
    }
}

fn read_context(path: &Path) -> Result<serde_json::Map<String, serde_json::Value>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read context file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Context file must hold a JSON object: {}", path.display()))
}

fn build_service(config: &Config) -> Result<LlmService<OpenRouterClient>> {
    let (api_key, source) = CredentialStore::new().api_key(config.llm.api_key.as_deref())?;
    tracing::debug!("Using API key from {:?}", source);

    let client = OpenRouterClient::new(
        api_key,
        &config.llm.base_url,
        config.llm.model.clone(),
        config.llm.timeout(),
    )?;
    tracing::info!("Using model {}", client.model());

    Ok(LlmService::new(client, config.llm.retry()))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("Failed to serialize output")?
    );
    Ok(())
}

async fn run_chat(
    service: &LlmService<OpenRouterClient>,
    message: &str,
    inbox: Option<&Path>,
    select: Option<&str>,
    pending: Option<usize>,
) -> Result<()> {
    let mut context = ChatContext {
        pending_tasks: pending,
        ..Default::default()
    };

    if let Some(path) = inbox {
        let emails = mail::load_inbox(path)?;
        context.inbox_count = Some(emails.len());
        if context.pending_tasks.is_none() {
            context.pending_tasks = Some(mail::pending_task_count(&emails));
        }
        if let Some(id) = select {
            let email = emails
                .iter()
                .find(|e| e.id == id)
                .with_context(|| format!("No email with id {} in {}", id, path.display()))?;
            context.selected_email = Some(email.as_selected());
        }
    }

    let reply = service.chat(message, &context).await?;
    println!("{}", reply);
    Ok(())
}

async fn run_process(
    service: &LlmService<OpenRouterClient>,
    config: &Config,
    path: &Path,
) -> Result<()> {
    let mut emails = mail::load_inbox(path)?;
    let results = mail::process_unprocessed(
        service,
        &mut emails,
        &config.prompts.categorization,
        &config.prompts.action_items,
    )
    .await;

    let total = results.len();
    let mut processed = Vec::new();
    for (id, outcome) in results {
        match outcome {
            Ok(email) => processed.push(email),
            Err(e) => eprintln!("Skipped {}: {}", id, e),
        }
    }

    if !processed.is_empty() {
        mail::save_inbox(path, &emails)?;
    }

    tracing::info!("Processed {}/{} emails from {}", processed.len(), total, path.display());
    print_json(&processed)
}

fn run_setup() -> Result<()> {
    println!("mailagent Setup");
    println!("===============\n");

    print!("API key (OpenRouter or OpenAI-compatible): ");
    io::stdout().flush()?;
    let mut key = String::new();
    io::stdin().read_line(&mut key)?;
    let key = key.trim();
    if key.is_empty() {
        anyhow::bail!("No API key entered");
    }

    CredentialStore::new().set_api_key(key)?;
    println!("API key stored.");

    let config_path = Config::config_path()?;
    if config_path.exists() {
        println!("Keeping existing configuration at {}", config_path.display());
    } else {
        let config = Config::default();
        config.ensure_dirs()?;
        config.save()?;
        println!("Configuration saved to {}", config_path.display());
    }

    println!("\nSetup complete! Try 'mailagent classify <email-file>'.");
    Ok(())
}

async fn run(cmd: ParsedCommand) -> Result<()> {
    let config = match cmd {
        ParsedCommand::Help => {
            print_usage();
            return Ok(());
        }
        ParsedCommand::Setup => return run_setup(),
        _ => Config::load()?,
    };

    match cmd {
        ParsedCommand::Help | ParsedCommand::Setup => Ok(()),
        ParsedCommand::Prompts => {
            println!("# categorization\n{}\n", config.prompts.categorization);
            println!("# action_items\n{}\n", config.prompts.action_items);
            println!("# auto_reply\n{}", config.prompts.auto_reply);
            Ok(())
        }
        ParsedCommand::Classify(input) => {
            let content = read_input(&input)?;
            let service = build_service(&config)?;
            let category = service
                .classify(&content, &config.prompts.categorization)
                .await?;
            println!("{}", category);
            Ok(())
        }
        ParsedCommand::Extract(input) => {
            let content = read_input(&input)?;
            let service = build_service(&config)?;
            let items = service
                .extract_action_items(&content, &config.prompts.action_items)
                .await?;
            print_json(&items)
        }
        ParsedCommand::Draft { input, context } => {
            let content = read_input(&input)?;
            let context = context.as_deref().map(read_context).transpose()?;
            let service = build_service(&config)?;
            let draft = service
                .generate_draft(&content, &config.prompts.auto_reply, context.as_ref())
                .await?;
            print_json(&draft)
        }
        ParsedCommand::Chat {
            message,
            inbox,
            select,
            pending,
        } => {
            let service = build_service(&config)?;
            run_chat(
                &service,
                &message,
                inbox.as_deref(),
                select.as_deref(),
                pending,
            )
            .await
        }
        ParsedCommand::Process(path) => {
            let service = build_service(&config)?;
            run_process(&service, &config, &path).await
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();

    let cmd = match parse_command(&args) {
        Ok(cmd) => cmd,
        Err(msg) => {
            eprintln!("{}", msg);
            print_usage();
            std::process::exit(1);
        }
    };

    if !matches!(cmd, ParsedCommand::Help | ParsedCommand::Setup) {
        setup_logging();
    }

    match run(cmd).await {
        Ok(()) => Ok(()),
        Err(e) => match e.downcast_ref::<LlmError>() {
            Some(llm) if llm.is_unavailable() => {
                eprintln!(
                    "Model service temporarily unavailable, try again later: {}",
                    llm
                );
                std::process::exit(EXIT_UNAVAILABLE);
            }
            Some(llm) => {
                eprintln!("Request to the model failed: {}", llm);
                std::process::exit(1);
            }
            None => Err(e),
        },
    }
}
