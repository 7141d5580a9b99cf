//! Command line parsing

use std::path::PathBuf;

/// Help information for a command
#[derive(Debug, Clone)]
pub struct CommandHelp {
    pub name: &'static str,
    pub description: &'static str,
}

/// Where email text comes from: a file, or stdin for `-`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Stdin,
    File(PathBuf),
}

impl Input {
    fn from_arg(arg: &str) -> Self {
        if arg == "-" {
            Input::Stdin
        } else {
            Input::File(PathBuf::from(arg))
        }
    }
}

/// Parsed command from the process arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedCommand {
    Help,
    Setup,
    Prompts,
    Classify(Input),
    Extract(Input),
    Draft {
        input: Input,
        /// JSON object file with extra drafting context
        context: Option<PathBuf>,
    },
    Chat {
        message: String,
        inbox: Option<PathBuf>,
        select: Option<String>,
        pending: Option<usize>,
    },
    Process(PathBuf),
}

/// Parse the arguments after the program name
pub fn parse_command(args: &[String]) -> Result<ParsedCommand, String> {
    let Some((cmd, rest)) = args.split_first() else {
        return Ok(ParsedCommand::Help);
    };

    match cmd.as_str() {
        "help" | "--help" | "-h" => Ok(ParsedCommand::Help),
        "setup" => Ok(ParsedCommand::Setup),
        "prompts" => Ok(ParsedCommand::Prompts),
        "classify" => single_input(cmd, rest).map(ParsedCommand::Classify),
        "extract" => single_input(cmd, rest).map(ParsedCommand::Extract),
        "draft" => match rest {
            [input] => Ok(ParsedCommand::Draft {
                input: Input::from_arg(input),
                context: None,
            }),
            [input, flag, path] if flag == "--context" => Ok(ParsedCommand::Draft {
                input: Input::from_arg(input),
                context: Some(PathBuf::from(path)),
            }),
            _ => Err("usage: draft <email-file|-> [--context <file.json>]".to_string()),
        },
        "chat" => parse_chat(rest),
        "process" => match rest {
            [path] => Ok(ParsedCommand::Process(PathBuf::from(path))),
            _ => Err("usage: process <inbox.json>".to_string()),
        },
        other => Err(format!("Unknown command: {}", other)),
    }
}

fn single_input(cmd: &str, rest: &[String]) -> Result<Input, String> {
    match rest {
        [input] => Ok(Input::from_arg(input)),
        _ => Err(format!("usage: {} <email-file|->", cmd)),
    }
}

fn parse_chat(rest: &[String]) -> Result<ParsedCommand, String> {
    let mut inbox = None;
    let mut select = None;
    let mut pending = None;
    let mut words = Vec::new();

    let mut iter = rest.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--inbox" => {
                inbox = Some(PathBuf::from(flag_value(&mut iter, "--inbox")?));
            }
            "--select" => {
                select = Some(flag_value(&mut iter, "--select")?.to_string());
            }
            "--pending" => {
                let value = flag_value(&mut iter, "--pending")?;
                pending = Some(
                    value
                        .parse()
                        .map_err(|_| format!("--pending expects a number, got {}", value))?,
                );
            }
            word => words.push(word),
        }
    }

    if words.is_empty() {
        return Err(
            "usage: chat [--inbox <inbox.json>] [--select <email-id>] [--pending <n>] <message>"
                .to_string(),
        );
    }
    if select.is_some() && inbox.is_none() {
        return Err("--select requires --inbox".to_string());
    }

    Ok(ParsedCommand::Chat {
        message: words.join(" "),
        inbox,
        select,
        pending,
    })
}

fn flag_value<'a>(
    iter: &mut impl Iterator<Item = &'a String>,
    flag: &str,
) -> Result<&'a str, String> {
    iter.next()
        .map(String::as_str)
        .ok_or_else(|| format!("{} expects a value", flag))
}

/// Get all available commands for help display
pub fn available_commands() -> Vec<CommandHelp> {
    vec![
        CommandHelp {
            name: "classify <file|->",
            description: "Categorize an email (Important, Newsletter, Spam, To-Do)",
        },
        CommandHelp {
            name: "extract <file|->",
            description: "Extract action items as JSON",
        },
        CommandHelp {
            name: "draft <file|-> [--context <json>]",
            description: "Draft a reply",
        },
        CommandHelp {
            name: "chat [--inbox <json>] [--select <id>] [--pending <n>] <message>",
            description: "Ask the assistant about your inbox",
        },
        CommandHelp {
            name: "process <inbox.json>",
            description: "Classify and extract tasks for new emails, saving them to the inbox",
        },
        CommandHelp {
            name: "prompts",
            description: "Show the active prompt templates",
        },
        CommandHelp {
            name: "setup",
            description: "Store the API key and write a default config",
        },
        CommandHelp {
            name: "help",
            description: "Show this help message",
        },
    ]
}
