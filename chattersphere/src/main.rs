//! `ChatterSphere`: a simulated group chat in the terminal.
//!
//! Plain lines are sent as messages; lines starting with `/` are commands.
//! The terminal hands over whole lines, so each line counts as one
//! keystroke for the typing indicator before it is sent. `/typing` marks
//! the participant as composing without sending anything.
//! Configuration via CLI flags, environment variables, or config file
//! (`~/.config/chattersphere/config.toml`).
//!
//! ```bash
//! cargo run --bin chattersphere -- --name dana
//!
//! # Reproducible replies
//! cargo run --bin chattersphere -- --name dana --seed 7
//! ```

use std::io;
use std::path::{Path, PathBuf};

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_appender::non_blocking::WorkerGuard;

use chattersphere::chat::search::SearchView;
use chattersphere::chat::{ChatEvent, ChatSession};
use chattersphere::config::{CliArgs, ClientConfig, UiConfig};
use chattersphere::format::{format_clock, format_relative};
use chattersphere_proto::message::{Message, MessageId, Timestamp};
use chattersphere_proto::presence::{Participant, PresenceStatus};
use chattersphere_proto::reaction::{QUICK_REACTIONS, Reactions};

const HELP: &str = "\
commands:
  /react <id> <emoji>   toggle a reaction
  /search [query]       list matching messages (no query lists all)
  /attach <path>        share a file
  /typing               show as typing until idle
  /status <status>      online, away, busy or invisible
  /export [dir]         write the history as JSON
  /who                  list participants
  /reset                clear the chat
  /switch <name>        start over under another name
  /quit                 leave";

type Lines = tokio::io::Lines<BufReader<tokio::io::Stdin>>;

#[tokio::main]
async fn main() -> io::Result<()> {
    let cli = CliArgs::parse();

    let config = match ClientConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Warning: failed to load config file: {e}");
            ClientConfig::default()
        }
    };

    // Logs go to a file so they never interleave with the chat.
    let _log_guard = init_logging(&cli.log_level, cli.log_file.as_deref());

    tracing::info!("chattersphere starting");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let Some(participant) = login(&config, &mut lines).await? else {
        return Ok(());
    };

    let (session, events) = match ChatSession::new(participant, config.session.clone()) {
        Ok(pair) => pair,
        Err(e) => {
            eprintln!("error: {e}");
            return Ok(());
        }
    };

    for message in session.messages() {
        print_message(&message, &config.ui);
    }
    println!("type /help for commands");

    let result = run_repl(&session, events, lines, &config.ui).await;

    tracing::info!("chattersphere exiting");
    result
}

/// Initialize file-based tracing.
///
/// Returns a guard that must be held for the lifetime of the application
/// to ensure logs are flushed.
fn init_logging(level: &str, file_path: Option<&Path>) -> Option<WorkerGuard> {
    let default_path = std::env::temp_dir().join("chattersphere.log");
    let log_path = file_path.unwrap_or(&default_path);

    let log_dir = log_path.parent()?;
    let file_name = log_path.file_name()?.to_str()?;

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(env_filter)
        .with_ansi(false)
        .init();

    Some(guard)
}

/// Resolves the local participant from config, asking on stdin until a
/// valid name is given. `None` means stdin closed.
async fn login(config: &ClientConfig, lines: &mut Lines) -> io::Result<Option<Participant>> {
    let mut candidate = config.name.clone();
    loop {
        let name = match candidate.take() {
            Some(name) => name,
            None => {
                println!("enter your name:");
                match lines.next_line().await? {
                    Some(line) => line,
                    None => return Ok(None),
                }
            }
        };
        match Participant::new(&name) {
            Ok(p) => {
                let p = match &config.avatar {
                    Some(avatar) => p.with_avatar(avatar.clone()),
                    None => p,
                };
                return Ok(Some(p));
            }
            Err(e) => println!("{e}"),
        }
    }
}

/// Whether the REPL keeps running after a command.
#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

async fn run_repl(
    session: &ChatSession,
    mut events: mpsc::Receiver<ChatEvent>,
    mut lines: Lines,
    ui: &UiConfig,
) -> io::Result<()> {
    let mut search = SearchView::new();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if handle_line(session, &mut search, &line).await == Flow::Quit {
                    break;
                }
            }
            Some(event) = events.recv() => print_event(&event, ui),
        }
    }
    Ok(())
}

async fn handle_line(session: &ChatSession, search: &mut SearchView, line: &str) -> Flow {
    let Some(command) = line.strip_prefix('/') else {
        if !line.trim().is_empty() {
            session.keystroke();
        }
        if let Err(e) = session.send(line) {
            println!("not sent: {e}");
        }
        return Flow::Continue;
    };

    let (name, arg) = command
        .split_once(char::is_whitespace)
        .map_or((command, ""), |(n, a)| (n, a.trim()));

    match name {
        "quit" | "q" => return Flow::Quit,
        "help" => println!("{HELP}"),
        "typing" => session.keystroke(),
        "react" => react(session, arg),
        "search" => {
            search.set_query(arg);
            let now = Timestamp::now();
            session.with_log(|log| {
                let results = search.results(log);
                println!("{} match(es)", results.len());
                for message in results {
                    println!(
                        "  #{} {} {}: {}",
                        message.id,
                        format_relative(message.created_at, now),
                        message.sender,
                        message.text
                    );
                }
            });
        }
        "attach" => {
            if arg.is_empty() {
                println!("usage: /attach <path>");
            } else if let Err(e) = session.attach_file(Path::new(arg)).await {
                println!("not attached: {e}");
            }
        }
        "status" => match arg.parse::<PresenceStatus>() {
            Ok(status) => {
                session.set_status(status);
                println!("status: {status}");
            }
            Err(e) => println!("{e}"),
        },
        "export" => {
            let dir = if arg.is_empty() {
                PathBuf::from(".")
            } else {
                PathBuf::from(arg)
            };
            match session.write_export(&dir).await {
                Ok(path) => println!("exported to {}", path.display()),
                Err(e) => println!("export failed: {e}"),
            }
        }
        "who" => {
            let participant = session.participant();
            for (i, name) in session.roster().iter().enumerate() {
                if i == 0 {
                    println!("  {} {name} ({})", participant.avatar(), participant.status());
                } else {
                    println!("  {name}");
                }
            }
        }
        "reset" => {
            session.reset();
        }
        "switch" => match Participant::new(arg) {
            Ok(p) => {
                let p = p.with_avatar(session.participant().avatar().to_string());
                if let Err(e) = session.switch_participant(p) {
                    println!("{e}");
                }
            }
            Err(e) => println!("{e}"),
        },
        other => println!("unknown command /{other}, try /help"),
    }
    Flow::Continue
}

fn react(session: &ChatSession, arg: &str) {
    let mut parts = arg.split_whitespace();
    let id = parts.next().and_then(|s| s.parse::<MessageId>().ok());
    let emoji = parts.next();
    match (id, emoji) {
        (Some(id), Some(emoji)) => {
            if !session.react(id, emoji) {
                println!("no message #{id}");
            }
        }
        _ => println!("usage: /react <id> <emoji>  (try {})", QUICK_REACTIONS.join(" ")),
    }
}

fn print_message(message: &Message, ui: &UiConfig) {
    let time = format_clock(message.created_at, &ui.timestamp_format);
    let avatar = message.avatar.as_deref().unwrap_or(" ");
    let status = if message.is_user() {
        format!(" {}", message.status.symbol())
    } else {
        String::new()
    };
    println!(
        "[{time}] #{} {avatar} {}: {}{status}",
        message.id, message.sender, message.text
    );
}

fn print_event(event: &ChatEvent, ui: &UiConfig) {
    match event {
        ChatEvent::MessageAppended(message) => print_message(message, ui),
        ChatEvent::StatusChanged { message_id, status } => {
            println!("  #{message_id} {}", status.symbol());
        }
        ChatEvent::ReactionsChanged {
            message_id,
            reactions,
        } => println!("  #{message_id} {}", render_reactions(reactions)),
        ChatEvent::Notification { .. } => {
            if ui.sound_enabled {
                print!("\x07");
            }
        }
        ChatEvent::SessionReset { welcome } => {
            println!("--- chat cleared ---");
            print_message(welcome, ui);
        }
        ChatEvent::TypingChanged { is_active: true } => println!("  typing..."),
        ChatEvent::TypingChanged { is_active: false } => println!("  stopped typing"),
    }
}

fn render_reactions(reactions: &Reactions) -> String {
    if reactions.is_empty() {
        return "(no reactions)".to_string();
    }
    reactions
        .iter()
        .map(|(emoji, actors)| format!("{emoji} {}", actors.len()))
        .collect::<Vec<_>>()
        .join("  ")
}
