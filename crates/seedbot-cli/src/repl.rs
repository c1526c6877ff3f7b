//! Interactive chat loop and slash commands.

use anyhow::Result;
use seedbot_config::SeedbotConfig;
use seedbot_core::{ConversationalAgent, prompts};
use seedbot_types::{Role, truncate_str};
use std::future::Future;
use std::io::{self, BufRead, Write};
use tokio::sync::mpsc;

use crate::{REPLY_PREFIX, ask, new_session_id};

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Command {
    Help,
    History,
    Sessions,
    New,
    Switch(String),
    Config,
    Quit,
    Usage(&'static str),
    Unknown(String),
}

/// Parse a slash command. Returns `None` for ordinary chat input.
pub(crate) fn parse_command(input: &str) -> Option<Command> {
    if !input.starts_with('/') {
        return None;
    }

    let (cmd, args) = match input.split_once(' ') {
        Some((c, a)) => (c, Some(a.trim()).filter(|a| !a.is_empty())),
        None => (input, None),
    };

    Some(match cmd {
        "/help" => Command::Help,
        "/history" => Command::History,
        "/sessions" => Command::Sessions,
        "/new" | "/clear" => Command::New,
        "/switch" => match args {
            Some(id) => Command::Switch(id.to_string()),
            None => Command::Usage("/switch <session-id>"),
        },
        "/config" => Command::Config,
        "/quit" | "/exit" => Command::Quit,
        _ => Command::Unknown(cmd.to_string()),
    })
}

/// Resolve `arg` against known session ids: an exact match wins, then a
/// unique prefix. Anything else names a new session.
pub(crate) fn resolve_session<'a>(ids: impl IntoIterator<Item = &'a str>, arg: &str) -> String {
    let mut prefixed = Vec::new();
    for id in ids {
        if id == arg {
            return id.to_string();
        }
        if id.starts_with(arg) {
            prefixed.push(id);
        }
    }
    match prefixed.as_slice() {
        [only] => only.to_string(),
        _ => arg.to_string(),
    }
}

/// What the prompt produced.
#[derive(Debug)]
pub(crate) enum Input {
    Line(String),
    Eof,
    Interrupted,
}

/// Read lines from `reader` on a background thread.
///
/// The channel closes at end of input. The thread is detached; a read still
/// pending at exit is abandoned.
pub(crate) fn spawn_line_reader<R>(mut reader: R) -> mpsc::UnboundedReceiver<io::Result<String>>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        loop {
            let mut line = String::new();
            match reader.read_line(&mut line) {
                Ok(0) => break,
                Ok(_) => {
                    if tx.send(Ok(line)).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    let _ = tx.send(Err(e));
                    break;
                }
            }
        }
    });
    rx
}

/// Wait for the next line, or for `interrupt` to fire first.
pub(crate) async fn next_input(
    lines: &mut mpsc::UnboundedReceiver<io::Result<String>>,
    interrupt: impl Future<Output = ()>,
) -> io::Result<Input> {
    tokio::select! {
        line = lines.recv() => match line {
            Some(line) => Ok(Input::Line(line?)),
            None => Ok(Input::Eof),
        },
        _ = interrupt => Ok(Input::Interrupted),
    }
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}

pub(crate) async fn run(
    agent: &ConversationalAgent,
    config: &SeedbotConfig,
    mut session_id: String,
) -> Result<()> {
    let kb = config.knowledge.base;
    eprintln!(
        "seedbot v{} (model: {}, knowledge base: {}, session: {})",
        env!("CARGO_PKG_VERSION"),
        config.model,
        kb,
        truncate_str(&session_id, 8)
    );
    eprintln!("📝 About me: {}", prompts::about(kb));
    eprintln!("Type your message, /help for commands. Press Ctrl+D or Ctrl+C to exit.\n");
    println!("{REPLY_PREFIX} {}\n", prompts::WELCOME_MESSAGE);

    let mut lines = spawn_line_reader(io::BufReader::new(io::stdin()));
    loop {
        eprint!("> ");
        io::stderr().flush()?;

        let input = match next_input(&mut lines, ctrl_c()).await? {
            Input::Line(line) => line,
            Input::Eof | Input::Interrupted => {
                eprintln!();
                break;
            }
        };

        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        if let Some(command) = parse_command(input) {
            match command {
                Command::Quit => break,
                Command::Help => print_help(),
                Command::History => print_history(agent, &session_id).await,
                Command::Sessions => print_sessions(agent, &session_id).await,
                Command::New => {
                    session_id = new_session_id();
                    eprintln!("Started new session {}", truncate_str(&session_id, 8));
                }
                Command::Switch(arg) => {
                    let summaries = agent.history().summaries().await;
                    session_id = resolve_session(summaries.iter().map(|s| s.id.as_str()), &arg);
                    let turns = agent.history().snapshot(&session_id).await.len();
                    eprintln!("Switched to session {session_id} ({turns} messages)");
                }
                Command::Config => print_config(agent, config),
                Command::Usage(usage) => eprintln!("Usage: {usage}"),
                Command::Unknown(cmd) => {
                    eprintln!("Unknown command: {cmd}. Type /help for available commands.")
                }
            }
            continue;
        }

        match ask(agent, &session_id, input).await {
            Ok(reply) => println!("{REPLY_PREFIX} {reply}\n"),
            Err(seedbot_types::SeedbotError::Cancelled) => println!(),
            Err(e) => eprintln!("Error: {e}\n"),
        }
    }

    Ok(())
}

async fn print_history(agent: &ConversationalAgent, session_id: &str) {
    let turns = agent.history().snapshot(session_id).await;
    if turns.is_empty() {
        eprintln!("No messages in this session yet.");
        return;
    }
    for turn in &turns {
        let speaker = match turn.role {
            Role::User => "You:",
            Role::Assistant => REPLY_PREFIX,
        };
        eprintln!(
            "[{}] {speaker} {}",
            turn.created_at.format("%H:%M:%S"),
            turn.content
        );
    }
}

async fn print_sessions(agent: &ConversationalAgent, current: &str) {
    let summaries = agent.history().summaries().await;
    if summaries.is_empty() {
        eprintln!("No sessions yet.");
        return;
    }
    eprintln!("Sessions:");
    for s in &summaries {
        let marker = if s.id == current { "*" } else { " " };
        eprintln!(
            "{marker} {} {:>8}  {:>3} msgs  {}",
            s.short_id(),
            s.age(),
            s.turn_count,
            if s.preview.is_empty() {
                "(empty)"
            } else {
                s.preview.as_str()
            }
        );
    }
}

fn print_config(agent: &ConversationalAgent, config: &SeedbotConfig) {
    let agent_config = agent.config();
    let knowledge = &config.knowledge;
    eprintln!("Model:          {}", agent_config.model);
    match agent_config.temperature {
        Some(t) => eprintln!("Temperature:    {t}"),
        None => eprintln!("Temperature:    (provider default)"),
    }
    eprintln!("Knowledge base: {}", knowledge.base);
    for def in agent.registry().definitions() {
        eprintln!("Tool:           {}", def.name);
    }
    eprintln!("Top-k:          {}", knowledge.top_k);
    eprintln!("Max tool loops: {}", agent_config.max_tool_iterations);
    eprintln!("Timeout:        {}s", agent_config.request_timeout.as_secs());
    eprintln!("Config dir:     {}", config.config_dir.display());
}

fn print_help() {
    eprintln!("Available commands:");
    eprintln!("  /help          Show this help");
    eprintln!("  /history       Show this session's messages");
    eprintln!("  /sessions      List sessions in this process");
    eprintln!("  /new           Start a new session");
    eprintln!("  /switch <id>   Switch to a session by ID or prefix");
    eprintln!("  /config        Show model and knowledge base settings");
    eprintln!("  /quit          Exit (or Ctrl+D / Ctrl+C at the prompt)");
    eprintln!();
    eprintln!("Press Ctrl+C while Seedbot is answering to cancel the reply.");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_not_a_command() {
        assert_eq!(parse_command("What is Seedworld?"), None);
    }

    #[test]
    fn parses_simple_commands() {
        assert_eq!(parse_command("/help"), Some(Command::Help));
        assert_eq!(parse_command("/history"), Some(Command::History));
        assert_eq!(parse_command("/sessions"), Some(Command::Sessions));
        assert_eq!(parse_command("/new"), Some(Command::New));
        assert_eq!(parse_command("/config"), Some(Command::Config));
        assert_eq!(parse_command("/quit"), Some(Command::Quit));
        assert_eq!(parse_command("/exit"), Some(Command::Quit));
    }

    #[test]
    fn switch_requires_an_id() {
        assert_eq!(
            parse_command("/switch  abc123 "),
            Some(Command::Switch("abc123".into()))
        );
        assert_eq!(
            parse_command("/switch"),
            Some(Command::Usage("/switch <session-id>"))
        );
        assert_eq!(
            parse_command("/switch   "),
            Some(Command::Usage("/switch <session-id>"))
        );
    }

    #[test]
    fn unknown_command_is_reported() {
        assert_eq!(
            parse_command("/plot sales"),
            Some(Command::Unknown("/plot".into()))
        );
    }

    #[tokio::test]
    async fn line_reader_yields_lines_then_eof() {
        let mut lines = spawn_line_reader(io::Cursor::new("hello\n/quit\n"));
        let pending = std::future::pending::<()>;

        match next_input(&mut lines, pending()).await.unwrap() {
            Input::Line(line) => assert_eq!(line, "hello\n"),
            other => panic!("expected a line, got {other:?}"),
        }
        match next_input(&mut lines, pending()).await.unwrap() {
            Input::Line(line) => assert_eq!(line, "/quit\n"),
            other => panic!("expected a line, got {other:?}"),
        }
        assert!(matches!(
            next_input(&mut lines, pending()).await.unwrap(),
            Input::Eof
        ));
    }

    #[tokio::test]
    async fn interrupt_at_idle_prompt_ends_input() {
        // No line ever arrives; the interrupt must win.
        let (_tx, mut lines) = mpsc::unbounded_channel::<io::Result<String>>();
        let input = next_input(&mut lines, std::future::ready(())).await.unwrap();
        assert!(matches!(input, Input::Interrupted));
    }

    #[test]
    fn resolve_prefers_exact_then_unique_prefix() {
        let ids = ["abc12345-1", "abc12345", "def67890"];
        assert_eq!(resolve_session(ids, "abc12345"), "abc12345");
        assert_eq!(resolve_session(ids, "def"), "def67890");
        // Ambiguous prefix names a new session.
        assert_eq!(resolve_session(["abc1", "abc2"], "abc"), "abc");
        assert_eq!(resolve_session([], "fresh"), "fresh");
    }
}
