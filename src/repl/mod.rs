//! Interactive chat loop.
//!
//! The loop consumes [`LoopEvent`]s from a channel rather than reading stdin
//! directly. A reader thread ([`spawn_stdin_reader`]) and the Ctrl-C handler
//! ([`install_interrupt_handler`]) both feed the same channel, so an
//! interrupt during a blocking read still ends the loop through the normal
//! shutdown path.

use crate::models::Mode;
use crate::services::{Session, SessionSummary, format_uptime};
use crate::{Error, Result};
use std::io::{self, BufRead, Write};
use std::sync::mpsc::{Receiver, Sender};
use std::thread::JoinHandle;

/// Prompt written before each read.
pub const PROMPT: &str = "You> ";

/// Label for ordinary replies.
pub const REPLY_LABEL: &str = "Bot> ";

/// Label for replies to `chat` lines.
pub const CHAT_LABEL: &str = "Rosie> ";

/// Input events consumed by the loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopEvent {
    /// A line of user input, without its line terminator.
    Line(String),
    /// Ctrl-C.
    Interrupt,
    /// Input closed.
    Eof,
}

/// What a line of input asks for.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// `exit` or `quit`.
    Exit,
    /// `mode <value>`.
    SetMode(String),
    /// `chat <text>`, answered under the bot's chat label.
    Chat(String),
    /// `score <number> <text>`.
    Score {
        /// Rating recorded with the exchange.
        score: f64,
        /// Conversational text.
        text: String,
    },
    /// Anything else.
    Say(String),
}

/// Classifies a line of input.
///
/// Keywords are case-insensitive and must start the line, followed by a
/// space. `mode ` with nothing after it asks for an empty mode. A `score`
/// line whose number does not parse or that has no text is ordinary
/// conversation, which is passed on trimmed.
#[must_use]
pub fn classify(line: &str) -> Command {
    let trimmed = line.trim();
    let lower = trimmed.to_lowercase();

    if lower == "exit" || lower == "quit" {
        return Command::Exit;
    }
    if let Some(value) = strip_keyword(line, "mode") {
        return Command::SetMode(value.to_string());
    }
    if let Some(text) = strip_keyword(line, "chat") {
        return Command::Chat(text.to_string());
    }
    if let Some(rest) = strip_keyword(line, "score") {
        let (number, text) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
        let text = text.trim();
        if let Ok(score) = number.parse::<f64>() {
            if score.is_finite() && !text.is_empty() {
                return Command::Score {
                    score,
                    text: text.to_string(),
                };
            }
        }
    }
    Command::Say(trimmed.to_string())
}

/// Returns the remainder after `keyword` and a space, matched case-insensitively.
fn strip_keyword<'a>(line: &'a str, keyword: &str) -> Option<&'a str> {
    let head = line.get(..=keyword.len())?;
    let (word, space) = head.split_at(keyword.len());
    if word.eq_ignore_ascii_case(keyword) && space == " " {
        line.get(keyword.len() + 1..).map(str::trim)
    } else {
        None
    }
}

/// Runs the chat loop until exit, interrupt, end of input or a fatal error.
///
/// The session is closed and the shutdown notice written on every path.
///
/// # Errors
///
/// Returns the fatal pipeline error that ended the loop, an error from the
/// final memory flush, or an error writing to `out`.
pub fn run(
    mut session: Session,
    events: &Receiver<LoopEvent>,
    out: &mut impl Write,
) -> Result<SessionSummary> {
    let outcome = converse(&mut session, events, out);

    let uptime = session.uptime();
    let closed = session.close();
    write_line(out, &format!("[aiml] Shutting down. Uptime: {}", format_uptime(uptime)))?;

    outcome?;
    closed
}

fn converse(
    session: &mut Session,
    events: &Receiver<LoopEvent>,
    out: &mut impl Write,
) -> Result<()> {
    write_line(
        out,
        &format!("[{}] Ready to chat. Type 'exit' to quit.", session.name()),
    )?;

    loop {
        write!(out, "{PROMPT}")
            .and_then(|()| out.flush())
            .map_err(write_error)?;

        let line = match events.recv() {
            Ok(LoopEvent::Line(line)) => line,
            Ok(LoopEvent::Interrupt) => {
                tracing::debug!("Interrupted");
                write_line(out, "")?;
                return Ok(());
            },
            Ok(LoopEvent::Eof) | Err(_) => {
                write_line(out, "")?;
                return Ok(());
            },
        };

        match classify(&line) {
            Command::Exit => return Ok(()),
            Command::SetMode(value) => match session.set_mode(&value) {
                Ok(mode) => write_line(out, &format!("[settings] Mode set to {mode}"))?,
                Err(Error::InvalidInput(_)) => write_line(
                    out,
                    &format!(
                        "[settings] Unknown mode '{value}'. Valid modes: {}",
                        Mode::names()
                    ),
                )?,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to save settings");
                    write_line(out, &format!("[settings] Could not save mode: {e}"))?;
                },
            },
            Command::Chat(text) => {
                let reply = session.listen(&text, None)?;
                write_line(out, &format!("{CHAT_LABEL}{reply}"))?;
            },
            Command::Score { score, text } => {
                let reply = session.listen(&text, Some(score))?;
                write_line(out, &format!("{REPLY_LABEL}{reply}"))?;
            },
            Command::Say(text) => {
                let reply = session.listen(&text, None)?;
                write_line(out, &format!("{REPLY_LABEL}{reply}"))?;
            },
        }
    }
}

fn write_line(out: &mut impl Write, line: &str) -> Result<()> {
    writeln!(out, "{line}").map_err(write_error)
}

#[allow(clippy::needless_pass_by_value)]
fn write_error(e: io::Error) -> Error {
    Error::OperationFailed {
        operation: "write_output".to_string(),
        cause: e.to_string(),
    }
}

/// Forwards lines from `input` until it closes, then sends [`LoopEvent::Eof`].
///
/// Stops early when the receiving side hangs up.
pub fn forward_lines(input: impl BufRead, tx: &Sender<LoopEvent>) {
    for line in input.lines() {
        match line {
            Ok(line) => {
                if tx.send(LoopEvent::Line(line)).is_err() {
                    return;
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read input");
                break;
            },
        }
    }
    let _ = tx.send(LoopEvent::Eof);
}

/// Starts a thread forwarding stdin lines to `tx`.
#[must_use]
pub fn spawn_stdin_reader(tx: Sender<LoopEvent>) -> JoinHandle<()> {
    std::thread::spawn(move || forward_lines(io::stdin().lock(), &tx))
}

/// Routes Ctrl-C to `tx` as [`LoopEvent::Interrupt`].
///
/// # Errors
///
/// Returns an error if a handler is already installed.
pub fn install_interrupt_handler(tx: Sender<LoopEvent>) -> Result<()> {
    ctrlc::set_handler(move || {
        let _ = tx.send(LoopEvent::Interrupt);
    })
    .map_err(|e| Error::OperationFailed {
        operation: "install_interrupt_handler".to_string(),
        cause: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BotConfig;
    use crate::engine::AimlKernel;
    use crate::services::PassthroughCorrector;
    use std::fs;
    use std::io::Cursor;
    use std::sync::mpsc;
    use tempfile::TempDir;
    use test_case::test_case;

    fn session_in(dir: &TempDir) -> (BotConfig, Session) {
        let rules = dir.path().join("Achat");
        fs::create_dir_all(&rules).unwrap();
        fs::write(
            rules.join("hello.aiml"),
            "<aiml><category><pattern>HELLO</pattern><template>Hi there!</template></category></aiml>",
        )
        .unwrap();
        let config = BotConfig::default().with_data_dir(dir.path());
        let session =
            Session::open(&config, Box::new(AimlKernel::new()), Box::new(PassthroughCorrector));
        (config, session)
    }

    fn run_with(events: Vec<LoopEvent>, dir: &TempDir) -> (Result<SessionSummary>, String) {
        let (_, session) = session_in(dir);
        let (tx, rx) = mpsc::channel();
        for event in events {
            tx.send(event).unwrap();
        }
        drop(tx);
        let mut out = Vec::new();
        let result = run(session, &rx, &mut out);
        (result, String::from_utf8(out).unwrap())
    }

    fn line(text: &str) -> LoopEvent {
        LoopEvent::Line(text.to_string())
    }

    #[test_case("exit" ; "lowercase exit")]
    #[test_case("  QUIT  " ; "padded uppercase quit")]
    #[test_case("Exit" ; "title case exit")]
    fn test_classify_exit(input: &str) {
        assert_eq!(classify(input), Command::Exit);
    }

    #[test_case("mode mediation", "mediation" ; "lowercase")]
    #[test_case("MODE  Arbitration ", "Arbitration" ; "uppercase keyword")]
    #[test_case("mode zen", "zen" ; "unknown value")]
    #[test_case("mode ", "" ; "trailing space only")]
    #[test_case("Mode   ", "" ; "several trailing spaces")]
    fn test_classify_mode(input: &str, value: &str) {
        assert_eq!(classify(input), Command::SetMode(value.to_string()));
    }

    #[test]
    fn test_classify_score() {
        assert_eq!(
            classify("score 4.5 hello there"),
            Command::Score {
                score: 4.5,
                text: "hello there".to_string()
            }
        );
        assert_eq!(
            classify("score high hello"),
            Command::Say("score high hello".to_string())
        );
        assert_eq!(classify("score 3"), Command::Say("score 3".to_string()));
    }

    #[test]
    fn test_classify_conversation() {
        assert_eq!(classify(" hello "), Command::Say("hello".to_string()));
        assert_eq!(classify("exiting"), Command::Say("exiting".to_string()));
        assert_eq!(classify("model trains"), Command::Say("model trains".to_string()));
        assert_eq!(classify("mode"), Command::Say("mode".to_string()));
        assert_eq!(classify(" mode zen"), Command::Say("mode zen".to_string()));
        assert_eq!(classify("chatter"), Command::Say("chatter".to_string()));
    }

    #[test_case("chat hello", "hello" ; "lowercase")]
    #[test_case("CHAT  hello there ", "hello there" ; "uppercase padded")]
    #[test_case("chat ", "" ; "empty text")]
    fn test_classify_chat(input: &str, text: &str) {
        assert_eq!(classify(input), Command::Chat(text.to_string()));
    }

    #[test]
    fn test_chat_line_uses_chat_label() {
        let dir = TempDir::new().unwrap();
        let (result, output) = run_with(vec![line("chat hello"), line("hello")], &dir);

        assert_eq!(result.unwrap().exchanges, 2);
        assert!(output.contains("You> Rosie> Hi there!\n"));
        assert!(output.contains("You> Bot> Hi there!\n"));
    }

    #[test]
    fn test_empty_mode_lists_valid_modes() {
        let dir = TempDir::new().unwrap();
        let (result, output) = run_with(vec![line("mode ")], &dir);

        assert_eq!(result.unwrap().exchanges, 0);
        assert!(output.contains("[settings] Unknown mode ''. Valid modes: harmony"));
    }

    #[test]
    fn test_conversation_and_exit() {
        let dir = TempDir::new().unwrap();
        let (result, output) = run_with(vec![line("hello"), line("exit"), line("ignored")], &dir);

        let summary = result.unwrap();
        assert_eq!(summary.exchanges, 1);
        assert!(output.starts_with("[Alice] Ready to chat. Type 'exit' to quit.\n"));
        assert!(output.contains("You> Bot> Hi there!\n"));
        assert!(output.contains("[aiml] Shutting down. Uptime: 0:00:"));
        assert!(!output.contains("ignored"));
    }

    #[test]
    fn test_mode_commands() {
        let dir = TempDir::new().unwrap();
        let (result, output) = run_with(
            vec![line("mode fight-abating"), line("mode zen"), line("hello")],
            &dir,
        );

        result.unwrap();
        assert!(output.contains("[settings] Mode set to fight-abating"));
        assert!(output.contains(
            "[settings] Unknown mode 'zen'. Valid modes: harmony, mediation, arbitration, fight-abating"
        ));
        assert!(output.contains("Bot> Let's remain calm: Hi there!"));
    }

    #[test]
    fn test_interrupt_runs_shutdown_and_persists() {
        let dir = TempDir::new().unwrap();
        let config = BotConfig::default().with_data_dir(dir.path());
        let (result, output) = run_with(vec![line("hello"), LoopEvent::Interrupt], &dir);

        assert_eq!(result.unwrap().exchanges, 1);
        assert!(output.contains("[aiml] Shutting down."));
        assert!(config.memory_file.exists());
    }

    #[test]
    fn test_closed_channel_is_eof() {
        let dir = TempDir::new().unwrap();
        let (result, output) = run_with(Vec::new(), &dir);

        assert_eq!(result.unwrap().exchanges, 0);
        assert!(output.contains("[aiml] Shutting down."));
    }

    #[test]
    fn test_score_line_records_score() {
        let dir = TempDir::new().unwrap();
        let config = BotConfig::default().with_data_dir(dir.path());
        let (result, _) = run_with(vec![line("score 2.5 hello"), line("quit")], &dir);
        result.unwrap();

        let memory: crate::models::SessionMemory =
            serde_json::from_str(&fs::read_to_string(config.memory_file).unwrap()).unwrap();
        assert_eq!(memory.scores, vec![2.5]);
        assert_eq!(memory.log[0].input, "hello");
    }

    #[test]
    fn test_forward_lines_ends_with_eof() {
        let (tx, rx) = mpsc::channel();
        forward_lines(Cursor::new("one\r\ntwo\n"), &tx);

        assert_eq!(rx.recv().unwrap(), line("one"));
        assert_eq!(rx.recv().unwrap(), line("two"));
        assert_eq!(rx.recv().unwrap(), LoopEvent::Eof);
    }
}
