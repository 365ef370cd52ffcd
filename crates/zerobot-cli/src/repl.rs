//! REPL – interactive teleop shell for `zerobot drive`.
//!
//! Supported commands:
//!   w / a / s / d       – toggle forward / left / back / right
//!   press <direction>   – hold a direction
//!   release <direction> – let go of a direction
//!   stop                – release everything (sends a stop)
//!   status              – link state and held directions
//!   log                 – timestamped link message log
//!   help                – show this list
//!   quit | exit         – release everything and leave

use colored::Colorize;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::sync::{Arc, Mutex};

use zerobot_operator::{LinkState, OperatorHandle, SessionEvent, StatusUpdate, TransportSession};
use zerobot_types::Direction;

/// A parsed REPL line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeleopCommand {
    Toggle(Direction),
    Press(Direction),
    Release(Direction),
    Stop,
    Status,
    Log,
    Help,
    Quit,
}

impl TeleopCommand {
    pub fn parse(line: &str) -> Result<Self, String> {
        let mut words = line.split_whitespace();
        let verb = words.next().unwrap_or_default();
        let arg = words.next();
        if words.next().is_some() {
            return Err(format!("too many arguments in '{line}'"));
        }

        let direction = |arg: Option<&str>| -> Result<Direction, String> {
            let name = arg.ok_or_else(|| format!("'{verb}' needs a direction"))?;
            name.parse::<Direction>().map_err(|e| e.to_string())
        };

        match (verb, arg) {
            ("w", None) => Ok(Self::Toggle(Direction::Forward)),
            ("a", None) => Ok(Self::Toggle(Direction::Left)),
            ("s", None) => Ok(Self::Toggle(Direction::Back)),
            ("d", None) => Ok(Self::Toggle(Direction::Right)),
            ("press", arg) => direction(arg).map(Self::Press),
            ("release", arg) => direction(arg).map(Self::Release),
            ("stop", None) => Ok(Self::Stop),
            ("status", None) => Ok(Self::Status),
            ("log", None) => Ok(Self::Log),
            ("help", None) => Ok(Self::Help),
            ("quit" | "exit", None) => Ok(Self::Quit),
            _ => Err(format!("unknown command '{line}'")),
        }
    }
}

/// Which directions the operator is holding, as seen from the shell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeldKeys([bool; 4]);

impl HeldKeys {
    pub fn is_held(&self, direction: Direction) -> bool {
        self.0[direction.index()]
    }

    pub fn set(&mut self, direction: Direction, held: bool) {
        self.0[direction.index()] = held;
    }

    /// Flip `direction`; returns the new held state.
    pub fn toggle(&mut self, direction: Direction) -> bool {
        let held = !self.is_held(direction);
        self.set(direction, held);
        held
    }

    pub fn clear(&mut self) {
        self.0 = [false; 4];
    }

    pub fn describe(&self) -> String {
        let held: Vec<&str> = Direction::ALL
            .into_iter()
            .filter(|d| self.is_held(*d))
            .map(|d| d.name())
            .collect();
        if held.is_empty() {
            "none".to_string()
        } else {
            held.join(" + ")
        }
    }
}

/// Append-only, timestamped record of link events.
#[derive(Debug, Clone, Default)]
pub struct MessageLog(Arc<Mutex<Vec<StatusUpdate>>>);

impl MessageLog {
    pub fn push(&self, update: StatusUpdate) {
        if let Ok(mut entries) = self.0.lock() {
            entries.push(update);
        }
    }

    pub fn entries(&self) -> Vec<StatusUpdate> {
        self.0.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

/// One-line description of a link event for the operator.
pub fn describe_event(event: &SessionEvent) -> String {
    match event {
        SessionEvent::Connecting { url } => format!("connecting to {url}"),
        SessionEvent::Connected => "connected".to_string(),
        SessionEvent::MessageReceived(text) => format!("received: {text}"),
        SessionEvent::Closed { reason } => format!("closed: {reason}"),
    }
}

/// Run the shell until `quit`, end of input, Ctrl-C, or the link closing.
///
/// Every exit path releases all inputs so the vehicle receives a stop.
pub fn run(handle: &OperatorHandle, session: &TransportSession, log: &MessageLog) {
    let mut editor = match DefaultEditor::new() {
        Ok(editor) => editor,
        Err(e) => {
            eprintln!("{}: {}", "Terminal error".red(), e);
            handle.release_all();
            return;
        }
    };
    let mut keys = HeldKeys::default();

    loop {
        if handle.is_closed() {
            println!("{}", "Operator session ended.".yellow());
            break;
        }

        let line = match editor.readline(&format!("{} ", "zerobot>".bold().cyan())) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                println!("{}", "Releasing all inputs.".yellow());
                break;
            }
            Err(e) => {
                eprintln!("{}: {}", "Read error".red(), e);
                break;
            }
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let _ = editor.add_history_entry(line);

        let command = match TeleopCommand::parse(line) {
            Ok(command) => command,
            Err(e) => {
                println!("{} {}. Type {} for available commands.", "Error:".red(), e, "help".bold());
                continue;
            }
        };

        match command {
            TeleopCommand::Toggle(direction) => {
                if keys.toggle(direction) {
                    handle.press(direction);
                } else {
                    handle.release(direction);
                }
                println!("  holding: {}", keys.describe().bold());
            }
            TeleopCommand::Press(direction) => {
                keys.set(direction, true);
                handle.press(direction);
                println!("  holding: {}", keys.describe().bold());
            }
            TeleopCommand::Release(direction) => {
                keys.set(direction, false);
                handle.release(direction);
                println!("  holding: {}", keys.describe().bold());
            }
            TeleopCommand::Stop => {
                keys.clear();
                handle.release_all();
                println!("  {}", "stopped".green());
            }
            TeleopCommand::Status => cmd_status(session, &keys),
            TeleopCommand::Log => cmd_log(log),
            TeleopCommand::Help => cmd_help(),
            TeleopCommand::Quit => {
                println!("{}", "Goodbye.".green());
                break;
            }
        }
    }

    handle.release_all();
}

fn cmd_status(session: &TransportSession, keys: &HeldKeys) {
    let state = match session.link_state() {
        LinkState::Connecting => "connecting".yellow(),
        LinkState::Open => "open".green(),
        LinkState::Closed { reason } => format!("closed ({reason})").red(),
    };
    println!("  vehicle : {}", session.url().bold());
    println!("  link    : {state}");
    println!("  holding : {}", keys.describe().bold());
}

fn cmd_log(log: &MessageLog) {
    let entries = log.entries();
    if entries.is_empty() {
        println!("  {}", "(no messages yet)".dimmed());
    }
    for entry in entries {
        println!(
            "  {}  {}",
            entry.timestamp.format("%H:%M:%S%.3f").to_string().dimmed(),
            describe_event(&entry.event)
        );
    }
}

fn cmd_help() {
    println!();
    println!("{}", "ZeroBot Teleop Commands".bold().underline());
    println!("  {}        – toggle forward / left / back / right", "w a s d".bold().cyan());
    println!("  {}    – hold a direction", "press <dir>".bold().cyan());
    println!("  {}  – let go of a direction", "release <dir>".bold().cyan());
    println!("  {}           – release everything", "stop".bold().cyan());
    println!("  {}         – link state and held directions", "status".bold().cyan());
    println!("  {}            – link message log", "log".bold().cyan());
    println!("  {}    – release everything and exit", "quit  exit".bold().cyan());
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn wasd_toggles() {
        assert_eq!(TeleopCommand::parse("w"), Ok(TeleopCommand::Toggle(Direction::Forward)));
        assert_eq!(TeleopCommand::parse("a"), Ok(TeleopCommand::Toggle(Direction::Left)));
        assert_eq!(TeleopCommand::parse(" s "), Ok(TeleopCommand::Toggle(Direction::Back)));
        assert_eq!(TeleopCommand::parse("d"), Ok(TeleopCommand::Toggle(Direction::Right)));
    }

    #[test]
    fn press_and_release_take_a_direction() {
        assert_eq!(
            TeleopCommand::parse("press right"),
            Ok(TeleopCommand::Press(Direction::Right))
        );
        assert_eq!(
            TeleopCommand::parse("release back"),
            Ok(TeleopCommand::Release(Direction::Back))
        );
        assert!(TeleopCommand::parse("press").is_err());
        assert!(TeleopCommand::parse("press up").is_err());
        assert!(TeleopCommand::parse("press left now").is_err());
    }

    #[test]
    fn keyword_commands() {
        assert_eq!(TeleopCommand::parse("stop"), Ok(TeleopCommand::Stop));
        assert_eq!(TeleopCommand::parse("status"), Ok(TeleopCommand::Status));
        assert_eq!(TeleopCommand::parse("log"), Ok(TeleopCommand::Log));
        assert_eq!(TeleopCommand::parse("help"), Ok(TeleopCommand::Help));
        assert_eq!(TeleopCommand::parse("exit"), Ok(TeleopCommand::Quit));
        assert!(TeleopCommand::parse("stop now").is_err());
        assert!(TeleopCommand::parse("jump").is_err());
    }

    #[test]
    fn held_keys_toggle_and_describe() {
        let mut keys = HeldKeys::default();
        assert_eq!(keys.describe(), "none");
        assert!(keys.toggle(Direction::Forward));
        keys.set(Direction::Right, true);
        assert_eq!(keys.describe(), "forward + right");
        assert!(!keys.toggle(Direction::Forward));
        keys.clear();
        assert!(!keys.is_held(Direction::Right));
    }

    #[test]
    fn message_log_keeps_order() {
        let log = MessageLog::default();
        log.push(StatusUpdate {
            timestamp: Utc::now(),
            event: SessionEvent::Connected,
        });
        log.push(StatusUpdate {
            timestamp: Utc::now(),
            event: SessionEvent::Closed {
                reason: "connection lost".to_string(),
            },
        });
        let described: Vec<String> = log
            .entries()
            .iter()
            .map(|e| describe_event(&e.event))
            .collect();
        assert_eq!(described, vec!["connected", "closed: connection lost"]);
    }
}
