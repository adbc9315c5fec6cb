//! Console commands and user-facing output.

use crate::config::{Config, HotkeyBindings};
use crate::error::ClickerError;
use crate::keys::Chord;
use crate::session::{
    CommandOutcome, SessionCommand, SessionController, StartOutcome, StopOutcome,
};
use colored::Colorize;
use std::str::FromStr;
use tracing::error;

/// A line typed at the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Stop,
    Status,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "s" | "start" => Ok(Command::Start),
            "t" | "stop" => Ok(Command::Stop),
            "status" => Ok(Command::Status),
            "h" | "help" | "?" => Ok(Command::Help),
            "q" | "quit" | "exit" => Ok(Command::Quit),
            other => Err(format!("unknown command '{other}', type 'help' for a list")),
        }
    }
}

impl Command {
    pub fn session_command(self) -> Option<SessionCommand> {
        match self {
            Command::Start => Some(SessionCommand::Start),
            Command::Stop => Some(SessionCommand::Stop),
            _ => None,
        }
    }
}

/// Where a session command came from, for the notice printed afterwards.
#[derive(Debug, Clone)]
pub enum Origin {
    Console,
    Hotkey(Chord),
}

pub fn print_banner(config: &Config, backend: &str) {
    println!(
        "{} {}",
        "🖱️  Rapid Clicker".bold(),
        concat!("v", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!(
        "   Rate: {} clicks/s   Backend: {}",
        config.clicks_per_second.to_string().cyan(),
        backend
    );
    println!();
    print_help(config.hotkey_bindings().ok().filter(|_| config.hotkeys_enabled).as_ref());
}

pub fn print_help(bindings: Option<&HotkeyBindings>) {
    println!("Commands:");
    println!("  {}  start clicking at the current cursor position", "s".green());
    println!("  {}  stop clicking", "t".green());
    println!("  {}  show whether a session is running", "status".green());
    println!("  {}  quit", "q".green());
    if let Some(bindings) = bindings {
        println!();
        println!("Global hotkeys:");
        println!("  {}  start clicking", bindings.start.to_string().yellow());
        println!("  {}  stop clicking", bindings.stop.to_string().yellow());
    }
    println!();
}

pub fn print_status(controller: &SessionController) {
    match controller.anchor() {
        Some(anchor) => println!(
            "▶️  Clicking at {} ({} clicks/s)",
            anchor,
            controller.click_config().clicks_per_second()
        ),
        None => println!("⏸️  Idle"),
    }
}

/// Run `command` on the controller and print what happened.
pub fn execute(controller: &SessionController, command: SessionCommand, origin: &Origin) {
    if let Origin::Hotkey(chord) = origin {
        println!("\n{} {}", "[hotkey]".magenta(), chord);
    }
    match controller.execute(command) {
        Ok(outcome) => println!("{}", describe(&outcome, controller)),
        Err(e) => report_error(&e),
    }
}

fn describe(outcome: &CommandOutcome, controller: &SessionController) -> String {
    match outcome {
        CommandOutcome::Start(StartOutcome::Started { anchor }) => format!(
            "{} at {}, {} clicks/s",
            "▶️  Clicking started".green(),
            anchor,
            controller.click_config().clicks_per_second()
        ),
        CommandOutcome::Start(StartOutcome::AlreadyActive { anchor }) => {
            format!("{} (at {})", "Already clicking".yellow(), anchor)
        }
        CommandOutcome::Stop(StopOutcome::Stopped(report)) => format!(
            "{} after {} clicks",
            "⏹️  Clicking stopped".green(),
            report.pairs
        ),
        CommandOutcome::Stop(StopOutcome::NotActive) => {
            "Not clicking right now".yellow().to_string()
        }
        CommandOutcome::Stop(StopOutcome::Detached) => {
            "⚠️  Clicking stopped, but the clicker thread did not exit in time"
                .yellow()
                .to_string()
        }
        CommandOutcome::Stop(StopOutcome::Panicked) => {
            "❌ The clicker thread crashed; clicking is off".red().to_string()
        }
    }
}

fn report_error(e: &ClickerError) {
    error!(error = %e, "session command failed");
    eprintln!("{} {}", "❌".red(), e);
}
