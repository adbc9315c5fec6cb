use anyhow::{anyhow, Context, Result};
use clap::Parser;
use colored::Colorize;
use rapid_clicker::config::{HotkeyBindings, MAX_CLICKS_PER_SECOND};
use rapid_clicker::console::{self, Command, Origin};
use rapid_clicker::platform::{self, DryRunBackend, InputBackend};
use rapid_clicker::{Config, HotkeyPoller, SessionCommand, SessionController};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "rclick",
    version,
    about = "Click the left mouse button at a fixed rate and position"
)]
struct Cli {
    /// JSON configuration file (created with defaults if missing)
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Clicks per second, overriding the configuration file
    #[arg(
        long,
        value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_CLICKS_PER_SECOND))
    )]
    cps: Option<u32>,

    /// Disable the global start/stop hotkeys
    #[arg(long)]
    no_hotkeys: bool,

    /// Simulate input instead of touching the real mouse and keyboard
    #[arg(long)]
    dry_run: bool,

    /// Write the effective configuration back to the config file
    #[arg(long)]
    save: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded = Config::load_or_create(&cli.config);
    let verbose = cli.verbose || loaded.as_ref().map(|c| c.verbose).unwrap_or(false);
    init_tracing(verbose);

    let mut config = loaded.unwrap_or_else(|e| {
        warn!(error = %e, "using default configuration");
        eprintln!("{} {}, using defaults", "⚠️ ".yellow(), e);
        Config::default()
    });
    if let Some(cps) = cli.cps {
        config.clicks_per_second = cps;
    }
    if cli.no_hotkeys {
        config.hotkeys_enabled = false;
    }
    config.validate().context("invalid configuration")?;

    if cli.save {
        config
            .save_to_file(&cli.config)
            .with_context(|| format!("failed to save {}", cli.config.display()))?;
        println!("💾 Configuration saved to {}", cli.config.display());
    }

    let backend: Arc<dyn InputBackend> = if cli.dry_run {
        Arc::new(DryRunBackend::new())
    } else {
        platform::native_backend().context("no input backend available (try --dry-run)")?
    };

    let controller = Arc::new(SessionController::from_config(Arc::clone(&backend), &config)?);
    console::print_banner(&config, backend.name());

    let shutdown = Arc::new(AtomicBool::new(false));
    let bindings = config.hotkey_bindings()?;
    let poller = if config.hotkeys_enabled {
        Some(spawn_poller(
            HotkeyPoller::from_config(Arc::clone(&backend), &config)?,
            Arc::clone(&controller),
            Arc::clone(&shutdown),
        )?)
    } else {
        None
    };

    run_console(&controller, config.hotkeys_enabled.then_some(&bindings)).await;

    info!("shutting down");
    shutdown.store(true, Ordering::Release);

    let stopping = Arc::clone(&controller);
    tokio::task::spawn_blocking(move || stopping.shutdown()).await?;
    if let Some(handle) = poller {
        tokio::task::spawn_blocking(move || handle.join())
            .await?
            .map_err(|_| anyhow!("hotkey poller panicked"))?;
    }

    println!("👋 Bye");
    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn spawn_poller(
    poller: HotkeyPoller,
    controller: Arc<SessionController>,
    shutdown: Arc<AtomicBool>,
) -> Result<JoinHandle<()>> {
    let bindings = poller.bindings().clone();
    poller
        .spawn(shutdown, move |command| {
            let chord = match command {
                SessionCommand::Start => bindings.start.clone(),
                SessionCommand::Stop => bindings.stop.clone(),
            };
            console::execute(&controller, command, &Origin::Hotkey(chord));
        })
        .context("failed to start hotkey poller")
}

/// Read commands until quit, end of input, or Ctrl+C.
async fn run_console(controller: &Arc<SessionController>, bindings: Option<&HotkeyBindings>) {
    let mut lines = spawn_stdin_reader();
    // Listens across turns, including while a command runs.
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        print!("> ");
        let _ = io::stdout().flush();

        let line = tokio::select! {
            line = lines.recv() => line,
            _ = &mut ctrl_c => {
                println!();
                info!("interrupted");
                break;
            }
        };
        let Some(line) = line else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        match line.parse::<Command>() {
            Ok(Command::Quit) => break,
            Ok(Command::Help) => console::print_help(bindings),
            Ok(Command::Status) => console::print_status(controller),
            Ok(command) => {
                let Some(session_command) = command.session_command() else {
                    continue;
                };
                // stop() may wait for the clicker thread; keep it off the runtime.
                let controller = Arc::clone(controller);
                let mut task = tokio::task::spawn_blocking(move || {
                    console::execute(&controller, session_command, &Origin::Console)
                });
                let interrupted = tokio::select! {
                    result = &mut task => {
                        if let Err(e) = result {
                            warn!(error = %e, "console command task failed");
                        }
                        false
                    }
                    _ = &mut ctrl_c => true,
                };
                if interrupted {
                    // The blocking command cannot be cancelled; let it finish first.
                    if let Err(e) = task.await {
                        warn!(error = %e, "console command task failed");
                    }
                    println!();
                    info!("interrupted");
                    break;
                }
            }
            Err(message) => println!("{}", message.yellow()),
        }
    }
}

/// Blocking stdin reads live on their own thread so shutdown never waits on them.
fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    let spawned = thread::Builder::new()
        .name("stdin".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines().map_while(|l| l.ok()) {
                if tx.send(line).is_err() {
                    break;
                }
            }
        });
    if let Err(e) = spawned {
        warn!(error = %e, "could not read console input");
    }
    rx
}
