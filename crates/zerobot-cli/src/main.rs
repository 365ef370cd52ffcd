//! `zerobot-cli` – ZeroBot command line interface
//!
//! One binary for both ends of the link:
//!
//! * `zerobot serve` runs on the vehicle: it serves the operator page and
//!   interprets drive commands with the dead-man's switch armed.
//! * `zerobot drive [url]` runs on the operator's machine: it opens a link to
//!   the vehicle and drops into an interactive teleop shell.
//!
//! Ctrl-C in either mode stops the vehicle before the process exits.

mod config;
mod repl;
mod telemetry;

use colored::Colorize;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::runtime::Runtime;
use tokio::sync::{Notify, broadcast::error::RecvError};
use tracing::{info, warn};

use zerobot_cockpit::CockpitServer;
use zerobot_hal::LogDrive;
use zerobot_kernel::DriveArbiter;
use zerobot_operator::{OperatorSession, SessionEvent, TransportSession};
use zerobot_types::ZeroBotError;

use crate::config::Config;
use crate::repl::MessageLog;

fn main() -> ExitCode {
    let _telemetry = telemetry::init_tracing("zerobot");

    print_banner();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let mode = args.first().map(String::as_str);
    if matches!(mode, None | Some("help" | "--help" | "-h")) {
        print_usage();
        return ExitCode::SUCCESS;
    }

    ensure_config_file();
    let cfg = match config::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            println!("{}: {}", "Config error".red(), e);
            return ExitCode::FAILURE;
        }
    };

    let runtime = match Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            println!("{}: {}", "Failed to start Tokio runtime".red(), e);
            return ExitCode::FAILURE;
        }
    };

    let result = match mode {
        Some("serve") => serve(&runtime, &cfg),
        Some("drive") => drive(&runtime, &cfg, args.get(1).map(String::as_str)),
        Some(other) => {
            println!("{} '{}'", "Unknown mode:".red(), other.yellow());
            print_usage();
            return ExitCode::from(2);
        }
        None => Ok(()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            println!("{}: {}", "Error".red(), e);
            ExitCode::FAILURE
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// serve
// ─────────────────────────────────────────────────────────────────────────────

fn serve(runtime: &Runtime, cfg: &Config) -> Result<(), ZeroBotError> {
    let arbiter = DriveArbiter::new(Box::new(LogDrive::new("drive_base")));
    let server = CockpitServer::new(arbiter.clone())
        .with_host(cfg.bind_addr()?)
        .with_port(cfg.port);

    // Notify keeps a permit, so a Ctrl-C before the select is not lost.
    let shutdown = Arc::new(Notify::new());
    let signal = Arc::clone(&shutdown);
    if let Err(e) = ctrlc::set_handler(move || signal.notify_one()) {
        warn!(error = %e, "Failed to install Ctrl-C handler; the drive will not be stopped on Ctrl-C");
    }

    println!(
        "  Serving operator page on {}",
        format!("http://{}", server.addr()).bold()
    );
    println!("  Press {} to stop.\n", "Ctrl-C".bold());

    runtime.block_on(async move {
        tokio::select! {
            result = server.run() => result,
            _ = shutdown.notified() => {
                println!();
                println!("{}", "⚠  Ctrl-C received – stopping the drive …".yellow().bold());
                arbiter.halt()?;
                println!("{}", "  ✓ Drive stopped.".green());
                Ok(())
            }
        }
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// drive
// ─────────────────────────────────────────────────────────────────────────────

fn drive(runtime: &Runtime, cfg: &Config, url: Option<&str>) -> Result<(), ZeroBotError> {
    let url = url.unwrap_or(cfg.server_url.as_str()).to_string();
    let log = MessageLog::default();

    let (session, handle, operator) = runtime.block_on(async {
        let (session, mut status) = TransportSession::connect(url);
        let session = Arc::new(session);

        let log_writer = log.clone();
        tokio::spawn(async move {
            loop {
                match status.recv().await {
                    Ok(update) => {
                        if !matches!(update.event, SessionEvent::MessageReceived(_)) {
                            info!("{}", repl::describe_event(&update.event));
                        }
                        log_writer.push(update);
                    }
                    Err(RecvError::Lagged(missed)) => {
                        warn!(missed, "message log fell behind");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });

        let (handle, operator) =
            OperatorSession::new(Arc::clone(&session), cfg.refresh_interval()).spawn();
        (session, handle, operator)
    });

    let ctrlc_handle = handle.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        println!("{}", "⚠  Ctrl-C received – releasing all inputs …".yellow().bold());
        ctrlc_handle.release_all();
        ctrlc_handle.shutdown();
    }) {
        warn!(error = %e, "Failed to install Ctrl-C handler");
    }

    println!(
        "  Type {} for a list of commands.\n",
        "help".bold().cyan()
    );
    repl::run(&handle, &session, &log);

    // The stop queued by the shell reaches the link before it is closed.
    handle.shutdown();
    runtime.block_on(async {
        let _ = operator.await;
        session.close();
        let reason = session.closed().await;
        println!("  {} ({})", "Link closed".green(), reason);
    });
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Write a default config on first run so the operator has a file to edit.
fn ensure_config_file() {
    let path = config::config_path();
    if path.exists() {
        println!("  Config loaded from {}", path.display().to_string().bold());
        return;
    }
    match config::save(&Config::default()) {
        Ok(()) => println!(
            "  {} Default config written to {}",
            "✓".green().bold(),
            path.display().to_string().bold()
        ),
        Err(e) => println!("{}: {}", "Error saving config".red(), e),
    }
}

fn print_usage() {
    println!("{}", "Usage".bold().underline());
    println!("  {}          – run the vehicle server", "zerobot serve".bold().cyan());
    println!("  {}  – drive a vehicle from this terminal", "zerobot drive [url]".bold().cyan());
    println!();
}

fn print_banner() {
    println!();
    println!("{}", r#"  _____              ____        _   "#.bold().cyan());
    println!("{}", r#" |__  /___ _ __ ___ | __ )  ___ | |_ "#.bold().cyan());
    println!("{}", r#"   / // _ \ '__/ _ \|  _ \ / _ \| __|"#.bold().cyan());
    println!("{}", r#"  / /|  __/ | | (_) | |_) | (_) | |_ "#.bold().cyan());
    println!("{}", r#" /____\___|_|  \___/|____/ \___/ \__|"#.bold().cyan());
    println!();
    println!(
        "  {} {}",
        "ZeroBot".bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("  Remote teleoperation with a dead-man's switch");
    println!();
}
