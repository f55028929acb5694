//! Balance bridge - supervised input event readers driven by a control console.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use futures_util::StreamExt;
use serde::Serialize;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use balance_bridge::command::tokens;
use balance_bridge::config::{BridgeConfig, ConfigLoader};
use balance_bridge::console::spawn_console;
use balance_bridge::event::input_events;
use balance_bridge::process::{
    BoxError, OsProcess, ProcSig, ProcessGroup, ProcessLike, TaskProcess, EXIT_ABORTED, EXIT_FAILURE,
};
use balance_bridge::stream::{byte_chunks, decode_utf8};

#[derive(Parser)]
#[command(
    name = "balance-bridge",
    about = "Supervise input event readers from a control console",
    version
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Config file to use instead of the default search paths.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program under a console reading commands from stdin.
    Run {
        /// Program and arguments to supervise.
        #[arg(last = true)]
        program: Vec<String>,
    },
    /// Decode input events from a device or capture file as JSON lines.
    Events {
        /// Path to an evdev device or a recorded event file.
        path: PathBuf,
        /// Fields are big-endian.
        #[arg(long)]
        big_endian: bool,
    },
    /// Print the tokens of commands read from stdin as JSON lines.
    Tokens,
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

async fn write_json<W, T>(output: &mut W, value: &T) -> Result<(), BoxError>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let mut line = serde_json::to_vec(value)?;
    line.push(b'\n');
    output.write_all(&line).await?;
    Ok(())
}

/// Forward SIGINT to the group as a kill.
fn forward_interrupt(group: &Arc<ProcessGroup>) {
    let group = Arc::downgrade(group);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Received interrupt");
                if let Some(group) = group.upgrade() {
                    group.kill(ProcSig::SigInt);
                }
            }
            Err(e) => tracing::error!(error = %e, "Failed to listen for interrupt"),
        }
    });
}

async fn run(program: &[String], config: &BridgeConfig) -> i32 {
    let group = Arc::new(ProcessGroup::new().named("balance-bridge"));

    if let Some((name, args)) = program.split_first() {
        let mut command = tokio::process::Command::new(name);
        // Stdin belongs to the console.
        command.args(args).stdin(std::process::Stdio::null());
        match OsProcess::spawn(&mut command) {
            Ok(child) => {
                tracing::info!(pid = %child.id(), program = %name, "Started program");
                group.add_child(Arc::new(child));
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to start program");
                return EXIT_FAILURE;
            }
        }
    }

    let console = spawn_console(&group, tokio::io::stdin(), tokio::io::stdout(), config.console.clone());
    group.add_child(Arc::new(console));
    forward_interrupt(&group);
    group.wait().await
}

async fn pump_events(path: &Path, little_endian: bool, cancel: &CancellationToken) -> Result<i32, BoxError> {
    let file = tokio::fs::File::open(path).await?;
    let mut events = std::pin::pin!(input_events(byte_chunks(file), little_endian));
    let mut stdout = tokio::io::stdout();
    loop {
        let next = tokio::select! {
            () = cancel.cancelled() => return Ok(EXIT_ABORTED),
            next = events.next() => next,
        };
        match next {
            Some(event) => write_json(&mut stdout, &event?).await?,
            None => break,
        }
        stdout.flush().await?;
    }
    Ok(0)
}

async fn events(path: PathBuf, little_endian: bool, config: &BridgeConfig) -> i32 {
    let group = Arc::new(ProcessGroup::new().named("events"));

    let reader_group = Arc::downgrade(&group);
    let reader = TaskProcess::builder()
        .name("event reader")
        .spawn(move |cancel| async move {
            let code = match pump_events(&path, little_endian, &cancel).await {
                Ok(code) => code,
                Err(e) => {
                    tracing::error!(path = %path.display(), error = %e, "Event reader failed");
                    EXIT_FAILURE
                }
            };
            // Reaching the end of the events ends the whole group, console included.
            if !cancel.is_cancelled() {
                if let Some(group) = reader_group.upgrade() {
                    group.exit(code);
                }
            }
            Ok(code)
        });
    group.add_child(Arc::new(reader));

    let console = spawn_console(&group, tokio::io::stdin(), tokio::io::sink(), config.console.clone());
    group.add_child(Arc::new(console));
    forward_interrupt(&group);
    group.wait().await
}

async fn print_tokens() -> i32 {
    let mut stream = std::pin::pin!(tokens(decode_utf8(byte_chunks(tokio::io::stdin()))));
    let mut stdout = tokio::io::stdout();
    while let Some(token) = stream.next().await {
        let written = match token {
            Ok(token) => write_json(&mut stdout, &token).await,
            Err(e) => Err(e.into()),
        };
        if let Err(e) = written {
            tracing::error!(error = %e, "Tokenizing failed");
            return EXIT_FAILURE;
        }
    }
    match stdout.flush().await {
        Ok(()) => 0,
        Err(_) => EXIT_FAILURE,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let loader = cli.config.map_or_else(ConfigLoader::new, ConfigLoader::with_path);
    let config = match loader.load() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            std::process::exit(EXIT_FAILURE);
        }
    };

    let code = match cli.command {
        Commands::Run { program } => run(&program, &config).await,
        Commands::Events { path, big_endian } => {
            let little_endian = config.records.little_endian && !big_endian;
            events(path, little_endian, &config).await
        }
        Commands::Tokens => print_tokens().await,
    };

    tracing::debug!(code, "Exiting");
    std::process::exit(code);
}
