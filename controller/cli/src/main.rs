//! inkframe - Command-Line Controller for the E-Ink Message Frame
//!
//! Stages content on the gateway, promotes it to the frame, manages the
//! idle-art set, and previews what the frame shows.
//!
//! # Usage
//!
//! ```bash
//! # Live preview; type commands on stdin ("help" lists them)
//! inkframe watch
//!
//! # Same, against an in-process gateway
//! inkframe watch --offline
//!
//! # One-shot actions
//! inkframe send-text --align center "Happy Birthday"
//! inkframe send-image ./cat.jpg --crop 5:3
//! inkframe display
//! inkframe delete-idle-art sunset.png --yes
//!
//! # Verbose logging (logs go to stderr)
//! RUST_LOG=debug inkframe watch
//! ```

mod commands;
mod render;

use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tokio::sync::mpsc;
use tracing::{info, warn};

use inkframe_core::{
    load_config_from_path, poller, Action, Alignment, AspectRatio, ConfigOverrides,
    ContentGateway, Controller, ControllerConfigFile, ControllerMessage, HttpGateway,
    InMemoryGateway, PollerHandle, TextOptions, UploadFile,
};

use commands::Command;
use render::{Renderer, DEFAULT_WIDTH};

/// inkframe - control and preview an e-ink message frame
#[derive(Parser, Debug)]
#[command(name = "inkframe")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Gateway base URL
    #[arg(short = 'g', long, global = true, value_name = "URL")]
    gateway: Option<String>,

    /// Configuration file path
    #[arg(short = 'c', long, global = true, env = "INKFRAME_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(
        short = 'l',
        long,
        global = true,
        env = "INKFRAME_LOG_LEVEL",
        default_value = "info"
    )]
    log_level: String,

    /// Seconds between gateway polls
    #[arg(long, global = true, value_name = "SECS")]
    poll_interval: Option<u64>,

    /// Center-crop staged photos to this ratio unless one is given, e.g. 5:3
    #[arg(long, global = true, value_name = "W:H")]
    default_crop: Option<AspectRatio>,

    /// Print controller messages as JSON lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Poll the gateway and preview the frame; read commands from stdin
    Watch {
        /// Use an in-process gateway instead of the network
        #[arg(long)]
        offline: bool,
    },
    /// Stage a text message
    SendText {
        /// Message text
        text: String,
        /// Alignment (left, center, right)
        #[arg(long, value_name = "ALIGN")]
        align: Option<Alignment>,
        /// Layout name understood by the gateway
        #[arg(long)]
        layout: Option<String>,
        /// Show once, then fall back to idle art
        #[arg(long)]
        temp: bool,
    },
    /// Stage a photo
    SendImage {
        /// Image file
        path: PathBuf,
        /// Center-crop to this ratio first, e.g. 5:3
        #[arg(long, value_name = "W:H")]
        crop: Option<AspectRatio>,
        /// Show once, then fall back to idle art
        #[arg(long)]
        temp: bool,
    },
    /// Add an image to the idle-art set
    UploadIdleArt {
        /// Image file
        path: PathBuf,
    },
    /// Delete an image from the idle-art set
    DeleteIdleArt {
        /// Gallery filename
        filename: String,
        /// Skip the confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
    /// Promote staged content to the frame
    Display,
    /// Clear the frame
    Clear,
    /// Ask the frame to refresh itself
    RequestUpdate,
    /// Stage the weather card
    SendWeather,
    /// Generate an image from a prompt and stage it
    GenerateAi {
        /// Prompt text
        prompt: String,
    },
    /// Stage a random museum piece
    MetArt,
    /// List the idle-art set
    Gallery,
    /// Show what the frame should be showing now
    Latest,
}

/// Initialize logging with the specified level
fn init_logging(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!("inkframe={level},inkframe_core={level}"))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

/// Resolve configuration: file, then environment, then flags
fn resolve_config(args: &Args) -> Result<ControllerConfigFile> {
    let path = args
        .config
        .clone()
        .or_else(inkframe_core::default_config_path);
    let mut config = load_config_from_path(path).context("Failed to load configuration")?;

    let mut overrides = ConfigOverrides::new();
    if let Some(ref url) = args.gateway {
        overrides = overrides.with_gateway(url.clone());
    }
    if let Some(secs) = args.poll_interval {
        overrides = overrides.with_poll_interval_secs(secs);
    }
    if let Some(ratio) = args.default_crop {
        overrides = overrides.with_crop_aspect(ratio);
    }
    overrides.apply(&mut config);

    config.validate()?;
    info!(
        gateway = %config.base_url,
        poll_interval_secs = config.poll_interval.as_secs(),
        source = %config.source(),
        "Configuration resolved"
    );
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();
    init_logging(&args.log_level);

    let config = resolve_config(&args)?;
    let renderer = Renderer::new(DEFAULT_WIDTH).json(args.json);

    match args.command {
        Cmd::Watch { offline: true } => {
            let gateway = InMemoryGateway::new();
            watch(gateway, &config, renderer).await?;
            Ok(ExitCode::SUCCESS)
        }
        Cmd::Watch { offline: false } => {
            watch(http_gateway(&config)?, &config, renderer).await?;
            Ok(ExitCode::SUCCESS)
        }
        command => one_shot(http_gateway(&config)?, &config, renderer, command).await,
    }
}

fn http_gateway(config: &ControllerConfigFile) -> Result<HttpGateway> {
    HttpGateway::with_timeout(&config.base_url, config.request_timeout)
        .with_context(|| format!("Invalid gateway URL: {}", config.base_url))
}

// =============================================================================
// One-shot subcommands
// =============================================================================

async fn one_shot<G>(
    gateway: G,
    config: &ControllerConfigFile,
    mut renderer: Renderer,
    command: Cmd,
) -> Result<ExitCode>
where
    G: ContentGateway + 'static,
{
    let (tx, mut rx) = mpsc::channel(64);
    let mut controller = Controller::new(gateway, config.to_controller_config(), tx);

    let succeeded = match command {
        Cmd::Gallery => controller.refresh_idle_art().await.is_fresh(),
        Cmd::Latest => {
            controller.start().await;
            true
        }
        command => {
            let action = action_for(command).await?;
            controller.perform(action).await.succeeded()
        }
    };

    drop(controller);
    while let Some(msg) = rx.recv().await {
        print_lines(renderer.apply(&msg));
    }

    Ok(if succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Map a subcommand to an action
async fn action_for(command: Cmd) -> Result<Action> {
    let action = match command {
        Cmd::SendText {
            text,
            align,
            layout,
            temp,
        } => {
            let mut options = TextOptions::default();
            if let Some(align) = align {
                options = options.with_alignment(align);
            }
            if let Some(layout) = layout {
                options = options.with_layout(layout);
            }
            if temp {
                options = options.temporary();
            }
            Action::StageText { text, options }
        }
        Cmd::SendImage { path, crop, temp } => Action::StageImage {
            file: Some(read_file(&path).await?),
            temp_msg: temp,
            crop,
        },
        Cmd::UploadIdleArt { path } => Action::UploadIdleArt {
            file: Some(read_file(&path).await?),
        },
        Cmd::DeleteIdleArt { filename, yes } => {
            let confirmed = yes || {
                let mut stdin = BufReader::new(tokio::io::stdin()).lines();
                confirm(&mut stdin, &filename).await?
            };
            Action::DeleteIdleArt {
                filename,
                confirmed,
            }
        }
        Cmd::Display => Action::Display,
        Cmd::Clear => Action::Clear,
        Cmd::RequestUpdate => Action::RequestUpdate,
        Cmd::SendWeather => Action::SendWeather,
        Cmd::GenerateAi { prompt } => Action::GenerateAiImage { prompt },
        Cmd::MetArt => Action::RandomMetArt,
        Cmd::Watch { .. } | Cmd::Gallery | Cmd::Latest => {
            anyhow::bail!("not an action subcommand")
        }
    };
    Ok(action)
}

async fn read_file(path: &Path) -> Result<UploadFile> {
    UploadFile::from_path(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))
}

async fn confirm<R>(input: &mut Lines<R>, filename: &str) -> Result<bool>
where
    R: AsyncBufRead + Unpin,
{
    eprint!("Delete {filename}? [y/N] ");
    let answer = input.next_line().await?.unwrap_or_default();
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

fn print_lines(lines: Vec<String>) {
    for line in lines {
        println!("{line}");
    }
}

// =============================================================================
// watch
// =============================================================================

async fn watch<G>(gateway: G, config: &ControllerConfigFile, mut renderer: Renderer) -> Result<()>
where
    G: ContentGateway + 'static,
{
    let (tx, mut rx) = mpsc::channel(256);
    let controller =
        Controller::with_shared_gateway(Arc::new(gateway), config.to_controller_config(), tx);
    let handle = poller::spawn(controller);

    let printer = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let stopped = matches!(msg, ControllerMessage::Stopped);
            print_lines(renderer.apply(&msg));
            if stopped {
                break;
            }
        }
    });

    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let interrupted = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
        info!("Interrupted");
    };
    let outcome = read_commands(&mut input, &handle, interrupted).await;

    handle.shutdown().await;
    if let Err(e) = printer.await {
        warn!(error = %e, "Printer task failed");
    }
    outcome
}

/// Feed operator commands to the poll loop until `quit` or `interrupt`
///
/// Closed input stops the reading, not the polling.
async fn read_commands<R>(
    input: &mut Lines<R>,
    handle: &PollerHandle,
    interrupt: impl Future<Output = ()>,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    tokio::pin!(interrupt);
    let mut input_open = true;

    loop {
        let line = tokio::select! {
            line = input.next_line(), if input_open => line?,
            () = &mut interrupt => {
                handle.cancel();
                break;
            }
        };
        let Some(line) = line else {
            info!("Input closed, polling until interrupted");
            input_open = false;
            continue;
        };

        let command = match commands::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                eprintln!("{e}");
                continue;
            }
        };

        let event = match command {
            Command::Event(event) => event,
            Command::StageImage {
                path,
                temp_msg,
                crop,
            } => match read_file(&path).await {
                Ok(file) => Action::StageImage {
                    file: Some(file),
                    temp_msg,
                    crop,
                }
                .into(),
                Err(e) => {
                    eprintln!("{e:#}");
                    continue;
                }
            },
            Command::UploadIdleArt { path } => match read_file(&path).await {
                Ok(file) => Action::UploadIdleArt { file: Some(file) }.into(),
                Err(e) => {
                    eprintln!("{e:#}");
                    continue;
                }
            },
            Command::ConfirmDelete { filename } => {
                let confirmed = confirm(input, &filename).await?;
                Action::DeleteIdleArt {
                    filename,
                    confirmed,
                }
                .into()
            }
            Command::Help => {
                println!("{}", commands::HELP);
                continue;
            }
            Command::Quit => break,
        };

        if !handle.send(event).await {
            warn!("Poll loop is no longer running");
            break;
        }
    }

    Ok(())
}
