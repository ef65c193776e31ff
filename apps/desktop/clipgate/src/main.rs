use clipgate::cli::{Cli, Command};
use clipgate::commands::{keygen, remote, serve};
use clipgate::error::AppError;
use clipgate::logger::{default_log_dir, initialize as LoggerInitialize};

use std::fs::create_dir_all;
use std::process::ExitCode;

use clap::Parser;
use log::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.debug) {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(debug: bool) -> Result<(), AppError> {
    let log_dir = default_log_dir()?;

    create_dir_all(&log_dir).map_err(|e| {
        AppError::clipgate(format!(
            "Failed to create log directory {}: {e}",
            log_dir.display()
        ))
    })?;

    LoggerInitialize(&log_dir, debug)?;
    info!("Log directory: {}", log_dir.display());
    Ok(())
}

async fn run(cli: Cli) -> Result<(), AppError> {
    match cli.command {
        Command::Serve(args) => serve::run(args, cli.config_dir).await,
        Command::Keygen(args) => {
            let identity = keygen::run(&args)?;
            println!("{}", identity.public_hex());
            Ok(())
        }
        Command::Copy {
            target,
            line_ending,
            text,
        } => remote::copy(&target, text, line_ending).await,
        Command::Paste { target } => {
            let text = remote::paste(&target).await?;
            print!("{text}");
            Ok(())
        }
        Command::Open {
            target,
            translate_loopback,
            uri,
        } => remote::open(&target, uri, translate_loopback).await,
    }
}
