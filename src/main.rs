mod bluetoothctl;
mod cli;
mod error;
mod models;
mod picker;

use clap::Parser;
use cli::{run_loop, App, Cli};
use colored::*;
use dialoguer::{theme::ColorfulTheme, Input};
use error::{AppError, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    info!(
        "Starting Bluetooth device menu (control tool: {}, picker: {})",
        cli.bluetoothctl, cli.picker
    );

    let app = App::new(&cli);

    // A subprocess failure prints its diagnostic, waits for an
    // acknowledgement and restarts the whole workflow from the listing.
    run_loop(&app, |err| {
        report_process_failure(err);
        wait_for_acknowledgement()
    })
}

/// Prints the failure diagnostic to stderr: exit code and captured streams.
fn report_process_failure(err: &AppError) {
    if let AppError::Process {
        program,
        code,
        stdout,
        stderr,
    } = err
    {
        eprintln!(
            "{}",
            format!("Error spawning process `{}`:", program).red().bold()
        );
        eprintln!("\tcode: {}", code);
        eprintln!("\tstderr: {}", stderr);
        eprintln!("\tstdout: {}", stdout);
    }
}

/// Blocks until the user acknowledges the diagnostic with one line of input.
fn wait_for_acknowledgement() -> Result<()> {
    let _ = Input::<String>::with_theme(&ColorfulTheme::default())
        .with_prompt("Press Enter to continue")
        .allow_empty(true)
        .interact_text()?;
    Ok(())
}
