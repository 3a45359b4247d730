#![allow(clippy::print_stderr)]

use anyhow::Result;
use clap::Parser;
use std::io::IsTerminal;

use patchref::cli::args::{CliArgs, Command, OutputFormat};
use patchref::cli::{driver, reporter};

const EXIT_SUCCESS: i32 = 0;
const EXIT_DIAGNOSTICS_REPORTED: i32 = 1;

fn main() -> Result<()> {
    // Initialize tracing if PATCHREF_LOG or RUST_LOG is set.
    patchref::tracing_config::init_tracing();

    let args = CliArgs::parse();
    match args.command {
        Command::Check(check) => {
            let diagnostics = driver::check(&check)?;
            match check.format {
                OutputFormat::Json => println!("{}", reporter::render_json(&diagnostics)?),
                OutputFormat::Text => {
                    let color = !check.no_color && std::io::stdout().is_terminal();
                    let mut reporter = reporter::Reporter::new(color);
                    if !diagnostics.is_empty() {
                        println!("{}", reporter.render(&diagnostics));
                        println!();
                        println!("{}", reporter.summary(diagnostics.len()));
                    }
                }
            }
            let status = if diagnostics.is_empty() {
                EXIT_SUCCESS
            } else {
                EXIT_DIAGNOSTICS_REPORTED
            };
            std::process::exit(status);
        }
    }
}
