//! pagecast CLI

#![allow(clippy::print_stderr)]

use pagecast::cli::{self, EXIT_OK, exit_code_for, render_error};
use pagecast::commands;
use pagecast::tracing::{self, TracingConfig, TracingFormat};

fn main() {
    // Tracing may be unusable during a panic
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panicked: {panic_info}");
        eprintln!("Internal error occurred. Run with RUST_LOG=debug for more information.");
    }));

    let cli = cli::parse();

    let tracing_config = TracingConfig {
        format: if cli.json && cli.log_format == TracingFormat::Compact {
            TracingFormat::Json
        } else {
            cli.log_format
        },
        level: cli.level.into(),
        ..Default::default()
    };
    if let Err(e) = tracing::init_tracing(tracing_config) {
        eprintln!("Failed to initialize tracing: {e}");
    }

    let json = cli.json;
    let exit_code = match commands::execute(cli) {
        Ok(()) => EXIT_OK,
        Err(err) => {
            render_error(&err, json);
            exit_code_for(&err)
        }
    };
    std::process::exit(exit_code);
}
