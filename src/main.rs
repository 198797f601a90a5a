mod addr;
mod cli;
mod config;
mod correlate;
mod decode;
mod dedup;
mod error;
mod filter;
mod model;
mod output;
mod reader;
mod resolve;
mod scan;

use std::io;

use clap::Parser;
use cli::CliArgs;
use config::Config;
use scan::Scanner;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: bool) {
    let level = if verbose {
        LevelFilter::INFO
    } else {
        LevelFilter::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_target(false)
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .init();
}

fn main() {
    let args = CliArgs::parse();
    init_tracing(args.verbose);

    let config = match Config::from_cli(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    let interval = config.interval;
    let mut scanner = Scanner::new(config);

    let stdout = io::stdout();
    let stderr = io::stderr();
    let mut exit_code = 0;
    loop {
        let report = match scanner.run_cycle(&mut stdout.lock(), &mut stderr.lock()) {
            Ok(report) => report,
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        };
        tracing::info!(
            rows = report.rows,
            missing = report.missing.len(),
            failures = report.failures.len(),
            "cycle complete"
        );
        for failure in &report.failures {
            eprintln!("rnetstat: {}", failure);
        }
        exit_code = exit_code.max(report.exit_code());

        match interval {
            Some(delay) if report.failures.is_empty() => std::thread::sleep(delay),
            _ => break,
        }
    }

    std::process::exit(exit_code);
}
