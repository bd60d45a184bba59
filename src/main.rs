mod cli;
mod data;
mod output;
mod profile;

use std::process::ExitCode;

use env_logger::Env;

fn main() -> ExitCode {
    // Per-file skip warnings go to stderr even without RUST_LOG set.
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match cli::run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
