mod args;
mod cli;
mod commands;
mod logging;

use std::env;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();

    match cli::run(args).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            if let Some(source) = e.source() {
                eprintln!("Caused by: {source}");
            }
            ExitCode::FAILURE
        }
    }
}
