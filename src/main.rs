//! Trama CLI — declarative network topology synthesis.

use clap::Parser;

fn main() {
    let cli = trama::cli::Cli::parse();
    if let Err(e) = trama::cli::dispatch(cli.command) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
