//! planrun CLI entry point

use clap::Parser;

use planrun::cli::{run_cli, Cli};

fn main() {
    let cli = Cli::parse();
    std::process::exit(run_cli(cli));
}
