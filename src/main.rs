use clap::Parser;
use vaultex::cli::{Cli, run};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
