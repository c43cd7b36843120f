mod cli;

use clap::{Parser, Subcommand};

use cli::check::CheckArgs;
use cli::gen::GenArgs;
use cli::names::NamesArgs;

#[derive(Parser)]
#[command(
    name = "skelc",
    version,
    about = "Skeleton kernel generator: specializes skeleton calls into backend kernels"
)]
struct Cli {
    /// Log every generation step
    #[arg(long, global = true)]
    verbose: bool,
    /// Only print warnings and errors
    #[arg(long, global = true)]
    silent: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate kernels and the main include fragment for a manifest
    Gen(GenArgs),
    /// Validate a manifest without writing anything
    Check(CheckArgs),
    /// Print the kernel names `gen` would produce
    Names(NamesArgs),
}

fn main() {
    let cli = Cli::parse();
    cli::logger::init(cli.verbose, cli.silent);

    match cli.command {
        Command::Gen(args) => cli::gen::cmd_gen(args),
        Command::Check(args) => cli::check::cmd_check(args),
        Command::Names(args) => cli::names::cmd_names(args),
    }
}
