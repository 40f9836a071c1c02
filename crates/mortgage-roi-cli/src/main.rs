mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use commands::compare::{BreakEvenArgs, CompareArgs, ScheduleArgs};
use commands::loan::SolveArgs;

/// Compare two mortgage options, reinvesting the payment difference
#[derive(Parser)]
#[command(
    name = "mroi",
    version,
    about = "Compare two mortgage options, reinvesting the payment difference",
    long_about = "Solve a loan for whichever of principal, term, rate or payment is left \
                  blank, then compare two loans month by month with the payment difference \
                  invested at an expected return. Reports net wealth, crossover months and \
                  the break-even reinvestment rate."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log solver and simulation details to stderr
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve a single loan for its one blank field
    Solve(SolveArgs),
    /// Compare two loan options with the payment difference reinvested
    Compare(CompareArgs),
    /// Month-by-month ledger for two loan options
    Schedule(ScheduleArgs),
    /// Reinvestment rate at which both strategies end level
    BreakEven(BreakEvenArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Solve(args) => commands::loan::run_solve(args),
        Commands::Compare(args) => commands::compare::run_compare(args),
        Commands::Schedule(args) => commands::compare::run_schedule(args),
        Commands::BreakEven(args) => commands::compare::run_break_even(args),
        Commands::Version => {
            println!("mroi {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
