mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::mortgage::{BalanceArgs, PaymentArgs, RemainingTermArgs, ScheduleArgs};

/// Mortgage amortization calculations with decimal precision
#[derive(Parser)]
#[command(
    name = "amort",
    version,
    about = "Mortgage amortization calculations with decimal precision",
    long_about = "A CLI for generating fixed-payment mortgage amortization schedules, \
                  contractual payment amounts, outstanding balances, and remaining-term \
                  estimates from loan terms supplied as JSON."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the full amortization schedule for a loan
    Schedule(ScheduleArgs),
    /// Calculate the fixed periodic payment for a balance, rate, and term
    Payment(PaymentArgs),
    /// Outstanding balance as of a date
    Balance(BalanceArgs),
    /// Estimate remaining whole periods from a balance and fixed payment
    RemainingTerm(RemainingTermArgs),
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

fn main() {
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Schedule(args) => commands::mortgage::run_schedule(args),
        Commands::Payment(args) => commands::mortgage::run_payment(args),
        Commands::Balance(args) => commands::mortgage::run_balance(args),
        Commands::RemainingTerm(args) => commands::mortgage::run_remaining_term(args),
        Commands::Version => {
            println!("amort {}", env!("CARGO_PKG_VERSION"));
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
