use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};

use case_mover::config::{Args, Config};
use case_mover::print_error;

/// Exit code for a clap parse result: help and version output are clean
/// exits, any other argument error is a startup failure. Code 2 is reserved
/// for runs that completed with ERROR records.
const fn usage_exit_code(kind: ErrorKind) -> u8 {
    match kind {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
        _ => 1,
    }
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let code = usage_exit_code(e.kind());
            let _ = e.print();
            return ExitCode::from(code);
        }
    };
    if let Some(shell) = args.completion {
        case_mover::generate_shell_completion(shell, Args::command(), "casemover");
        return ExitCode::SUCCESS;
    }

    let config = match Config::from_args(args) {
        Ok(config) => config,
        Err(e) => {
            print_error!("{e:#}");
            return ExitCode::from(1);
        }
    };

    match case_mover::run::run(&config) {
        // ERROR records mean the run finished but some folders need attention.
        Ok(outcome) if outcome.error_count() > 0 => ExitCode::from(2),
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            print_error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
