mod config;
#[cfg(windows)]
mod dbghelp;
mod debugger;
mod dump;
mod logging;
mod pe;
mod symsrv;

use std::process::ExitCode;

use clap::Parser;
use clap::error::ErrorKind;
use sosfetch_shared::workflow::{self, Outcome, Request};
use sosfetch_shared::{Bitness, FileOutcome, Locator, Result, SymbolService};
use tracing::debug;

use config::{Backend, Cli, USAGE, normalize_args};
use debugger::ProcessDebugger;
use dump::MinidumpInspector;
use symsrv::SymbolServer;

fn main() -> ExitCode {
    let args = normalize_args(std::env::args_os());
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => {
            println!("{}", USAGE);
            if e.kind() != ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand {
                println!();
                println!("{}", e.render());
            }
            return ExitCode::SUCCESS;
        }
    };

    if let Err(e) = logging::init_logging(cli.log_level.as_deref(), cli.log_format) {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    let code = match execute(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    };

    if cli.pause {
        pause();
    }

    code
}

/// Pick the symbol backend and run the flow with it.
fn execute(cli: &Cli) -> Result<ExitCode> {
    match cli.backend() {
        Backend::Http => run_with(cli, SymbolServer::new(cli.symbol_server.as_str())),
        #[cfg(windows)]
        Backend::Dbghelp => {
            println!(
                "\nPlease make sure that you have dbghelp.dll and symsrv.dll accessible\n\
                 to the application. Otherwise, we will not be able to retrieve files\n\
                 from the Microsoft symbol server.\n"
            );
            run_with(cli, dbghelp::DbgHelp::new(cli.symbol_path.clone()))
        }
        #[cfg(not(windows))]
        Backend::Dbghelp => Err(sosfetch_shared::Error::SymbolInit(
            "the dbghelp backend is only available on Windows, use --backend http".into(),
        )),
    }
}

fn run_with<S: SymbolService>(cli: &Cli, service: S) -> Result<ExitCode> {
    let (mode, dump) = cli.command.target();
    let request = Request {
        mode,
        dump: dump.to_path_buf(),
        storage_location: cli.cache_dir.clone(),
        host: Bitness::current(),
    };
    debug!(?request, backend = ?cli.backend(), "starting");

    let locator = Locator::new(service)
        .with_retry_policy(cli.retry_policy())
        .with_completeness(cli.completeness());
    let debugger = ProcessDebugger::new(&cli.debugger);

    let outcome = workflow::run(&request, &MinidumpInspector, &locator, &debugger)?;
    Ok(report(&outcome))
}

fn report(outcome: &Outcome) -> ExitCode {
    match outcome {
        Outcome::Rejected(rejection) => {
            println!("{}", rejection);
            ExitCode::FAILURE
        }
        Outcome::Local {
            version,
            dac_location,
            ..
        } => {
            println!();
            println!("CLR version: {}", version);
            println!("dacLocation: {}", dac_location.display());
            println!("The debug support files are available on the local machine.");
            ExitCode::SUCCESS
        }
        Outcome::Resolved {
            version,
            resolution,
            launched,
        } => {
            println!("CLR version: {}", version);
            for file in &resolution.files {
                match &file.outcome {
                    FileOutcome::Resolved(path) => println!("  [OK] {}", path.display()),
                    FileOutcome::Exhausted {
                        attempts,
                        last_error,
                    } => println!(
                        "*** Could not retrieve {} ({}) after {} attempts: {}",
                        file.file.identity.file_name, file.file.destination, attempts, last_error
                    ),
                    FileOutcome::CopyFailed { reason, .. } => println!(
                        "*** Could not copy {} into {}: {}",
                        file.file.destination,
                        resolution.directory.display(),
                        reason
                    ),
                }
            }

            if launched.is_none() {
                let directory = resolution.directory.display();
                println!("Debug support files are now available in {}", directory);
                println!(
                    "Use .load {} to load SOS and .cordll -se -lp {} to set up DAC",
                    resolution.directory.join("sos").display(),
                    directory
                );
            }
            ExitCode::SUCCESS
        }
    }
}

fn pause() {
    println!("Press Enter to exit...");
    let mut line = String::new();
    let _ = std::io::stdin().read_line(&mut line);
}
