//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `watchdog_core` linkage with deterministic output.
//! - `bootstrap <path>` creates every entity table in a SQLite file.

use log::error;
use std::process::ExitCode;
use watchdog_core::{init_logging, open_store, EntityKind, FundService, TableEngine, WatchdogConfig};

fn main() -> ExitCode {
    println!("watchdog_core ping={}", watchdog_core::ping());
    println!("watchdog_core version={}", watchdog_core::core_version());

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.as_slice() {
        [] => ExitCode::SUCCESS,
        [command, path] if command == "bootstrap" => match bootstrap(path) {
            Ok(()) => ExitCode::SUCCESS,
            Err(message) => {
                error!("event=cli_bootstrap module=cli status=error error={message}");
                eprintln!("bootstrap failed: {message}");
                ExitCode::FAILURE
            }
        },
        _ => {
            eprintln!("usage: watchdog_cli [bootstrap <db-path>]");
            ExitCode::from(2)
        }
    }
}

fn bootstrap(path: &str) -> Result<(), String> {
    let config = WatchdogConfig::from_env().map_err(|err| err.to_string())?;
    if let Some(log) = config.log.as_ref() {
        init_logging(log).map_err(|err| err.to_string())?;
    }

    let store = open_store(path).map_err(|err| err.to_string())?;
    let service = FundService::new(TableEngine::new(store));
    service.bootstrap().map_err(|err| err.to_string())?;

    for kind in EntityKind::ALL {
        println!("table={} short={}", kind.table_name(), kind.short_name());
    }
    Ok(())
}
