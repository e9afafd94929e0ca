//! Logging setup for dupscan.
//!
//! Uses the `log` facade with an `env_logger` backend. The level comes from,
//! in priority order:
//!
//! 1. The `RUST_LOG` environment variable
//! 2. `--quiet` (errors only) or `-v`/`-vv` (debug/trace)
//! 3. Info
//!
//! Debug builds prefix each line with a timestamp, and with the module path
//! when verbose. Release builds print only the level and message.

use std::env;
use std::io::Write;

use env_logger::Builder;
use log::LevelFilter;

/// Initialize logging from the CLI verbosity flags.
///
/// Calling this more than once is harmless: later calls keep the logger
/// installed by the first.
///
/// ```rust,no_run
/// dupscan::logging::init_logging(1, false);
/// log::debug!("visible with -v");
/// ```
pub fn init_logging(verbose: u8, quiet: bool) {
    let from_env = env::var("RUST_LOG").ok();

    let mut builder = Builder::new();
    match from_env {
        Some(_) => {
            builder.parse_default_env();
        }
        None => {
            builder.filter_level(determine_level(verbose, quiet));
        }
    }
    configure_format(&mut builder, verbose);

    if builder.try_init().is_err() {
        log::trace!("Logger already initialized");
        return;
    }

    match from_env {
        Some(filter) => log::debug!("Log level taken from RUST_LOG={filter}"),
        None => log::debug!("Log level: {:?}", determine_level(verbose, quiet)),
    }
}

/// Map CLI flags to a level filter. `quiet` wins over `verbose`.
fn determine_level(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::Error;
    }
    match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

#[cfg(debug_assertions)]
fn configure_format(builder: &mut Builder, verbose: u8) {
    let show_module = verbose >= 1;
    builder.format(move |buf, record| {
        let level = record.level();
        let style = buf.default_level_style(level);
        write!(
            buf,
            "{} {style}{:<5}{style:#} ",
            buf.timestamp_seconds(),
            level
        )?;
        if show_module {
            write!(buf, "[{}] ", record.module_path().unwrap_or("unknown"))?;
        }
        writeln!(buf, "{}", record.args())
    });
}

#[cfg(not(debug_assertions))]
fn configure_format(builder: &mut Builder, _verbose: u8) {
    builder.format(|buf, record| {
        let level = record.level();
        let style = buf.default_level_style(level);
        writeln!(buf, "{style}{:<5}{style:#} {}", level, record.args())
    });
}
