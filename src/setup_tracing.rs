use time::format_description::parse;
use tracing_subscriber::{filter::Directive, fmt::time::OffsetTime, EnvFilter};

use crate::cli::Commands;

/// Third-party targets kept at `warn` unless `RUST_LOG` says otherwise.
const QUIET_TARGETS: [&str; 3] = ["hyper_util=warn", "reqwest=warn", "lettre=warn"];

pub fn setup_tracing_for_command(command: Option<&Commands>, server_log_level: &str) {
    // CLI commands stay quiet, the server logs at the configured level.
    // RUST_LOG overrides both.
    let default_level = match command {
        Some(Commands::CheckConfig) => "warn",
        Some(Commands::Version) => "error",
        Some(Commands::Serve) | None => server_log_level,
    };

    let env_filter = QUIET_TARGETS
        .iter()
        .filter_map(|target| target.parse::<Directive>().ok())
        .fold(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
            EnvFilter::add_directive,
        );

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_level(true)
        .with_ansi(true)
        .compact();

    match parse("[hour]:[minute]:[second].[subsecond digits:2]") {
        Ok(format) => builder
            .with_timer(OffsetTime::new(
                time::UtcOffset::current_local_offset().unwrap_or(time::UtcOffset::UTC),
                format,
            ))
            .init(),
        Err(_) => builder.init(),
    }
}
