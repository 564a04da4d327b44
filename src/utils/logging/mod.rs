//! Logging utilities for the client and its command line tool.
//!
//! Environment variables used by [`setup_logging`]:
//! - RUST_LOG: filter directives; default is "info"
//! - LOG_MODE: "stderr" (default) or "file"
//! - LOG_DATA_DIR: directory for log files; default is "logs/"

pub mod error;

use std::{env, fs::create_dir_all, path::Path};
use tracing::info;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

/// File name prefix used for daily rolled log files
pub const LOG_FILE_PREFIX: &str = "poly-client.log";

fn env_filter() -> EnvFilter {
	EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

fn create_log_format(with_ansi: bool) -> fmt::format::Format<fmt::format::Compact> {
	fmt::format()
		.with_level(true)
		.with_target(true)
		.with_thread_ids(false)
		.with_thread_names(false)
		.with_ansi(with_ansi)
		.compact()
}

/// Resolves the directory that file logging writes into
pub fn log_directory() -> String {
	let log_dir = env::var("LOG_DATA_DIR").unwrap_or_else(|_| "logs/".to_string());
	format!("{}/", log_dir.trim_end_matches('/'))
}

/// Sets up logging by reading configuration from environment variables.
///
/// Logs go to stderr, leaving stdout to command output. With `LOG_MODE=file` a daily
/// rolling file is written under [`log_directory`] without ANSI colours.
pub fn setup_logging() -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
	let log_mode = env::var("LOG_MODE").unwrap_or_else(|_| "stderr".to_string());

	if log_mode.eq_ignore_ascii_case("file") {
		let log_dir = log_directory();
		create_dir_all(Path::new(&log_dir))?;

		let file_appender = tracing_appender::rolling::daily(&log_dir, LOG_FILE_PREFIX);

		tracing_subscriber::registry()
			.with(env_filter())
			.with(
				fmt::layer()
					.with_writer(file_appender)
					.event_format(create_log_format(false))
					.fmt_fields(fmt::format::PrettyFields::new()),
			)
			.try_init()?;
	} else {
		setup_logging_with_writer(std::io::stderr)?;
	}

	info!("Logging is successfully configured (mode: {})", log_mode);
	Ok(())
}

/// Sets up logging with a custom writer
///
/// Used by [`setup_logging`] for stderr and by tests that capture output.
pub fn setup_logging_with_writer<W>(
	writer: W,
) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>>
where
	W: for<'writer> tracing_subscriber::fmt::MakeWriter<'writer> + Send + Sync + 'static,
{
	tracing_subscriber::registry()
		.with(env_filter())
		.with(
			fmt::layer()
				.with_writer(writer)
				.event_format(create_log_format(true))
				.fmt_fields(fmt::format::PrettyFields::new()),
		)
		.try_init()?;
	Ok(())
}
