pub mod client;
pub mod commands;
pub mod error;
pub mod output;

pub use client::AdminClient;
pub use commands::{BlocksCommand, KillCommand, StatsCommand, TestAlertCommand};
pub use error::{CliError, CliResult};
pub use output::{OutputFormat, format_timestamp, truncate_string};
