//! Tool-call adapter for dfanalyst.
//!
//! Translates external calls into direct invocations of the
//! [`dfanalyst_core::Analyst`] facade. Two transports are provided:
//! JSON-RPC 2.0 over stdio ([`rpc`]) and a line-oriented shell ([`shell`]).
//! Both dispatch through [`tools::call_tool`].

pub mod rpc;
pub mod shell;
pub mod tools;

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use dfanalyst_core::analysis::{GroupOrder, MissingKeyPolicy};
use dfanalyst_core::logging::LogFormat;
use dfanalyst_core::{AnalystConfig, AnalystError, Result};

/// Command-line interface.
#[derive(Parser, Debug)]
#[command(name = "dfanalyst")]
#[command(about = "Single-dataset analysis tools over JSON-RPC or an interactive shell")]
#[command(
    long_about = "Loads one tabular dataset per session and answers analysis calls against it:
schema inference, missing-value reporting, profiling, correlation, outlier
detection, grouped aggregation and report export.

Logs are written to stderr; stdout carries protocol messages only."
)]
#[command(version)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Flags shared by every subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Log line format (text or json)
    #[arg(long, value_name = "FORMAT", default_value = "text", value_parser = parse_log_format, global = true)]
    pub log_format: LogFormat,

    /// JSON configuration file
    #[arg(long, value_name = "FILE", env = "DFANALYST_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Handling of missing group keys (group or drop)
    #[arg(long, value_name = "POLICY", global = true)]
    pub missing_keys: Option<MissingKeyPolicy>,

    /// Output order of groups (sorted or first_appearance)
    #[arg(long, value_name = "ORDER", global = true)]
    pub group_order: Option<GroupOrder>,

    /// Disable memoization of analysis results
    #[arg(long, global = true)]
    pub no_cache: bool,

    /// Rows echoed back by load_data
    #[arg(long, value_name = "N", global = true)]
    pub preview_rows: Option<usize>,
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Serve tool calls as JSON-RPC 2.0 over stdin/stdout
    Serve,
    /// Interactive prompt: `<tool> [json-arguments]`
    Shell,
    /// List the available tools and their parameters
    Tools,
}

fn parse_log_format(value: &str) -> std::result::Result<LogFormat, String> {
    match value.trim().to_lowercase().as_str() {
        "text" => Ok(LogFormat::Text),
        "json" => Ok(LogFormat::Json),
        other => Err(format!("unknown log format '{}' (expected text or json)", other)),
    }
}

/// Builds the session configuration from the config file and flag overrides.
///
/// # Errors
/// `Configuration` if the file cannot be read or fails validation.
pub fn build_config(args: &GlobalArgs) -> Result<AnalystConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path).map_err(|e| {
                AnalystError::configuration(format!(
                    "Failed to read config file {}: {}",
                    path.display(),
                    e
                ))
            })?;
            AnalystConfig::from_json_str(&text)?
        }
        None => AnalystConfig::default(),
    };

    if let Some(policy) = args.missing_keys {
        config.groupby = config.groupby.with_missing_keys(policy);
    }
    if let Some(order) = args.group_order {
        config.groupby = config.groupby.with_order(order);
    }
    if args.no_cache {
        config = config.with_cache_enabled(false);
    }
    if let Some(rows) = args.preview_rows {
        config = config.with_preview_rows(rows);
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::io::Write;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_flags() {
        let cli = Cli::try_parse_from([
            "dfanalyst",
            "-vv",
            "--log-format",
            "json",
            "--missing-keys",
            "drop",
            "--group-order",
            "first_appearance",
            "--no-cache",
            "serve",
        ])
        .unwrap();

        assert_eq!(cli.command, Command::Serve);
        assert_eq!(cli.global.verbose, 2);
        assert_eq!(cli.global.log_format, LogFormat::Json);
        assert_eq!(cli.global.missing_keys, Some(MissingKeyPolicy::Drop));
        assert_eq!(cli.global.group_order, Some(GroupOrder::FirstAppearance));
        assert!(cli.global.no_cache);
    }

    #[test]
    fn test_rejects_unknown_log_format() {
        assert!(Cli::try_parse_from(["dfanalyst", "--log-format", "xml", "shell"]).is_err());
    }

    #[test]
    fn test_build_config_applies_overrides() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"preview_rows": 3, "groupby": {{"order": "first_appearance"}}}}"#)
            .unwrap();

        let args = GlobalArgs {
            config: Some(file.path().to_path_buf()),
            missing_keys: Some(MissingKeyPolicy::Drop),
            no_cache: true,
            ..GlobalArgs::default()
        };
        let config = build_config(&args).unwrap();

        assert_eq!(config.preview_rows, 3);
        assert_eq!(config.groupby.order, GroupOrder::FirstAppearance);
        assert_eq!(config.groupby.missing_keys, MissingKeyPolicy::Drop);
        assert!(!config.cache_enabled);
    }

    #[test]
    fn test_build_config_missing_file() {
        let args = GlobalArgs {
            config: Some(PathBuf::from("/nonexistent/dfanalyst.json")),
            ..GlobalArgs::default()
        };
        let error = build_config(&args).unwrap_err();
        assert!(matches!(error, AnalystError::Configuration { .. }));
    }
}
