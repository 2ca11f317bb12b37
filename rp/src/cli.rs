//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

/// Roadplan - weekly resource planning from the command line
#[derive(Parser)]
#[command(
    name = "rp",
    about = "Check, plan, diff and sync weekly resource-planning snapshots",
    version,
    after_help = "Logs are written to: ~/.local/share/roadplan/logs/roadplan.log"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Validate a snapshot: blocker cycles, order chains, week lengths
    Check {
        /// Snapshot JSON file
        file: PathBuf,
    },

    /// Recompute auto plans and report overloaded weeks
    Plan {
        /// Snapshot JSON file
        file: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,

        /// Write the replanned snapshot back to the file
        #[arg(short, long)]
        write: bool,
    },

    /// Print the change log between two snapshots
    Diff {
        /// Snapshot before the edits
        old: PathBuf,

        /// Snapshot after the edits
        new: PathBuf,
    },

    /// Send the changes between two snapshots to the server
    Push {
        /// Snapshot the server last saw (its version is sent)
        old: PathBuf,

        /// Edited snapshot
        new: PathBuf,
    },

    /// Fetch the server snapshot
    Pull {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

/// Output format for plan reports
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "OutputFormat::from_str: called");
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {}. Use text or json", s)),
        }
    }
}

/// Location of the log file
pub fn get_log_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("roadplan")
        .join("logs")
        .join("roadplan.log")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_parse() {
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("TEXT".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert!("table".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_parse_plan_command() {
        let cli = Cli::try_parse_from(["rp", "-l", "debug", "plan", "data.json", "--format", "json", "--write"]).unwrap();
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        match cli.command {
            Command::Plan { file, format, write } => {
                assert_eq!(file, PathBuf::from("data.json"));
                assert_eq!(format, OutputFormat::Json);
                assert!(write);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_log_path_file_name() {
        assert!(get_log_path().ends_with("roadplan/logs/roadplan.log"));
    }
}
