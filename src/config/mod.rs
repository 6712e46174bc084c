pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::app::Stage;
#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "vbrick-etl")]
#[command(about = "Collects Vbrick video and webcast analytics and shapes them for reporting")]
pub struct CliConfig {
    /// Path to the TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Log CPU and memory usage per phase
    #[arg(long, global = true)]
    pub monitor: bool,

    /// Validate the configuration and show what would run, without running it
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Fetch active videos and their viewing statistics
    Videos,
    /// Fetch webcasts and attendance, then categorize them
    Webcasts,
    /// Join the webcast and video summaries
    Merge,
    /// Reshape the merged summary into one row per dimension value
    Normalize,
    /// All four stages in order
    RunAll,
}

#[cfg(feature = "cli")]
impl Command {
    pub fn stages(&self) -> Vec<Stage> {
        match self {
            Command::Videos => vec![Stage::Videos],
            Command::Webcasts => vec![Stage::Webcasts],
            Command::Merge => vec![Stage::Merge],
            Command::Normalize => vec![Stage::Normalize],
            Command::RunAll => Stage::ALL.to_vec(),
        }
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flags_after_subcommand() {
        let cli = CliConfig::try_parse_from([
            "vbrick-etl",
            "merge",
            "--config",
            "etl.toml",
            "--verbose",
        ])
        .unwrap();

        assert_eq!(cli.command, Command::Merge);
        assert_eq!(cli.config, Some(PathBuf::from("etl.toml")));
        assert!(cli.verbose);
        assert!(!cli.dry_run);
    }

    #[test]
    fn test_run_all_expands_to_every_stage() {
        let cli = CliConfig::try_parse_from(["vbrick-etl", "--dry-run", "run-all"]).unwrap();
        assert!(cli.dry_run);
        assert_eq!(cli.command.stages(), Stage::ALL.to_vec());
    }

    #[test]
    fn test_subcommand_is_required() {
        assert!(CliConfig::try_parse_from(["vbrick-etl"]).is_err());
    }
}
