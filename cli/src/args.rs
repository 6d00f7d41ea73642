//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "slotedit")]
#[command(about = "Edit page fields or role stylesheets slot by slot")]
#[command(version)]
#[command(
    after_help = "Logs go to ~/.slotedit/logs/slotedit.log; set RUST_LOG to adjust verbosity."
)]
pub(crate) struct Cli {
    /// Configuration file (defaults to ~/.slotedit/config.toml)
    #[arg(short, long, value_name = "PATH")]
    pub(crate) config: Option<PathBuf>,

    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub(crate) enum Command {
    /// Show every slot with its active and dirty state
    Status,
    /// Load a local file into a slot
    Import {
        /// Slot id
        slot: String,
        /// File to read
        file: PathBuf,
    },
    /// Write a slot's content to a file or stdout
    Export {
        /// Slot id
        slot: String,
        /// Output file (stdout if omitted)
        out: Option<PathBuf>,
    },
    /// Save one slot
    Save {
        /// Slot id
        slot: String,
    },
    /// Save every slot in one request
    SaveAll,
    /// Revert one slot (or all) to the server baseline
    Discard {
        /// Slot id (all slots if omitted)
        slot: Option<String>,
    },
    /// Replace all slots with server content
    Reload,
}

impl Command {
    /// Commands that are pointless without a fresh session token.
    pub(crate) fn needs_server(&self) -> bool {
        matches!(self, Command::Save { .. } | Command::SaveAll | Command::Reload)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use clap::{CommandFactory, Parser};

    use super::{Cli, Command};

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("slotedit").chain(args.iter().copied()))
    }

    #[test]
    fn definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn config_flag_in_each_form() {
        let long = parse(&["--config", "/tmp/a.toml", "status"]).expect("parse");
        assert_eq!(long.config, Some(PathBuf::from("/tmp/a.toml")));
        assert_eq!(long.command, Command::Status);

        let short = parse(&["-c", "b.toml", "save-all"]).expect("parse");
        assert_eq!(short.config, Some(PathBuf::from("b.toml")));
        assert_eq!(short.command, Command::SaveAll);
    }

    #[test]
    fn import_takes_slot_and_file() {
        let cli = parse(&["import", "head", "head.html"]).expect("parse");
        assert_eq!(
            cli.command,
            Command::Import {
                slot: "head".to_string(),
                file: PathBuf::from("head.html"),
            }
        );
    }

    #[test]
    fn discard_slot_is_optional() {
        assert_eq!(
            parse(&["discard"]).expect("parse").command,
            Command::Discard { slot: None }
        );
        assert_eq!(
            parse(&["discard", "tail"]).expect("parse").command,
            Command::Discard {
                slot: Some("tail".to_string())
            }
        );
    }

    #[test]
    fn missing_or_unknown_arguments_are_errors() {
        assert!(parse(&[]).is_err());
        assert!(parse(&["save"]).is_err());
        assert!(parse(&["status", "extra"]).is_err());
        assert!(parse(&["publish"]).is_err());
        assert!(parse(&["--verbose", "status"]).is_err());
    }

    #[test]
    fn only_network_commands_need_the_server() {
        assert!(Command::SaveAll.needs_server());
        assert!(Command::Reload.needs_server());
        assert!(!Command::Status.needs_server());
        assert!(!Command::Discard { slot: None }.needs_server());
    }
}
