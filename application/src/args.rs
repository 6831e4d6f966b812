//! [`Args`] definitions.

use clap::{Parser, Subcommand};

/// Server of the timesheet management system.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Path to the configuration file.
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,

    /// Operator command to run instead of serving.
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Args {
    /// Parses command line arguments.
    ///
    /// # Errors
    ///
    /// Errors if failed to parse command line arguments.
    pub fn parse() -> Result<Self, clap::Error> {
        <Self as Parser>::try_parse()
    }
}

/// Operator command.
#[derive(Clone, Debug, Subcommand)]
pub enum Command {
    /// Prints a session token of an existing user.
    IssueToken {
        /// Email of the user to issue the token for.
        #[arg(long)]
        email: String,
    },
}

#[cfg(test)]
mod spec {
    use clap::Parser as _;

    use super::{Args, Command};

    #[test]
    fn parses_issue_token() {
        let args = Args::try_parse_from([
            "application",
            "--config",
            "prod.toml",
            "issue-token",
            "--email",
            "boss@example.com",
        ])
        .unwrap();

        assert_eq!(args.config, "prod.toml");
        assert!(matches!(
            args.command,
            Some(Command::IssueToken { email }) if email == "boss@example.com",
        ));
    }

    #[test]
    fn serves_by_default() {
        let args = Args::try_parse_from(["application"]).unwrap();

        assert_eq!(args.config, "config.toml");
        assert!(args.command.is_none());
    }
}
