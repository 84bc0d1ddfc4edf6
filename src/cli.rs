//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::models::{ManagedRole, UserId};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// PortfolioX - terminal dashboards for academic portfolios
///
/// Fetches students, faculty and portfolio items from a PortfolioX backend
/// and renders the admin and faculty dashboards as text, Markdown or JSON.
///
/// Examples:
///   portfoliox login --username admin
///   portfoliox --token $TOKEN admin-home
///   portfoliox students --search ada --format markdown -o students.md
///   portfoliox student 42
///   portfoliox approve 17 --reject
///   portfoliox --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Base URL of the PortfolioX backend
    ///
    /// Overrides `api.base_url` from .portfoliox.toml.
    #[arg(long, global = true, value_name = "URL", env = "PORTFOLIOX_API_URL")]
    pub api_url: Option<String>,

    /// Bearer token for the session
    #[arg(
        long,
        global = true,
        value_name = "TOKEN",
        env = "PORTFOLIOX_TOKEN",
        hide_env_values = true
    )]
    pub token: Option<String>,

    /// Id of the signed-in user (used for the greeting on faculty-home)
    #[arg(long, global = true, value_name = "ID", env = "PORTFOLIOX_USER_ID")]
    pub user_id: Option<UserId>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .portfoliox.toml in the current directory
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format (text, markdown, json)
    #[arg(long, global = true, default_value = "text", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Write the report to a file instead of stdout
    #[arg(short, long, global = true, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Number of entries in the recent activity feed
    #[arg(long, global = true, value_name = "COUNT")]
    pub recent_limit: Option<usize>,

    /// Hide the progress bar while fetching per-student data
    #[arg(long, global = true)]
    pub no_progress: bool,

    /// Exit with code 2 when any listed student's portfolio is stale
    #[arg(long, global = true)]
    pub fail_on_stale: bool,

    /// Generate a default .portfoliox.toml configuration file
    #[arg(long)]
    pub init_config: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Dashboard pages and admin actions.
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Sign in and print the session token
    Login {
        #[arg(short, long)]
        username: String,
        #[arg(long, env = "PORTFOLIOX_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// End the session and print the shell lines that forget the token
    Logout,
    /// Admin home: user totals, pending approvals, activity and growth
    AdminHome,
    /// Faculty home: student and portfolio totals with recent activity
    FacultyHome,
    /// Student table with portfolio counts and recency status
    Students {
        /// Filter by name or email (case-insensitive)
        #[arg(short, long)]
        search: Option<String>,
    },
    /// One student's portfolio: projects, microcredentials, timeline, skills
    Student { id: UserId },
    /// Faculty accounts and their registration status
    Faculty,
    /// Faculty registrations awaiting approval
    Pending,
    /// Approve (or reject) a faculty registration
    Approve {
        id: UserId,
        /// Reject instead of approving
        #[arg(long)]
        reject: bool,
    },
    /// Issue a one-time temporary password
    ResetPassword { role: RoleArg, id: UserId },
    /// Permanently delete an account and its data
    Delete {
        role: RoleArg,
        id: UserId,
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
    /// All portfolio items grouped by category
    Portfolios,
    /// Skill distribution across all portfolios, or one student's
    Skills {
        #[arg(long, value_name = "ID")]
        student: Option<UserId>,
    },
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Plain text for the terminal (default)
    #[default]
    Text,
    /// Markdown tables
    Markdown,
    /// JSON format
    Json,
}

/// Account kind for admin actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum RoleArg {
    Student,
    Faculty,
}

impl From<RoleArg> for ManagedRole {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::Student => ManagedRole::Student,
            RoleArg::Faculty => ManagedRole::Faculty,
        }
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        let Some(ref command) = self.command else {
            return Err("A command is required. Run with --help to list commands".to_string());
        };

        if let Some(ref url) = self.api_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("API URL must start with 'http://' or 'https://'".to_string());
            }
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if self.recent_limit == Some(0) {
            return Err("Recent limit must be at least 1".to_string());
        }

        if let Command::Delete { yes: false, .. } = command {
            return Err("Refusing to delete without --yes".to_string());
        }

        if let Command::Login { ref username, .. } = command {
            if username.trim().is_empty() {
                return Err("Username must not be empty".to_string());
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args(command: Command) -> Args {
        Args {
            api_url: None,
            token: Some("tok".to_string()),
            user_id: None,
            config: None,
            verbose: false,
            quiet: false,
            format: OutputFormat::Text,
            output: None,
            timeout: None,
            recent_limit: None,
            no_progress: false,
            fail_on_stale: false,
            init_config: false,
            command: Some(command),
        }
    }

    #[test]
    fn test_parse_subcommand() {
        let args = Args::try_parse_from([
            "portfoliox",
            "--token",
            "abc",
            "students",
            "--search",
            "ada",
            "--format",
            "json",
        ])
        .unwrap();

        assert_eq!(args.token.as_deref(), Some("abc"));
        assert_eq!(args.format, OutputFormat::Json);
        assert_eq!(
            args.command,
            Some(Command::Students {
                search: Some("ada".to_string())
            })
        );
    }

    #[test]
    fn test_parse_reset_password() {
        let args =
            Args::try_parse_from(["portfoliox", "reset-password", "faculty", "12"]).unwrap();
        assert_eq!(
            args.command,
            Some(Command::ResetPassword {
                role: RoleArg::Faculty,
                id: 12
            })
        );
        assert_eq!(ManagedRole::from(RoleArg::Faculty), ManagedRole::Faculty);
    }

    #[test]
    fn test_validation_requires_command() {
        let mut args = make_args(Command::AdminHome);
        args.command = None;
        assert!(args.validate().is_err());

        args.init_config = true;
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_invalid_url() {
        let mut args = make_args(Command::AdminHome);
        args.api_url = Some("localhost:8080".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args(Command::Pending);
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_delete_needs_confirmation() {
        let args = make_args(Command::Delete {
            role: RoleArg::Student,
            id: 3,
            yes: false,
        });
        assert!(args.validate().is_err());

        let args = make_args(Command::Delete {
            role: RoleArg::Student,
            id: 3,
            yes: true,
        });
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_zero_limits() {
        let mut args = make_args(Command::FacultyHome);
        args.recent_limit = Some(0);
        assert!(args.validate().is_err());

        args.recent_limit = None;
        args.timeout = Some(0);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args(Command::AdminHome);
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
