//! Command line definition

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(name = "ems", version, about = "Employee management from the terminal")]
pub struct Cli {
    /// Backend base URL, e.g. http://localhost:8000/api
    #[arg(long, env = "EMS_API_BASE_URL", global = true)]
    pub api_url: Option<String>,

    /// Directory holding the saved session and preferences
    #[arg(long, env = "EMS_DATA_DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Log filter (overrides RUST_LOG)
    #[arg(long, global = true)]
    pub log: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Commands that work without a session
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in and save the session
    Login {
        username: String,
        #[arg(long, env = "EMS_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Show or change the color theme
    Theme {
        #[arg(value_enum)]
        action: Option<ThemeAction>,
    },
    #[command(flatten)]
    Session(SessionCommand),
}

/// Commands that need a logged-in user
#[derive(Debug, Subcommand)]
pub enum SessionCommand {
    /// End the session
    Logout,
    /// Show the logged-in user
    Whoami,
    /// Update the logged-in user's profile
    Profile(ProfileArgs),
    /// Manage employees
    #[command(subcommand)]
    Employees(EmployeeCommand),
    /// List every division
    Divisions,
    /// Totals and the most recent employees
    Dashboard,
}

#[derive(Debug, Args)]
pub struct ProfileArgs {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub username: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub password: Option<String>,
    #[arg(long, requires = "password")]
    pub password_confirmation: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum EmployeeCommand {
    /// One page of the list
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, short)]
        search: Option<String>,
        /// Division id
        #[arg(long, short)]
        division: Option<String>,
    },
    /// Show one employee
    Show { id: String },
    Create(EmployeeArgs),
    Update {
        id: String,
        #[command(flatten)]
        fields: EmployeeArgs,
    },
    Delete { id: String },
}

#[derive(Debug, Args)]
pub struct EmployeeArgs {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
    /// Division id (defaults to the first division on create)
    #[arg(long)]
    pub division: Option<String>,
    #[arg(long)]
    pub position: Option<String>,
    /// Photo to upload
    #[arg(long)]
    pub image: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ThemeAction {
    Light,
    Dark,
    System,
    Toggle,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_employee_update() {
        let cli = Cli::try_parse_from([
            "ems", "employees", "update", "e-1", "--position", "Lead", "--api-url", "http://x/api",
        ])
        .unwrap();
        assert_eq!(cli.api_url.as_deref(), Some("http://x/api"));
        match cli.command {
            Command::Session(SessionCommand::Employees(EmployeeCommand::Update { id, fields })) => {
                assert_eq!(id, "e-1");
                assert_eq!(fields.position.as_deref(), Some("Lead"));
                assert!(fields.name.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_session_free_commands_stay_top_level() {
        let cli = Cli::try_parse_from(["ems", "theme", "dark"]).unwrap();
        assert!(matches!(cli.command, Command::Theme { action: Some(ThemeAction::Dark) }));

        let cli = Cli::try_parse_from(["ems", "whoami"]).unwrap();
        assert!(matches!(cli.command, Command::Session(SessionCommand::Whoami)));
    }

    #[test]
    fn test_confirmation_requires_password() {
        let result = Cli::try_parse_from(["ems", "profile", "--password-confirmation", "x"]);
        assert!(result.is_err());
    }
}
