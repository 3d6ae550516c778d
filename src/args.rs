//! These structs provide the CLI interface for the towbill CLI.

use crate::model::Role;
use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// towbill: Invoices and job records for a heavy-duty towing company.
///
/// Invoices are priced by vehicle weight: each selected recovery service has a rate in cents per
/// pound. Custom services and subcontractor work are added on top, and a fuel surcharge
/// percentage is applied to the services and custom services.
///
/// Run `towbill init` once to create the data directory, add a user with `towbill user add` and
/// then run `towbill serve` to start the REST API. The `calc` command prices an invoice from a
/// JSON file without the server.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the data directory, the configuration file and the database.
    ///
    /// This is the first command you should run. The database is seeded with the default towing
    /// service catalog. By default the data directory is $HOME/towbill; pass --home or set
    /// TOWBILL_HOME to put it somewhere else.
    Init(InitArgs),
    /// Run the REST API.
    Serve(ServeArgs),
    /// Compute an invoice from a JSON file.
    ///
    /// The file has the same shape as the body of `POST /api/invoices/calculate`:
    /// `{"job": {...}, "selectedServices": {...}, "customServices": [...],
    /// "subcontractors": [...]}`. It may also carry a `services` catalog to price against instead
    /// of the stored one.
    Calc(CalcArgs),
    /// View and edit the towing service catalog.
    #[command(subcommand)]
    Services(ServicesCommand),
    /// View, export and delete saved jobs.
    #[command(subcommand)]
    Jobs(JobsCommand),
    /// View and edit a user's company settings (invoice branding).
    #[command(subcommand)]
    Settings(SettingsCommand),
    /// Manage user accounts.
    #[command(subcommand)]
    User(UserCommand),
    /// Manage companies.
    #[command(subcommand)]
    Company(CompanyCommand),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where towbill data and configuration is held. Defaults to ~/towbill
    #[arg(long, env = "TOWBILL_HOME", default_value_t = default_towbill_home())]
    home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, home: PathBuf) -> Self {
        Self {
            log_level,
            home: home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn home(&self) -> &DisplayPath {
        &self.home
    }
}

/// (Not shown): Args for the `towbill init` command.
#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// The address the REST API listens on, saved to the config file. Defaults to 127.0.0.1:5000
    #[arg(long)]
    bind_addr: Option<String>,
}

impl InitArgs {
    pub fn new(bind_addr: Option<String>) -> Self {
        Self { bind_addr }
    }

    pub fn bind_addr(&self) -> Option<&str> {
        self.bind_addr.as_deref()
    }
}

/// (Not shown): Args for the `towbill serve` command.
#[derive(Debug, Parser, Clone)]
pub struct ServeArgs {
    /// Listen on this address instead of the one in the config file.
    #[arg(long)]
    bind_addr: Option<String>,
}

impl ServeArgs {
    pub fn new(bind_addr: Option<String>) -> Self {
        Self { bind_addr }
    }

    pub fn bind_addr(&self) -> Option<&str> {
        self.bind_addr.as_deref()
    }
}

/// How an invoice is printed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// A detailed plain text invoice.
    #[default]
    Text,
    /// The computed invoice as JSON.
    Json,
    /// A printable HTML page.
    Html,
    /// The three line share summary.
    Share,
}

serde_plain::derive_display_from_serialize!(OutputFormat);
serde_plain::derive_fromstr_from_deserialize!(OutputFormat);

/// (Not shown): Args for the `towbill calc` command.
#[derive(Debug, Parser, Clone)]
pub struct CalcArgs {
    /// The JSON file describing the job, the selected services and the line items.
    #[arg(long)]
    pub input: PathBuf,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Write the invoice to this file instead of stdout.
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Brand the invoice with this user's company settings instead of the defaults.
    #[arg(long)]
    pub user: Option<String>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ServicesCommand {
    /// List the catalog.
    List,
    /// Change the rate of a service, in cents per pound, e.g. 4.5
    SetRate(SetRateArgs),
}

/// (Not shown): Args for the `towbill services set-rate` command.
#[derive(Debug, Parser, Clone)]
pub struct SetRateArgs {
    pub id: i64,
    pub rate: String,
}

#[derive(Subcommand, Debug, Clone)]
pub enum JobsCommand {
    /// List saved jobs, newest first.
    List(JobsListArgs),
    /// Print the invoice of a saved job.
    Show(JobsShowArgs),
    /// Delete a job together with its line items and photos.
    Delete(JobIdArgs),
    /// Write every job to a CSV file.
    Export(JobsExportArgs),
}

/// (Not shown): Args for the `towbill jobs list` command.
#[derive(Debug, Parser, Clone)]
pub struct JobsListArgs {
    /// Only list this many of the most recent jobs.
    #[arg(long)]
    pub recent: Option<u32>,
}

/// (Not shown): Args for the `towbill jobs show` command.
#[derive(Debug, Parser, Clone)]
pub struct JobsShowArgs {
    pub id: i64,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Write the invoice to this file instead of stdout.
    #[arg(long)]
    pub output: Option<PathBuf>,
}

/// (Not shown): Args for commands that take a job id.
#[derive(Debug, Parser, Clone)]
pub struct JobIdArgs {
    pub id: i64,
}

/// (Not shown): Args for the `towbill jobs export` command.
#[derive(Debug, Parser, Clone)]
pub struct JobsExportArgs {
    #[arg(long)]
    pub output: PathBuf,
}

#[derive(Subcommand, Debug, Clone)]
pub enum SettingsCommand {
    /// Print a user's company settings.
    Show(SettingsShowArgs),
    /// Change a user's company settings. Fields that are not given are left unchanged; an empty
    /// value clears an address, phone or email.
    Set(SettingsSetArgs),
}

/// (Not shown): Args for the `towbill settings show` command.
#[derive(Debug, Parser, Clone)]
pub struct SettingsShowArgs {
    #[arg(long)]
    pub user: String,
}

/// (Not shown): Args for the `towbill settings set` command.
#[derive(Debug, Parser, Clone)]
pub struct SettingsSetArgs {
    #[arg(long)]
    pub user: String,

    #[arg(long)]
    pub company_name: Option<String>,

    #[arg(long)]
    pub company_subtitle: Option<String>,

    /// An emoji or short text shown when no logo image has been uploaded.
    #[arg(long)]
    pub company_logo: Option<String>,

    #[arg(long)]
    pub address: Option<String>,

    #[arg(long)]
    pub phone: Option<String>,

    #[arg(long)]
    pub email: Option<String>,

    /// The fuel surcharge percentage new jobs start with.
    #[arg(long)]
    pub default_fuel_surcharge: Option<f64>,

    /// Footer text. Use \n to separate lines.
    #[arg(long)]
    pub invoice_footer: Option<String>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum UserCommand {
    /// Create a user.
    Add(UserAddArgs),
    /// List users.
    List,
    /// Delete a user. Their jobs are kept.
    Delete(UsernameArgs),
    /// Change a user's role.
    Role(UserRoleArgs),
    /// Assign a user to a company, or remove them from their company when no id is given.
    Company(UserCompanyArgs),
}

/// (Not shown): Args for the `towbill user add` command.
#[derive(Debug, Parser, Clone)]
pub struct UserAddArgs {
    pub username: String,

    #[arg(long)]
    pub password: String,

    #[arg(long, default_value_t = Role::User)]
    pub role: Role,

    /// The id of the company the user belongs to.
    #[arg(long)]
    pub company: Option<i64>,
}

/// (Not shown): Args for commands that take a username.
#[derive(Debug, Parser, Clone)]
pub struct UsernameArgs {
    pub username: String,
}

/// (Not shown): Args for the `towbill user role` command.
#[derive(Debug, Parser, Clone)]
pub struct UserRoleArgs {
    pub username: String,
    /// admin or user
    pub role: Role,
}

/// (Not shown): Args for the `towbill user company` command.
#[derive(Debug, Parser, Clone)]
pub struct UserCompanyArgs {
    pub username: String,
    pub company_id: Option<i64>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum CompanyCommand {
    /// Create a company.
    Add(CompanyAddArgs),
    /// List companies.
    List,
    /// Delete a company. Its users are kept without a company.
    Delete(CompanyIdArgs),
}

/// (Not shown): Args for the `towbill company add` command.
#[derive(Debug, Parser, Clone)]
pub struct CompanyAddArgs {
    pub name: String,
}

/// (Not shown): Args for the `towbill company delete` command.
#[derive(Debug, Parser, Clone)]
pub struct CompanyIdArgs {
    pub id: i64,
}

fn default_towbill_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("towbill"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --home or TOWBILL_HOME instead of relying on the default \
                towbill home directory. If you continue using the program right now, you may have \
                problems!",
            );
            PathBuf::from("towbill")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn new(path: PathBuf) -> Self {
        Self(path)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_calc() {
        let args = Args::try_parse_from([
            "towbill",
            "--home",
            "/tmp/tb",
            "calc",
            "--input",
            "job.json",
            "--format",
            "html",
        ])
        .unwrap();
        assert_eq!(args.common().home().path(), Path::new("/tmp/tb"));
        match args.command() {
            Command::Calc(calc) => {
                assert_eq!(calc.format, OutputFormat::Html);
                assert!(calc.output.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_user_commands() {
        let args = Args::try_parse_from([
            "towbill", "user", "add", "dave", "--password", "pw", "--role", "admin",
        ])
        .unwrap();
        match args.command() {
            Command::User(UserCommand::Add(add)) => {
                assert_eq!(add.username, "dave");
                assert_eq!(add.role, Role::Admin);
                assert_eq!(add.company, None);
            }
            other => panic!("unexpected command {other:?}"),
        }

        let args = Args::try_parse_from(["towbill", "user", "company", "dave"]).unwrap();
        match args.command() {
            Command::User(UserCommand::Company(c)) => assert_eq!(c.company_id, None),
            other => panic!("unexpected command {other:?}"),
        }

        assert!(Args::try_parse_from(["towbill", "user", "role", "dave", "boss"]).is_err());
    }

    #[test]
    fn test_output_format_text() {
        assert_eq!(OutputFormat::Share.to_string(), "share");
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
    }
}
