use clap::Parser;
use std::process::ExitCode;
use towbill::args::{
    Args, Command, CompanyCommand, JobsCommand, ServicesCommand, SettingsCommand, UserCommand,
};
use towbill::{commands, Config, Result};
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().home().path();

    // Route to appropriate command handler
    let _: () = match args.command() {
        Command::Init(init_args) => commands::init(home, init_args.bind_addr()).await?.print(),

        Command::Serve(serve_args) => {
            let config = Config::load(home).await?;
            commands::serve(config, serve_args.bind_addr())
                .await?
                .print()
        }

        Command::Calc(calc_args) => {
            let config = Config::load(home).await?;
            commands::calc(config, calc_args.clone()).await?.print()
        }

        Command::Services(services_command) => {
            let config = Config::load(home).await?;
            match services_command {
                ServicesCommand::List => commands::services_list(config).await?.print(),
                ServicesCommand::SetRate(args) => {
                    commands::services_set_rate(config, args.id, &args.rate)
                        .await?
                        .print()
                }
            }
        }

        Command::Jobs(jobs_command) => {
            let config = Config::load(home).await?;
            match jobs_command {
                JobsCommand::List(args) => commands::jobs_list(config, args.recent).await?.print(),
                JobsCommand::Show(args) => commands::jobs_show(config, args.clone()).await?.print(),
                JobsCommand::Delete(args) => commands::jobs_delete(config, args.id).await?.print(),
                JobsCommand::Export(args) => {
                    commands::jobs_export(config, &args.output).await?.print()
                }
            }
        }

        Command::Settings(settings_command) => {
            let config = Config::load(home).await?;
            match settings_command {
                SettingsCommand::Show(args) => {
                    commands::settings_show(config, &args.user).await?.print()
                }
                SettingsCommand::Set(args) => {
                    commands::settings_set(config, args.clone()).await?.print()
                }
            }
        }

        Command::User(user_command) => {
            let config = Config::load(home).await?;
            match user_command {
                UserCommand::Add(args) => commands::user_add(config, args.clone()).await?.print(),
                UserCommand::List => commands::user_list(config).await?.print(),
                UserCommand::Delete(args) => {
                    commands::user_delete(config, &args.username).await?.print()
                }
                UserCommand::Role(args) => commands::user_role(config, &args.username, args.role)
                    .await?
                    .print(),
                UserCommand::Company(args) => {
                    commands::user_company(config, &args.username, args.company_id)
                        .await?
                        .print()
                }
            }
        }

        Command::Company(company_command) => {
            let config = Config::load(home).await?;
            match company_command {
                CompanyCommand::Add(args) => commands::company_add(config, &args.name).await?.print(),
                CompanyCommand::List => commands::company_list(config).await?.print(),
                CompanyCommand::Delete(args) => {
                    commands::company_delete(config, args.id).await?.print()
                }
            }
        }
    };
    Ok(())
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use default log level for this crate only.
            EnvFilter::new(format!(
                "{}={},{}={}",
                env!("CARGO_CRATE_NAME"),
                level,
                env!("CARGO_BIN_NAME"),
                level
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
