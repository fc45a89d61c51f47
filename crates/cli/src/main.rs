//! Mealgate CLI - access lifecycle host

use anyhow::Result;
use clap::Parser;
use mealgate_cli::{commands, host::Host, Cli, Commands};
use tracing::Level;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Init writes the config file, so the host is only loaded by the other commands.
    let store = cli.store.as_deref();
    let host = || Host::load(store);

    match cli.command {
        Commands::Init { path } => commands::init::run(path.as_deref())?,
        Commands::Login {
            uid,
            email,
            name,
            role,
        } => commands::auth::run_login(&host()?, &uid, &email, &name, &role)?,
        Commands::Logout => commands::auth::run_logout(&host()?)?,
        Commands::Status { path, json } => commands::status::run(&host()?, &path, json)?,
        Commands::Trial { action } => commands::trial::run(&host()?, &action)?,
        Commands::Activate {
            days,
            plan_id,
            plan_name,
            reference,
        } => commands::activate::run(&host()?, days, plan_id, plan_name, reference)?,
        Commands::Verify { reference } => commands::verify::run(&host()?, &reference)?,
        Commands::Check { path, json } => {
            if !commands::check::run(&host()?, &path, json)? {
                std::process::exit(1);
            }
        }
        Commands::Watch { path } => commands::watch::run(&host()?, &path)?,
    }
    Ok(())
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
