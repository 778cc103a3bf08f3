//! Permitbot CLI - work permit lifecycle with photo evidence and PPE checks

use clap::Parser;
use permitbot::cli::commands;
use permitbot::cli::{Cli, Commands, GlobalOpts};
use permitbot::domain::PermitAction;
use permitbot::errors::to_exit_code;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing; logs go to stderr so --json output stays clean
    let filter = if cli.global.verbose {
        EnvFilter::new("debug")
    } else if cli.global.quiet {
        EnvFilter::new("warn")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let result = run(cli).await;

    match result {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("Error: {}", e);
            if e.is_fatal() {
                eprintln!("Произошла ошибка. Попробуйте ещё раз позже.");
            }
            std::process::exit(to_exit_code(&e));
        }
    }
}

async fn run(cli: Cli) -> permitbot::Result<()> {
    let opts: &GlobalOpts = &cli.global;
    match cli.command {
        Some(Commands::Init { force }) => commands::init::run(opts, force).await,
        Some(Commands::Import { file }) => commands::import::run(opts, &file).await,
        Some(Commands::Login { token }) => commands::auth::login(opts, &token).await,
        Some(Commands::Logout) => commands::auth::logout(opts).await,
        Some(Commands::Whoami { json }) => commands::auth::whoami(opts, json).await,
        Some(Commands::List { role, json }) => commands::list::run(opts, role, json).await,
        Some(Commands::Show { number, json }) => commands::show::run(opts, &number, json).await,
        Some(Commands::Submit {
            number,
            phase,
            handles,
        }) => commands::submit::run(opts, &number, phase, &handles).await,
        Some(Commands::Approve { number, phase }) => {
            commands::decide::run(opts, &number, PermitAction::approve(phase)).await
        }
        Some(Commands::Reject { number, phase }) => {
            commands::decide::run(opts, &number, PermitAction::reject(phase)).await
        }
        Some(Commands::Photos {
            number,
            phase,
            json,
        }) => commands::photos::run(opts, &number, phase, json).await,
        Some(Commands::Analyze {
            number,
            phase,
            annotate,
            json,
        }) => commands::analyze::run(opts, &number, phase, annotate, json).await,
        None => {
            // Default to showing help - clap handles this
            println!("Use --help for usage information");
            Ok(())
        }
    }
}
