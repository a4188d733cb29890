use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "writeback", version, about = "Writeback actions CLI")]
struct Cli {
    /// Configuration file (YAML). Without it no resources are known.
    #[arg(long, global = true, env = "WRITEBACK_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Normalize and validate arguments for an action without running it.
    Check {
        /// Action name, e.g. row/create
        action: String,

        /// JSON arguments file; stdin when omitted
        #[arg(long)]
        args: Option<PathBuf>,
    },

    /// List known actions, their contracts and the connector kinds that handle them.
    Actions {
        /// Print each contract's JSON Schema as well
        #[arg(long, default_value_t = false)]
        schemas: bool,
    },

    /// Perform an action against the configured in-memory resources.
    Run {
        /// Action name, e.g. bulk/update
        action: String,

        /// JSON arguments file; stdin when omitted
        #[arg(long)]
        args: Option<PathBuf>,

        /// Caller id; without it the call is trusted and skips authorization
        #[arg(long = "as")]
        as_user: Option<String>,

        /// Run as a superuser (requires --as)
        #[arg(long, default_value_t = false, requires = "as_user")]
        superuser: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = commands::load_config(cli.config.as_deref())?;

    let ok = match cli.cmd {
        Command::Check { action, args } => {
            let args = commands::read_args(args.as_deref())?;
            commands::check::run(&config, &action, args)?
        }
        Command::Actions { schemas } => {
            commands::actions::run(&config, schemas)?;
            true
        }
        Command::Run {
            action,
            args,
            as_user,
            superuser,
        } => {
            let args = commands::read_args(args.as_deref())?;
            commands::run::run(&config, &action, args, as_user, superuser).await?
        }
    };

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
