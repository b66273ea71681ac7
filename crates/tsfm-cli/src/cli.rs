use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context as _;
use clap::{ArgAction, Parser, Subcommand};
use tsfm_inference::{HandlerLoader, HandlerRegistry, ServiceConfig};

use crate::commands;
use crate::logging::init_logger;
use crate::{print_err, print_info};

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Loader settings in TOML (`config_file_name`, `model_root`).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve a model and show which handler would serve it.
    Inspect(commands::inspect::InspectArgs),
    /// Load, prepare and run a forecasting model on JSON input.
    Run(commands::run::RunArgs),
    /// List the model families this build can serve.
    Families,
}

pub fn cli_main() -> ExitCode {
    let args = CliArgs::parse();
    init_logger(args.verbose);

    let time_begin = std::time::Instant::now();
    let result = service_config(args.config.as_deref()).and_then(|config| {
        let loader = HandlerLoader::new(config, HandlerRegistry::with_defaults());
        handle_command(args.command, &loader)
    });

    match result {
        Ok(()) => {
            print_info!("Done in {:.2?}", time_begin.elapsed());
            ExitCode::SUCCESS
        }
        Err(e) => {
            print_err!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn service_config(path: Option<&std::path::Path>) -> anyhow::Result<ServiceConfig> {
    match path {
        Some(path) => ServiceConfig::from_file(path)
            .with_context(|| format!("Failed to read loader settings from {}", path.display())),
        None => Ok(ServiceConfig::default()),
    }
}

fn handle_command(
    command: Commands,
    loader: &HandlerLoader<tsfm_inference::ForecastingInput>,
) -> anyhow::Result<()> {
    match command {
        Commands::Inspect(inspect_args) => commands::inspect::handle_command(inspect_args, loader),
        Commands::Run(run_args) => commands::run::handle_command(run_args, loader),
        Commands::Families => {
            for key in loader.registry().keys() {
                println!("{key}");
            }
            Ok(())
        }
    }
}
