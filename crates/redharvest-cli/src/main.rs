mod harvest;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use redharvest_core::{AppConfig, RunInput};

#[derive(Debug, Parser)]
#[command(name = "redharvest")]
#[command(about = "Quota-aware harvester for public discussion threads")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run a harvest and write every record as one JSON line.
    Run {
        /// Run input file (YAML or JSON).
        #[arg(long, short)]
        input: PathBuf,
        /// Output file; records go to stdout when omitted or `-`.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Validate a run input and print what the run would request.
    Plan {
        #[arg(long, short)]
        input: PathBuf,
        /// Print the plan as JSON.
        #[arg(long)]
        json: bool,
    },
}

impl Commands {
    fn input(&self) -> &PathBuf {
        match self {
            Commands::Run { input, .. } | Commands::Plan { input, .. } => input,
        }
    }
}

/// Logs go to stderr so stdout can carry the record stream. `RUST_LOG`
/// wins over the configured level; `debugMode` raises the default to debug.
fn init_tracing(config: &AppConfig, debug_mode: bool) -> anyhow::Result<()> {
    let level = if debug_mode {
        "debug".to_owned()
    } else {
        config.log_level.clone()
    };
    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = redharvest_core::load_app_config()?;

    let input = RunInput::from_path(cli.command.input())?;
    init_tracing(&config, input.debug_mode)?;
    let plan = input.validate(&config.platform_origin)?;

    match cli.command {
        Commands::Run { output, .. } => {
            let to_stdout = harvest::writes_to_stdout(output.as_deref());
            let summary = harvest::run_harvest(&config, &plan, output.as_deref()).await?;
            if to_stdout {
                eprintln!("{summary}");
            } else {
                println!("{summary}");
            }
        }
        Commands::Plan { json, .. } => harvest::print_plan(&config, &plan, json)?,
    }

    Ok(())
}
