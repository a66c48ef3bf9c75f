mod commands;

use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use commands::{Context, PrintKind};

#[derive(Parser)]
#[command(
    name = "stowage",
    about = "Turn pups container configs into a docker compose setup"
)]
#[command(version)]
struct Cli {
    /// Directory containing {config}.yml container configs [default: ./containers]
    #[arg(long, global = true)]
    conf_dir: Option<PathBuf>,
    /// Directory that template paths are resolved against [default: .]
    #[arg(long, global = true)]
    templates_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write Dockerfiles, rendered configs, .envrc, and docker-compose.yaml
    /// to {output-dir}/{first config}/. Run with `source .envrc; docker compose up`.
    Compose {
        /// Configs to include; the first one's env wins and names the output dir
        #[arg(required = true, num_args = 1..)]
        configs: Vec<String>,
        /// Parent directory for the generated bundle [default: ./compose]
        #[arg(long, short = 'o')]
        output_dir: Option<PathBuf>,
        /// Bake the non-secret environment into each image as ENV
        #[arg(long, short = 'e')]
        bake_env: bool,
    },
    /// Print part of a config
    Print {
        #[arg(value_enum)]
        kind: PrintKind,
        /// Config to print; `env` merges every given config, first wins
        #[arg(required = true, num_args = 1..)]
        configs: Vec<String>,
    },
    /// Generate a Concourse image build job for a config
    Concourse {
        config: String,
        /// Write the job to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print a shell completion script
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let Cli {
        conf_dir,
        templates_dir,
        command,
    } = Cli::parse();
    let context = || Context::load(conf_dir.clone(), templates_dir.clone());

    match command {
        Commands::Compose {
            configs,
            output_dir,
            bake_env,
        } => commands::compose(&context()?, &configs, output_dir, bake_env)?,
        Commands::Print { kind, configs } => commands::print(&context()?, kind, &configs)?,
        Commands::Concourse { config, output } => {
            commands::concourse(&context()?, &config, output.as_deref())?
        }
        Commands::Completions { shell } => commands::completions(shell, &mut Cli::command()),
    }

    Ok(())
}
