//! robogen-swarm CLI
//!
//! Usage:
//!   robogen-swarm -c config.txt -p positions.txt -d robots.json [--save NAME]
//!   robogen-swarm --load NAME
//!   robogen-swarm --list

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use robogen_swarm::{
    Environment, EnvironmentError, EnvironmentStore, GeometryCatalog,
};

#[derive(Parser)]
#[command(name = "robogen-swarm")]
#[command(about = "Assemble and place a swarm of Robogen robots")]
struct Cli {
    /// Environment configuration file (terrain x, terrain y, robot count)
    #[arg(short, long, requires_all = ["position", "data"])]
    config: Option<PathBuf>,

    /// Robot positions file (one `x y z` per line)
    #[arg(short, long)]
    position: Option<PathBuf>,

    /// Robot data file (.json)
    #[arg(short, long)]
    data: Option<PathBuf>,

    /// List saved environments
    #[arg(short, long)]
    list: bool,

    /// Load a saved environment by name
    #[arg(short = 'L', long, conflicts_with = "config")]
    load: Option<String>,

    /// Save the built environment under this name
    #[arg(short, long)]
    save: Option<String>,

    /// Directory holding saved environments
    #[arg(long, default_value = "environments")]
    env_dir: PathBuf,

    /// Component geometry catalog (.json) overriding the built-in shapes
    #[arg(short, long)]
    geometry: Option<PathBuf>,

    /// Seed for robot colours
    #[arg(long)]
    seed: Option<u64>,

    /// Write the build log to this file
    #[arg(long)]
    log: Option<PathBuf>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            ExitCode::from(e.status() as u8)
        }
    }
}

fn run(cli: &Cli) -> Result<(), EnvironmentError> {
    let store = EnvironmentStore::new(&cli.env_dir);

    if cli.list {
        let names = store.list()?;
        println!("Environments: {}", names.join(", "));
        if cli.config.is_none() && cli.load.is_none() {
            return Ok(());
        }
    }

    let geometry = match &cli.geometry {
        Some(path) => GeometryCatalog::load(path)?,
        None => GeometryCatalog::default(),
    };
    let mut env = Environment::with_geometry(geometry).with_store(store);
    if let Some(seed) = cli.seed {
        env = env.with_seed(seed);
    }

    let result = match (&cli.load, &cli.config, &cli.position, &cli.data) {
        (Some(name), _, _, _) => env.load(name),
        (None, Some(config), Some(position), Some(data)) => env.open(config, position, data),
        _ => {
            println!("Nothing to do. See --help for usage.");
            return Ok(());
        }
    };

    if let Some(path) = &cli.log {
        env.logger().write(path)?;
    }
    let summary = result?;

    for robot in env.robots() {
        let b = robot.bounds;
        println!(
            "{:>12}  x [{:8.3}, {:8.3}]  y [{:8.3}, {:8.3}]  z [{:6.3}, {:6.3}]  {} parts",
            robot.id,
            b.min.x,
            b.max.x,
            b.min.y,
            b.max.y,
            b.min.z,
            b.max.z,
            robot.components.len()
        );
    }
    for message in env.logger().errors() {
        eprintln!("{}", message);
    }
    println!("{}", summary);

    if let Some(name) = &cli.save {
        let path = env.save(Some(name))?;
        println!("\"{}\" saved to {}", name, path.display());
    }
    Ok(())
}
