use std::{env, path::PathBuf};

use anyhow::Result;
use clap::Parser;
use flightperf::{
    batchrunner::{BatchRunner, write_csv},
    flight::{
        airframe::{AirframeProfile, airframe_data::available_keys},
        planner::{PlannerConfig, TrajectoryPlanner},
        route::load_route,
    },
    parameters::{ParameterMap, parameters},
};
use log::info;

/// Compare the fuel efficiency of several airframes on the same route
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "config/route.toml")]
    route: PathBuf,

    #[arg(short, long)]
    params: Option<PathBuf>,

    /// Airframes to compare, every preset and configured airframe if omitted
    #[arg(short, long, value_delimiter = ',')]
    airframes: Vec<String>,

    #[arg(short, long)]
    workers: Option<usize>,

    /// Write the ranking to a timestamped directory under this path
    #[arg(short, long)]
    out: Option<PathBuf>,
}

fn main() -> Result<()> {
    // Default log level to "info"
    if env::var("RUST_LOG").is_err() {
        unsafe { env::set_var("RUST_LOG", "info") }
    }

    pretty_env_logger::init();

    let args = Args::parse();

    let params = match &args.params {
        Some(path) => parameters::parse_file(path)?,
        None => ParameterMap::default(),
    };

    let config = PlannerConfig::lookup(&params)?;

    let keys = if args.airframes.is_empty() {
        available_keys(&params)?
    } else {
        args.airframes
    };

    let airframes = keys
        .iter()
        .map(|key| AirframeProfile::lookup(key, &params))
        .collect::<Result<Vec<_>>>()?;

    let route = load_route(&args.route)?;

    let runner = BatchRunner::new(route, airframes, TrajectoryPlanner::new(config), args.workers);
    let entries = runner.run_blocking()?;

    println!(
        "{:>3} {:<14} {:>9} {:>11} {:>10} {:>9}  status",
        "#", "airframe", "time h", "fuel kg", "kg/100km", "km/kg"
    );
    for (rank, entry) in entries.iter().enumerate() {
        println!(
            "{:>3} {:<14} {:>9.3} {:>11.1} {:>10.1} {:>9.3}  {}",
            rank + 1,
            entry.airframe,
            entry.time_h,
            entry.fuel_kg,
            entry.fuel_per_100km_kg,
            entry.efficiency_km_per_kg,
            entry.status
        );
    }

    if let Some(mut out_dir) = args.out {
        // Create a directory with the current date and time
        out_dir.push(chrono::Local::now().format("%Y_%m_%d_%H-%M-%S").to_string());

        if !out_dir.exists() {
            std::fs::create_dir_all(&out_dir)?;
        }

        let out_file = out_dir.join("comparison.csv");
        write_csv(&entries, &out_file)?;

        info!("Ranking written to '{}'", out_file.display());
    }

    Ok(())
}
