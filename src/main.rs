use std::{
    env,
    path::{Path, PathBuf},
};

use anyhow::Result;
use itertools::Itertools;
use clap::{Parser, Subcommand};
use flightperf::{
    flight::{
        aero::{atmosphere::AtmosphericReading, wind::WindVector},
        airframe::AirframeProfile,
        flight_output::{FlightResult, LegRecord, format_hms, hours_to_delta},
        planner::{PlannerConfig, TrajectoryPlanner, flight_time},
        route::load_route,
        weather::{advisories, classify, wind_chill_c},
    },
    parameters::{ParameterMap, parameters},
};
use log::info;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Plan a route for one airframe
    Plan {
        #[arg(short, long, default_value = "config/route.toml")]
        route: PathBuf,

        /// Preset name or key under [airframes] in the parameter file
        #[arg(short, long, default_value = "boeing_737")]
        airframe: String,

        #[arg(short, long)]
        params: Option<PathBuf>,

        /// Fuel on board at departure, full tanks if omitted
        #[arg(short, long)]
        fuel_kg: Option<f64>,

        /// Payload carried on top of the empty weight
        #[arg(long, default_value_t = 0.0)]
        payload_kg: f64,

        /// Print the full result as json
        #[arg(long)]
        json: bool,

        /// Write the per-leg breakdown to this file
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Quick flight time estimate
    Time {
        #[arg(short, long)]
        distance_km: f64,

        #[arg(short, long)]
        speed_kmh: f64,

        #[arg(short, long, default_value_t = 1.0)]
        wind_factor: f64,
    },

    /// Classify a surface observation
    Weather {
        #[arg(short, long)]
        temperature_c: f64,

        #[arg(short, long)]
        pressure_hpa: f64,

        #[arg(short, long, default_value_t = 0.0)]
        wind_speed_kmh: f64,

        #[arg(short, long)]
        visibility_m: Option<f64>,
    },
}

fn main() -> Result<()> {
    // Default log level to "info"
    if env::var("RUST_LOG").is_err() {
        unsafe { env::set_var("RUST_LOG", "info") }
    }

    pretty_env_logger::init();

    let args = Args::parse();

    match args.command {
        Command::Plan {
            route,
            airframe,
            params,
            fuel_kg,
            payload_kg,
            json,
            csv,
        } => {
            let params = match params {
                Some(path) => parameters::parse_file(&path)?,
                None => ParameterMap::default(),
            };

            let config = PlannerConfig::lookup(&params)?;
            let airframe = AirframeProfile::lookup(&airframe, &params)?;
            let route = load_route(&route)?;

            let fuel_kg = fuel_kg.unwrap_or(airframe.fuel_capacity_kg);
            let result = TrajectoryPlanner::new(config).plan_with_load(&route, &airframe, fuel_kg, payload_kg)?;

            if let Some(path) = csv {
                write_legs(&result, &path)?;
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_summary(&result);
            }
        }
        Command::Time {
            distance_km,
            speed_kmh,
            wind_factor,
        } => {
            let time_h = flight_time(distance_km, speed_kmh, wind_factor)?;
            let hms = hours_to_delta(time_h).map(format_hms).unwrap_or_default();

            println!("{time_h:.4} h ({hms})");
        }
        Command::Weather {
            temperature_c,
            pressure_hpa,
            wind_speed_kmh,
            visibility_m,
        } => {
            let mut reading = AtmosphericReading::new(temperature_c, pressure_hpa, None)?;
            if let Some(visibility_m) = visibility_m {
                reading = reading.with_visibility(visibility_m)?;
            }
            let wind = WindVector::from_factor(wind_speed_kmh, 1.0)?;

            println!("Condition: {}", classify(&reading, &wind));
            println!(
                "Advisories: {}",
                advisories(&reading, &wind).iter().map(|a| a.to_string()).join(", ")
            );
            println!("Wind chill: {:.1} °C", wind_chill_c(temperature_c, wind_speed_kmh));
        }
    }

    Ok(())
}

fn write_legs(result: &FlightResult, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;

    for leg in result.legs.iter() {
        writer.serialize(LegRecord::from(leg))?;
    }
    writer.flush()?;

    info!("Leg breakdown written to '{}'", path.display());

    Ok(())
}

fn print_summary(result: &FlightResult) {
    println!("{} / {}", result.route, result.airframe);

    for leg in result.legs.iter() {
        let time = leg
            .duration()
            .map(format_hms)
            .unwrap_or_else(|| "--:--:--".to_string());

        println!(
            "  {:>2} {:>6} -> {:<6} {:>8.1} km  gs {:>6.1} km/h  {time}  {:>9.1} kg  {:<9} {}",
            leg.index, leg.from, leg.to, leg.distance_km, leg.ground_speed_kmh, leg.fuel_kg, leg.condition, leg.status
        );
    }

    let total = result
        .total_duration()
        .map(format_hms)
        .unwrap_or_default();

    println!(
        "Total: {:.1} km in {total}, {:.1} kg of fuel ({:.3} km/kg), {:.1} kg remaining",
        result.distance_flown_km,
        result.total_fuel_kg,
        result.fuel_efficiency_km_per_kg(),
        result.remaining_fuel_kg
    );
    println!(
        "Reserve: {:.1} kg ({}), status: {}",
        result.reserve_fuel_kg,
        if result.meets_reserve { "met" } else { "not met" },
        result.status
    );
}
