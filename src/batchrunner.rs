use std::{
    cmp::Ordering,
    path::Path,
    sync::{
        Arc,
        atomic::{self, AtomicUsize},
        mpsc::Sender,
    },
    thread::available_parallelism,
    time::Instant,
};

use anyhow::{Result, anyhow};
use log::info;
use serde::Serialize;

use crate::flight::{
    airframe::AirframeProfile,
    flight_output::FlightStatus,
    planner::TrajectoryPlanner,
    route::Route,
};

/// One airframe's outcome on the shared route.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonEntry {
    pub index: usize,
    pub thread_id: usize,
    pub airframe: String,
    pub feasible: bool,
    pub status: FlightStatus,
    pub time_h: f64,
    pub fuel_kg: f64,
    pub fuel_per_100km_kg: f64,
    pub efficiency_km_per_kg: f64,
    pub meets_reserve: bool,
    pub plan_duration_us: i64,
}

fn worker(
    route: Arc<Route>,
    airframes: Arc<Vec<AirframeProfile>>,
    planner: TrajectoryPlanner,
    thread_id: usize,
    run_index: Arc<AtomicUsize>,
    tx_result: Sender<ComparisonEntry>,
) -> Result<()> {
    loop {
        let index = run_index.fetch_add(1, atomic::Ordering::Relaxed);

        let Some(airframe) = airframes.get(index) else {
            return Ok(());
        };

        let start_time = Instant::now();
        let result = planner.plan(&route, airframe)?;
        let plan_duration = Instant::now() - start_time;

        let fuel_per_100km_kg = if result.distance_flown_km > 0.0 {
            result.total_fuel_kg / result.distance_flown_km * 100.0
        } else {
            0.0
        };

        let entry = ComparisonEntry {
            index,
            thread_id,
            airframe: result.airframe.clone(),
            feasible: result.feasible,
            status: result.status,
            time_h: result.total_time_h,
            fuel_kg: result.total_fuel_kg,
            fuel_per_100km_kg,
            efficiency_km_per_kg: result.fuel_efficiency_km_per_kg(),
            meets_reserve: result.meets_reserve,
            plan_duration_us: plan_duration.as_micros() as i64,
        };

        tx_result.send(entry)?;
    }
}

/// Feasible flights first, then by decreasing efficiency. Ties keep the input
/// order.
fn rank(a: &ComparisonEntry, b: &ComparisonEntry) -> Ordering {
    b.feasible
        .cmp(&a.feasible)
        .then(b.efficiency_km_per_kg.total_cmp(&a.efficiency_km_per_kg))
        .then(a.index.cmp(&b.index))
}

/// Plans one route for several airframes in parallel.
pub struct BatchRunner {
    num_workers: usize,
    route: Arc<Route>,
    airframes: Arc<Vec<AirframeProfile>>,
    planner: TrajectoryPlanner,
}

impl BatchRunner {
    pub fn new(
        route: Route,
        airframes: Vec<AirframeProfile>,
        planner: TrajectoryPlanner,
        num_workers: Option<usize>,
    ) -> Self {
        let num_workers = num_workers
            .unwrap_or_else(|| available_parallelism().map(|n| n.get()).unwrap_or(1))
            .clamp(1, airframes.len().max(1));

        info!(
            "Batch configuration: {num_workers} workers, {} airframes",
            airframes.len()
        );

        BatchRunner {
            num_workers,
            route: Arc::new(route),
            airframes: Arc::new(airframes),
            planner,
        }
    }

    /// Runs every plan and returns the entries ranked by efficiency.
    pub fn run_blocking(self) -> Result<Vec<ComparisonEntry>> {
        info!("Comparing airframes on route '{}'", self.route.name);

        let (tx_result, rx_result) = std::sync::mpsc::channel();
        let mut workers = vec![];

        let run_index = Arc::new(AtomicUsize::new(0));

        for i in 0..self.num_workers {
            let route = self.route.clone();
            let airframes = self.airframes.clone();
            let planner = self.planner.clone();
            let tx_result = tx_result.clone();
            let run_index = run_index.clone();

            let worker = std::thread::spawn(move || {
                worker(route, airframes, planner, i, run_index, tx_result)
            });

            workers.push(worker);
        }
        drop(tx_result);

        let mut entries = vec![];
        while let Ok(entry) = rx_result.recv() {
            info!(
                "{} (thread {}): {:.3} h, {:.1} kg, {}",
                entry.airframe, entry.thread_id, entry.time_h, entry.fuel_kg, entry.status
            );

            entries.push(entry);
        }

        for worker in workers {
            worker
                .join()
                .map_err(|_| anyhow!("Batch worker panicked"))??;
        }

        entries.sort_by(rank);

        Ok(entries)
    }
}

pub fn write_csv(entries: &[ComparisonEntry], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;

    for entry in entries {
        writer.serialize(entry)?;
    }
    writer.flush()?;

    Ok(())
}
