//! two_node — an access point and a walking station on one 20 MHz channel.
//!
//! The station starts 2 m from the access point and walks to 32 m over ten
//! seconds, crossing model B's 5 m LOS breakpoint.  The same run is computed
//! twice: once with plain sequential queries and once through the precompute
//! scheduler.  Both must produce identical matrices.
//!
//! Antenna layouts come from an embedded CSV unless a path is given:
//!
//! ```text
//! cargo run -p two_node --release -- antennas.csv
//! RUST_LOG=tgn_channel=debug cargo run -p two_node
//! ```

use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tgn_channel::{
    AntennaArrayConfig, ChannelSpec, ModelInterface, TgnConfig, TgnMimoChannelModel, load_antenna_configs_csv,
    load_antenna_configs_reader,
};
use tgn_core::{ChannelNumber, NodeId, Position, SectorId, SimTime};
use tgn_mobility::{LinearMobility, SharedMobility, StationaryMobility};
use tgn_model::{ComplexMatrix, ModelLetter};

// ── Constants ─────────────────────────────────────────────────────────────────

const AP:              NodeId        = NodeId(0);
const STA:             NodeId        = NodeId(1);
const CHANNEL:         ChannelNumber = ChannelNumber(36);
const WORKER_THREADS:  usize         = 4;
const RUN_SEED:        u64           = 42;
const STEP_MS:         i64           = 100;
const DURATION_MS:     i64           = 10_000;
const SUBCARRIERS:     usize         = 64;

const ANTENNAS_CSV: &str = "\
node_id,antenna_count,antenna_spacing_wavelengths\n\
0,2,0.5\n\
1,2,0.5\n\
";

// ── Setup ─────────────────────────────────────────────────────────────────────

fn config(worker_threads: usize) -> TgnConfig {
    TgnConfig {
        model: ModelLetter::B,
        worker_threads,
        base_channel: CHANNEL,
        channels: vec![ChannelSpec::new(5.18e9, 20e6)],
        subcarrier_count: SUBCARRIERS,
        sampling_interval: Some(SimTime::MILLISECOND),
        run_seed: RUN_SEED,
        instance_name: "two_node".to_string(),
        ..TgnConfig::default()
    }
}

fn mobility(node: NodeId) -> Result<SharedMobility> {
    if node != STA {
        return Ok(Arc::new(StationaryMobility::new(Position::default())));
    }
    let walk = LinearMobility::new(
        Position::new(2.0, 0.0, 0.0),
        Position::new(32.0, 0.0, 0.0),
        SimTime::ZERO,
        SimTime::from_millis(DURATION_MS),
    )?;
    Ok(Arc::new(walk))
}

/// Build one model and register both nodes.
fn build(
    worker_threads: usize,
    antennas:       &[(NodeId, AntennaArrayConfig)],
) -> Result<(TgnMimoChannelModel, ModelInterface, ModelInterface)> {
    let mut model = TgnMimoChannelModel::new(config(worker_threads))?;
    let layout = |node: NodeId| {
        antennas
            .iter()
            .find(|(n, _)| *n == node)
            .map(|(_, a)| *a)
            .with_context(|| format!("no antenna layout for {node}"))
    };
    let ap = model.create_interface_for(AP, SectorId::PRIMARY, layout(AP)?, mobility(AP)?)?;
    let sta = model.create_interface_for(STA, SectorId::PRIMARY, layout(STA)?, mobility(STA)?)?;
    Ok((model, ap, sta))
}

// ── Runs ──────────────────────────────────────────────────────────────────────

/// Downlink matrices (AP → STA) on every subcarrier at every step.
type Trace = Vec<Vec<ComplexMatrix>>;

fn run_sequential(antennas: &[(NodeId, AntennaArrayConfig)]) -> Result<Trace> {
    let (mut model, ap, sta) = build(0, antennas)?;
    let mut trace = Vec::new();
    for step in 0..=DURATION_MS / STEP_MS {
        let time = SimTime::from_millis(step * STEP_MS);
        let mut view = model.view(&sta)?;
        let row = (0..SUBCARRIERS)
            .map(|k| view.channel_matrix(time, CHANNEL, ap.end(), k))
            .collect::<Result<Vec<_>, _>>()?;
        trace.push(row);
    }
    Ok(trace)
}

fn run_precomputed(antennas: &[(NodeId, AntennaArrayConfig)]) -> Result<Trace> {
    let (mut model, ap, sta) = build(WORKER_THREADS, antennas)?;
    let mut trace = Vec::new();
    for step in 0..=DURATION_MS / STEP_MS {
        let time = SimTime::from_millis(step * STEP_MS);
        model.notify_of_imminent_link_use(CHANNEL, ap.end(), sta.end(), time)?;
        model.do_the_parallel_precalculation();

        let mut view = model.view(&sta)?;
        let row = (0..SUBCARRIERS)
            .map(|k| view.channel_matrix(time, CHANNEL, ap.end(), k))
            .collect::<Result<Vec<_>, _>>()?;
        trace.push(row);
    }
    Ok(trace)
}

/// Average `|h|²` per antenna pair across the band.
fn mean_power(row: &[ComplexMatrix]) -> f64 {
    let per_pair = |m: &ComplexMatrix| m.power() / (m.rows() * m.cols()) as f64;
    row.iter().map(per_pair).sum::<f64>() / row.len() as f64
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let antennas = match std::env::args().nth(1) {
        Some(path) => load_antenna_configs_csv(Path::new(&path))
            .with_context(|| format!("loading antenna layouts from {path}"))?,
        None => load_antenna_configs_reader(Cursor::new(ANTENNAS_CSV))?,
    };
    info!(nodes = antennas.len(), "antenna layouts loaded");

    let t0 = Instant::now();
    let sequential = run_sequential(&antennas)?;
    let sequential_secs = t0.elapsed().as_secs_f64();

    let t0 = Instant::now();
    let precomputed = run_precomputed(&antennas)?;
    let precomputed_secs = t0.elapsed().as_secs_f64();

    if sequential != precomputed {
        bail!("sequential and precomputed runs diverged");
    }
    info!(
        steps = sequential.len(),
        sequential_secs,
        precomputed_secs,
        "sequential and precomputed matrices are identical"
    );

    println!("{:>8}  {:>10}  {:>12}  {:>12}", "time_ms", "distance_m", "mean_power", "power_sc0");
    println!("{}", "-".repeat(48));
    let every = (1_000 / STEP_MS) as usize;
    for (step, row) in sequential.iter().enumerate().step_by(every) {
        let time_ms = step as i64 * STEP_MS;
        let distance = 2.0 + 30.0 * time_ms as f64 / DURATION_MS as f64;
        println!("{time_ms:>8}  {distance:>10.1}  {:>12.4}  {:>12.4}", mean_power(row), row[0].power());
    }

    let overall =
        sequential.iter().map(|row| mean_power(row)).sum::<f64>() / sequential.len() as f64;
    // Fading samples carry power 1/2 + 1 per antenna pair.
    if !(0.3..7.5).contains(&overall) {
        warn!(overall, "average channel power far from 1.5");
    }
    info!(overall, "run complete");
    Ok(())
}
