use anyhow::Result;
use diffusion_engine::{Simulation, Snapshot, SimulationConfig};
use log::{error, info, trace};
use std::fs::File;
use std::io::Write;
use std::time::Instant;

fn main() -> Result<()> {
    // Initialize the logger
    env_logger::init();

    info!("Starting Particle Diffusion Engine (headless)...");

    // --- Load Configuration ---
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());
    let config = SimulationConfig::load(&config_path)?;

    info!("Using {} Rayon threads.", rayon::current_num_threads());

    // --- Initialize Simulation ---
    let mut sim = Simulation::new(config)?;
    info!("Simulation initialized with {} particles.", sim.particle_count());

    // --- Derive loop bounds ---
    let dt = sim.params().dt;
    let total_steps = (sim.config().timing.total_time / dt).ceil() as u64;
    let record_interval = sim.config().timing.record_interval.max(0.0);
    let record_interval_steps = ((record_interval / dt).round() as u64).max(1);
    info!(
        "Running {} steps, recording every {} steps ({:.2} time units).",
        total_steps,
        record_interval_steps,
        record_interval_steps as f64 * dt
    );

    // --- Simulation Loop ---
    let mut snapshots: Vec<Snapshot> = Vec::new();
    info!("Recording initial snapshot (t=0)...");
    snapshots.push(sim.snapshot());

    let start_time = Instant::now();
    let mut previous_print_time = start_time;
    let print_interval_secs = 5.0;

    for step in 0..total_steps {
        let step_start_time = Instant::now();
        sim.step();
        let step_duration = step_start_time.elapsed();

        let now = Instant::now();
        let should_print_status =
            now.duration_since(previous_print_time).as_secs_f64() >= print_interval_secs;
        let is_record_step = (step + 1) % record_interval_steps == 0;
        let is_last_step = step == total_steps - 1;

        if should_print_status || is_record_step || is_last_step {
            let stats = sim.stats();
            info!(
                "Step [{}/{}] (t={:.2}) | pi={} | Step Time: {:6.2} ms | Elapsed: {:.2} s",
                step + 1,
                total_steps,
                stats.elapsed,
                stats
                    .pi
                    .map(|e| format!("{:.7}", e.pi))
                    .unwrap_or_else(|| "n/a".to_string()),
                step_duration.as_secs_f64() * 1000.0,
                start_time.elapsed().as_secs_f64()
            );
            previous_print_time = now;

            if is_record_step || is_last_step {
                snapshots.push(sim.snapshot());
            }
        } else {
            trace!(
                "Step [{}/{}] completed in {:.2} ms",
                step + 1,
                total_steps,
                step_duration.as_secs_f64() * 1000.0
            );
        }
    }

    let total_duration = start_time.elapsed();
    info!(
        "Simulation finished in {:.3} seconds ({} snapshots recorded).",
        total_duration.as_secs_f64(),
        snapshots.len()
    );

    // --- Save Recorded Data ---
    if sim.config().output.save_stats {
        let format = sim
            .config()
            .output
            .format
            .clone()
            .unwrap_or_else(|| "json".to_string());
        save_snapshots(&snapshots, &sim.config().output.base_filename, &format);
    } else {
        info!("Skipping saving snapshots as per config (save_stats is false).");
    }

    if sim.config().output.save_positions {
        save_final_positions(&sim)?;
    } else {
        info!("Skipping saving final positions as per config.");
    }

    info!("Simulation Complete.");
    Ok(())
}

/// Writes the snapshot series in the configured serialization format.
/// Unknown formats fall back to JSON. Failures are logged, not fatal: the
/// simulation itself already completed.
fn save_snapshots(snapshots: &[Snapshot], base_filename: &str, format: &str) {
    let result = match format {
        "bincode" => {
            let filename = format!("{}_snapshots.bin", base_filename);
            write_snapshots(&filename, |file| {
                bincode::serialize_into(file, snapshots)
                    .map_err(|e| anyhow::anyhow!("bincode serialization: {}", e))
            })
        }
        "messagepack" => {
            let filename = format!("{}_snapshots.msgpack", base_filename);
            write_snapshots(&filename, |file| {
                rmp_serde::encode::write(file, snapshots)
                    .map_err(|e| anyhow::anyhow!("MessagePack serialization: {}", e))
            })
        }
        other => {
            if other != "json" {
                error!("Unknown output format: {}. Using JSON instead.", other);
            }
            let filename = format!("{}_snapshots.json", base_filename);
            write_snapshots(&filename, |file| {
                let json_string = serde_json::to_string(snapshots)?;
                file.write_all(json_string.as_bytes()).map_err(anyhow::Error::from)
            })
        }
    };

    if let Err(e) = result {
        error!("Error saving snapshots: {:#}", e);
    }
}

fn write_snapshots<F>(filename: &str, writer: F) -> Result<()>
where
    F: FnOnce(&mut File) -> Result<()>,
{
    let mut file = File::create(filename)
        .map_err(|e| anyhow::anyhow!("creating snapshot file '{}': {}", filename, e))?;
    writer(&mut file)?;
    info!("All snapshots saved to {}", filename);
    Ok(())
}

/// Writes the final particle positions as CSV for external analysis.
fn save_final_positions(sim: &Simulation) -> Result<()> {
    let filename = format!("{}_final_positions.csv", sim.config().output.base_filename);
    let mut writer = csv::Writer::from_path(&filename)?;
    writer.write_record(["x", "y"])?;
    for p in sim.particles() {
        writer.write_record(&[format!("{:.4}", p.pos.x), format!("{:.4}", p.pos.y)])?;
    }
    writer.flush()?;
    info!("Final positions saved to {}", filename);
    Ok(())
}
