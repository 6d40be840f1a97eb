//! Headless arena demo
//!
//! Runs a scenario for a fixed span of simulated time and logs what the
//! agents decide. Pass a `.ron` or `.json` scenario path to load your own.

use melee_ai::core::{GameEvent, Scenario, Simulation};
use std::process::ExitCode;

const RUN_SECONDS: f32 = 20.0;
const TIMESTEP: f32 = 1.0 / 30.0;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let scenario = match std::env::args().nth(1) {
        Some(path) => match Scenario::load(&path) {
            Ok(scenario) => scenario,
            Err(e) => {
                log::error!("Failed to load scenario {path}: {e}");
                return ExitCode::FAILURE;
            }
        },
        None => Scenario::arena(),
    };

    log::info!(
        "Running scenario '{}' ({} entities, seed {})",
        scenario.name,
        scenario.entity_count(),
        scenario.seed
    );

    let mut sim = Simulation::from_scenario(&scenario);
    while sim.time.elapsed() < RUN_SECONDS {
        sim.tick(TIMESTEP);
        report(&sim);
    }

    log::info!("{}", sim.roster.format_stats());
    ExitCode::SUCCESS
}

fn report(sim: &Simulation) {
    let now = sim.time.elapsed();
    for event in sim.events.iter() {
        match event {
            GameEvent::StateChanged { agent, from, to } => {
                log::info!("[{now:6.2}s] {agent:?}: {from} -> {to}");
            }
            GameEvent::EntityDamaged {
                entity,
                amount,
                source,
            } => {
                let left = sim.health_of(*entity).unwrap_or(0.0);
                log::info!("[{now:6.2}s] {entity:?} took {amount:.0} from {source:?} ({left:.0} left)");
            }
            GameEvent::EntityKilled { entity, killer } => {
                log::info!("[{now:6.2}s] {entity:?} killed by {killer:?}");
            }
            GameEvent::EntityDestroyed { entity } => {
                log::info!("[{now:6.2}s] {entity:?} removed");
            }
            _ => {}
        }
    }
}
