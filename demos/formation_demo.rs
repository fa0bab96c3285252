//! Formation engine demo
//!
//! This example shows how to:
//! - Configure and validate the engine
//! - Request a formation and tick the loop to convergence
//! - Read agent positions and TDOA measurements
//! - Export the reached formation as a named point cloud

use drone_formation_system::{
    save_point_clouds, FormationConfig, FormationEngine, FormationPhase, PointCloud, Position,
    Result,
};

fn main() -> Result<()> {
    println!("Drone Formation Control System");
    println!("==============================\n");

    // Step 1: configure the swarm
    let config = FormationConfig::new(27);
    config.validate()?;
    println!("configuration validated: {} agents, {}m world", config.num_agents, config.world_size);

    // Step 2: build the engine (agents start parked on the ground grid)
    let mut engine = FormationEngine::new(config)?;
    println!("engine ready, phase: {}", engine.current_phase());

    // Step 3: fly the cube formation
    engine.request_phase(FormationPhase::Cube);
    let dt = 0.05;
    let mut ticks = 0;
    while !engine.is_formation_complete() && ticks < 2000 {
        engine.tick(dt)?;
        ticks += 1;
    }
    println!(
        "cube formation {} after {} ticks ({:.1}s simulated)",
        if engine.is_formation_complete() { "complete" } else { "incomplete" },
        ticks,
        engine.sim_time()
    );

    // Step 4: inspect the swarm
    let positions = engine.get_agent_positions();
    let (id, p) = positions[0];
    println!("{} sits at ({:.2}, {:.2}, {:.2})", id, p.x, p.y, p.z);

    let measurements = engine.tdoa_positioning(&Position::new(20.0, 20.0, 5.0));
    println!("TDOA measurements against {} aerial stations:", measurements.len());
    for (i, tdoa) in measurements.iter().enumerate() {
        println!("  station {i}: {tdoa:+.3e} s");
    }
    println!("time syncs so far: {}", engine.positioning().sync_count());

    // Step 5: export the reached formation for later replay
    let cloud = PointCloud::new(positions.iter().map(|(_, p)| *p).collect());
    let path = std::env::temp_dir().join("cube_formation.json");
    save_point_clouds(&path, &[("cube", &cloud)])?;
    println!("\nformation exported to {}", path.display());

    Ok(())
}
