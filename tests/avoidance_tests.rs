//! Separation property tests for collision avoidance

use drone_formation_system::{FormationConfig, FormationEngine, FormationPhase, Position};

const DT: f32 = 0.05;

fn min_pairwise_distance(engine: &FormationEngine) -> f32 {
    let positions = engine.get_agent_positions();
    let mut min = f32::INFINITY;
    for i in 0..positions.len() {
        for j in (i + 1)..positions.len() {
            min = min.min(positions[i].1.distance_to(&positions[j].1));
        }
    }
    min
}

#[test]
fn test_separation_maintained_from_ground_grid() {
    // Non-adversarial start: the parked grid already respects the minimum
    // separation. It must keep doing so while the swarm flies formations.
    let config = FormationConfig::test_config(8);
    let floor = config.min_distance * 0.9;
    let mut engine = FormationEngine::new(config).unwrap();
    engine.request_phase(FormationPhase::Cube);

    for tick in 0..800 {
        engine.tick(DT).unwrap();
        let min = min_pairwise_distance(&engine);
        assert!(
            min >= floor,
            "separation violated at tick {tick}: {min:.3} m"
        );
    }
}

#[test]
fn test_larger_swarm_settles_above_separation_floor() {
    // With more agents the transit scramble is harsher, but after the
    // avoidance-active transient the swarm must hold the separation floor.
    let config = FormationConfig::test_config(16);
    let floor = config.min_distance * 0.9;
    let mut engine = FormationEngine::new(config).unwrap();
    engine.request_phase(FormationPhase::Cube);

    for _ in 0..700 {
        engine.tick(DT).unwrap();
    }
    for tick in 700..800 {
        engine.tick(DT).unwrap();
        let min = min_pairwise_distance(&engine);
        assert!(
            min >= floor,
            "separation floor not held at tick {tick}: {min:.3} m"
        );
    }
}

#[test]
fn test_crowded_start_recovers_separation() {
    // Agents squeezed below the minimum distance must be pushed apart
    // within a bounded number of avoidance-active ticks.
    let config = FormationConfig::test_config(9);
    let floor = config.min_distance * 0.9;
    let mut engine = FormationEngine::new(config).unwrap();
    engine.request_phase(FormationPhase::Exit);

    // Hover targets well inside the world, packed too tight
    let packed: Vec<Position> = (0..9)
        .map(|i| Position::new(19.0 + (i % 3) as f32, 19.0 + (i / 3) as f32, 6.0))
        .collect();
    engine.set_formation_targets(&packed).unwrap();
    for _ in 0..1500 {
        engine.tick(DT).unwrap();
    }

    // Spread the targets back out; separation must recover
    let spread: Vec<Position> = (0..9)
        .map(|i| Position::new(14.0 + 3.0 * (i % 3) as f32, 14.0 + 3.0 * (i / 3) as f32, 6.0))
        .collect();
    engine.set_formation_targets(&spread).unwrap();
    for _ in 0..1500 {
        engine.tick(DT).unwrap();
        if engine.is_formation_complete() {
            break;
        }
    }
    assert!(
        min_pairwise_distance(&engine) >= floor,
        "separation did not recover: {:.3} m",
        min_pairwise_distance(&engine)
    );
}

#[test]
fn test_agents_stay_inside_world() {
    // Boundary repulsion keeps transit paths inside the volume
    let config = FormationConfig::test_config(16);
    let world = config.world_size;
    let mut engine = FormationEngine::new(config).unwrap();
    engine.request_phase(FormationPhase::Helix);

    for _ in 0..800 {
        engine.tick(DT).unwrap();
        for (id, p) in engine.get_agent_positions() {
            assert!(
                p.x > -1.0 && p.x < world + 1.0 && p.y > -1.0 && p.y < world + 1.0,
                "{id} left the world at ({}, {}, {})",
                p.x,
                p.y,
                p.z
            );
        }
    }
}
