//! Simulated two-way-ranging time synchronization
//!
//! Each synchronization round first ranges every aerial station against the
//! ground reference (median of several noisy exchanges, robust to
//! outliers), then runs a mutual convergence pass that averages offsets
//! pairwise until the fleet agrees to within the injected noise envelope.
//!
//! Known limitation: sample sets inconsistent beyond that envelope are
//! mitigated only by the median filter; no separate divergence error is
//! raised.

use crate::rng::SimRng;
use crate::types::Position;

use super::stations::ReferenceStation;

/// Signal propagation speed (m/s)
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;

/// Fixed transponder processing delay between receive and reply (seconds)
pub const PROCESSING_DELAY: f64 = 1e-6;

/// Standard deviation of one-way measurement noise (seconds)
pub const MEASUREMENT_NOISE_STD: f64 = 1e-10;

/// Ranging exchanges per station against the ground reference
const TWR_SAMPLES: usize = 5;

/// Upper bound on pairwise convergence rounds. Each sequential sweep
/// contracts the fleet's offset spread roughly 3x, so this cap covers any
/// realistic post-ranging spread.
const MAX_PAIRWISE_ROUNDS: usize = 32;

/// The mutual pass stops once the fleet's offset spread is at the
/// measurement noise floor.
const PAIRWISE_CONVERGENCE_SPREAD: f64 = MEASUREMENT_NOISE_STD;

/// Geometric propagation time between two points (seconds)
pub fn propagation_time(a: &Position, b: &Position) -> f64 {
    let dx = (a.x - b.x) as f64;
    let dy = (a.y - b.y) as f64;
    let dz = (a.z - b.z) as f64;
    libm::sqrt(dx * dx + dy * dy + dz * dz) / SPEED_OF_LIGHT
}

/// Two-way-ranging clock synchronization across the station network
#[derive(Debug, Clone)]
pub struct TimeSyncService {
    rng: SimRng,
    sync_count: u64,
}

impl TimeSyncService {
    /// Create a service with its own noise stream
    pub fn new(rng: SimRng) -> Self {
        Self { rng, sync_count: 0 }
    }

    /// Simulate one two-way ranging exchange, returning the estimated
    /// one-way time
    ///
    /// Timestamp algebra of the exchange:
    /// t1 = send (initiator clock), t2 = receive (responder clock),
    /// t3 = reply after the processing delay, t4 = final receive.
    /// The round trip (t4 - t1) - (t3 - t2) cancels the processing delay;
    /// half of it estimates the one-way time, biased by the two clock
    /// offsets and blurred by measurement noise.
    pub fn two_way_ranging(
        &mut self,
        initiator: &ReferenceStation,
        responder: &ReferenceStation,
        now: f64,
    ) -> f64 {
        let propagation = propagation_time(&initiator.position(), &responder.position());

        let t1 = now + initiator.time_offset();
        let t2 = t1 + propagation + responder.time_offset();
        let t3 = t2 + PROCESSING_DELAY;
        let t4 = t3 + propagation + initiator.time_offset();

        let round_trip = (t4 - t1) - (t3 - t2);
        let one_way = round_trip / 2.0;
        one_way + self.rng.next_normal(0.0, MEASUREMENT_NOISE_STD)
    }

    /// Synchronize every aerial station's clock against the network
    pub fn synchronize_network(
        &mut self,
        ground: &ReferenceStation,
        aerial: &mut [ReferenceStation],
        now: f64,
    ) {
        // Phase one: each station ranges against the ground reference.
        // The median filters outlier samples.
        for station in aerial.iter_mut() {
            let mut samples = [0.0f64; TWR_SAMPLES];
            for sample in &mut samples {
                *sample = self.two_way_ranging(station, ground, now);
            }
            station.set_time_offset(median(&mut samples));
        }

        // Phase two: mutual convergence. Every unordered pair exchanges
        // once per round and both settle on the pairwise average; rounds
        // repeat until the fleet agrees to within the noise floor.
        for _ in 0..MAX_PAIRWISE_ROUNDS {
            if offset_spread(aerial) <= PAIRWISE_CONVERGENCE_SPREAD {
                break;
            }
            for i in 0..aerial.len() {
                for j in (i + 1)..aerial.len() {
                    let (left, right) = aerial.split_at_mut(j);
                    let a = &mut left[i];
                    let b = &mut right[0];
                    let _exchange = self.two_way_ranging(a, b, now);
                    let mean = (a.time_offset() + b.time_offset()) / 2.0;
                    a.set_time_offset(mean);
                    b.set_time_offset(mean);
                }
            }
        }

        self.sync_count += 1;
        log::debug!(
            "time sync #{} complete for {} aerial stations",
            self.sync_count,
            aerial.len()
        );
    }

    /// Number of completed synchronization rounds
    pub fn sync_count(&self) -> u64 {
        self.sync_count
    }
}

/// Largest clock disagreement across the aerial fleet
fn offset_spread(aerial: &[ReferenceStation]) -> f64 {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for station in aerial {
        min = min.min(station.time_offset());
        max = max.max(station.time_offset());
    }
    if aerial.is_empty() {
        0.0
    } else {
        max - min
    }
}

/// Median of a small sample buffer
fn median(samples: &mut [f64]) -> f64 {
    samples.sort_by(f64::total_cmp);
    let mid = samples.len() / 2;
    if samples.len() % 2 == 1 {
        samples[mid]
    } else {
        (samples[mid - 1] + samples[mid]) / 2.0
    }
}
