//! Parallel check of the tick catch-up arithmetic.
//!
//! Each sample picks a reload value, a compare value and how far the
//! counter ran past it, then runs the catch-up once and checks the result
//! against the closed form.

use anyhow::{Result, bail};
use hartirq_core::tick::{MachineTimer, TickGenerator};
use rayon::prelude::*;
use std::cell::Cell;
use std::num::NonZeroU32;
use std::time::Instant;

use crate::rng::XorShift;
use crate::stats::TickStats;

struct SweepTimer {
    counter: Cell<u64>,
    compare: Cell<u64>,
    writes: Cell<u32>,
}

impl MachineTimer for SweepTimer {
    fn counter(&self) -> u64 {
        self.counter.get()
    }

    fn set_counter(&self, value: u64) {
        self.counter.set(value);
    }

    fn compare(&self) -> u64 {
        self.compare.get()
    }

    fn set_compare(&self, value: u64) {
        self.writes.set(self.writes.get() + 1);
        self.compare.set(value);
    }

    fn interrupt_pending(&self) -> bool {
        self.counter.get() >= self.compare.get()
    }
}

#[derive(Debug)]
struct Violation {
    reload: u64,
    compare: u64,
    counter: u64,
    what: &'static str,
}

/// Runs one sample; returns the ticks delivered.
fn check(rng: &mut XorShift, max_lag: u64) -> Result<u32, Violation> {
    let reload = rng.below(100_000) + 1;
    let compare = rng.below(1 << 40) + reload;
    let counter = compare + rng.below(max_lag * reload + 1);

    let ticks = TickGenerator::new(
        SweepTimer {
            counter: Cell::new(counter),
            compare: Cell::new(compare),
            writes: Cell::new(0),
        },
        NonZeroU32::new(reload as u32).ok_or(Violation {
            reload,
            compare,
            counter,
            what: "zero reload",
        })?,
    );
    let violation = |what| Violation {
        reload,
        compare,
        counter,
        what,
    };

    let mut seen = 0u32;
    let delivered = ticks.catch_up(|| seen += 1);
    let timer = ticks.timer();
    let after = timer.compare();

    if delivered != seen {
        return Err(violation("return value differs from callbacks"));
    }
    if u64::from(delivered) != (counter - compare) / reload + 1 {
        return Err(violation("tick count"));
    }
    if after <= counter || after - counter > reload {
        return Err(violation("next compare outside one period"));
    }
    if (after - compare) % reload != 0 {
        return Err(violation("next compare off the period grid"));
    }
    if timer.writes.get() != 1 {
        return Err(violation("compare written more than once"));
    }

    // After the catch-up the counter sits inside the new period.
    if u64::from(ticks.elapsed_cycles()) >= reload {
        return Err(violation("elapsed cycles beyond reload"));
    }
    Ok(delivered)
}

pub fn run_sweep(samples: usize, max_lag: u64, seed: u64) -> Result<()> {
    const CHUNK: usize = 4096;

    println!("Sweeping {} samples (lag up to {} periods)...", samples, max_lag);
    let start = Instant::now();
    let chunks = samples.div_ceil(CHUNK);

    let results: Vec<(TickStats, Vec<Violation>)> = (0..chunks)
        .into_par_iter()
        .map(|chunk| {
            let mut rng = XorShift::new(seed ^ (chunk as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15));
            let mut stats = TickStats::new();
            let mut violations = Vec::new();
            let n = CHUNK.min(samples - chunk * CHUNK);
            for _ in 0..n {
                match check(&mut rng, max_lag) {
                    Ok(delivered) => stats.record(delivered),
                    Err(v) => violations.push(v),
                }
            }
            (stats, violations)
        })
        .collect();

    let mut stats = TickStats::new();
    let mut violations = Vec::new();
    for (chunk_stats, chunk_violations) in results {
        stats.merge(&chunk_stats);
        violations.extend(chunk_violations);
    }

    let seconds = start.elapsed().as_secs_f64();
    println!("Time: {:.4} s", seconds);
    println!("Rate: {:.2} samples/s", samples as f64 / seconds);
    stats.print_report();

    if let Some(first) = violations.first() {
        log::error!("{} violations, first: {:?}", violations.len(), first);
        bail!("catch-up check failed: {}", first.what);
    }
    println!("All {} samples passed.", samples);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn samples_pass() {
        let mut rng = XorShift::new(7);
        for _ in 0..10_000 {
            check(&mut rng, 64).unwrap();
        }
    }

    #[test]
    fn zero_lag_delivers_one_tick() {
        let mut rng = XorShift::new(99);
        for _ in 0..1000 {
            assert_eq!(check(&mut rng, 0).unwrap(), 1);
        }
    }
}
