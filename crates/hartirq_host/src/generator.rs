//! Stress script generator.
//!
//! Produces a scenario mixing timer progress, masked stretches of random
//! length and bursts of external and software interrupts, for replay with
//! `simulate`.

use anyhow::{Context, Result};
use hartirq_common::cause::IRQ_M_SOFTWARE;
use hartirq_io::BoardConfig;
use std::fs::File;
use std::io::{BufWriter, Write};

use crate::rng::XorShift;

/// Parameters of a generated script.
pub struct StressParams {
    pub board: BoardConfig,
    /// PLIC sources to install, spread over `1..board.platform`.
    pub sources: usize,
    pub events: usize,
    /// Probability that an event masks interrupts.
    pub mask_rate: f64,
    /// Longest masked stretch, in tick periods.
    pub max_mask_periods: u64,
    pub seed: u64,
}

pub fn write_stress_script<W: Write>(out: &mut W, params: &StressParams) -> Result<()> {
    let board = params.board;
    let reload = u64::from(board.timer_freq / board.tick_freq);
    let mut rng = XorShift::new(params.seed);

    writeln!(out, "# generated stress script, seed {}", params.seed)?;
    writeln!(
        out,
        "board timer_freq={} tick_freq={} local={} platform={}",
        board.timer_freq, board.tick_freq, board.local, board.platform
    )?;

    let mut sources: Vec<usize> = Vec::with_capacity(params.sources);
    while sources.len() < params.sources.min(board.platform.saturating_sub(1)) {
        let source = rng.below(board.platform as u64 - 1) as usize + 1;
        if !sources.contains(&source) {
            sources.push(source);
        }
    }
    sources.sort_unstable();
    for &source in &sources {
        writeln!(out, "install plic {} priority={}", source, rng.below(7) + 1)?;
    }

    for _ in 0..params.events {
        if rng.chance(params.mask_rate) {
            let periods = rng.below(params.max_mask_periods) + 1;
            writeln!(out, "mask {}", periods * reload + rng.below(reload))?;
            continue;
        }
        match rng.below(4) {
            0 if !sources.is_empty() => {
                let source = sources[rng.below(sources.len() as u64) as usize];
                writeln!(out, "raise plic {}", source)?;
            }
            1 => writeln!(out, "raise local {}", IRQ_M_SOFTWARE)?,
            2 => writeln!(out, "query")?,
            _ => writeln!(out, "advance {}", rng.below(4 * reload) + 1)?,
        }
    }
    writeln!(out, "query")?;
    Ok(())
}

pub fn generate_stress_script(path: &str, params: &StressParams) -> Result<()> {
    println!(
        "Generating {} events over {} sources (seed {})...",
        params.events, params.sources, params.seed
    );
    let file = File::create(path).with_context(|| format!("Failed to create {}", path))?;
    let mut out = BufWriter::new(file);
    write_stress_script(&mut out, params)?;
    out.flush()?;
    println!("Done.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hartirq_io::{Event, parse_script};

    #[test]
    fn generated_scripts_parse_and_run() {
        let params = StressParams {
            board: BoardConfig {
                timer_freq: 100_000,
                tick_freq: 100,
                local: 16,
                platform: 32,
            },
            sources: 6,
            events: 500,
            mask_rate: 0.2,
            max_mask_periods: 8,
            seed: 42,
        };
        let mut text = Vec::new();
        write_stress_script(&mut text, &params).unwrap();

        let script = parse_script(std::str::from_utf8(&text).unwrap()).unwrap();
        assert_eq!(script.board, params.board);
        assert_eq!(script.setup.len(), 6);
        assert_eq!(script.events.len(), 501);
        assert_eq!(script.events.last(), Some(&Event::Query));

        let report = crate::sim::run(&script).unwrap();
        assert_eq!(report.counters.spurious_claims, 0);
        assert!(report.compare > report.counter);
    }
}
