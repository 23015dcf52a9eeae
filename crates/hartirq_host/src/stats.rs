//! Tick burst statistics.
//!
//! Every timer interrupt delivers one tick plus one for each period that
//! elapsed while interrupts were masked. The size of these bursts shows
//! how long the system ran with the timer interrupt held off.

const BUCKETS: usize = 16;

/// Distribution of ticks delivered per timer interrupt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickStats {
    pub min: u32,
    pub max: u32,
    pub sum: u64,
    pub count: u64,
    /// `buckets[i]` counts bursts of `i + 1` ticks; the last bucket also
    /// takes every larger burst.
    pub buckets: [u64; BUCKETS],
}

impl Default for TickStats {
    fn default() -> Self {
        Self::new()
    }
}

impl TickStats {
    pub fn new() -> Self {
        Self {
            min: u32::MAX,
            max: 0,
            sum: 0,
            count: 0,
            buckets: [0; BUCKETS],
        }
    }

    /// Records the number of ticks one timer interrupt delivered.
    pub fn record(&mut self, ticks: u32) {
        self.min = self.min.min(ticks);
        self.max = self.max.max(ticks);
        self.sum += u64::from(ticks);
        self.count += 1;

        let idx = (ticks.max(1) as usize - 1).min(BUCKETS - 1);
        self.buckets[idx] += 1;
    }

    /// Ticks that were delivered late, i.e. beyond the first of each burst.
    pub fn caught_up(&self) -> u64 {
        self.sum - self.count
    }

    pub fn avg(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum as f64 / self.count as f64
        }
    }

    pub fn merge(&mut self, other: &TickStats) {
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
        self.sum += other.sum;
        self.count += other.count;
        for (mine, theirs) in self.buckets.iter_mut().zip(other.buckets) {
            *mine += theirs;
        }
    }

    pub fn print_report(&self) {
        println!("\nTick Bursts");
        println!("Interrupts: {}", self.count);
        if self.count == 0 {
            return;
        }
        println!("Min:        {}", self.min);
        println!("Avg:        {:.2}", self.avg());
        println!("Max:        {}", self.max);
        println!("Caught up:  {}", self.caught_up());

        println!("Distribution (ticks per interrupt):");
        for (i, &count) in self.buckets.iter().enumerate() {
            if count > 0 {
                let more = if i == BUCKETS - 1 { "+" } else { "" };
                println!("[{:3}{}]: {}", i + 1, more, count);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bursts_land_in_their_bucket() {
        let mut stats = TickStats::new();
        for ticks in [1, 1, 4, 40] {
            stats.record(ticks);
        }
        assert_eq!(stats.count, 4);
        assert_eq!(stats.min, 1);
        assert_eq!(stats.max, 40);
        assert_eq!(stats.caught_up(), 42);
        assert_eq!(stats.buckets[0], 2);
        assert_eq!(stats.buckets[3], 1);
        assert_eq!(stats.buckets[BUCKETS - 1], 1);
    }

    #[test]
    fn merge_adds_up() {
        let mut a = TickStats::new();
        a.record(2);
        let mut b = TickStats::new();
        b.record(5);
        b.record(1);
        a.merge(&b);
        assert_eq!(a.count, 3);
        assert_eq!(a.sum, 8);
        assert_eq!((a.min, a.max), (1, 5));
    }
}
