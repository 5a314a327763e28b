//! Corpus statistics collection for `--stats` output.

use std::time::{Duration, Instant};

/// Collects corpus counters and phase timings.
///
/// Created when `--stats` is passed, threaded as `Option<&mut Stats>`.
pub struct Stats {
    total_start: Instant,
    phases: Vec<(&'static str, Duration)>,
    pub files_loaded: usize,
    pub files_skipped: usize,
    pub entities: usize,
    pub components: usize,
    pub nodes: usize,
    pub samples: usize,
}

impl Default for Stats {
    fn default() -> Self {
        Self::new()
    }
}

impl Stats {
    pub fn new() -> Self {
        Self {
            total_start: Instant::now(),
            phases: Vec::new(),
            files_loaded: 0,
            files_skipped: 0,
            entities: 0,
            components: 0,
            nodes: 0,
            samples: 0,
        }
    }

    /// Record a completed phase with its duration.
    pub fn add_phase(&mut self, name: &'static str, duration: Duration) {
        self.phases.push((name, duration));
    }

    pub fn phases(&self) -> &[(&'static str, Duration)] {
        &self.phases
    }

    /// Print the stats table to stderr.
    pub fn display(&self) {
        let total = self.total_start.elapsed();
        eprintln!();
        eprintln!("=== Netgraph Stats ===");

        for (name, dur) in &self.phases {
            eprintln!("  {:<24} {:>8.3}s", name, dur.as_secs_f64());
        }

        if self.files_loaded > 0 || self.files_skipped > 0 {
            eprintln!("  Files:                  loaded={}  skipped={}", self.files_loaded, self.files_skipped);
        }
        eprintln!("  Entities:               {} ({} components, {} nodes)", self.entities, self.components, self.nodes);
        if self.samples > 0 {
            eprintln!("  Samples:                {}", self.samples);
        }

        eprintln!("  ─────────────────────────────────");
        eprintln!("  Total:                  {:>8.3}s", total.as_secs_f64());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_recorded_in_order() {
        let mut stats = Stats::new();
        stats.add_phase("load", Duration::from_millis(3));
        stats.add_phase("encode", Duration::from_millis(1));
        let names: Vec<_> = stats.phases().iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["load", "encode"]);
    }
}
