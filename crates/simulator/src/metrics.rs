//! Metrics collection for simulation runs.

use crate::workload::WorkloadKind;
use hdrhistogram::Histogram;
use hypercore_core::{ActionId, ActionOutcome};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tracing::warn;

/// Collects per-action counters and settle latency during a run.
pub struct MetricsCollector {
    in_flight: HashMap<ActionId, (WorkloadKind, Duration)>,
    submitted: BTreeMap<WorkloadKind, u64>,
    applied: BTreeMap<WorkloadKind, u64>,
    dropped: BTreeMap<WorkloadKind, u64>,
    drop_reasons: BTreeMap<&'static str, u64>,
    /// Settle latency in milliseconds of simulated time.
    latency: Histogram<u64>,
    credits_released: u64,
    mirror_transfers: u64,
    conservation_violations: u64,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            in_flight: HashMap::new(),
            submitted: BTreeMap::new(),
            applied: BTreeMap::new(),
            dropped: BTreeMap::new(),
            drop_reasons: BTreeMap::new(),
            // Auto-resizing, 3 significant figures.
            latency: Histogram::new(3).expect("Histogram creation should never fail"),
            credits_released: 0,
            mirror_transfers: 0,
            conservation_violations: 0,
        }
    }

    /// Record that an action entered the queue.
    pub fn record_queued(&mut self, id: ActionId, kind: WorkloadKind, now: Duration) {
        self.in_flight.insert(id, (kind, now));
        *self.submitted.entry(kind).or_default() += 1;
    }

    /// Record a terminal outcome. Unknown ids are ignored.
    pub fn record_settled(&mut self, id: ActionId, outcome: &ActionOutcome, now: Duration) {
        let Some((kind, queued_at)) = self.in_flight.remove(&id) else {
            return;
        };
        match outcome.drop_reason() {
            None => *self.applied.entry(kind).or_default() += 1,
            Some(reason) => {
                *self.dropped.entry(kind).or_default() += 1;
                *self.drop_reasons.entry(reason.label()).or_default() += 1;
            }
        }
        let millis = now.saturating_sub(queued_at).as_millis() as u64;
        // Auto-resizing; only fails past the histogram's u64 ceiling.
        if let Err(error) = self.latency.record(millis) {
            warn!(%error, millis, "Settle latency not recorded");
        }
    }

    pub fn record_credit_released(&mut self) {
        self.credits_released += 1;
    }

    pub fn record_mirror_transfer(&mut self) {
        self.mirror_transfers += 1;
    }

    pub fn record_conservation_violation(&mut self) {
        self.conservation_violations += 1;
    }

    /// Number of actions still waiting in the queue.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Build the final report.
    pub fn report(&self, duration: Duration, supply: SupplySnapshot) -> SimulationReport {
        let total_submitted = self.submitted.values().sum();
        let total_applied = self.applied.values().sum();
        let total_dropped = self.dropped.values().sum();

        let quantile = |q: f64| {
            if self.latency.len() == 0 {
                0.0
            } else {
                self.latency.value_at_quantile(q) as f64 / 1_000.0
            }
        };

        let kinds = self
            .submitted
            .iter()
            .map(|(kind, submitted)| {
                let stats = KindStats {
                    submitted: *submitted,
                    applied: self.applied.get(kind).copied().unwrap_or(0),
                    dropped: self.dropped.get(kind).copied().unwrap_or(0),
                };
                (kind.name().to_string(), stats)
            })
            .collect();

        SimulationReport {
            duration_secs: duration.as_secs_f64(),
            total_submitted,
            total_applied,
            total_dropped,
            in_flight: self.in_flight.len() as u64,
            kinds,
            drop_reasons: self
                .drop_reasons
                .iter()
                .map(|(label, count)| (label.to_string(), *count))
                .collect(),
            latency_p50_secs: quantile(0.50),
            latency_p90_secs: quantile(0.90),
            latency_p99_secs: quantile(0.99),
            latency_max_secs: self.latency.max() as f64 / 1_000.0,
            credits_released: self.credits_released,
            mirror_transfers: self.mirror_transfers,
            conservation_violations: self.conservation_violations,
            supply,
        }
    }
}

/// Per-kind counters.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct KindStats {
    pub submitted: u64,
    pub applied: u64,
    pub dropped: u64,
}

/// Totals checked for conservation at the end of a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SupplySnapshot {
    pub usd_supply: u128,
    pub usd_expected: u128,
    pub staking_supply: u128,
    pub staking_expected: u128,
}

impl SupplySnapshot {
    pub fn is_conserved(&self) -> bool {
        self.usd_supply == self.usd_expected && self.staking_supply == self.staking_expected
    }
}

/// Summary of a simulation run.
#[derive(Clone, Debug, Serialize)]
pub struct SimulationReport {
    /// Simulated time covered.
    pub duration_secs: f64,
    pub total_submitted: u64,
    pub total_applied: u64,
    pub total_dropped: u64,
    /// Actions still queued when the run ended.
    pub in_flight: u64,
    pub kinds: BTreeMap<String, KindStats>,
    pub drop_reasons: BTreeMap<String, u64>,
    pub latency_p50_secs: f64,
    pub latency_p90_secs: f64,
    pub latency_p99_secs: f64,
    pub latency_max_secs: f64,
    pub credits_released: u64,
    pub mirror_transfers: u64,
    /// Flushes after which a supply total did not match.
    pub conservation_violations: u64,
    pub supply: SupplySnapshot,
}

impl SimulationReport {
    /// Print a human-readable summary to stdout.
    pub fn print(&self) {
        println!("\n=== Simulation Report ===");
        println!("Simulated time:  {:.0}s", self.duration_secs);
        println!(
            "Actions:         {} submitted, {} applied, {} dropped, {} in flight",
            self.total_submitted, self.total_applied, self.total_dropped, self.in_flight
        );

        println!("\nBy kind:");
        for (kind, stats) in &self.kinds {
            println!(
                "  {:<20} {:>8} submitted {:>8} applied {:>8} dropped",
                kind, stats.submitted, stats.applied, stats.dropped
            );
        }

        if !self.drop_reasons.is_empty() {
            println!("\nDrop reasons:");
            for (reason, count) in &self.drop_reasons {
                println!("  {:<24} {:>8}", reason, count);
            }
        }

        println!("\nSettle latency (simulated):");
        println!("  p50: {:.1}s", self.latency_p50_secs);
        println!("  p90: {:.1}s", self.latency_p90_secs);
        println!("  p99: {:.1}s", self.latency_p99_secs);
        println!("  max: {:.1}s", self.latency_max_secs);

        println!("\nDeferred credits released: {}", self.credits_released);
        println!("Mirror transfers:          {}", self.mirror_transfers);
        println!(
            "Conservation:              {}",
            if self.conservation_violations == 0 && self.supply.is_conserved() {
                "ok".to_string()
            } else {
                format!("{} violations", self.conservation_violations)
            }
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hypercore_core::DropReason;

    #[test]
    fn test_counts_and_latency() {
        let mut metrics = MetricsCollector::new();
        metrics.record_queued(ActionId::new(0), WorkloadKind::SpotSend, Duration::ZERO);
        metrics.record_queued(ActionId::new(1), WorkloadKind::VaultDeposit, Duration::ZERO);
        metrics.record_queued(ActionId::new(2), WorkloadKind::Malformed, Duration::ZERO);
        metrics.record_settled(ActionId::new(0), &ActionOutcome::Applied, Duration::ZERO);
        metrics.record_settled(
            ActionId::new(1),
            &ActionOutcome::Applied,
            Duration::from_secs(240),
        );

        let report = metrics.report(Duration::from_secs(300), SupplySnapshot::default());
        assert_eq!(report.total_submitted, 3);
        assert_eq!(report.total_applied, 2);
        assert_eq!(report.in_flight, 1);
        assert_eq!(report.kinds["vault_deposit"].applied, 1);
        assert!(report.latency_max_secs >= 239.0);
        assert!(report.latency_p90_secs >= 239.0);
        assert_eq!(report.latency_p50_secs, 0.0);
        assert!(report.supply.is_conserved());
    }

    #[test]
    fn test_latency_beyond_initial_range() {
        let mut metrics = MetricsCollector::new();
        let week = Duration::from_secs(7 * 24 * 60 * 60);
        metrics.record_queued(ActionId::new(0), WorkloadKind::StakingWithdraw, Duration::ZERO);
        metrics.record_settled(ActionId::new(0), &ActionOutcome::Applied, week);

        let report = metrics.report(week, SupplySnapshot::default());
        let secs = week.as_secs_f64();
        assert!(report.latency_max_secs >= secs * 0.999);
        assert!(report.latency_p50_secs >= secs * 0.999);
    }

    #[test]
    fn test_drop_reasons_by_label() {
        let mut metrics = MetricsCollector::new();
        metrics.record_queued(ActionId::new(7), WorkloadKind::SpotSend, Duration::ZERO);
        metrics.record_settled(
            ActionId::new(7),
            &ActionOutcome::Dropped(DropReason::AmountOutOfRange),
            Duration::ZERO,
        );
        // Settling twice is ignored.
        metrics.record_settled(ActionId::new(7), &ActionOutcome::Applied, Duration::ZERO);

        let report = metrics.report(Duration::ZERO, SupplySnapshot::default());
        assert_eq!(report.total_dropped, 1);
        assert_eq!(report.total_applied, 0);
        assert_eq!(report.drop_reasons["amount_out_of_range"], 1);
    }
}
