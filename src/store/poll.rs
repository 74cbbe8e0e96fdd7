//! Retry machinery for delegated writes. The host offers no push
//! signal when a URL-scheme mutation lands in its store, so the only
//! consistency primitive is bounded polling: wait, probe, repeat,
//! give up. Cadence and budget live here so they can be tested and
//! tuned without touching the store code.

use std::time::Duration;

/// Polling cadence for one reconciliation. The defaults are sized to
/// the host's observed write latency; tightening them risks false
/// timeouts on slower machines.
#[derive(Debug, Clone)]
pub struct PollPlan {
    /// Sleep before the first probe. The host needs noticeably longer
    /// to process a URL request than to commit subsequent writes.
    pub initial_delay: Duration,
    /// Sleep between probes after the first.
    pub interval: Duration,
    /// Hard ceiling on probes.
    pub max_attempts: u32,
}

impl Default for PollPlan {
    fn default() -> Self {
        PollPlan {
            initial_delay: Duration::from_millis(1500),
            interval: Duration::from_millis(500),
            max_attempts: 15,
        }
    }
}

impl PollPlan {
    /// Zero-delay plan; probes run back to back. Meant for tests.
    pub fn immediate(max_attempts: u32) -> Self {
        PollPlan {
            initial_delay: Duration::ZERO,
            interval: Duration::ZERO,
            max_attempts,
        }
    }
}

/// Terminal states of a reconciliation. The interior state (row not
/// yet visible, budget remaining) lives inside [`run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation<T> {
    /// The expected row appeared; carries the probe's finding.
    Visible(T),
    /// The retry budget was exhausted without a sighting.
    Expired,
}

/// Yields the delay to observe before each probe, then `None` once
/// the budget is spent.
#[derive(Debug)]
pub struct Reconciler {
    plan: PollPlan,
    probes_issued: u32,
}

impl Reconciler {
    pub fn new(plan: PollPlan) -> Self {
        Reconciler {
            plan,
            probes_issued: 0,
        }
    }

    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.probes_issued >= self.plan.max_attempts {
            return None;
        }
        let delay = if self.probes_issued == 0 {
            self.plan.initial_delay
        } else {
            self.plan.interval
        };
        self.probes_issued += 1;
        Some(delay)
    }

    pub fn probes_issued(&self) -> u32 {
        self.probes_issued
    }
}

/// Drives a reconciliation to a terminal state. `sleep` is injected
/// so callers (and tests) control real time; `probe` returns the row
/// when it has become visible. Probe-side failures are the probe's
/// business: report them as "not visible yet" to keep retrying.
pub fn run<T>(
    plan: &PollPlan,
    mut sleep: impl FnMut(Duration),
    mut probe: impl FnMut() -> Option<T>,
) -> Reconciliation<T> {
    let mut reconciler = Reconciler::new(plan.clone());
    while let Some(delay) = reconciler.next_delay() {
        if !delay.is_zero() {
            sleep(delay);
        }
        if let Some(found) = probe() {
            return Reconciliation::Visible(found);
        }
    }
    Reconciliation::Expired
}
