//! Advancing transfers by one progress update.

use edgesim_core::EPSILON;

use crate::allocator::Allocation;
use crate::transfer::Transfer;

/// Outcome of a single update of a transfer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Progress {
    /// Capacity the transfer progressed with.
    pub bandwidth: f64,
    /// Amount of data moved during the update.
    pub moved: f64,
    /// Time needed to move that data at the given capacity, at most the update interval.
    pub usage_time: f64,
    /// Whether the transfer has no data left.
    pub completed: bool,
}

/// Moves transfer data according to the assigned capacities.
#[derive(Clone, Copy, Debug)]
pub struct ProgressEngine {
    interval: f64,
}

impl ProgressEngine {
    /// Creates engine with the given update interval.
    pub fn new(interval: f64) -> Self {
        Self { interval }
    }

    /// Update interval.
    pub fn interval(&self) -> f64 {
        self.interval
    }

    /// Applies the allocation to the transfer for one interval.
    ///
    /// Usage time is charged only for the data actually moved, so a transfer finishing early in the interval
    /// is not charged for the rest of it.
    pub fn advance(&self, transfer: &mut Transfer, allocation: &Allocation) -> Progress {
        transfer.assign(allocation.lan_bandwidth, allocation.wan_bandwidth, allocation.uses_wan);
        let bandwidth = allocation.effective_bandwidth();
        let remaining = transfer.remaining_size();
        let capacity = bandwidth * self.interval;
        // residues left by floating-point division are treated as done
        let moved = if capacity >= remaining - EPSILON * transfer.size().max(1.) {
            remaining
        } else {
            capacity
        };
        let usage_time = if bandwidth > 0. { moved / bandwidth } else { 0. };
        transfer.record_progress(moved, usage_time, bandwidth);
        Progress {
            bandwidth,
            moved,
            usage_time,
            completed: transfer.remaining_size() == 0.,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transfer::{TaskRef, TransferKind};

    fn transfer(size: f64) -> Transfer {
        let task = TaskRef {
            task_id: 1,
            origin: 0,
            orchestrator: 0,
            destination: 1,
            registry: None,
            notify: 0,
        };
        Transfer::new(1, task, size, TransferKind::OutboundTask, 0.)
    }

    fn allocation(lan: f64, wan: f64, uses_wan: bool) -> Allocation {
        Allocation {
            lan_bandwidth: lan,
            wan_bandwidth: wan,
            uses_wan,
            lan_contenders: 1,
            wan_contenders: 1,
        }
    }

    #[test]
    fn partial_update_charges_only_used_time() {
        let engine = ProgressEngine::new(1.);
        let mut t = transfer(10.);
        let progress = engine.advance(&mut t, &allocation(50., 0., false));
        assert!(progress.completed);
        assert_eq!(progress.moved, 10.);
        assert_eq!(t.remaining_size(), 0.);
        assert_eq!(t.lan_usage_time(), 0.2);
        assert_eq!(t.wan_usage_time(), 0.);
    }

    #[test]
    fn wan_transfer_is_limited_by_narrowest_link() {
        let engine = ProgressEngine::new(1.);
        let mut t = transfer(100.);
        let progress = engine.advance(&mut t, &allocation(100., 20., true));
        assert_eq!(progress.bandwidth, 20.);
        assert_eq!(t.remaining_size(), 80.);
        assert_eq!(t.lan_usage_time(), 1.);
        assert_eq!(t.wan_usage_time(), 1.);
        assert_eq!(t.average_bandwidth(), 20.);
    }

    #[test]
    fn remaining_size_decreases_to_exact_zero() {
        let engine = ProgressEngine::new(1.);
        let mut t = transfer(100.);
        let mut previous = t.remaining_size();
        let mut updates = 0;
        loop {
            let progress = engine.advance(&mut t, &allocation(100. / 3., 0., false));
            updates += 1;
            assert!(t.remaining_size() <= previous);
            assert!(t.remaining_size() >= 0.);
            previous = t.remaining_size();
            if progress.completed {
                break;
            }
        }
        assert_eq!(updates, 3);
        assert_eq!(t.remaining_size(), 0.);
        assert!((t.lan_usage_time() - 3.).abs() < 1e-9);
    }

    #[test]
    fn average_bandwidth_over_updates() {
        let engine = ProgressEngine::new(0.5);
        let mut t = transfer(100.);
        engine.advance(&mut t, &allocation(100., 0., false));
        engine.advance(&mut t, &allocation(50., 0., false));
        assert_eq!(t.remaining_size(), 25.);
        assert_eq!(t.average_bandwidth(), 75.);
        assert_eq!(t.lan_usage_time(), 1.);
    }

    #[test]
    fn empty_transfer_completes_without_usage() {
        let engine = ProgressEngine::new(1.);
        let mut t = transfer(0.);
        let progress = engine.advance(&mut t, &allocation(100., 0., false));
        assert!(progress.completed);
        assert_eq!(t.lan_usage_time(), 0.);
    }
}
