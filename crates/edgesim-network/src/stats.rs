//! Aggregated network statistics.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::progress::Progress;
use crate::transfer::{TransferKind, TransferReport};

/// Counters accumulated over a simulation run.
#[derive(Clone, Debug, Default, Serialize)]
pub struct NetworkStats {
    /// Number of submitted transfers.
    pub submitted: u64,
    /// Number of completed transfers.
    pub completed: u64,
    /// Number of abandoned transfers.
    pub abandoned: u64,
    /// Number of completed transfers per kind.
    pub completed_by_kind: BTreeMap<TransferKind, u64>,
    /// Amount of data moved per kind, including partially moved abandoned transfers.
    pub volume_by_kind: BTreeMap<TransferKind, f64>,
    /// Total LAN usage time of all transfers.
    pub lan_usage_time: f64,
    /// Total WAN usage time of all transfers.
    pub wan_usage_time: f64,
    /// Number of performed progress updates.
    pub updates: u64,
    average_bandwidth_sum: f64,
}

impl NetworkStats {
    pub(crate) fn on_submitted(&mut self) {
        self.submitted += 1;
    }

    pub(crate) fn on_progress(&mut self, kind: TransferKind, uses_wan: bool, progress: &Progress) {
        *self.volume_by_kind.entry(kind).or_default() += progress.moved;
        self.lan_usage_time += progress.usage_time;
        if uses_wan {
            self.wan_usage_time += progress.usage_time;
        }
    }

    pub(crate) fn on_completed(&mut self, report: &TransferReport) {
        self.completed += 1;
        *self.completed_by_kind.entry(report.kind).or_default() += 1;
        self.average_bandwidth_sum += report.average_bandwidth;
    }

    pub(crate) fn on_abandoned(&mut self) {
        self.abandoned += 1;
    }

    /// Mean of average capacities of completed transfers.
    pub fn average_transfer_bandwidth(&self) -> f64 {
        if self.completed == 0 {
            0.
        } else {
            self.average_bandwidth_sum / self.completed as f64
        }
    }

    /// Total amount of moved data.
    pub fn total_volume(&self) -> f64 {
        self.volume_by_kind.values().sum()
    }
}
