//! Periodic driver of transfer progress.

use std::cell::RefCell;
use std::rc::Rc;

use serde::Serialize;

use edgesim_core::{cast, log_debug, log_trace, log_warn};
use edgesim_core::{Event, EventHandler, EventId, Id, SimulationContext};

use crate::allocator::BandwidthAllocator;
use crate::config::NetworkConfig;
use crate::dispatcher::CompletionDispatcher;
use crate::error::ConfigError;
use crate::locality::{LocalityClassifier, Scope};
use crate::location::{LocationModel, StaticLocation};
use crate::node::{Node, NodeId, NodeTable, NodeTier};
use crate::progress::ProgressEngine;
use crate::stats::NetworkStats;
use crate::transfer::{TaskRef, Transfer, TransferId, TransferKind, TransferReport, TransferState};

/// Self-event triggering a progress update.
#[derive(Clone, Serialize)]
pub struct ProgressTick {}

/// Request to stop the engine at simulation teardown.
#[derive(Clone, Serialize)]
pub struct StopNetwork {}

/// Notification about a failed node, e.g. a device with a depleted battery.
#[derive(Clone, Serialize)]
pub struct NodeFailed {
    /// Failed node.
    pub node: NodeId,
}

/// Lifecycle state of the progress updates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum SchedulerState {
    /// Created but not started yet.
    Idle,
    /// Updates are performed periodically.
    Running,
    /// Stopped for good, no transfers are processed anymore.
    Stopped,
}

/// Network engine modelling concurrent transfers over shared LAN and WAN links.
///
/// Producers submit transfers at any time. Every `update_interval` the engine admits the new transfers,
/// groups all of them by the links they share, splits link capacities equally within the groups,
/// moves the data and emits a completion event for each transfer that has no data left.
pub struct NetworkEngine {
    config: NetworkConfig,
    nodes: NodeTable,
    location: Rc<RefCell<dyn LocationModel>>,
    allocator: BandwidthAllocator,
    progress: ProgressEngine,
    dispatcher: CompletionDispatcher,
    pending: Vec<Transfer>,
    active: Vec<Transfer>,
    history: Vec<TransferReport>,
    stats: NetworkStats,
    utilization_history: Vec<(f64, f64)>,
    state: SchedulerState,
    next_tick: Option<EventId>,
    next_transfer_id: TransferId,
    ctx: SimulationContext,
}

impl NetworkEngine {
    /// Creates engine with validated config.
    pub fn new(config: NetworkConfig, ctx: SimulationContext) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            allocator: BandwidthAllocator::new(&config),
            progress: ProgressEngine::new(config.update_interval),
            dispatcher: CompletionDispatcher::new(config.wan_propagation_delay),
            config,
            nodes: NodeTable::new(),
            location: Rc::new(RefCell::new(StaticLocation)),
            pending: Vec::new(),
            active: Vec::new(),
            history: Vec::new(),
            stats: NetworkStats::default(),
            utilization_history: Vec::new(),
            state: SchedulerState::Idle,
            next_tick: None,
            next_transfer_id: 0,
            ctx,
        })
    }

    /// Replaces the location model consulted on every update.
    pub fn set_location_model(&mut self, location: Rc<RefCell<dyn LocationModel>>) {
        self.location = location;
    }

    /// Returns the component id of the engine.
    pub fn id(&self) -> Id {
        self.ctx.id()
    }

    /// Returns the engine config.
    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    /// Returns the lifecycle state.
    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Registers a network node.
    pub fn add_node(&mut self, name: &str, tier: NodeTier) -> NodeId {
        let id = self.nodes.add(name, tier);
        log_debug!(self.ctx, "added node {} ({:?}) with id {}", name, tier, id);
        id
    }

    /// Returns the node with the given id.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Returns all registered nodes.
    pub fn nodes(&self) -> &NodeTable {
        &self.nodes
    }

    /// Starts periodic updates, the first one happens after `update_interval`.
    pub fn start(&mut self) {
        match self.state {
            SchedulerState::Idle => {
                self.state = SchedulerState::Running;
                self.next_tick = Some(self.ctx.emit_self(ProgressTick {}, self.config.update_interval));
                log_debug!(self.ctx, "started");
            }
            SchedulerState::Running => {}
            SchedulerState::Stopped => log_warn!(self.ctx, "can't restart stopped network"),
        }
    }

    /// Stops periodic updates for good.
    ///
    /// Transfers still in flight stay unfinished and are visible via [`active_transfers`](Self::active_transfers).
    pub fn stop(&mut self) {
        if self.state == SchedulerState::Stopped {
            return;
        }
        self.state = SchedulerState::Stopped;
        if let Some(tick) = self.next_tick.take() {
            self.ctx.cancel_event(tick);
        }
        log_debug!(
            self.ctx,
            "stopped with {} transfers in flight",
            self.active.len() + self.pending.len()
        );
    }

    /// Submits a new transfer of `size` kilobits, which will start at the next update.
    ///
    /// A transfer submitted after stop or involving a failed or unknown node is abandoned right away.
    pub fn submit_transfer(&mut self, task: TaskRef, size: f64, kind: TransferKind) -> TransferId {
        assert!(size >= 0., "Transfer size must be non-negative, got {}", size);
        let id = self.next_transfer_id;
        self.next_transfer_id += 1;
        self.stats.on_submitted();
        let transfer = Transfer::new(id, task, size, kind, self.ctx.time());
        if self.state == SchedulerState::Stopped {
            log_warn!(self.ctx, "transfer {} submitted to stopped network", id);
            self.finalize_abandoned(transfer);
        } else if let Some(node) = self.dead_party(transfer.task()) {
            log_warn!(self.ctx, "transfer {} involves unavailable node {}", id, node);
            self.finalize_abandoned(transfer);
        } else {
            log_debug!(
                self.ctx,
                "new transfer {}: {:?} of task {} from {} to {} of size {}",
                id,
                kind,
                transfer.task().task_id,
                transfer.task().origin,
                transfer.task().destination,
                size
            );
            self.pending.push(transfer);
        }
        id
    }

    /// Removes an unfinished transfer, keeping its partial statistics.
    ///
    /// Returns false if the transfer is not in flight.
    pub fn abandon_transfer(&mut self, id: TransferId) -> bool {
        let transfer = if let Some(pos) = self.pending.iter().position(|t| t.id() == id) {
            self.pending.remove(pos)
        } else if let Some(pos) = self.active.iter().position(|t| t.id() == id) {
            self.active.remove(pos)
        } else {
            return false;
        };
        log_warn!(self.ctx, "transfer {} abandoned", id);
        self.finalize_abandoned(transfer);
        true
    }

    /// Marks the node as failed and abandons all transfers of tasks it takes part in.
    pub fn fail_node(&mut self, node: NodeId) {
        if !self.nodes.mark_failed(node) {
            return;
        }
        log_warn!(self.ctx, "node {} failed", node);
        let orphaned: Vec<TransferId> = self
            .pending
            .iter()
            .chain(self.active.iter())
            .filter(|t| t.task().involves(node))
            .map(|t| t.id())
            .collect();
        for id in orphaned {
            self.abandon_transfer(id);
        }
    }

    /// Returns the transfers taking part in the last update.
    pub fn active_transfers(&self) -> &[Transfer] {
        &self.active
    }

    /// Returns the transfers submitted since the last update.
    pub fn pending_transfers(&self) -> &[Transfer] {
        &self.pending
    }

    /// Returns reports of finished (completed or abandoned) transfers in order of finishing.
    pub fn history(&self) -> &[TransferReport] {
        &self.history
    }

    /// Returns accumulated statistics.
    pub fn stats(&self) -> &NetworkStats {
        &self.stats
    }

    /// Returns WAN utilization sampled at every update as `(time, percent)` pairs.
    pub fn utilization_history(&self) -> &[(f64, f64)] {
        &self.utilization_history
    }

    /// Returns mean of the sampled WAN utilization.
    pub fn average_wan_utilization(&self) -> f64 {
        if self.utilization_history.is_empty() {
            0.
        } else {
            self.utilization_history.iter().map(|(_, u)| u).sum::<f64>() / self.utilization_history.len() as f64
        }
    }

    /// Returns the capacity used by active WAN transfers as a percentage of the WAN bandwidth,
    /// capped at the configured ceiling.
    pub fn wan_utilization(&self) -> f64 {
        self.utilization_of(&self.active)
    }

    fn utilization_of(&self, transfers: &[Transfer]) -> f64 {
        let used: f64 = transfers
            .iter()
            .filter(|t| t.uses_wan())
            .map(|t| t.effective_bandwidth())
            .sum();
        (used / self.config.wan_bandwidth * 100.).min(self.config.wan_utilization_ceiling)
    }

    fn dead_party(&self, task: &TaskRef) -> Option<NodeId> {
        task.parties()
            .into_iter()
            .chain(task.registry)
            .find(|node| !self.nodes.is_alive(*node))
    }

    fn finalize_abandoned(&mut self, mut transfer: Transfer) {
        transfer.finish(TransferState::Abandoned, self.ctx.time());
        self.stats.on_abandoned();
        self.history.push(transfer.report());
    }

    fn on_tick(&mut self) {
        self.next_tick = None;
        if self.state != SchedulerState::Running {
            return;
        }
        self.update();
        self.next_tick = Some(self.ctx.emit_self(ProgressTick {}, self.config.update_interval));
    }

    fn update(&mut self) {
        let time = self.ctx.time();
        for mut transfer in self.pending.drain(..) {
            transfer.activate();
            self.active.push(transfer);
        }
        if self.active.is_empty() {
            self.utilization_history.push((time, 0.));
            self.stats.updates += 1;
            return;
        }

        let scopes: Vec<Scope> = {
            let location = self.location.borrow();
            let classifier = LocalityClassifier::new(&self.nodes, &*location, time);
            self.active.iter().map(|t| classifier.classify(t)).collect()
        };
        let allocations = self.allocator.allocate(&scopes);

        let mut completed = 0;
        for (transfer, allocation) in self.active.iter_mut().zip(allocations.iter()) {
            let progress = self.progress.advance(transfer, allocation);
            self.stats.on_progress(transfer.kind(), allocation.uses_wan, &progress);
            log_trace!(
                self.ctx,
                "transfer {}: lan {:.3} ({} users), wan {:.3} ({} users), moved {:.3}, remaining {:.3}",
                transfer.id(),
                allocation.lan_bandwidth,
                allocation.lan_contenders,
                allocation.wan_bandwidth,
                allocation.wan_contenders,
                progress.moved,
                transfer.remaining_size()
            );
            if progress.completed {
                completed += 1;
            }
        }
        self.utilization_history.push((time, self.utilization_of(&self.active)));
        self.stats.updates += 1;

        if completed > 0 {
            let (finished, active): (Vec<Transfer>, Vec<Transfer>) =
                std::mem::take(&mut self.active).into_iter().partition(|t| t.remaining_size() == 0.);
            self.active = active;
            for transfer in finished {
                let report = self.dispatcher.dispatch(transfer, &mut self.ctx);
                self.stats.on_completed(&report);
                self.history.push(report);
            }
        }
    }
}

impl EventHandler for NetworkEngine {
    fn on(&mut self, event: Event) {
        cast!(match event.data {
            ProgressTick {} => {
                self.on_tick();
            }
            StopNetwork {} => {
                self.stop();
            }
            NodeFailed { node } => {
                self.fail_node(node);
            }
        })
    }
}
