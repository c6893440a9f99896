//! Completion events.

use serde::Serialize;

use edgesim_core::{log_debug, SimulationContext};

use crate::node::NodeId;
use crate::transfer::{CompletionAction, Propagation, Transfer, TransferReport, TransferState};

/// Task input or container arrived at the destination, the task can be executed there.
#[derive(Clone, Serialize)]
pub struct TaskReady {
    /// Node where the task is ready.
    pub node: NodeId,
    /// Statistics of the completed transfer.
    pub report: TransferReport,
}

/// Execution result arrived at the device or the orchestrator.
#[derive(Clone, Serialize)]
pub struct ResultDelivered {
    /// Node that received the result.
    pub node: NodeId,
    /// Statistics of the completed transfer.
    pub report: TransferReport,
}

/// Offloading request arrived at the orchestrator.
#[derive(Clone, Serialize)]
pub struct RequestDelivered {
    /// Orchestrator node.
    pub node: NodeId,
    /// Statistics of the completed transfer.
    pub report: TransferReport,
}

/// Emits the downstream event of a completed transfer.
#[derive(Clone, Copy, Debug)]
pub struct CompletionDispatcher {
    wan_propagation_delay: f64,
}

impl CompletionDispatcher {
    /// Creates dispatcher adding the given delay to completions of WAN transfers.
    pub fn new(wan_propagation_delay: f64) -> Self {
        Self { wan_propagation_delay }
    }

    /// Returns the delay of the completion event of a finished transfer.
    pub fn delay(&self, report: &TransferReport) -> f64 {
        match report.kind.completion().propagation {
            Propagation::WideAreaIfUsed if report.used_wan => self.wan_propagation_delay,
            _ => 0.,
        }
    }

    /// Finalizes the transfer and sends its completion event to the task's notification component.
    ///
    /// Takes the transfer by value: it must already be out of the active set, and it cannot be dispatched again.
    pub fn dispatch(&self, mut transfer: Transfer, ctx: &mut SimulationContext) -> TransferReport {
        transfer.finish(TransferState::Completed, ctx.time());
        let report = transfer.report();
        let completion = report.kind.completion();
        let node = report.receiver();
        let delay = self.delay(&report);
        let dst = report.task.notify;
        log_debug!(
            ctx,
            "transfer {} ({:?} of task {}) completed, {:?} at node {} in {}",
            report.id,
            report.kind,
            report.task.task_id,
            completion.action,
            node,
            delay
        );
        match completion.action {
            CompletionAction::TaskReady => {
                ctx.emit(
                    TaskReady {
                        node,
                        report: report.clone(),
                    },
                    dst,
                    delay,
                );
            }
            CompletionAction::ResultDelivered => {
                ctx.emit(
                    ResultDelivered {
                        node,
                        report: report.clone(),
                    },
                    dst,
                    delay,
                );
            }
            CompletionAction::RequestDelivered => {
                ctx.emit(
                    RequestDelivered {
                        node,
                        report: report.clone(),
                    },
                    dst,
                    delay,
                );
            }
        }
        report
    }
}
