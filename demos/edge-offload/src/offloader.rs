use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde::Serialize;

use edgesim_core::{cast, log_debug, log_warn, Event, EventHandler, SimulationContext};
use edgesim_network::{
    AccessPointMap, NetworkEngine, NodeFailed, NodeId, RequestDelivered, ResultDelivered, TaskReady, TaskRef, TransferKind,
};

use crate::config::ScenarioConfig;

#[derive(Clone, Serialize)]
pub struct GenerateTask {
    device: NodeId,
}

#[derive(Clone, Serialize)]
pub struct ExecutionFinished {
    task_id: u64,
}

struct TaskProgress {
    task: TaskRef,
    created: f64,
    input_arrived: bool,
    container_arrived: bool,
}

/// Generates tasks on devices and walks each of them through the offloading steps:
/// request to the orchestrator, input and container transfers to the destination, execution
/// and result delivery back to the device through the orchestrator.
pub struct Offloader {
    net: Rc<RefCell<NetworkEngine>>,
    location: Rc<RefCell<AccessPointMap>>,
    cloud: NodeId,
    config: ScenarioConfig,
    tasks: HashMap<u64, TaskProgress>,
    next_task_id: u64,
    latencies: Vec<f64>,
    ctx: SimulationContext,
}

impl Offloader {
    pub fn new(
        net: Rc<RefCell<NetworkEngine>>,
        location: Rc<RefCell<AccessPointMap>>,
        cloud: NodeId,
        config: ScenarioConfig,
        ctx: SimulationContext,
    ) -> Self {
        Self {
            net,
            location,
            cloud,
            config,
            tasks: HashMap::new(),
            next_task_id: 0,
            latencies: Vec::new(),
            ctx,
        }
    }

    pub fn start(&mut self, devices: &[NodeId]) {
        for &device in devices {
            let delay = self.ctx.gen_range(0.0..self.config.task_interval);
            self.ctx.emit_self(GenerateTask { device }, delay);
        }
    }

    /// Returns the number of generated tasks.
    pub fn generated_tasks(&self) -> u64 {
        self.next_task_id
    }

    /// Returns latencies of the tasks whose results reached the device.
    pub fn latencies(&self) -> &[f64] {
        &self.latencies
    }

    /// Submits the next transfer of the task, or drops the task if one of its nodes has failed.
    fn submit(&mut self, task_id: u64, size: f64, kind: TransferKind) {
        let task = match self.tasks.get(&task_id) {
            Some(progress) => progress.task.clone(),
            None => return,
        };
        let unavailable = {
            let net = self.net.borrow();
            task.parties()
                .into_iter()
                .chain(task.registry)
                .find(|node| !net.nodes().is_alive(*node))
        };
        if let Some(node) = unavailable {
            log_warn!(self.ctx, "task {} dropped, node {} is unavailable", task_id, node);
            self.tasks.remove(&task_id);
            return;
        }
        self.net.borrow_mut().submit_transfer(task, size, kind);
    }

    fn on_node_failed(&mut self, node: NodeId) {
        let before = self.tasks.len();
        self.tasks.retain(|_, progress| !progress.task.involves(node));
        log_warn!(
            self.ctx,
            "node {} failed, {} unfinished tasks dropped",
            node,
            before - self.tasks.len()
        );
    }

    fn on_generate_task(&mut self, device: NodeId) {
        if !self.net.borrow().nodes().is_alive(device) {
            return;
        }
        let task_id = self.next_task_id;
        self.next_task_id += 1;
        let orchestrator = self.location.borrow().get(device).unwrap_or(self.cloud);
        let destination = if self.ctx.rand() < self.config.cloud_share {
            self.cloud
        } else {
            orchestrator
        };
        let task = TaskRef {
            task_id,
            origin: device,
            orchestrator,
            destination,
            registry: Some(self.cloud),
            notify: self.ctx.id(),
        };
        log_debug!(
            self.ctx,
            "task {} created on device {}, offloaded to {} by {}",
            task_id,
            device,
            destination,
            orchestrator
        );
        self.tasks.insert(
            task_id,
            TaskProgress {
                task,
                created: self.ctx.time(),
                input_arrived: false,
                container_arrived: false,
            },
        );
        self.submit(task_id, self.config.request_size, TransferKind::ControlRequest);

        let delay = self.config.task_interval * self.ctx.gen_range(0.5..1.5);
        if self.ctx.time() + delay <= self.config.duration {
            self.ctx.emit_self(GenerateTask { device }, delay);
        }
    }

    fn on_task_ready(&mut self, task_id: u64, kind: TransferKind) {
        let progress = match self.tasks.get_mut(&task_id) {
            Some(progress) => progress,
            None => return,
        };
        match kind {
            TransferKind::ContainerFetch => progress.container_arrived = true,
            _ => progress.input_arrived = true,
        }
        if progress.input_arrived && progress.container_arrived {
            self.ctx.emit_self(ExecutionFinished { task_id }, self.config.execution_time);
        }
    }

    fn on_execution_finished(&mut self, task_id: u64) {
        let task = match self.tasks.get(&task_id) {
            Some(progress) => &progress.task,
            None => return,
        };
        if task.orchestrator == task.destination {
            self.submit(task_id, self.config.result_size, TransferKind::ResultToDevice);
        } else {
            self.submit(task_id, self.config.result_size, TransferKind::ResultToOrchestrator);
        }
    }

    fn on_result_delivered(&mut self, task_id: u64, kind: TransferKind) {
        if kind == TransferKind::ResultToOrchestrator {
            self.submit(task_id, self.config.result_size, TransferKind::ResultToDevice);
            return;
        }
        if let Some(progress) = self.tasks.remove(&task_id) {
            let latency = self.ctx.time() - progress.created;
            log_debug!(self.ctx, "task {} finished in {:.3}", task_id, latency);
            self.latencies.push(latency);
        }
    }
}

impl EventHandler for Offloader {
    fn on(&mut self, event: Event) {
        cast!(match event.data {
            GenerateTask { device } => {
                self.on_generate_task(device);
            }
            RequestDelivered { node: _, report } => {
                let task_id = report.task.task_id;
                if self.tasks.contains_key(&task_id) {
                    self.submit(task_id, self.config.input_size, TransferKind::OutboundTask);
                    self.submit(task_id, self.config.container_size, TransferKind::ContainerFetch);
                } else {
                    log_warn!(self.ctx, "request of unknown task {}", task_id);
                }
            }
            TaskReady { node: _, report } => {
                self.on_task_ready(report.task.task_id, report.kind);
            }
            ExecutionFinished { task_id } => {
                self.on_execution_finished(task_id);
            }
            ResultDelivered { node: _, report } => {
                self.on_result_delivered(report.task.task_id, report.kind);
            }
            NodeFailed { node } => {
                self.on_node_failed(node);
            }
        })
    }
}
