use std::cell::RefCell;
use std::rc::Rc;

use serde::Serialize;

use edgesim_core::{cast, log_debug, Event, EventHandler, SimulationContext};
use edgesim_network::{AccessPointMap, NodeId};

#[derive(Clone, Serialize)]
pub struct Move {}

/// Random walk of devices between the access points of edge datacenters.
pub struct Mobility {
    location: Rc<RefCell<AccessPointMap>>,
    devices: Vec<NodeId>,
    access_points: Vec<NodeId>,
    interval: f64,
    until: f64,
    ctx: SimulationContext,
}

impl Mobility {
    pub fn new(
        location: Rc<RefCell<AccessPointMap>>,
        devices: Vec<NodeId>,
        access_points: Vec<NodeId>,
        interval: f64,
        until: f64,
        ctx: SimulationContext,
    ) -> Self {
        Self {
            location,
            devices,
            access_points,
            interval,
            until,
            ctx,
        }
    }

    pub fn start(&mut self) {
        if self.interval > 0. {
            self.ctx.emit_self(Move {}, self.interval);
        }
    }

    fn move_random_device(&mut self) {
        let device = self.devices[self.ctx.gen_range(0..self.devices.len())];
        let access_point = self.access_points[self.ctx.gen_range(0..self.access_points.len())];
        self.location.borrow_mut().attach(device, access_point);
        log_debug!(self.ctx, "device {} moved to access point {}", device, access_point);
        if self.ctx.time() + self.interval <= self.until {
            self.ctx.emit_self(Move {}, self.interval);
        }
    }
}

impl EventHandler for Mobility {
    fn on(&mut self, event: Event) {
        cast!(match event.data {
            Move {} => {
                self.move_random_device();
            }
        })
    }
}
