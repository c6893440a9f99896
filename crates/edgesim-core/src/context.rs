//! Access to the simulation from components.

use std::cell::RefCell;
use std::rc::Rc;

use rand::distributions::uniform::{SampleRange, SampleUniform};

use crate::component::Id;
use crate::event::{EventData, EventId};
use crate::state::SimulationState;

/// Handle of a component: its identity, the shared clock and the event queue.
///
/// Events emitted through the context have the bound component as their source.
pub struct SimulationContext {
    id: Id,
    name: String,
    sim_state: Rc<RefCell<SimulationState>>,
}

impl SimulationContext {
    pub(crate) fn new(id: Id, name: &str, sim_state: Rc<RefCell<SimulationState>>) -> Self {
        Self {
            id,
            name: name.to_owned(),
            sim_state,
        }
    }

    /// Component id.
    pub fn id(&self) -> Id {
        self.id
    }

    /// Component name, also used as the log target.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current simulation time.
    pub fn time(&self) -> f64 {
        self.sim_state.borrow().time()
    }

    /// Returns a random float in _[0, 1)_.
    pub fn rand(&mut self) -> f64 {
        self.gen_range(0.0..1.0)
    }

    /// Returns a random value from the range. All components draw from the same seeded generator.
    pub fn gen_range<T, R>(&mut self, range: R) -> T
    where
        T: SampleUniform,
        R: SampleRange<T>,
    {
        self.sim_state.borrow_mut().gen_range(range)
    }

    /// Schedules an event for `dst` after `delay`, which must not be negative.
    pub fn emit<T>(&mut self, data: T, dst: Id, delay: f64) -> EventId
    where
        T: EventData,
    {
        self.sim_state.borrow_mut().schedule(Box::new(data), self.id, dst, delay)
    }

    /// Schedules an event for the component itself.
    pub fn emit_self<T>(&mut self, data: T, delay: f64) -> EventId
    where
        T: EventData,
    {
        self.emit(data, self.id, delay)
    }

    /// Cancels a scheduled event, has no effect if it was already delivered.
    pub fn cancel_event(&mut self, id: EventId) {
        self.sim_state.borrow_mut().cancel(id);
    }
}
