//! Simulation setup and execution.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::Level::Trace;
use log::{debug, log_enabled, trace};
use rand::distributions::uniform::{SampleRange, SampleUniform};
use serde_json::json;
use serde_type_name::type_name;

use crate::component::Id;
use crate::context::SimulationContext;
use crate::handler::EventHandler;
use crate::log::{get_colored, log_undelivered_event};
use crate::state::SimulationState;

struct Component {
    name: String,
    handler: Option<Rc<RefCell<dyn EventHandler>>>,
}

/// Owns the simulation clock, the event queue and the registered components.
pub struct Simulation {
    sim_state: Rc<RefCell<SimulationState>>,
    ids: HashMap<String, Id>,
    components: Vec<Component>,
}

impl Simulation {
    /// Creates a new simulation with the given random seed.
    pub fn new(seed: u64) -> Self {
        Self {
            sim_state: Rc::new(RefCell::new(SimulationState::new(seed))),
            ids: HashMap::new(),
            components: Vec::new(),
        }
    }

    fn register(&mut self, name: &str) -> Id {
        if let Some(&id) = self.ids.get(name) {
            return id;
        }
        let id = self.components.len() as Id;
        self.ids.insert(name.to_owned(), id);
        self.components.push(Component {
            name: name.to_owned(),
            handler: None,
        });
        debug!(
            target: "simulation",
            "[{:.3} {} simulation] Registered component: {}",
            self.time(),
            get_colored("DEBUG", colored::Color::Blue),
            json!({"name": name, "id": id})
        );
        id
    }

    fn name(&self, id: Id) -> &str {
        self.components.get(id as usize).map_or("?", |c| c.name.as_str())
    }

    /// Creates a context for the named component.
    ///
    /// Ids are assigned sequentially from 0, and a name keeps its id when used again.
    pub fn create_context<S>(&mut self, name: S) -> SimulationContext
    where
        S: AsRef<str>,
    {
        let id = self.register(name.as_ref());
        SimulationContext::new(id, name.as_ref(), self.sim_state.clone())
    }

    /// Registers the event handler of the named component and returns the component id.
    pub fn add_handler<S>(&mut self, name: S, handler: Rc<RefCell<dyn EventHandler>>) -> Id
    where
        S: AsRef<str>,
    {
        let id = self.register(name.as_ref());
        self.components[id as usize].handler = Some(handler);
        id
    }

    /// Returns the current simulation time.
    pub fn time(&self) -> f64 {
        self.sim_state.borrow().time()
    }

    /// Delivers the next event, advancing the clock to its time.
    ///
    /// Returns `false` if there were no pending events.
    pub fn step(&mut self) -> bool {
        let next = self.sim_state.borrow_mut().pop();
        let event = match next {
            Some(event) => event,
            None => return false,
        };
        let handler = self.components.get(event.dst as usize).and_then(|c| c.handler.clone());
        match handler {
            Some(handler) => {
                if log_enabled!(Trace) {
                    let dst_name = self.name(event.dst);
                    trace!(
                        target: dst_name,
                        "[{:.3} {} {}] {}",
                        event.time,
                        get_colored("EVENT", colored::Color::BrightBlack),
                        dst_name,
                        json!({"type": type_name(&event.data).unwrap_or("?"), "data": event.data, "src": self.name(event.src)})
                    );
                }
                handler.borrow_mut().on(event);
            }
            None => log_undelivered_event(event),
        }
        true
    }

    /// Delivers events until none are left.
    pub fn step_until_no_events(&mut self) {
        while self.step() {}
    }

    /// Delivers all events with time not later than `time`.
    ///
    /// Returns `true` if there are pending events left.
    pub fn step_until_time(&mut self, time: f64) -> bool {
        loop {
            let next = self.sim_state.borrow_mut().next_time();
            match next {
                Some(t) if t > time => return true,
                Some(_) => {
                    self.step();
                }
                None => return false,
            }
        }
    }

    /// Returns a random value from the range, drawn from the generator shared with all contexts.
    pub fn gen_range<T, R>(&mut self, range: R) -> T
    where
        T: SampleUniform,
        R: SampleRange<T>,
    {
        self.sim_state.borrow_mut().gen_range(range)
    }
}
