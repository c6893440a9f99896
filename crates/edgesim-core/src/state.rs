use std::collections::{BinaryHeap, HashSet};

use rand::distributions::uniform::{SampleRange, SampleUniform};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;

use crate::component::Id;
use crate::event::{Event, EventData, EventId};
use crate::log::log_incorrect_event;

/// Tolerance used when comparing simulation times and amounts of work.
pub const EPSILON: f64 = 1e-12;

/// Clock, random generator and event queue shared by the simulation and all contexts.
pub(crate) struct SimulationState {
    clock: f64,
    rng: Pcg64,
    queue: BinaryHeap<Event>,
    cancelled: HashSet<EventId>,
    next_id: EventId,
}

impl SimulationState {
    pub fn new(seed: u64) -> Self {
        Self {
            clock: 0.,
            rng: Pcg64::seed_from_u64(seed),
            queue: BinaryHeap::new(),
            cancelled: HashSet::new(),
            next_id: 0,
        }
    }

    pub fn time(&self) -> f64 {
        self.clock
    }

    pub fn gen_range<T, R>(&mut self, range: R) -> T
    where
        T: SampleUniform,
        R: SampleRange<T>,
    {
        self.rng.gen_range(range)
    }

    pub fn schedule(&mut self, data: Box<dyn EventData>, src: Id, dst: Id, delay: f64) -> EventId {
        let id = self.next_id;
        let event = Event {
            id,
            time: self.clock + delay.max(0.),
            src,
            dst,
            data,
        };
        if delay < -EPSILON {
            log_incorrect_event(event, &format!("negative delay {}", delay));
            panic!("Event delay is negative! It is not allowed to add events from the past.");
        }
        self.queue.push(event);
        self.next_id += 1;
        id
    }

    pub fn cancel(&mut self, id: EventId) {
        if id < self.next_id {
            self.cancelled.insert(id);
        }
    }

    /// Pops the next live event and moves the clock to its time.
    pub fn pop(&mut self) -> Option<Event> {
        self.skip_cancelled();
        let event = self.queue.pop()?;
        self.clock = event.time;
        Some(event)
    }

    /// Time of the next live event.
    pub fn next_time(&mut self) -> Option<f64> {
        self.skip_cancelled();
        self.queue.peek().map(|event| event.time)
    }

    fn skip_cancelled(&mut self) {
        while let Some(id) = self.queue.peek().map(|event| event.id) {
            if !self.cancelled.remove(&id) {
                break;
            }
            self.queue.pop();
        }
    }
}
