//! Event handling.

use crate::event::Event;

/// Trait implemented by simulation components that receive events.
pub trait EventHandler {
    /// Processes an event addressed to the component.
    fn on(&mut self, event: Event);
}

/// Dispatches an event by the concrete type of its payload.
///
/// Each arm names a payload struct and destructures it. Arms need not be exhaustive:
/// an event matching none of them is logged as unhandled at the `ERROR` level.
///
/// # Examples
///
/// ```rust
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use serde::Serialize;
/// use edgesim_core::{cast, Event, EventHandler, Simulation};
///
/// #[derive(Serialize)]
/// pub struct Upload {
///     size: f64,
/// }
///
/// #[derive(Serialize)]
/// pub struct Reset {}
///
/// pub struct Receiver {
///     received: f64,
/// }
///
/// impl EventHandler for Receiver {
///     fn on(&mut self, event: Event) {
///         cast!(match event.data {
///             Upload { size } => {
///                 self.received += size;
///             }
///             Reset {} => {
///                 self.received = 0.;
///             }
///         })
///     }
/// }
///
/// let mut sim = Simulation::new(123);
/// let receiver = Rc::new(RefCell::new(Receiver { received: 0. }));
/// let receiver_id = sim.add_handler("receiver", receiver.clone());
/// let mut client = sim.create_context("client");
/// client.emit(Upload { size: 10. }, receiver_id, 1.);
/// client.emit(Upload { size: 5. }, receiver_id, 2.);
/// sim.step_until_no_events();
/// assert_eq!(receiver.borrow().received, 15.);
/// assert_eq!(sim.time(), 2.);
/// ```
#[macro_export]
macro_rules! cast {
    ( match $event:ident.data { $( $type:ident { $($tt:tt)* } => { $($expr:tt)* } )+ } ) => {
        $(
            if $event.data.is::<$type>() {
                if let Ok(__value) = $event.data.downcast::<$type>() {
                    let $type { $($tt)* } = *__value;
                    $($expr)*
                }
            } else
        )*
        {
            $crate::log::log_unhandled_event($event);
        }
    }
}
