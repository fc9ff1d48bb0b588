mod event;
mod event_queue;

pub use event::Event;
pub use event_queue::{EventPublisher, EventQueue, FswEvent};
