use core::sync::atomic::AtomicBool;

use crate::{Instant, common::Ts, component::ComponentId};

use super::Event;
use alloc::sync::Arc;
use heapless::mpmc::MpMcQueue;

const QUEUE_SIZE: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FswEvent {
    pub src: ComponentId,
    pub event: Event,
}

#[derive(Default)]
pub struct EventQueue {
    dispatcher: Arc<EventQueueInner>,
}

#[derive(Default)]
struct EventQueueInner {
    ev_queue: MpMcQueue<Ts<FswEvent>, QUEUE_SIZE>,
    queue_full_signal: AtomicBool,
}

impl EventQueue {
    pub fn new() -> Self {
        EventQueue {
            dispatcher: Arc::new(EventQueueInner::default()),
        }
    }

    pub fn get_publisher(&self, src: ComponentId) -> EventPublisher {
        EventPublisher {
            dispatcher: self.dispatcher.clone(),
            src,
        }
    }

    pub fn pop_event(&self) -> Option<Ts<FswEvent>> {
        self.dispatcher.ev_queue.dequeue()
    }

    pub fn queue_full_signaled(&self) -> bool {
        self.dispatcher
            .queue_full_signal
            .load(core::sync::atomic::Ordering::SeqCst)
    }

    pub fn clear_queue_full_signal(&self) {
        self.dispatcher
            .queue_full_signal
            .store(false, core::sync::atomic::Ordering::SeqCst);
    }
}

pub struct EventPublisher {
    dispatcher: Arc<EventQueueInner>,
    src: ComponentId,
}

impl EventPublisher {
    pub fn publish(&self, event: Event, ts: Instant) {
        if self
            .dispatcher
            .ev_queue
            .enqueue(Ts {
                t: ts,
                v: FswEvent {
                    src: self.src,
                    event,
                },
            })
            .is_err()
        {
            // Signal that a publisher found the queue full
            self.dispatcher
                .queue_full_signal
                .store(true, core::sync::atomic::Ordering::SeqCst);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InstantU64;

    #[test]
    fn events_drain_in_publication_order() {
        let queue = EventQueue::new();
        let publisher = queue.get_publisher(ComponentId::FlightPhaseManager);

        publisher.publish(Event::FlightCalibrated, Instant(InstantU64::from_ticks(10)));
        publisher.publish(Event::FlightLiftoff, Instant(InstantU64::from_ticks(20)));

        let first = queue.pop_event().unwrap();
        assert_eq!(first.v.event, Event::FlightCalibrated);
        assert_eq!(first.t.0.ticks(), 10);

        let second = queue.pop_event().unwrap();
        assert_eq!(second.v.event, Event::FlightLiftoff);
        assert_eq!(second.v.src, ComponentId::FlightPhaseManager);

        assert!(queue.pop_event().is_none());
        assert!(!queue.queue_full_signaled());
    }

    #[test]
    fn overflow_sets_the_queue_full_signal() {
        let queue = EventQueue::new();
        let publisher = queue.get_publisher(ComponentId::Ground);

        for _ in 0..QUEUE_SIZE {
            publisher.publish(Event::Step, Instant(InstantU64::from_ticks(0)));
        }
        assert!(!queue.queue_full_signaled());

        publisher.publish(Event::Step, Instant(InstantU64::from_ticks(0)));
        assert!(queue.queue_full_signaled());

        queue.clear_queue_full_signal();
        assert!(!queue.queue_full_signaled());
    }
}
