use crate::component::{Component, LoopContext};
use crate::events::EventQueue;
use alloc::boxed::Box;
use heapless::Vec;

pub struct ComponentLoop<const N: usize> {
    event_queue: EventQueue,
    components: Vec<Box<dyn Component>, N>,
}

impl<const N: usize> ComponentLoop<N> {
    /// Drains events published during the previous tick to every component
    /// except their source, then steps components in registration order.
    pub fn step(&mut self, context: &mut LoopContext) {
        while let Some(event) = self.event_queue.pop_event() {
            for component in &mut self.components {
                if event.v.src != component.id() {
                    component.handle_event(event.v.event, context);
                }
            }
        }

        for component in &mut self.components {
            component.step(context);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ComponentLoopBuilderError {
    #[error("too many components for component loop capacity")]
    TooManyComponents,
}

pub struct ComponentLoopBuilder<const N: usize> {
    components: Vec<Box<dyn Component>, N>,
}

impl<const N: usize> ComponentLoopBuilder<N> {
    pub fn new() -> Self {
        ComponentLoopBuilder {
            components: Vec::new(),
        }
    }

    pub fn add_component<T>(&mut self, component: T) -> Result<(), ComponentLoopBuilderError>
    where
        T: Component + 'static,
    {
        if self.components.push(Box::new(component)).is_ok() {
            Ok(())
        } else {
            Err(ComponentLoopBuilderError::TooManyComponents)
        }
    }

    pub fn build(self, event_queue: EventQueue) -> ComponentLoop<N> {
        ComponentLoop {
            event_queue,
            components: self.components,
        }
    }
}

impl<const N: usize> Default for ComponentLoopBuilder<N> {
    fn default() -> Self {
        ComponentLoopBuilder::new()
    }
}
