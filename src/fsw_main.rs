use thiserror::Error;

use crate::{
    Duration, DurationU64,
    component::{ComponentId, LoopContext, StepData},
    component_loop::{ComponentLoop, ComponentLoopBuilder, ComponentLoopBuilderError},
    components::{
        acquisition::{AcquisitionHarness, SensorAcquisition},
        phase::{FlightPhaseManager, PhaseConfig},
    },
    datatypes::flight::{FlightData, FlightPhase},
    events::EventQueue,
};

const NUM_COMPONENTS: usize = 2;

#[derive(Debug, Error, Clone)]
pub enum KestrelLoopError {
    #[error("Component loop error: {0:?}")]
    ComponentBuilder(#[from] ComponentLoopBuilderError),
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FswConfig {
    pub phase: PhaseConfig,
    pub gps_poll_budget_ms: u32,
}

impl Default for FswConfig {
    fn default() -> Self {
        FswConfig {
            phase: PhaseConfig::default(),
            gps_poll_budget_ms: 500,
        }
    }
}

pub struct KestrelLoopHarness {
    pub acquisition: AcquisitionHarness,
}

/// One tick: acquisition refreshes the flight record and health bits, then
/// the phase manager evaluates the current phase's exit predicate. Telemetry
/// transfer runs on demand outside this loop.
pub struct KestrelLoop {
    component_loop: ComponentLoop<NUM_COMPONENTS>,
    context: LoopContext,
}

impl KestrelLoop {
    pub fn new(
        event_queue: EventQueue,
        harness: KestrelLoopHarness,
        config: FswConfig,
    ) -> Result<Self, KestrelLoopError> {
        let mut loop_builder = ComponentLoopBuilder::<NUM_COMPONENTS>::new();

        let acquisition = SensorAcquisition::new(
            harness.acquisition,
            Duration(DurationU64::millis(config.gps_poll_budget_ms as u64)),
        );
        loop_builder.add_component(acquisition)?;

        let phase_manager = FlightPhaseManager::new(
            event_queue.get_publisher(ComponentId::FlightPhaseManager),
            config.phase,
        );
        loop_builder.add_component(phase_manager)?;

        Ok(KestrelLoop {
            component_loop: loop_builder.build(event_queue),
            context: LoopContext::new(),
        })
    }

    pub fn step(&mut self, step: StepData) {
        self.context.begin_step(step);
        self.component_loop.step(&mut self.context);
    }

    /// Read-only snapshot for the log-sink collaborator.
    pub fn flight(&self) -> &FlightData {
        &self.context.flight
    }

    pub fn phase(&self) -> FlightPhase {
        self.context.phase
    }
}
