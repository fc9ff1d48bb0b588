use crate::{
    Duration, DurationU64, Instant, InstantU64,
    datatypes::flight::{FlightData, FlightPhase},
    events::Event,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentId {
    Ground,
    SensorAcquisition,
    FlightPhaseManager,
}

#[derive(Debug, Clone, Copy)]
pub struct StepData {
    pub step_time: Instant,
    pub step_interval: Duration,
    pub step_count: u32,
}

/// Per-tick state shared down the component chain. The flight record has a
/// single writer per field group: acquisition owns the sensor fields and
/// health bits, the phase manager owns the phase and the altitude offset.
pub struct LoopContext {
    step: StepData,
    pub flight: FlightData,
    pub phase: FlightPhase,
}

impl LoopContext {
    pub fn new() -> Self {
        LoopContext {
            step: StepData {
                step_time: Instant(InstantU64::from_ticks(0)),
                step_interval: Duration(DurationU64::from_ticks(0)),
                step_count: 0,
            },
            flight: FlightData::default(),
            phase: FlightPhase::Uncalibrated,
        }
    }

    pub fn step(&self) -> &StepData {
        &self.step
    }

    pub(crate) fn begin_step(&mut self, step: StepData) {
        self.step = step;
        self.flight.total_time = Duration(step.step_time.0.duration_since_epoch());
    }
}

impl Default for LoopContext {
    fn default() -> Self {
        LoopContext::new()
    }
}

pub trait Component {
    fn id(&self) -> ComponentId;

    fn handle_event(&mut self, event: Event, context: &mut LoopContext);

    fn step(&mut self, context: &mut LoopContext);
}
