#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Event {
    Step,

    // Flight state transitions
    FlightCalibrated,
    FlightLiftoff,
    FlightDescent,
    FlightLanded,

    // Ground commands
    CmdForceLiftoff,
}
