use crate::datatypes::sensors::{
    BarometerSample, GpsSnapshot, HighGSample, ImuSample, OrientationSample,
};

/// Sensor drivers attempt one bounded read per call and signal failure with
/// `None`, never by panicking. A failed read must leave the driver usable on
/// the next tick.
pub trait ImuDriver {
    fn sample(&mut self) -> Option<ImuSample>;
}

pub trait HighGAccelDriver {
    fn sample(&mut self) -> Option<HighGSample>;
}

pub trait OrientationDriver {
    fn sample(&mut self) -> Option<OrientationSample>;
}

pub trait BarometerDriver {
    fn sample(&mut self) -> Option<BarometerSample>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpsPoll {
    /// No characters pending on the receiver.
    Idle,
    /// Characters consumed, sentence still incomplete.
    Partial,
    /// A full sentence was parsed into the snapshot.
    Complete,
}

/// GPS serial input is asynchronous; the driver exposes its incremental
/// parser and the acquisition step owns the poll budget.
pub trait GpsDriver {
    fn snapshot(&self) -> GpsSnapshot;

    fn poll(&mut self) -> GpsPoll;
}
