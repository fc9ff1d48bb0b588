use defmt_or_log::warn;

use crate::datatypes::{flight::FlightData, wire::TransmissionRecord};

use super::{LinkError, RecordLink};

/// Drives a [`RecordLink`] from the live flight record: a fresh transmission
/// record per send, and receive-side updates only when a complete record has
/// arrived. An idle link is not an error, it is a no-op.
pub struct TelemetryTransfer<L> {
    link: L,
    seq_cnt: u8,
    err_cnt: usize,
}

impl<L: RecordLink> TelemetryTransfer<L> {
    pub fn new(link: L) -> Self {
        Self {
            link,
            seq_cnt: 0,
            err_cnt: 0,
        }
    }

    pub fn send(&mut self, flight: &FlightData) -> Result<(), LinkError> {
        let record = TransmissionRecord::from_flight(flight);
        match self.link.send(&record) {
            Ok(()) => {
                self.seq_cnt = self.seq_cnt.wrapping_add(1);
                Ok(())
            }
            Err(e) => {
                self.err_cnt = self.err_cnt.wrapping_add(1);
                warn!("telemetry send failed");
                Err(e)
            }
        }
    }

    /// Returns `Ok(true)` when the flight record was updated from the link.
    pub fn receive(&mut self, flight: &mut FlightData) -> Result<bool, LinkError> {
        if !self.link.record_available() {
            return Ok(false);
        }

        let mut record = TransmissionRecord::default();
        match self.link.receive(&mut record) {
            Ok(true) => {
                record.apply_to(flight);
                Ok(true)
            }
            Ok(false) => Ok(false),
            Err(e) => {
                self.err_cnt = self.err_cnt.wrapping_add(1);
                Err(e)
            }
        }
    }

    pub fn sequence(&self) -> u8 {
        self.seq_cnt
    }

    pub fn error_count(&self) -> usize {
        self.err_cnt
    }
}
