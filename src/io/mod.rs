use thiserror::Error;

use crate::datatypes::wire::TransmissionRecord;

pub mod transfer;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LinkError {
    #[error("Transmit side not ready to accept a record")]
    TxBusy,

    #[error("Received record was incomplete or malformed")]
    Malformed,
}

/// Point-to-point link to the companion board. Framing, checksums and
/// retransmission are entirely the link's responsibility; this layer only
/// hands records across.
pub trait RecordLink {
    fn send(&mut self, record: &TransmissionRecord) -> Result<(), LinkError>;

    fn record_available(&mut self) -> bool;

    /// Fills `record` and returns `Ok(true)` once a complete record has been
    /// consumed. At most one record is consumed per call.
    fn receive(&mut self, record: &mut TransmissionRecord) -> Result<bool, LinkError>;
}
