use alloc::boxed::Box;
use defmt_or_log::warn;

use crate::{
    Duration,
    component::{Component, ComponentId, LoopContext},
    datatypes::flight::{FlightData, SensorHealth},
    hal::{
        MonotonicClock,
        drivers::{
            BarometerDriver, GpsDriver, GpsPoll, HighGAccelDriver, ImuDriver, OrientationDriver,
        },
    },
};

pub struct AcquisitionHarness {
    pub imu: Box<dyn ImuDriver + Send>,
    pub high_g: Box<dyn HighGAccelDriver + Send>,
    pub ahrs: Box<dyn OrientationDriver + Send>,
    pub barometer: Box<dyn BarometerDriver + Send>,
    pub gps: Box<dyn GpsDriver + Send>,
    pub clock: Box<dyn MonotonicClock + Send>,
}

/// Attempts one read per sensor per tick. A successful read overwrites the
/// corresponding flight-record fields and clears the sensor's health bit; a
/// failed read leaves the previous tick's fields in place and sets the bit.
pub struct SensorAcquisition {
    harness: AcquisitionHarness,
    gps_poll_budget: Duration,
}

impl SensorAcquisition {
    pub fn new(harness: AcquisitionHarness, gps_poll_budget: Duration) -> Self {
        SensorAcquisition {
            harness,
            gps_poll_budget,
        }
    }

    fn read_imu(&mut self, flight: &mut FlightData) -> bool {
        match self.harness.imu.sample() {
            Some(s) => {
                flight.imu_gyro_rad_s = s.gyro_rad_s;
                flight.imu_accel_m_s2 = s.accel_m_s2;
                flight.imu_temp_degc = s.temperature_degc;
                true
            }
            None => false,
        }
    }

    fn read_high_g(&mut self, flight: &mut FlightData) -> bool {
        match self.harness.high_g.sample() {
            Some(s) => {
                flight.high_g_accel_m_s2 = s.accel_m_s2;
                flight.high_g_temp_degc = s.temperature_degc;
                true
            }
            None => false,
        }
    }

    fn read_ahrs(&mut self, flight: &mut FlightData) -> bool {
        match self.harness.ahrs.sample() {
            Some(s) => {
                flight.orientation = s.orientation;
                flight.ahrs_gyro_rad_s = s.gyro_rad_s;
                flight.ahrs_accel_m_s2 = s.accel_m_s2;
                flight.ahrs_mag_gauss = s.mag_gauss;
                flight.ahrs_temp_degc = s.temperature_degc;
                true
            }
            None => false,
        }
    }

    fn read_barometer(&mut self, flight: &mut FlightData) -> bool {
        match self.harness.barometer.sample() {
            Some(s) => {
                flight.pressure_pa = s.pressure_pa;
                flight.baro_temp_degc = s.temperature_degc;
                flight.altitude_m = s.altitude_m - flight.altitude_offset_m;
                true
            }
            None => false,
        }
    }

    /// Non-blocking contract: the snapshot is refreshed unconditionally, a
    /// missing fix fails without touching the poll budget, and with a fix
    /// present the receiver is polled until a complete sentence lands or the
    /// budget elapses.
    fn read_gps(&mut self, flight: &mut FlightData) -> bool {
        flight.gps = self.harness.gps.snapshot();
        if !flight.gps.fix_valid {
            return false;
        }

        let start = self.harness.clock.now();
        loop {
            if self.harness.clock.now().0 - start.0 > self.gps_poll_budget.0 {
                return false;
            }
            if let GpsPoll::Complete = self.harness.gps.poll() {
                flight.gps = self.harness.gps.snapshot();
                return true;
            }
        }
    }
}

impl Component for SensorAcquisition {
    fn id(&self) -> ComponentId {
        ComponentId::SensorAcquisition
    }

    fn handle_event(&mut self, _event: crate::events::Event, _context: &mut LoopContext) {}

    fn step(&mut self, context: &mut LoopContext) {
        let prev = context.flight.health;

        let ok = self.read_imu(&mut context.flight);
        context.flight.health.set(SensorHealth::IMU, !ok);

        let ok = self.read_high_g(&mut context.flight);
        context.flight.health.set(SensorHealth::HIGH_G, !ok);

        let ok = self.read_ahrs(&mut context.flight);
        context.flight.health.set(SensorHealth::AHRS, !ok);

        let ok = self.read_barometer(&mut context.flight);
        context.flight.health.set(SensorHealth::BAROMETER, !ok);

        let ok = self.read_gps(&mut context.flight);
        context.flight.health.set(SensorHealth::GPS, !ok);

        if context.flight.health != prev {
            warn!(
                "sensor health changed: {} -> {}",
                prev.bits(),
                context.flight.health.bits()
            );
        }
    }
}
