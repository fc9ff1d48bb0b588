use nalgebra::{Quaternion, Vector3};

use super::flight::FlightData;

/// Flattened, link-safe copy of the transmit-relevant subset of
/// [`FlightData`]. Health bits, altitude offsets, timestamps and the GPS
/// snapshot stay on the sending board.
#[derive(Debug, Clone, PartialEq)]
pub struct TransmissionRecord {
    pub imu_gyro_rad_s: Vector3<f32>,
    pub imu_accel_m_s2: Vector3<f32>,
    pub high_g_accel_m_s2: Vector3<f32>,
    pub ahrs_gyro_rad_s: Vector3<f32>,
    pub ahrs_accel_m_s2: Vector3<f32>,
    pub ahrs_mag_gauss: Vector3<f32>,
    pub orientation: Quaternion<f32>,

    pub imu_temp_degc: f32,
    pub high_g_temp_degc: f32,
    pub ahrs_temp_degc: f32,
    pub baro_temp_degc: f32,

    pub pressure_pa: f32,
    pub altitude_m: f32,
}

impl TransmissionRecord {
    pub fn from_flight(flight: &FlightData) -> Self {
        TransmissionRecord {
            imu_gyro_rad_s: flight.imu_gyro_rad_s,
            imu_accel_m_s2: flight.imu_accel_m_s2,
            high_g_accel_m_s2: flight.high_g_accel_m_s2,
            ahrs_gyro_rad_s: flight.ahrs_gyro_rad_s,
            ahrs_accel_m_s2: flight.ahrs_accel_m_s2,
            ahrs_mag_gauss: flight.ahrs_mag_gauss,
            orientation: flight.orientation,
            imu_temp_degc: flight.imu_temp_degc,
            high_g_temp_degc: flight.high_g_temp_degc,
            ahrs_temp_degc: flight.ahrs_temp_degc,
            baro_temp_degc: flight.baro_temp_degc,
            pressure_pa: flight.pressure_pa,
            altitude_m: flight.altitude_m,
        }
    }

    /// Exact inverse of [`from_flight`](Self::from_flight) for every carried
    /// field; fields the record does not carry are left untouched on the
    /// receiving side.
    pub fn apply_to(&self, flight: &mut FlightData) {
        flight.imu_gyro_rad_s = self.imu_gyro_rad_s;
        flight.imu_accel_m_s2 = self.imu_accel_m_s2;
        flight.high_g_accel_m_s2 = self.high_g_accel_m_s2;
        flight.ahrs_gyro_rad_s = self.ahrs_gyro_rad_s;
        flight.ahrs_accel_m_s2 = self.ahrs_accel_m_s2;
        flight.ahrs_mag_gauss = self.ahrs_mag_gauss;
        flight.orientation = self.orientation;
        flight.imu_temp_degc = self.imu_temp_degc;
        flight.high_g_temp_degc = self.high_g_temp_degc;
        flight.ahrs_temp_degc = self.ahrs_temp_degc;
        flight.baro_temp_degc = self.baro_temp_degc;
        flight.pressure_pa = self.pressure_pa;
        flight.altitude_m = self.altitude_m;
    }
}

impl From<&FlightData> for TransmissionRecord {
    fn from(flight: &FlightData) -> Self {
        TransmissionRecord::from_flight(flight)
    }
}

impl Default for TransmissionRecord {
    fn default() -> Self {
        TransmissionRecord::from_flight(&FlightData::default())
    }
}
