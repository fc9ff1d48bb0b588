use bitflags::bitflags;
use nalgebra::{Quaternion, Vector3};

use crate::{Duration, DurationU64};

use super::sensors::GpsSnapshot;

bitflags! {
    /// One bit per monitored sensor; a set bit means the most recent read
    /// failed. Recomputed by the acquisition step every tick.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct SensorHealth: u8 {
        const IMU       = 1 << 0;
        const HIGH_G    = 1 << 1;
        const AHRS      = 1 << 2;
        const BAROMETER = 1 << 3;
        const GPS       = 1 << 4;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FlightPhase {
    Uncalibrated,
    CalibratedIdle,
    Ascent,
    Descent,
    Landed,
}

/// The authoritative current-state record. One instance lives for the whole
/// flight; the acquisition step overwrites sensor fields in place each tick.
#[derive(Debug, Clone)]
pub struct FlightData {
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
    /// Barometric altitude relative to the committed ground reference. Raw
    /// altitude never leaves the acquisition step.
    pub altitude_m: f32,
    pub altitude_offset_m: f32,

    pub total_time: Duration,

    pub health: SensorHealth,
    pub gps: GpsSnapshot,
}

impl FlightData {
    /// Folds the current corrected altitude into the committed offset so the
    /// present position reads as zero. Called once on the transition into
    /// ascent, against altimeter drift accumulated on the pad.
    pub fn commit_ground_reference(&mut self) {
        self.altitude_offset_m += self.altitude_m;
        self.altitude_m = 0.0;
    }
}

impl Default for FlightData {
    fn default() -> Self {
        FlightData {
            imu_gyro_rad_s: Vector3::zeros(),
            imu_accel_m_s2: Vector3::zeros(),
            high_g_accel_m_s2: Vector3::zeros(),
            ahrs_gyro_rad_s: Vector3::zeros(),
            ahrs_accel_m_s2: Vector3::zeros(),
            ahrs_mag_gauss: Vector3::zeros(),
            orientation: Quaternion::identity(),
            imu_temp_degc: 0.0,
            high_g_temp_degc: 0.0,
            ahrs_temp_degc: 0.0,
            baro_temp_degc: 0.0,
            pressure_pa: 0.0,
            altitude_m: 0.0,
            altitude_offset_m: 0.0,
            total_time: Duration(DurationU64::from_ticks(0)),
            health: SensorHealth::empty(),
            gps: GpsSnapshot::default(),
        }
    }
}
