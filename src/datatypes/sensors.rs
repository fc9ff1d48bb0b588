use nalgebra::{Quaternion, Vector3};

#[derive(Debug, Clone)]
pub struct ImuSample {
    pub gyro_rad_s: Vector3<f32>,
    pub accel_m_s2: Vector3<f32>,
    pub temperature_degc: f32,
}

#[derive(Debug, Clone)]
pub struct HighGSample {
    pub accel_m_s2: Vector3<f32>,
    pub temperature_degc: f32,
}

#[derive(Debug, Clone)]
pub struct OrientationSample {
    pub orientation: Quaternion<f32>,
    pub gyro_rad_s: Vector3<f32>,
    pub accel_m_s2: Vector3<f32>,
    pub mag_gauss: Vector3<f32>,
    pub temperature_degc: f32,
}

#[derive(Debug, Clone)]
pub struct BarometerSample {
    pub pressure_pa: f32,
    pub temperature_degc: f32,
    /// Standard-atmosphere altitude as reported by the driver, before any
    /// ground-reference correction.
    pub altitude_m: f32,
}

/// Last-attempted GPS state. Updated unconditionally by the acquisition step,
/// so staleness is always observable through `fix_valid`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GpsSnapshot {
    pub fix_valid: bool,
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub satellites: u8,
    pub ground_speed_m_s: f32,
    pub heading_deg: f32,
    pub altitude_m: f32,
}
