pub mod flight;
pub mod sensors;
pub mod wire;
