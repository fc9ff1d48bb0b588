pub mod acquisition;
pub mod phase;
