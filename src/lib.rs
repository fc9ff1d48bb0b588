#![no_std]

pub mod common;
pub mod component;
pub mod component_loop;
pub mod components;
pub mod datatypes;
pub mod events;
pub mod fsw_main;
pub mod hal;
pub mod io;

#[cfg(feature = "std")]
extern crate std;

extern crate alloc;

pub type InstantU64 = fugit::Instant<u64, 1, 1000>;

/// Milliseconds since power-on.
#[derive(Debug, Clone, Copy)]
pub struct Instant(pub InstantU64);

pub type DurationU64 = fugit::Duration<u64, 1, 1000>;

#[derive(Debug, Clone, Copy)]
pub struct Duration(pub DurationU64);

impl From<InstantU64> for Instant {
    fn from(value: InstantU64) -> Self {
        Instant(value)
    }
}

impl From<DurationU64> for Duration {
    fn from(value: DurationU64) -> Self {
        Duration(value)
    }
}
