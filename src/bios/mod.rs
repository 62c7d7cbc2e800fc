//! # BIOS module
//!
//! This module is a place for the middleware that sits between the raw
//! sector stream and the `img` encoders.  It is named in analogy with the
//! role of a controller BIOS, which decides where logical sectors land
//! on the physical track.
//!
//! All the sector interleave tables are built in this module.

pub mod skew;

/// Errors pertaining to interleave tables
#[derive(thiserror::Error,Debug,PartialEq)]
pub enum Error {
    #[error("sectors per track {0} is out of range 1-63")]
    SectorCount(u8),
    #[error("interleave {stride} is out of range 1-{spt}")]
    Interleave { stride: u8, spt: u8 },
    #[error("physical slot {0} is not on the track")]
    Slot(usize)
}
