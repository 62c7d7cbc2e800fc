//! # Disk Image Module
//!
//! This module turns a flat sector dump into a container an emulated
//! controller can serve.  The pieces are layered so that each can be
//! exercised on its own:
//!
//! * `geometry` holds the validated drive parameters, replacing a loose bag of settings
//! * `tracks` pulls one track's worth of sectors from the input and re-interleaves them
//! * `wdi` encodes the header and the track records of the WDI container
//!
//! ## Sector Interleave
//!
//! The interleave tables themselves are built in `bios::skew`.  A dump is assumed to
//! have been captured with one interleave (the source) and is restated with another
//! (the target).  Only the order of sectors changes, never their contents.
//!
//! The interleave is constant over the whole disk, as are the sector count and size.

pub mod geometry;
pub mod tracks;
pub mod wdi;

/// Enumerates disk image errors.  The `Display` trait will print equivalent long message.
#[derive(thiserror::Error,Debug)]
pub enum Error {
    #[error("{name} {value} is out of range {min}-{max}")]
    OutOfRange { name: &'static str, value: usize, min: usize, max: usize },
    #[error("sector size {0} is not one of 128, 256, 512, 1024")]
    SectorSize(usize),
    #[error("bad interleave: {0}")]
    Interleave(#[from] crate::bios::Error),
    #[error("geometry description could not be interpreted")]
    MetadataMismatch,
    #[error("image size {actual} did not match the geometry, expected {expected}")]
    ImageSizeMismatch { expected: u64, actual: u64 },
    #[error("image is smaller than one track")]
    ImageTooSmall
}
