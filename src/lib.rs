//! # `wdikit` main library
//!
//! This library converts flat hard disk dumps into WDI images suitable for the
//! Winchesterduino emulator and imager.  A dump is a plain sequence of sectors,
//! cylinder by cylinder and head by head, with nothing to say how the sectors were
//! arranged on the original track.  The WDI image records the sector ID fields of
//! every track along with the data, so the drive geometry and interleave have to be
//! supplied by the user.
//!
//! ## Architecture
//!
//! * `bios::skew` builds interleave tables and can infer an interleave from sector IDs
//! * `img::geometry` holds the validated drive parameters
//! * `img::tracks` reads tracks from the dump and re-interleaves them
//! * `img::wdi` writes the header and the track records
//! * `commands` runs the CLI subcommands
//!
//! ## Limits
//!
//! Sector count, sector size, and interleave are constant over the whole drive.
//! Cylinder and head numbers in the ID fields equal the physical address.
//! There is no indication of bad blocks, CRC/ECC errors, or unreadable tracks.

pub mod bios;
pub mod img;
pub mod commands;

use std::io::{Read,Write};
use log::info;
use img::geometry::DriveGeometry;
use img::wdi::{WdiWriter,ConvertSummary};

type DYNERR = Box<dyn std::error::Error>;
type STDRESULT = Result<(),Box<dyn std::error::Error>>;

/// Convert a dump read from `input` into a WDI stream on `output`.
/// Stops at the end of the geometry or at the first incomplete track, whichever comes first.
pub fn convert_stream<R: Read,W: Write>(input: R,output: W,geometry: DriveGeometry) -> Result<ConvertSummary,DYNERR> {
    let mut writer = WdiWriter::new(output,geometry);
    writer.convert(input,|_| true)
}

/// Convert a dump held in memory, returning the WDI image and the summary.
pub fn convert_bytestream(dump: &[u8],geometry: DriveGeometry) -> Result<(Vec<u8>,ConvertSummary),DYNERR> {
    let mut ans: Vec<u8> = Vec::new();
    let summary = convert_stream(dump,&mut ans,geometry)?;
    Ok((ans,summary))
}

/// Load a JSON geometry description from a file
pub fn geometry_from_file(path: &str) -> Result<DriveGeometry,DYNERR> {
    let json_str = std::fs::read_to_string(path)?;
    let geometry = DriveGeometry::from_json(&json_str)?;
    info!("loaded geometry from {}",path);
    Ok(geometry)
}
