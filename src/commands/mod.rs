//! # CLI Subcommands
//!
//! Contains modules that run the subcommands.

pub mod convert;
pub mod stat;
pub mod completions;

use std::str::FromStr;
use log::debug;
use crate::img::geometry::{DriveGeometry,GeometryBuilder,SectorSize,DataMode,VerifyMode,SeekType};
use crate::DYNERR;

#[derive(thiserror::Error,Debug)]
pub enum CommandError {
    #[error("Command could not be interpreted")]
    InvalidCommand,
    #[error("One of the parameters was out of range")]
    OutOfRange,
    #[error("Image size does not match the geometry, use --force to convert anyway")]
    SizeMismatch,
    #[error("Refusing to write binary data to a terminal")]
    TerminalOutput
}

fn required<T: Clone + Send + Sync + 'static>(cmd: &clap::ArgMatches,name: &str) -> Result<T,CommandError> {
    match cmd.get_one::<T>(name) {
        Some(val) => Ok(val.clone()),
        None => Err(CommandError::InvalidCommand)
    }
}

/// Build the geometry from a JSON file given with `--geometry`, or from the individual flags.
pub fn get_geometry(cmd: &clap::ArgMatches) -> Result<DriveGeometry,DYNERR> {
    if let Some(path) = cmd.get_one::<String>("geometry") {
        return crate::geometry_from_file(path);
    }
    let ssize = SectorSize::from_str(&required::<String>(cmd,"size")?)?;
    let data_mode = match cmd.get_flag("rll") {
        true => DataMode::Rll,
        false => DataMode::Mfm
    };
    let desc = match cmd.get_many::<String>("desc") {
        Some(lines) => lines.cloned().collect::<Vec<String>>().join("\n"),
        None => String::new()
    };
    let geometry = GeometryBuilder::new(
        required::<u16>(cmd,"cylinders")?,
        required::<u8>(cmd,"heads")?,
        required::<u8>(cmd,"sectors")?,
        ssize
    )
        .source_interleave(required::<u8>(cmd,"source-interleave")?)
        .target_interleave(required::<u8>(cmd,"target-interleave")?)
        .start_sector(required::<u8>(cmd,"start-sector")?)
        .data_mode(data_mode)
        .verify_mode(VerifyMode::from_str(&required::<String>(cmd,"verify")?)?)
        .write_precomp(cmd.get_one::<u16>("precomp").copied())
        .reduced_write_current(cmd.get_one::<u16>("rwc").copied())
        .landing_zone(cmd.get_one::<u16>("landing").copied())
        .seek_type(SeekType::from_str(&required::<String>(cmd,"seek")?)?)
        .description(&desc)
        .build()?;
    debug!("geometry from command line {:?}",geometry);
    Ok(geometry)
}
