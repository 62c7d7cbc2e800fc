//! ## Support for WDI disk images
//!
//! WDI is the container used by the Winchesterduino hard disk imager.  It starts with
//! a text header that can be typed to a console, ended by 0x1A, followed by a fixed
//! drive parameter block.  Then come the track records, one per cylinder and head,
//! with no index.  The file can only be produced sequentially.
//!
//! Each track record holds a 4 byte track header, the sector ID fields as the
//! controller would read them, and the data fields.  There is a trivial compression
//! scheme for the data: a sector filled with a single value is stored as the value alone.
//! Compression happens as the record is flattened.

use std::io::{Read,Write};
use log::{trace,debug,info,error};
use a2kit_macro::{DiskStruct,DiskStructError};
use a2kit_macro_derive::DiskStruct;
use super::geometry::DriveGeometry;
use super::tracks::{Track,TrackReader};
use crate::{STDRESULT,DYNERR};

pub const SIGNATURE: &str = "WDI file created by Winchesterduino, (c) J. Bogin";
pub const TEXT_END: u8 = 0x1a;
pub const TRACK_HEADER_LEN: usize = 4;
pub const ID_ENTRY_LEN: usize = 4;

pub fn file_extensions() -> Vec<String> {
    vec!["wdi".to_string()]
}

/// Data field markers
pub enum SectorData {
    Normal = 0x01,
    NormalCompressed = 0x81
}

/// Drive parameters that follow the text header, all numbers LE.
/// Field order and widths are fixed by the format.
#[derive(DiskStruct)]
pub struct ParamBlock {
    data_mode: u8,
    verify_mode: u8,
    cylinders: [u8;2],
    heads: u8,
    precomp_enabled: u8,
    precomp_cyl: [u8;2],
    rwc_enabled: u8,
    rwc_cyl: [u8;2],
    landing_enabled: u8,
    landing_cyl: [u8;2],
    seek_type: u8,
    reserved: [u8;17]
}

fn feature(maybe_cyl: Option<u16>) -> (u8,[u8;2]) {
    match maybe_cyl {
        Some(cyl) => (1,u16::to_le_bytes(cyl)),
        None => (0,[0,0])
    }
}

impl ParamBlock {
    pub fn create(geometry: &DriveGeometry) -> Self {
        let mut ans = Self::new();
        ans.data_mode = geometry.data_mode() as u8;
        ans.verify_mode = geometry.verify_mode() as u8;
        ans.cylinders = u16::to_le_bytes(geometry.cylinders());
        ans.heads = geometry.heads();
        (ans.precomp_enabled,ans.precomp_cyl) = feature(geometry.write_precomp());
        (ans.rwc_enabled,ans.rwc_cyl) = feature(geometry.reduced_write_current());
        (ans.landing_enabled,ans.landing_cyl) = feature(geometry.landing_zone());
        ans.seek_type = geometry.seek_type() as u8;
        ans
    }
}

pub fn is_slice_uniform(slice: &[u8]) -> bool {
    match slice.first() {
        Some(test) => slice.iter().all(|x| x==test),
        None => true
    }
}

/// Description lines as they go in the header: printable ASCII, trailing
/// whitespace trimmed, empty lines dropped.
fn description_lines(desc: &str) -> Vec<String> {
    desc.lines()
        .map(|line| line.trim_end())
        .filter(|line| line.len() > 0)
        .map(|line| line.chars().map(|c| match c {
            ' '..='~' => c,
            _ => '?'
        }).collect())
        .collect()
}

/// Everything up to and including the parameter block
pub fn header_bytes(geometry: &DriveGeometry) -> Vec<u8> {
    let mut ans: Vec<u8> = Vec::new();
    ans.extend_from_slice(SIGNATURE.as_bytes());
    ans.extend_from_slice(b"\r\n");
    for line in description_lines(geometry.description()) {
        ans.extend_from_slice(line.as_bytes());
        ans.extend_from_slice(b"\r\n");
    }
    ans.push(TEXT_END);
    ans.append(&mut ParamBlock::create(geometry).to_bytes());
    ans
}

/// Byte count of the header for a given description
pub fn header_len(desc: &str) -> usize {
    let text: usize = description_lines(desc).iter().map(|line| line.len() + 2).sum();
    SIGNATURE.len() + 2 + text + 1 + ParamBlock::new().len()
}

/// One track as it is laid down in the file
pub struct TrackRecord {
    cylinder: u16,
    head: u8,
    sectors: u8,
    /// cylinder low, cylinder high, sector number, SDH per sector
    id_map: Vec<u8>,
    data_buf: Vec<u8>,
    compressed: usize
}

impl TrackRecord {
    /// Build the record from a track already in target order.
    pub fn create(track: &Track,geometry: &DriveGeometry) -> Self {
        let [cyl_lo,cyl_hi] = u16::to_le_bytes(track.cylinder);
        let mut id_map: Vec<u8> = Vec::with_capacity(track.sectors.len()*ID_ENTRY_LEN);
        let mut data_buf: Vec<u8> = Vec::new();
        let mut compressed = 0;
        for sec in &track.sectors {
            id_map.extend_from_slice(&[cyl_lo,cyl_hi,geometry.adjust_sector(sec.id),geometry.sdh() | track.head]);
            if !sec.data.is_empty() && is_slice_uniform(&sec.data) {
                trace!("compressing cyl {} head {} sec {}",track.cylinder,track.head,sec.id);
                data_buf.push(SectorData::NormalCompressed as u8);
                data_buf.push(sec.data[0]);
                compressed += 1;
            } else {
                data_buf.push(SectorData::Normal as u8);
                data_buf.extend_from_slice(&sec.data);
            }
        }
        Self {
            cylinder: track.cylinder,
            head: track.head,
            sectors: track.sectors.len() as u8,
            id_map,
            data_buf,
            compressed
        }
    }
    pub fn len(&self) -> usize {
        TRACK_HEADER_LEN + self.id_map.len() + self.data_buf.len()
    }
    pub fn compressed_sectors(&self) -> usize {
        self.compressed
    }
    pub fn to_bytes(&self) -> Vec<u8> {
        let [cyl_lo,cyl_hi] = u16::to_le_bytes(self.cylinder);
        [
            vec![cyl_lo,cyl_hi,self.head,self.sectors],
            self.id_map.clone(),
            self.data_buf.clone()
        ].concat()
    }
}

/// Where the conversion is after each track
#[derive(Clone,Copy,Debug,PartialEq)]
pub struct TrackProgress {
    pub cylinder: u16,
    pub head: u8,
    pub tracks: usize,
    pub cylinders_done: u16
}

#[derive(Clone,Copy,Debug,Default,PartialEq)]
pub struct ConvertSummary {
    /// cylinders with every head written
    pub cylinders: u16,
    pub tracks: usize,
    pub literal_sectors: usize,
    pub compressed_sectors: usize,
    pub bytes_written: u64,
    /// the progress hook asked to stop
    pub stopped: bool
}

/// Move to the next track, heads first.  Returns the new (cylinder,head).
pub fn advance(cylinder: u16,head: u8,heads: u8) -> (u16,u8) {
    match head + 1 {
        h if h>=heads => (cylinder + 1,0),
        h => (cylinder,h)
    }
}

/// Writes a WDI stream.  The writer owns the output for the duration of the run.
pub struct WdiWriter<W: Write> {
    out: W,
    geometry: DriveGeometry,
    bytes_written: u64
}

impl<W: Write> WdiWriter<W> {
    pub fn new(out: W,geometry: DriveGeometry) -> Self {
        Self {
            out,
            geometry,
            bytes_written: 0
        }
    }
    fn put(&mut self,buf: &[u8]) -> STDRESULT {
        if let Err(e) = self.out.write_all(buf) {
            error!("file write error: {}",e);
            return Err(Box::new(e));
        }
        self.bytes_written += buf.len() as u64;
        Ok(())
    }
    /// Write the text header and parameter block, must come first.
    pub fn write_header(&mut self) -> STDRESULT {
        let header = header_bytes(&self.geometry);
        info!("writing {} byte header, {} cyl {} heads",header.len(),self.geometry.cylinders(),self.geometry.heads());
        self.put(&header)
    }
    /// Write one track record, the track must already be in target order.
    pub fn write_track(&mut self,track: &Track) -> Result<TrackRecord,DYNERR> {
        let record = TrackRecord::create(track,&self.geometry);
        debug!("cyl {} head {}: {} bytes, {} of {} sectors compressed",
            track.cylinder,track.head,record.len(),record.compressed_sectors(),track.sectors.len());
        self.put(&record.to_bytes())?;
        Ok(record)
    }
    /// Convert a whole dump.  After each track `keep_going` is told where we are;
    /// returning false stops before the next track, leaving a valid file.
    pub fn convert<R: Read,F: FnMut(&TrackProgress) -> bool>(&mut self,input: R,mut keep_going: F) -> Result<ConvertSummary,DYNERR> {
        self.write_header()?;
        let ssize = self.geometry.sector_size().bytes();
        let mut reader = TrackReader::new(input,self.geometry.source_table()?,self.geometry.target_table()?,ssize)?;
        let mut summary = ConvertSummary::default();
        let (mut cylinder,mut head) = (0,0);
        while cylinder < self.geometry.cylinders() {
            let track = match reader.next_track(cylinder,head)? {
                Some(trk) => trk,
                None => break
            };
            let record = self.write_track(&track)?;
            summary.tracks += 1;
            summary.compressed_sectors += record.compressed_sectors();
            summary.literal_sectors += track.sectors.len() - record.compressed_sectors();
            (cylinder,head) = advance(cylinder,head,self.geometry.heads());
            summary.cylinders = cylinder;
            let progress = TrackProgress {
                cylinder: track.cylinder,
                head: track.head,
                tracks: summary.tracks,
                cylinders_done: cylinder
            };
            if !keep_going(&progress) {
                info!("stopped after cyl {} head {}",track.cylinder,track.head);
                summary.stopped = true;
                break;
            }
        }
        self.out.flush()?;
        summary.bytes_written = self.bytes_written;
        info!("{} track(s), {} sector(s) compressed",summary.tracks,summary.compressed_sectors);
        Ok(summary)
    }
    pub fn into_inner(self) -> W {
        self.out
    }
}
