//! ## Track Assembly
//!
//! A dump is read one track at a time.  Each sector read from the dump is tagged with
//! the logical number the source interleave puts at that physical slot.  The tagged
//! sectors are then laid out again in the order of the target interleave.
//! Only whole tracks are ever produced: if the input ends part way through a track,
//! that track is dropped and the reader reports the end of input.

use std::io::Read;
use log::{trace,debug,error};
use crate::bios::skew::InterleaveTable;
use crate::bios;
use super::Error;

/// One sector; `id` is the 1-based logical number from the interleave table
#[derive(Clone,Debug,PartialEq)]
pub struct Sector {
    pub id: u8,
    pub data: Vec<u8>
}

/// Sectors of one track in physical order
#[derive(Clone,Debug,PartialEq)]
pub struct Track {
    pub cylinder: u16,
    pub head: u8,
    pub sectors: Vec<Sector>
}

fn check_tables(source: &InterleaveTable,target: &InterleaveTable) -> Result<(),Error> {
    if source.len()!=target.len() {
        error!("source table has {} sectors but target has {}",source.len(),target.len());
        return Err(Error::Interleave(bios::Error::SectorCount(target.len() as u8)));
    }
    Ok(())
}

/// Tag sectors given in physical order with the source table's logical numbers.
fn tag(chunks: Vec<Vec<u8>>,source: &InterleaveTable) -> Result<Vec<Sector>,Error> {
    let mut ans = Vec::with_capacity(chunks.len());
    for (i,data) in chunks.into_iter().enumerate() {
        ans.push(Sector { id: source.logical(i+1)?, data });
    }
    Ok(ans)
}

/// Put tagged sectors into the physical order of the target table.
/// Every slot is filled since both tables are bijections over the same count.
pub fn reorder(tagged: Vec<Sector>,target: &InterleaveTable) -> Result<Vec<Sector>,Error> {
    let mut by_id: Vec<Option<Sector>> = vec![None;target.len()+1];
    for sec in tagged {
        let idx = sec.id as usize;
        if idx<1 || idx>target.len() {
            return Err(Error::Interleave(bios::Error::Slot(idx)));
        }
        by_id[idx] = Some(sec);
    }
    let mut ans = Vec::with_capacity(target.len());
    for slot in 1..=target.len() {
        let lsec = target.logical(slot)?;
        match by_id[lsec as usize].take() {
            Some(sec) => ans.push(sec),
            None => {
                error!("sector {} missing from track",lsec);
                return Err(Error::Interleave(bios::Error::Slot(slot)));
            }
        }
    }
    Ok(ans)
}

/// Restate a whole track buffer captured with `source` interleave as if it were
/// captured with `target` interleave.
pub fn reinterleave(raw: &[u8],ssize: usize,source: &InterleaveTable,target: &InterleaveTable) -> Result<Vec<u8>,Error> {
    check_tables(source,target)?;
    if ssize==0 || raw.len()!=ssize*source.len() {
        error!("track buffer of {} bytes does not hold {} sectors",raw.len(),source.len());
        return Err(Error::OutOfRange { name: "track buffer", value: raw.len(), min: ssize*source.len(), max: ssize*source.len() });
    }
    let chunks = raw.chunks(ssize).map(|c| c.to_vec()).collect();
    let ordered = reorder(tag(chunks,source)?,target)?;
    Ok(ordered.into_iter().flat_map(|s| s.data).collect())
}

/// Pulls re-interleaved tracks from a sequential dump
pub struct TrackReader<R: Read> {
    reader: R,
    source: InterleaveTable,
    target: InterleaveTable,
    ssize: usize
}

impl<R: Read> TrackReader<R> {
    pub fn new(reader: R,source: InterleaveTable,target: InterleaveTable,ssize: usize) -> Result<Self,Error> {
        check_tables(&source,&target)?;
        Ok(Self {
            reader,
            source,
            target,
            ssize
        })
    }
    /// Read the next track.  `Ok(None)` means the input ran out before a full track.
    pub fn next_track(&mut self,cylinder: u16,head: u8) -> Result<Option<Track>,std::io::Error> {
        let mut chunks = Vec::with_capacity(self.source.len());
        for i in 0..self.source.len() {
            let mut buf = vec![0;self.ssize];
            match self.reader.read_exact(&mut buf) {
                Ok(()) => chunks.push(buf),
                Err(e) if e.kind()==std::io::ErrorKind::UnexpectedEof => {
                    debug!("input ended at cyl {} head {} after {} sector(s)",cylinder,head,i);
                    return Ok(None);
                },
                Err(e) => return Err(e)
            }
        }
        let sectors = match tag(chunks,&self.source).and_then(|t| reorder(t,&self.target)) {
            Ok(s) => s,
            Err(e) => return Err(std::io::Error::new(std::io::ErrorKind::InvalidData,e))
        };
        trace!("cyl {} head {} order {:?}",cylinder,head,sectors.iter().map(|s| s.id).collect::<Vec<u8>>());
        Ok(Some(Track { cylinder, head, sectors }))
    }
    pub fn into_inner(self) -> R {
        self.reader
    }
}
