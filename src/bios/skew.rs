//! ## Sector Interleave Module
//!
//! Hard disk controllers of the WD1010 era lay logical sectors down on the track
//! with a fixed stride, so that the host has time to digest one sector before the
//! next one passes under the head.  When the stride does not divide the sector
//! count, the controller resolves collisions by sliding forward to the next free slot.
//!
//! Tables here are 1-based on both sides: physical slot 1 is the first sector after
//! the index pulse, logical sector 1 is the lowest sector number.  Offsetting the
//! logical numbers to match a particular drive is left to the encoder.

use log::{trace,debug};
use super::Error;

/// Largest sector count a track can hold
pub const MAX_SECTORS: u8 = 63;

/// Maps physical slot to logical sector number.
/// Slot 0 is kept unused so that both sides of the map are 1-based.
#[derive(Clone,Debug,PartialEq,Eq)]
pub struct InterleaveTable {
    stride: u8,
    map: Vec<u8>
}

impl InterleaveTable {
    /// Build the table for `spt` sectors laid down with the given stride.
    /// The table is a bijection from physical slots `1..=spt` to logical sectors `1..=spt`.
    pub fn build(spt: u8,stride: u8) -> Result<Self,Error> {
        if spt<1 || spt>MAX_SECTORS {
            return Err(Error::SectorCount(spt));
        }
        if stride<1 || stride>spt {
            return Err(Error::Interleave { stride, spt });
        }
        let n = spt as usize;
        let mut map = [0u8;MAX_SECTORS as usize + 1];
        let mut pos = 1;
        for lsec in 1..=n {
            map[pos] = lsec as u8;
            if lsec==n {
                break;
            }
            pos += stride as usize;
            if pos > n {
                pos = (pos - 1) % n + 1;
                while map[pos] != 0 {
                    pos = pos % n + 1;
                }
            }
        }
        trace!("interleave {} over {} sectors: {:?}",stride,spt,&map[1..=n]);
        Ok(Self {
            stride,
            map: map[0..=n].to_vec()
        })
    }
    /// Sectors on the track
    pub fn len(&self) -> usize {
        self.map.len() - 1
    }
    pub fn stride(&self) -> u8 {
        self.stride
    }
    /// Logical sector found at the 1-based physical slot
    pub fn logical(&self,slot: usize) -> Result<u8,Error> {
        match slot {
            s if s>=1 && s<self.map.len() => Ok(self.map[s]),
            s => Err(Error::Slot(s))
        }
    }
    /// 1-based physical slot holding the logical sector, if any
    pub fn slot_of(&self,lsec: u8) -> Option<usize> {
        self.physical_order().iter().position(|x| *x==lsec).map(|i| i+1)
    }
    /// Logical sector numbers in the order they pass under the head
    pub fn physical_order(&self) -> &[u8] {
        &self.map[1..]
    }
}

/// Get the interleave from a list of sector IDs given in physical order.
/// The stride is the cyclic distance from the lowest ID to its successor,
/// so IDs may start from any base.  Tracks of fewer than 3 sectors are
/// always sequential.  Returns `None` if the IDs are not distinct and consecutive.
pub fn detect_interleave(ids: &[u8]) -> Option<u8> {
    let n = ids.len();
    if n<1 || n>MAX_SECTORS as usize {
        return None;
    }
    let lowest = *ids.iter().min()?;
    let mut seen = [false;MAX_SECTORS as usize];
    for id in ids {
        let idx = (*id - lowest) as usize;
        if idx>=n || seen[idx] {
            debug!("sector {} breaks the sequence {:?}",id,ids);
            return None;
        }
        seen[idx] = true;
    }
    if n<3 {
        return Some(1);
    }
    let p0 = ids.iter().position(|x| *x==lowest)?;
    let p1 = ids.iter().position(|x| *x==lowest+1)?;
    Some(((p1 + n - p0) % n) as u8)
}
