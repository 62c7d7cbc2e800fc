//! ## Drive Geometry
//!
//! Everything the encoder needs to know about the drive, gathered into one validated
//! structure.  Values can come from the command line or from a JSON description:
//!
//! ```json
//! {
//!     "cylinders": 615, "heads": 4, "sectors": 17, "sector_size": 512,
//!     "target_interleave": 3, "landing_zone": 670, "description": "ST-225"
//! }
//! ```
//!
//! Only the first four keys are required.

use std::fmt;
use std::str::FromStr;
use log::{warn,debug,error};
use crate::bios::skew::{InterleaveTable,MAX_SECTORS};
use super::Error;

pub const MAX_CYLINDERS: u16 = 2048;
pub const MAX_HEADS: u8 = 16;
/// Reduced write current line is shared with head select 3 on larger drives
pub const MAX_RWC_HEADS: u8 = 8;

/// Data separator
#[derive(Clone,Copy,Debug,PartialEq,Eq)]
pub enum DataMode {
    Mfm = 0,
    Rll = 1
}

/// How the controller checks the data field
#[derive(Clone,Copy,Debug,PartialEq,Eq)]
pub enum VerifyMode {
    Crc16 = 0,
    Ecc32 = 1,
    Ecc56 = 2
}

#[derive(Clone,Copy,Debug,PartialEq,Eq)]
pub enum SeekType {
    Buffered = 0,
    St506 = 1
}

#[derive(Clone,Copy,Debug,PartialEq,Eq)]
pub enum SectorSize {
    S128,
    S256,
    S512,
    S1024
}

impl SectorSize {
    pub fn from_bytes(bytes: usize) -> Result<Self,Error> {
        match bytes {
            128 => Ok(Self::S128),
            256 => Ok(Self::S256),
            512 => Ok(Self::S512),
            1024 => Ok(Self::S1024),
            n => Err(Error::SectorSize(n))
        }
    }
    pub fn bytes(&self) -> usize {
        match self {
            Self::S128 => 128,
            Self::S256 => 256,
            Self::S512 => 512,
            Self::S1024 => 1024
        }
    }
    /// Size bits of the SDH register, to be or'd with the head number
    pub fn sdh(&self) -> u8 {
        match self {
            Self::S128 => 0x60,
            Self::S256 => 0x00,
            Self::S512 => 0x20,
            Self::S1024 => 0x40
        }
    }
}

impl FromStr for DataMode {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self,Self::Err> {
        match s {
            "mfm" => Ok(Self::Mfm),
            "rll" => Ok(Self::Rll),
            _ => Err(Error::MetadataMismatch)
        }
    }
}

impl FromStr for VerifyMode {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self,Self::Err> {
        match s {
            "crc16" => Ok(Self::Crc16),
            "ecc32" => Ok(Self::Ecc32),
            "ecc56" => Ok(Self::Ecc56),
            _ => Err(Error::MetadataMismatch)
        }
    }
}

impl FromStr for SeekType {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self,Self::Err> {
        match s {
            "buffered" => Ok(Self::Buffered),
            "st506" => Ok(Self::St506),
            _ => Err(Error::MetadataMismatch)
        }
    }
}

impl FromStr for SectorSize {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self,Self::Err> {
        match s.to_lowercase().as_str() {
            "1k" => Ok(Self::S1024),
            x => match usize::from_str(x) {
                Ok(n) => Self::from_bytes(n),
                Err(_) => Err(Error::MetadataMismatch)
            }
        }
    }
}

impl fmt::Display for DataMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mfm => write!(f,"mfm"),
            Self::Rll => write!(f,"rll")
        }
    }
}

impl fmt::Display for VerifyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Crc16 => write!(f,"crc16"),
            Self::Ecc32 => write!(f,"ecc32"),
            Self::Ecc56 => write!(f,"ecc56")
        }
    }
}

impl fmt::Display for SeekType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buffered => write!(f,"buffered"),
            Self::St506 => write!(f,"st506")
        }
    }
}

/// Validated drive parameters.  Create with `GeometryBuilder` or `DriveGeometry::from_json`.
#[derive(Clone,Debug,PartialEq)]
pub struct DriveGeometry {
    cylinders: u16,
    heads: u8,
    sectors: u8,
    sector_size: SectorSize,
    source_interleave: u8,
    target_interleave: u8,
    start_sector: u8,
    data_mode: DataMode,
    verify_mode: VerifyMode,
    write_precomp: Option<u16>,
    reduced_write_current: Option<u16>,
    landing_zone: Option<u16>,
    seek_type: SeekType,
    description: String
}

/// Collects drive parameters; nothing is checked until `build`.
#[derive(Clone,Debug)]
pub struct GeometryBuilder {
    geometry: DriveGeometry
}

fn check_range(name: &'static str,value: usize,min: usize,max: usize) -> Result<(),Error> {
    if value<min || value>max {
        error!("{} {} is out of range {}-{}",name,value,min,max);
        return Err(Error::OutOfRange { name, value, min, max });
    }
    Ok(())
}

impl GeometryBuilder {
    pub fn new(cylinders: u16,heads: u8,sectors: u8,sector_size: SectorSize) -> Self {
        Self {
            geometry: DriveGeometry {
                cylinders,
                heads,
                sectors,
                sector_size,
                source_interleave: 1,
                target_interleave: 1,
                start_sector: 1,
                data_mode: DataMode::Mfm,
                verify_mode: VerifyMode::Crc16,
                write_precomp: None,
                reduced_write_current: None,
                landing_zone: None,
                seek_type: SeekType::Buffered,
                description: String::new()
            }
        }
    }
    pub fn source_interleave(mut self,stride: u8) -> Self {
        self.geometry.source_interleave = stride;
        self
    }
    pub fn target_interleave(mut self,stride: u8) -> Self {
        self.geometry.target_interleave = stride;
        self
    }
    /// Number given to the first logical sector, usually 0 or 1
    pub fn start_sector(mut self,start: u8) -> Self {
        self.geometry.start_sector = start;
        self
    }
    pub fn data_mode(mut self,mode: DataMode) -> Self {
        self.geometry.data_mode = mode;
        self
    }
    pub fn verify_mode(mut self,mode: VerifyMode) -> Self {
        self.geometry.verify_mode = mode;
        self
    }
    pub fn write_precomp(mut self,start_cyl: Option<u16>) -> Self {
        self.geometry.write_precomp = start_cyl;
        self
    }
    pub fn reduced_write_current(mut self,start_cyl: Option<u16>) -> Self {
        self.geometry.reduced_write_current = start_cyl;
        self
    }
    pub fn landing_zone(mut self,cyl: Option<u16>) -> Self {
        self.geometry.landing_zone = cyl;
        self
    }
    pub fn seek_type(mut self,seek: SeekType) -> Self {
        self.geometry.seek_type = seek;
        self
    }
    pub fn description(mut self,desc: &str) -> Self {
        self.geometry.description = desc.to_string();
        self
    }
    /// Check ranges and apply the controller's fixed rules.
    pub fn build(self) -> Result<DriveGeometry,Error> {
        let mut g = self.geometry;
        check_range("cylinders",g.cylinders as usize,1,MAX_CYLINDERS as usize)?;
        check_range("heads",g.heads as usize,1,MAX_HEADS as usize)?;
        check_range("sectors per track",g.sectors as usize,1,MAX_SECTORS as usize)?;
        check_range("source interleave",g.source_interleave as usize,1,g.sectors as usize)?;
        check_range("target interleave",g.target_interleave as usize,1,g.sectors as usize)?;
        check_range("start sector",g.start_sector as usize,0,256 - g.sectors as usize)?;
        for (name,maybe_cyl) in [
            ("write precompensation cylinder",g.write_precomp),
            ("reduced write current cylinder",g.reduced_write_current),
            ("landing zone cylinder",g.landing_zone)
        ] {
            if let Some(cyl) = maybe_cyl {
                check_range(name,cyl as usize,0,MAX_CYLINDERS as usize)?;
            }
        }
        if g.data_mode==DataMode::Rll && g.verify_mode!=VerifyMode::Ecc56 {
            warn!("RLL data separator always verifies with 56-bit ECC, {} replaced",g.verify_mode);
            g.verify_mode = VerifyMode::Ecc56;
        }
        if g.heads>MAX_RWC_HEADS && g.reduced_write_current.is_some() {
            warn!("reduced write current is not available with more than {} heads, disabled",MAX_RWC_HEADS);
            g.reduced_write_current = None;
        }
        debug!("geometry {} cyl, {} heads, {} x {} bytes",g.cylinders,g.heads,g.sectors,g.sector_size.bytes());
        Ok(g)
    }
}

fn parse_usize(obj: &json::JsonValue,name: &str) -> Result<usize,Error> {
    if let Some(val) = obj.as_usize() {
        return Ok(val);
    }
    error!("{} should be a number",name);
    Err(Error::MetadataMismatch)
}

fn parse_u8(obj: &json::JsonValue,name: &'static str) -> Result<u8,Error> {
    let val = parse_usize(obj,name)?;
    check_range(name,val,0,u8::MAX as usize)?;
    Ok(val as u8)
}

fn parse_u16(obj: &json::JsonValue,name: &'static str) -> Result<u16,Error> {
    let val = parse_usize(obj,name)?;
    check_range(name,val,0,u16::MAX as usize)?;
    Ok(val as u16)
}

fn parse_str<'a>(obj: &'a json::JsonValue,name: &str) -> Result<&'a str,Error> {
    if let Some(s) = obj.as_str() {
        return Ok(s);
    }
    error!("{} should be a string",name);
    Err(Error::MetadataMismatch)
}

/// optional start cylinder, `null` or absent means disabled
fn parse_feature(obj: &json::JsonValue,name: &'static str) -> Result<Option<u16>,Error> {
    match obj.is_null() {
        true => Ok(None),
        false => Ok(Some(parse_u16(obj,name)?))
    }
}

fn opt_json(val: Option<u16>) -> json::JsonValue {
    match val {
        Some(cyl) => json::JsonValue::from(cyl),
        None => json::JsonValue::Null
    }
}

impl DriveGeometry {
    /// Parse a JSON geometry description, see module docs for the keys.
    pub fn from_json(json_str: &str) -> Result<Self,Error> {
        let root = match json::parse(json_str) {
            Ok(obj) => obj,
            Err(e) => {
                error!("could not parse geometry: {}",e);
                return Err(Error::MetadataMismatch);
            }
        };
        if !root.is_object() {
            error!("geometry should be a JSON object");
            return Err(Error::MetadataMismatch);
        }
        let ssize = match &root["sector_size"] {
            obj if obj.is_string() => SectorSize::from_str(parse_str(obj,"sector_size")?)?,
            obj => SectorSize::from_bytes(parse_usize(obj,"sector_size")?)?
        };
        let mut builder = GeometryBuilder::new(
            parse_u16(&root["cylinders"],"cylinders")?,
            parse_u8(&root["heads"],"heads")?,
            parse_u8(&root["sectors"],"sectors")?,
            ssize
        );
        if root.has_key("source_interleave") {
            builder = builder.source_interleave(parse_u8(&root["source_interleave"],"source_interleave")?);
        }
        if root.has_key("target_interleave") {
            builder = builder.target_interleave(parse_u8(&root["target_interleave"],"target_interleave")?);
        }
        if root.has_key("start_sector") {
            builder = builder.start_sector(parse_u8(&root["start_sector"],"start_sector")?);
        }
        if root.has_key("data_mode") {
            builder = builder.data_mode(DataMode::from_str(parse_str(&root["data_mode"],"data_mode")?)?);
        }
        if root.has_key("verify_mode") {
            builder = builder.verify_mode(VerifyMode::from_str(parse_str(&root["verify_mode"],"verify_mode")?)?);
        }
        if root.has_key("seek_type") {
            builder = builder.seek_type(SeekType::from_str(parse_str(&root["seek_type"],"seek_type")?)?);
        }
        if root.has_key("description") {
            builder = builder.description(parse_str(&root["description"],"description")?);
        }
        builder
            .write_precomp(parse_feature(&root["write_precomp"],"write_precomp")?)
            .reduced_write_current(parse_feature(&root["reduced_write_current"],"reduced_write_current")?)
            .landing_zone(parse_feature(&root["landing_zone"],"landing_zone")?)
            .build()
    }
    /// Geometry plus derived quantities as a JSON string, minified if `indent` is `None`.
    pub fn to_json(&self,indent: Option<u16>) -> Result<String,Error> {
        let mut root = json::JsonValue::new_object();
        root["cylinders"] = self.cylinders.into();
        root["heads"] = self.heads.into();
        root["sectors"] = self.sectors.into();
        root["sector_size"] = self.sector_size.bytes().into();
        root["source_interleave"] = self.source_interleave.into();
        root["target_interleave"] = self.target_interleave.into();
        root["start_sector"] = self.start_sector.into();
        root["data_mode"] = self.data_mode.to_string().into();
        root["verify_mode"] = self.verify_mode.to_string().into();
        root["write_precomp"] = opt_json(self.write_precomp);
        root["reduced_write_current"] = opt_json(self.reduced_write_current);
        root["landing_zone"] = opt_json(self.landing_zone);
        root["seek_type"] = self.seek_type.to_string().into();
        root["description"] = self.description.as_str().into();
        root["derived"]["sdh"] = format!("{:02X}",self.sdh()).into();
        root["derived"]["track_bytes"] = self.track_bytes().into();
        root["derived"]["image_bytes"] = self.expected_image_size().into();
        root["derived"]["header_bytes"] = super::wdi::header_len(&self.description).into();
        root["derived"]["source_table"] = self.source_table()?.physical_order().to_vec().into();
        root["derived"]["target_table"] = self.target_table()?.physical_order().to_vec().into();
        Ok(match indent {
            Some(spaces) => json::stringify_pretty(root,spaces),
            None => json::stringify(root)
        })
    }
    pub fn cylinders(&self) -> u16 {
        self.cylinders
    }
    pub fn heads(&self) -> u8 {
        self.heads
    }
    pub fn sectors(&self) -> u8 {
        self.sectors
    }
    pub fn sector_size(&self) -> SectorSize {
        self.sector_size
    }
    pub fn start_sector(&self) -> u8 {
        self.start_sector
    }
    pub fn data_mode(&self) -> DataMode {
        self.data_mode
    }
    pub fn verify_mode(&self) -> VerifyMode {
        self.verify_mode
    }
    pub fn write_precomp(&self) -> Option<u16> {
        self.write_precomp
    }
    pub fn reduced_write_current(&self) -> Option<u16> {
        self.reduced_write_current
    }
    pub fn landing_zone(&self) -> Option<u16> {
        self.landing_zone
    }
    pub fn seek_type(&self) -> SeekType {
        self.seek_type
    }
    pub fn description(&self) -> &str {
        &self.description
    }
    pub fn sdh(&self) -> u8 {
        self.sector_size.sdh()
    }
    /// Order in which the dump was captured
    pub fn source_table(&self) -> Result<InterleaveTable,Error> {
        Ok(InterleaveTable::build(self.sectors,self.source_interleave)?)
    }
    /// Order in which sectors appear in the container
    pub fn target_table(&self) -> Result<InterleaveTable,Error> {
        Ok(InterleaveTable::build(self.sectors,self.target_interleave)?)
    }
    pub fn track_bytes(&self) -> usize {
        self.sectors as usize * self.sector_size.bytes()
    }
    pub fn expected_image_size(&self) -> u64 {
        self.cylinders as u64 * self.heads as u64 * self.track_bytes() as u64
    }
    /// Shift a 1-based table entry onto the drive's own sector numbering
    pub fn adjust_sector(&self,lsec: u8) -> u8 {
        match self.start_sector {
            0 => lsec - 1,
            1 => lsec,
            start => lsec + (start - 1)
        }
    }
    /// Compare the dump size against the geometry.  A mismatch is for the caller to
    /// accept or refuse, but a dump smaller than one track cannot be used at all.
    pub fn check_image_size(&self,actual: u64) -> Result<(),Error> {
        if actual < self.track_bytes() as u64 {
            error!("image of {} bytes is smaller than one track of {} bytes",actual,self.track_bytes());
            return Err(Error::ImageTooSmall);
        }
        let expected = self.expected_image_size();
        if actual != expected {
            warn!("expected {} cyl(s), {} head(s), {} sector(s) per track, {} bytes each: {} bytes, found {}",
                self.cylinders,self.heads,self.sectors,self.sector_size.bytes(),expected,actual);
            return Err(Error::ImageSizeMismatch { expected, actual });
        }
        Ok(())
    }
}
