// test of interleave tables and the WDI encoder
use std::io::Write;
use wdikit::bios::skew::{InterleaveTable,detect_interleave};
use wdikit::img;
use wdikit::img::geometry::{DriveGeometry,GeometryBuilder,SectorSize,DataMode,VerifyMode};
use wdikit::img::tracks::{self,Sector,Track,TrackReader};
use wdikit::img::wdi::{self,TrackRecord,WdiWriter};

const HEADER_LEN: usize = 84;

fn small_geometry(cylinders: u16,heads: u8) -> DriveGeometry {
    GeometryBuilder::new(cylinders,heads,2,SectorSize::S128).build().expect("bad geometry")
}

/// sector `k` of the dump, never uniform
fn pattern(k: usize,ssize: usize) -> Vec<u8> {
    (0..ssize).map(|i| (i + k*7) as u8).collect()
}

fn dump(sectors: usize,ssize: usize) -> Vec<u8> {
    (0..sectors).flat_map(|k| pattern(k,ssize)).collect()
}

#[test]
fn tables_are_bijections() {
    for spt in 1..=63 {
        for stride in 1..=spt {
            let table = InterleaveTable::build(spt,stride).expect("build failed");
            let mut sorted = table.physical_order().to_vec();
            sorted.sort();
            let expected: Vec<u8> = (1..=spt).collect();
            assert_eq!(sorted,expected,"spt {} stride {}",spt,stride);
        }
    }
}

#[test]
fn stride_one_is_identity() {
    for spt in 1..=63 {
        let table = InterleaveTable::build(spt,1).expect("build failed");
        let expected: Vec<u8> = (1..=spt).collect();
        assert_eq!(table.physical_order(),expected.as_slice());
    }
    assert_eq!(InterleaveTable::build(1,1).expect("build failed").logical(1),Ok(1));
}

#[test]
fn seventeen_sectors_interleave_three() {
    let table = InterleaveTable::build(17,3).expect("build failed");
    assert_eq!(table.physical_order(),&[1,7,13,2,8,14,3,9,15,4,10,16,5,11,17,6,12]);
}

#[test]
fn detect_inverts_build() {
    for spt in 3..=63 {
        for stride in 1..spt {
            let table = InterleaveTable::build(spt,stride).expect("build failed");
            assert_eq!(detect_interleave(table.physical_order()),Some(stride),"spt {} stride {}",spt,stride);
        }
    }
    assert_eq!(detect_interleave(&[1,2]),Some(1));
}

#[test]
fn reinterleave_same_table_is_identity() {
    let raw = dump(17,128);
    for stride in [1,2,3,5,16] {
        let table = InterleaveTable::build(17,stride).expect("build failed");
        let ans = tracks::reinterleave(&raw,128,&table,&table).expect("reinterleave failed");
        assert_eq!(ans,raw);
    }
}

#[test]
fn reinterleave_order() {
    // sector `k` filled with `k`
    let raw: Vec<u8> = (1..=6).flat_map(|k| vec![k as u8;4]).collect();
    let source = InterleaveTable::build(6,1).expect("build failed");
    let target = InterleaveTable::build(6,3).expect("build failed");
    let ans = tracks::reinterleave(&raw,4,&source,&target).expect("reinterleave failed");
    let firsts: Vec<u8> = ans.chunks(4).map(|c| c[0]).collect();
    assert_eq!(firsts,vec![1,3,5,2,4,6]);
}

#[test]
fn reinterleave_round_trip() {
    let raw = dump(26,256);
    for (s,t) in [(1,2),(2,1),(3,7),(13,5),(26,4)] {
        let source = InterleaveTable::build(26,s).expect("build failed");
        let target = InterleaveTable::build(26,t).expect("build failed");
        let there = tracks::reinterleave(&raw,256,&source,&target).expect("reinterleave failed");
        let back = tracks::reinterleave(&there,256,&target,&source).expect("reinterleave failed");
        assert_eq!(back,raw,"source {} target {}",s,t);
    }
}

#[test]
fn reinterleave_rejects_bad_buffer() {
    let table = InterleaveTable::build(4,1).expect("build failed");
    assert!(tracks::reinterleave(&[0;100],128,&table,&table).is_err());
    let other = InterleaveTable::build(5,1).expect("build failed");
    assert!(tracks::reinterleave(&[0;512],128,&table,&other).is_err());
}

#[test]
fn track_reader_drops_partial_track() {
    let source = InterleaveTable::build(2,1).expect("build failed");
    let target = InterleaveTable::build(2,1).expect("build failed");
    let raw = dump(3,128);
    let mut reader = TrackReader::new(raw.as_slice(),source,target,128).expect("reader failed");
    let trk = reader.next_track(0,0).expect("read failed").expect("missing track");
    assert_eq!(trk.sectors.len(),2);
    assert_eq!(trk.sectors[1].data,pattern(1,128));
    assert!(reader.next_track(0,1).expect("read failed").is_none());
}

#[test]
fn fill_and_literal_records() {
    let geometry = GeometryBuilder::new(1,1,2,SectorSize::S512).build().expect("bad geometry");
    let track = Track {
        cylinder: 0,
        head: 0,
        sectors: vec![
            Sector { id: 1, data: vec![0xe5;512] },
            Sector { id: 2, data: pattern(0,512) }
        ]
    };
    let record = TrackRecord::create(&track,&geometry);
    assert_eq!(record.compressed_sectors(),1);
    assert_eq!(record.len(),4 + 8 + 2 + 513);
    let bytes = record.to_bytes();
    assert_eq!(bytes.len(),record.len());
    assert_eq!(&bytes[12..14],&[0x81,0xe5]);
    assert_eq!(bytes[14],0x01);
    assert_eq!(&bytes[15..],pattern(0,512).as_slice());
}

#[test]
fn id_map_carries_head_and_size() {
    let geometry = GeometryBuilder::new(300,4,2,SectorSize::S256).build().expect("bad geometry");
    let track = Track {
        cylinder: 259,
        head: 3,
        sectors: vec![
            Sector { id: 2, data: vec![0;256] },
            Sector { id: 1, data: vec![0;256] }
        ]
    };
    let bytes = TrackRecord::create(&track,&geometry).to_bytes();
    assert_eq!(&bytes[0..4],&[3,1,3,2]);
    assert_eq!(&bytes[4..12],&[3,1,2,0x03,3,1,1,0x03]);
}

#[test]
fn end_to_end() {
    let (wdi,summary) = wdikit::convert_bytestream(&dump(4,128),small_geometry(2,1)).expect("conversion failed");
    assert_eq!(summary.cylinders,2);
    assert_eq!(summary.tracks,2);
    assert_eq!(summary.literal_sectors,4);
    assert_eq!(summary.compressed_sectors,0);
    assert_eq!(wdi.len(),HEADER_LEN + 2*270);
    assert_eq!(summary.bytes_written,wdi.len() as u64);
    // header
    assert_eq!(&wdi[0..51],b"WDI file created by Winchesterduino, (c) J. Bogin\r\n");
    assert_eq!(wdi[51],0x1a);
    assert_eq!(&wdi[52..67],&[0,0,2,0,1,0,0,0,0,0,0,0,0,0,0]);
    assert_eq!(&wdi[67..84],&[0;17]);
    // tracks
    for cyl in 0..2 {
        let trk = &wdi[HEADER_LEN + cyl*270..HEADER_LEN + (cyl+1)*270];
        assert_eq!(&trk[0..4],&[cyl as u8,0,0,2]);
        assert_eq!(&trk[4..12],&[cyl as u8,0,1,0x60,cyl as u8,0,2,0x60]);
        assert_eq!(trk[12],0x01);
        assert_eq!(&trk[13..141],pattern(2*cyl,128).as_slice());
        assert_eq!(trk[141],0x01);
        assert_eq!(&trk[142..270],pattern(2*cyl+1,128).as_slice());
    }
}

#[test]
fn header_len_matches() {
    let geometry = GeometryBuilder::new(2,1,2,SectorSize::S128)
        .description("Seagate ST-225   \n\n20 MB\u{e9}")
        .build().expect("bad geometry");
    let header = wdi::header_bytes(&geometry);
    assert_eq!(header.len(),wdi::header_len(geometry.description()));
    assert_eq!(&header[51..75],b"Seagate ST-225\r\n20 MB?\r\n");
    assert_eq!(header[75],0x1a);
    assert_eq!(header.len(),HEADER_LEN + 24);
}

#[test]
fn parameter_block_layout() {
    let geometry = GeometryBuilder::new(615,4,17,SectorSize::S512)
        .verify_mode(VerifyMode::Ecc32)
        .write_precomp(Some(300))
        .reduced_write_current(Some(0))
        .landing_zone(Some(670))
        .seek_type(img::geometry::SeekType::St506)
        .build().expect("bad geometry");
    let header = wdi::header_bytes(&geometry);
    assert_eq!(&header[52..67],&[0,1,0x67,0x02,4,1,0x2c,0x01,1,0,0,1,0x9e,0x02,1]);
}

#[test]
fn short_input_writes_no_tracks() {
    let (wdi,summary) = wdikit::convert_bytestream(&dump(1,128)[0..100],small_geometry(2,1)).expect("conversion failed");
    assert_eq!(summary.tracks,0);
    assert_eq!(summary.cylinders,0);
    assert_eq!(wdi.len(),HEADER_LEN);
    let (wdi,summary) = wdikit::convert_bytestream(&dump(1,128),small_geometry(2,1)).expect("conversion failed");
    assert_eq!(summary.tracks,0);
    assert_eq!(wdi.len(),HEADER_LEN);
}

#[test]
fn stops_at_geometry_limit() {
    let (wdi,summary) = wdikit::convert_bytestream(&dump(8,128),small_geometry(2,2)).expect("conversion failed");
    assert_eq!(summary.tracks,4);
    assert_eq!(summary.cylinders,2);
    assert_eq!(wdi.len(),HEADER_LEN + 4*270);
    // excess input is ignored
    let (wdi,summary) = wdikit::convert_bytestream(&dump(13,128),small_geometry(2,2)).expect("conversion failed");
    assert_eq!(summary.tracks,4);
    assert_eq!(wdi.len(),HEADER_LEN + 4*270);
}

#[test]
fn partial_cylinder_not_counted() {
    let (wdi,summary) = wdikit::convert_bytestream(&dump(7,128),small_geometry(2,2)).expect("conversion failed");
    assert_eq!(summary.tracks,3);
    assert_eq!(summary.cylinders,1);
    assert_eq!(wdi.len(),HEADER_LEN + 3*270);
    let last = &wdi[HEADER_LEN + 2*270..];
    assert_eq!(&last[0..4],&[1,0,0,2]);
}

#[test]
fn advance_heads_first() {
    assert_eq!(wdi::advance(0,0,2),(0,1));
    assert_eq!(wdi::advance(0,1,2),(1,0));
    assert_eq!(wdi::advance(7,0,1),(8,0));
}

#[test]
fn stop_between_tracks() {
    let mut out: Vec<u8> = Vec::new();
    let mut seen = Vec::new();
    let summary = {
        let mut writer = WdiWriter::new(&mut out,small_geometry(4,2));
        writer.convert(dump(16,128).as_slice(),|p| {
            seen.push((p.cylinder,p.head));
            p.tracks < 3
        }).expect("conversion failed")
    };
    assert!(summary.stopped);
    assert_eq!(summary.tracks,3);
    assert_eq!(summary.cylinders,1);
    assert_eq!(seen,vec![(0,0),(0,1),(1,0)]);
    assert_eq!(out.len(),HEADER_LEN + 3*270);
}

#[test]
fn start_sector_adjustment() {
    let base = || GeometryBuilder::new(1,1,6,SectorSize::S128).target_interleave(3);
    let ids = |g: DriveGeometry| -> Vec<u8> {
        let (wdi,_) = wdikit::convert_bytestream(&dump(6,128),g).expect("conversion failed");
        wdi[HEADER_LEN+4..HEADER_LEN+28].chunks(4).map(|c| c[2]).collect()
    };
    assert_eq!(ids(base().build().expect("bad geometry")),vec![1,3,5,2,4,6]);
    assert_eq!(ids(base().start_sector(0).build().expect("bad geometry")),vec![0,2,4,1,3,5]);
    assert_eq!(ids(base().start_sector(5).build().expect("bad geometry")),vec![5,7,9,6,8,10]);
}

#[test]
fn uniform_dump_compresses() {
    let (wdi,summary) = wdikit::convert_bytestream(&vec![0xff;4*512],
        GeometryBuilder::new(2,1,2,SectorSize::S512).build().expect("bad geometry")).expect("conversion failed");
    assert_eq!(summary.compressed_sectors,4);
    assert_eq!(wdi.len(),HEADER_LEN + 2*(4 + 8 + 2*2));
}

struct FailingWriter {
    calls: usize,
    allowed: usize
}

impl Write for FailingWriter {
    fn write(&mut self,buf: &[u8]) -> std::io::Result<usize> {
        self.calls += 1;
        match self.allowed {
            0 => Err(std::io::Error::new(std::io::ErrorKind::Other,"disk full")),
            n => {
                let count = n.min(buf.len());
                self.allowed -= count;
                Ok(count)
            }
        }
    }
    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[test]
fn header_write_failure_aborts() {
    let mut out = FailingWriter { calls: 0, allowed: 0 };
    let res = wdikit::convert_stream(dump(4,128).as_slice(),&mut out,small_geometry(2,1));
    assert!(res.is_err());
    assert_eq!(out.calls,1);
}

#[test]
fn track_write_failure_aborts() {
    let mut out = FailingWriter { calls: 0, allowed: HEADER_LEN + 270 };
    let res = wdikit::convert_stream(dump(8,128).as_slice(),&mut out,small_geometry(4,1));
    assert!(res.is_err());
}

#[test]
fn geometry_ranges() {
    assert!(GeometryBuilder::new(0,1,17,SectorSize::S512).build().is_err());
    assert!(GeometryBuilder::new(2049,1,17,SectorSize::S512).build().is_err());
    assert!(GeometryBuilder::new(615,17,17,SectorSize::S512).build().is_err());
    assert!(GeometryBuilder::new(615,4,64,SectorSize::S512).build().is_err());
    assert!(GeometryBuilder::new(615,4,17,SectorSize::S512).target_interleave(18).build().is_err());
    assert!(GeometryBuilder::new(615,4,17,SectorSize::S512).source_interleave(0).build().is_err());
    assert!(GeometryBuilder::new(615,4,17,SectorSize::S512).start_sector(240).build().is_err());
    assert!(GeometryBuilder::new(615,4,17,SectorSize::S512).start_sector(239).build().is_ok());
    assert!(SectorSize::from_bytes(500).is_err());
}

#[test]
fn controller_rules() {
    let g = GeometryBuilder::new(615,4,26,SectorSize::S512)
        .data_mode(DataMode::Rll)
        .build().expect("bad geometry");
    assert_eq!(g.verify_mode(),VerifyMode::Ecc56);
    let g = GeometryBuilder::new(615,9,17,SectorSize::S512)
        .reduced_write_current(Some(128))
        .build().expect("bad geometry");
    assert_eq!(g.reduced_write_current(),None);
    let g = GeometryBuilder::new(615,8,17,SectorSize::S512)
        .reduced_write_current(Some(128))
        .build().expect("bad geometry");
    assert_eq!(g.reduced_write_current(),Some(128));
}

#[test]
fn image_size_check() {
    let g = GeometryBuilder::new(615,4,17,SectorSize::S512).build().expect("bad geometry");
    assert_eq!(g.expected_image_size(),21411840);
    assert!(g.check_image_size(21411840).is_ok());
    match g.check_image_size(21411840 - 512) {
        Err(img::Error::ImageSizeMismatch { expected, actual }) => {
            assert_eq!(expected,21411840);
            assert_eq!(actual,21411328);
        },
        _ => panic!("expected size mismatch")
    }
    assert!(matches!(g.check_image_size(17*512 - 1),Err(img::Error::ImageTooSmall)));
}

#[test]
fn geometry_from_json() {
    let g = DriveGeometry::from_json(r#"{
        "cylinders": 615, "heads": 4, "sectors": 17, "sector_size": 512,
        "target_interleave": 3, "start_sector": 0, "landing_zone": 670,
        "write_precomp": null, "seek_type": "st506", "description": "ST-225"
    }"#).expect("could not parse");
    let expected = GeometryBuilder::new(615,4,17,SectorSize::S512)
        .target_interleave(3)
        .start_sector(0)
        .landing_zone(Some(670))
        .seek_type(img::geometry::SeekType::St506)
        .description("ST-225")
        .build().expect("bad geometry");
    assert_eq!(g,expected);
    let again = DriveGeometry::from_json(&g.to_json(Some(4)).expect("could not write")).expect("could not parse");
    assert_eq!(again,g);
    assert!(DriveGeometry::from_json(r#"{"cylinders": 615, "heads": 4, "sectors": 17}"#).is_err());
    assert!(DriveGeometry::from_json(r#"{"cylinders": 615, "heads": 4, "sectors": 17, "sector_size": "1k", "data_mode": "fm"}"#).is_err());
    assert!(DriveGeometry::from_json("[1,2]").is_err());
}
