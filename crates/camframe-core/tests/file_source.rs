use std::fs;

use camframe_core::{
    ByteOrder, ByteSource, CaptureConfig, Category, ChannelOrder, ChecksumConvention, FileSource,
    FrameHeader, SourceError, SourceRead, StopReason, decode_file, test_pattern, write_frame,
};

fn write_capture(dir: &tempfile::TempDir, name: &str, frames: &[FrameHeader]) -> std::path::PathBuf {
    let mut bytes = Vec::new();
    for header in frames {
        let payload = test_pattern(header.width, header.height, ChannelOrder::Rgb, ByteOrder::Big);
        bytes.extend_from_slice(&write_frame(header, &payload, ChecksumConvention::Reflected));
    }
    let path = dir.path().join(name);
    fs::write(&path, bytes).unwrap();
    path
}

#[test]
fn file_source_reads_until_closed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("raw.dat");
    fs::write(&path, vec![7u8; 100]).unwrap();

    let mut source = FileSource::open(&path).unwrap();
    let mut buf = [0u8; 64];
    let mut total = 0;
    loop {
        match source.read_available(&mut buf).unwrap() {
            SourceRead::Data(n) => total += n,
            SourceRead::Idle => continue,
            SourceRead::Closed => break,
        }
    }
    assert_eq!(total, 100);
}

#[test]
fn small_reads_return_bytes_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ordered.dat");
    let data: Vec<u8> = (0..=255u8).cycle().take(70_000).collect();
    fs::write(&path, &data).unwrap();

    let mut source = FileSource::open(&path).unwrap();
    let mut buf = [0u8; 7];
    let mut read = Vec::new();
    while let SourceRead::Data(n) = source.read_available(&mut buf).unwrap() {
        read.extend_from_slice(&buf[..n]);
    }
    assert_eq!(read, data);
}

#[test]
fn file_source_rejects_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = match FileSource::open(&dir.path().join("absent.dat")) {
        Ok(_) => panic!("expected missing file to be rejected"),
        Err(err) => err,
    };
    assert!(matches!(err, SourceError::Io(_)));
}

#[test]
fn decode_file_returns_every_frame() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_capture(
        &dir,
        "IMG_0001.DAT",
        &[
            FrameHeader::rgb565(8, 2, Category::VisibleLight, true),
            FrameHeader::rgb565(8, 2, Category::Infrared, false),
        ],
    );

    let decoded = decode_file(&path, &CaptureConfig::default()).unwrap();
    assert_eq!(decoded.frames.len(), 2);
    assert_eq!(decoded.summary.stop_reason, StopReason::EndOfStream);

    let image = &decoded.frames[0].image;
    assert_eq!(image.pixel(0, 0), Some([248, 0, 0]));
    assert_eq!(image.pixel(2, 1), Some([0, 252, 0]));
    assert_eq!(image.pixel(4, 0), Some([0, 0, 248]));
    assert_eq!(image.pixel(7, 1), Some([248, 252, 248]));
    assert_eq!(decoded.frames[1].header.category, Category::Infrared);
}

#[test]
fn decode_file_with_wrong_convention_finds_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_capture(
        &dir,
        "IMG_0002.DAT",
        &[FrameHeader::rgb565(4, 4, Category::NoLight, true)],
    );
    let config = CaptureConfig {
        checksum: ChecksumConvention::Unreflected,
        ..CaptureConfig::default()
    };

    let decoded = decode_file(&path, &config).unwrap();
    assert!(decoded.frames.is_empty());
    assert_eq!(decoded.summary.stats.checksum_failures, 1);
}
