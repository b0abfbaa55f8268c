//! Stream-level properties of the frame assembler.

use camframe_core::{
    AssemblerConfig, AssemblerState, Category, ChecksumConvention, Frame, FrameAssembler,
    FrameHeader, write_frame,
};
use proptest::prelude::*;

fn payload(header: &FrameHeader, seed: u8) -> Vec<u8> {
    (0..header.payload_len() as usize)
        .map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed))
        .collect()
}

fn capture(headers: &[FrameHeader]) -> Vec<u8> {
    let mut bytes = b"camera ready\r\n".to_vec();
    for (seed, header) in headers.iter().enumerate() {
        bytes.extend_from_slice(&write_frame(
            header,
            &payload(header, seed as u8),
            ChecksumConvention::Reflected,
        ));
        bytes.extend_from_slice(b"Mode: next\r\n");
    }
    bytes
}

fn assemble(chunks: impl IntoIterator<Item = Vec<u8>>) -> Vec<Frame> {
    let mut assembler = FrameAssembler::new(AssemblerConfig::default());
    chunks
        .into_iter()
        .flat_map(|chunk| assembler.push(&chunk))
        .collect()
}

fn sample_headers() -> Vec<FrameHeader> {
    vec![
        FrameHeader::rgb565(8, 4, Category::NoLight, true),
        FrameHeader::rgb565(5, 3, Category::VisibleLight, false),
        FrameHeader::rgb565(6, 6, Category::Infrared, true),
        FrameHeader::rgb565(3, 1, Category::Unknown(7), true),
    ]
}

#[test]
fn single_byte_delivery_matches_single_chunk() {
    let bytes = capture(&sample_headers());
    let whole = assemble([bytes.clone()]);
    let bytewise = assemble(bytes.iter().map(|&byte| vec![byte]));

    assert_eq!(whole.len(), 4);
    assert_eq!(whole, bytewise);
}

proptest! {
    #[test]
    fn chunking_never_changes_output(cuts in proptest::collection::vec(1usize..300, 1..40)) {
        let bytes = capture(&sample_headers());
        let expected = assemble([bytes.clone()]);

        let mut chunks = Vec::new();
        let mut rest = bytes.as_slice();
        for cut in cuts.iter().cycle() {
            if rest.is_empty() {
                break;
            }
            let (chunk, tail) = rest.split_at((*cut).min(rest.len()));
            chunks.push(chunk.to_vec());
            rest = tail;
        }

        prop_assert_eq!(assemble(chunks), expected);
    }

    #[test]
    fn random_noise_never_yields_frames(noise in proptest::collection::vec(any::<u8>(), 0..4096)) {
        let frames = assemble([noise]);
        prop_assert!(frames.is_empty());
    }
}

#[test]
fn corrupted_frame_is_dropped_and_next_one_completes() {
    let first = FrameHeader::rgb565(4, 4, Category::NoLight, true);
    let second = FrameHeader::rgb565(4, 4, Category::VisibleLight, true);
    let mut corrupted = write_frame(&first, &payload(&first, 1), ChecksumConvention::Reflected);
    let flip = first.to_string().len() + 2 + 5;
    corrupted[flip] ^= 0x80;

    let mut assembler = FrameAssembler::new(AssemblerConfig::default());
    let mut frames = assembler.push(&corrupted);
    frames.extend(assembler.push(&write_frame(
        &second,
        &payload(&second, 2),
        ChecksumConvention::Reflected,
    )));

    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].header().category, Category::VisibleLight);
    assert_eq!(assembler.stats().checksum_failures, 1);
}

#[test]
fn declared_length_longer_than_delivered_stays_pending() {
    let mut assembler = FrameAssembler::new(AssemblerConfig::default());
    let mut bytes = b"IMG_START,320,240,16,2,1\r\n".to_vec();
    bytes.extend(std::iter::repeat_n(0x42, 153_600 - 1));

    for chunk in bytes.chunks(1024) {
        assert!(assembler.push(chunk).is_empty());
    }
    assert_eq!(assembler.state(), AssemblerState::AwaitingPayload);
    assert_eq!(assembler.stats().frames_completed, 0);
}

#[test]
fn full_size_frame_with_checksum() {
    let header = camframe_core::parse_header(b"IMG_START,320,240,16,2,1\r\n").unwrap();
    let body = payload(&header, 9);
    let frames = assemble([write_frame(&header, &body, ChecksumConvention::Reflected)]);

    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].payload().len(), 153_600);
    assert_eq!(frames[0].checksum(), Some(crc32fast::hash(&body)));
}

#[test]
fn full_size_frame_without_checksum() {
    let header = camframe_core::parse_header(b"IMG_START,320,240,16,2,0\r\n").unwrap();
    let body = payload(&header, 3);
    let frames = assemble([write_frame(&header, &body, ChecksumConvention::Reflected)]);

    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].payload(), body.as_slice());
    assert_eq!(frames[0].checksum(), None);
}

#[test]
fn reflected_convention_matches_zlib_crc() {
    let data: Vec<u8> = (0..10_000u32).map(|i| (i.wrapping_mul(2_654_435_761) >> 24) as u8).collect();
    assert_eq!(ChecksumConvention::Reflected.checksum(&data), crc32fast::hash(&data));
}

#[test]
fn header_parse_is_idempotent() {
    for line in [
        "IMG_START,320,240,16,2,1",
        "IMG_START,64,48,16,3",
        "IMG_START,1,1,16,42,0",
    ] {
        let header = camframe_core::parse_header(line.as_bytes()).unwrap();
        let reparsed = camframe_core::parse_header(header.to_string().as_bytes()).unwrap();
        assert_eq!(header, reparsed);
    }
}

#[test]
fn independent_assemblers_do_not_share_state() {
    let header = FrameHeader::rgb565(2, 2, Category::Infrared, false);
    let bytes = write_frame(&header, &payload(&header, 0), ChecksumConvention::Reflected);
    let (front, back) = bytes.split_at(bytes.len() / 2);

    let mut a = FrameAssembler::new(AssemblerConfig::default());
    let mut b = FrameAssembler::new(AssemblerConfig::default());
    assert!(a.push(front).is_empty());
    assert!(b.push(back).is_empty());
    assert_eq!(a.push(back).len(), 1);
    assert_eq!(b.stats().frames_completed, 0);
}

#[test]
fn missing_end_marker_resyncs_regardless_of_chunking() {
    let broken = FrameHeader::rgb565(2, 2, Category::NoLight, false);
    let good = FrameHeader::rgb565(2, 2, Category::Infrared, false);

    let mut bytes = write_frame(&broken, &payload(&broken, 1), ChecksumConvention::Reflected);
    let marker = bytes.len() - b"IMAGE_END\r\n".len();
    bytes[marker..marker + b"IMAGE_END".len()].fill(b'X');
    bytes.extend(std::iter::repeat_n(b'.', 5000));
    bytes.extend_from_slice(&write_frame(&good, &payload(&good, 2), ChecksumConvention::Reflected));

    let run = |chunks: Vec<Vec<u8>>| {
        let mut assembler = FrameAssembler::new(AssemblerConfig::default());
        let categories: Vec<Category> = chunks
            .iter()
            .flat_map(|chunk| assembler.push(chunk))
            .map(|frame| frame.header().category)
            .collect();
        (categories, assembler.stats().end_markers_missing)
    };

    let whole = run(vec![bytes.clone()]);
    let bytewise = run(bytes.iter().map(|&byte| vec![byte]).collect());

    assert_eq!(whole, (vec![Category::Infrared], 1));
    assert_eq!(whole, bytewise);
}
