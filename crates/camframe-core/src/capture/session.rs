use std::collections::BTreeMap;

use crate::assembler::{AssemblerState, AssemblerStats, FrameAssembler};
use crate::config::CaptureConfig;
use crate::pixel::{DecodedImage, PixelDecoder};
use crate::protocol::frame::FrameHeader;

/// A completed frame, decoded and numbered.
#[derive(Debug, Clone)]
pub struct CapturedFrame {
    pub header: FrameHeader,
    pub image: DecodedImage,
    pub checksum: Option<u32>,
    /// 1-based position among all frames of the session.
    pub sequence: u64,
    /// 1-based position among frames of the same category.
    pub category_sequence: u64,
}

/// Assembler plus decoder: chunks in, images out.
#[derive(Debug)]
pub struct CaptureSession {
    assembler: FrameAssembler,
    decoder: PixelDecoder,
    mirror: bool,
    sequence: u64,
    per_category: BTreeMap<u32, u64>,
}

impl CaptureSession {
    pub fn new(config: &CaptureConfig) -> Self {
        Self {
            assembler: FrameAssembler::new(config.assembler()),
            decoder: config.decoder(),
            mirror: config.mirror,
            sequence: 0,
            per_category: BTreeMap::new(),
        }
    }

    pub fn push(&mut self, chunk: &[u8]) -> Vec<CapturedFrame> {
        self.assembler
            .push(chunk)
            .into_iter()
            .map(|frame| {
                let mut image = self.decoder.decode(&frame);
                if self.mirror {
                    image.mirror_horizontal();
                }

                let header = *frame.header();
                self.sequence += 1;
                let category_sequence = self.per_category.entry(header.category.code()).or_default();
                *category_sequence += 1;

                tracing::info!(
                    sequence = self.sequence,
                    category = %header.category,
                    width = header.width,
                    height = header.height,
                    "frame completed"
                );

                CapturedFrame {
                    header,
                    image,
                    checksum: frame.checksum(),
                    sequence: self.sequence,
                    category_sequence: *category_sequence,
                }
            })
            .collect()
    }

    pub fn frames(&self) -> u64 {
        self.sequence
    }

    pub fn stats(&self) -> &AssemblerStats {
        self.assembler.stats()
    }

    pub fn state(&self) -> AssemblerState {
        self.assembler.state()
    }
}
