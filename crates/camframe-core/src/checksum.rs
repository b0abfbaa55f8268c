//! CRC-32 engine with an explicit bit convention.
//!
//! The camera firmware and the receiving tools must agree on every CRC
//! parameter; a mismatch makes every frame fail validation. The convention is
//! therefore a named value chosen by configuration, never inferred.
//!
//! Both conventions share the generator polynomial `0x04C11DB7` and an
//! all-ones initial register. They differ in bit reflection and the final
//! complement:
//!
//! | convention    | refin | refout | xorout       | check("123456789") |
//! |---------------|-------|--------|--------------|--------------------|
//! | `Reflected`   | yes   | yes    | `0xFFFFFFFF` | `0xCBF43926`       |
//! | `Unreflected` | no    | no     | `0x00000000` | `0x0376E6E7`       |
//!
//! `Reflected` is the zlib/ISO-HDLC CRC computed in software by the firmware;
//! `Unreflected` matches the STM32 hardware CRC peripheral (CRC-32/MPEG-2).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub const CRC32_POLY: u32 = 0x04C1_1DB7;

/// Full parameter set of a CRC-32 variant (Rocksoft model).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crc32Params {
    pub poly: u32,
    pub init: u32,
    pub reflect_in: bool,
    pub reflect_out: bool,
    pub xor_out: u32,
    /// Expected CRC of the ASCII bytes `123456789`.
    pub check: u32,
}

/// Named checksum convention shared with the sender.
///
/// # Examples
/// ```
/// use camframe_core::ChecksumConvention;
///
/// assert_eq!(ChecksumConvention::Reflected.checksum(b"123456789"), 0xCBF4_3926);
/// assert_eq!(ChecksumConvention::Unreflected.checksum(b"123456789"), 0x0376_E6E7);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChecksumConvention {
    /// CRC-32/ISO-HDLC, as produced by zlib and the firmware's software CRC.
    #[default]
    Reflected,
    /// CRC-32/MPEG-2, as produced by the STM32 CRC peripheral.
    Unreflected,
}

impl ChecksumConvention {
    pub const ALL: [ChecksumConvention; 2] =
        [ChecksumConvention::Reflected, ChecksumConvention::Unreflected];

    pub const fn params(self) -> Crc32Params {
        match self {
            ChecksumConvention::Reflected => Crc32Params {
                poly: CRC32_POLY,
                init: 0xFFFF_FFFF,
                reflect_in: true,
                reflect_out: true,
                xor_out: 0xFFFF_FFFF,
                check: 0xCBF4_3926,
            },
            ChecksumConvention::Unreflected => Crc32Params {
                poly: CRC32_POLY,
                init: 0xFFFF_FFFF,
                reflect_in: false,
                reflect_out: false,
                xor_out: 0,
                check: 0x0376_E6E7,
            },
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ChecksumConvention::Reflected => "reflected",
            ChecksumConvention::Unreflected => "unreflected",
        }
    }

    /// One-shot checksum of `data` under this convention.
    pub fn checksum(self, data: &[u8]) -> u32 {
        Crc32::new(self).checksum(data)
    }
}

impl fmt::Display for ChecksumConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ChecksumConvention {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "reflected" | "iso-hdlc" | "zlib" => Ok(ChecksumConvention::Reflected),
            "unreflected" | "mpeg-2" | "mpeg2" | "stm32" => Ok(ChecksumConvention::Unreflected),
            other => Err(format!("unknown checksum convention '{other}'")),
        }
    }
}

/// Table-driven CRC-32 engine for one convention.
///
/// The table is built MSB-first from the unreflected polynomial; input
/// reflection is applied per byte and output reflection once at the end, so
/// any Rocksoft parameter set is computed by the same loop.
#[derive(Clone)]
pub struct Crc32 {
    params: Crc32Params,
    table: [u32; 256],
}

impl Crc32 {
    pub fn new(convention: ChecksumConvention) -> Self {
        Self::with_params(convention.params())
    }

    pub fn with_params(params: Crc32Params) -> Self {
        Self {
            params,
            table: build_table(params.poly),
        }
    }

    pub fn params(&self) -> Crc32Params {
        self.params
    }

    pub fn checksum(&self, data: &[u8]) -> u32 {
        let mut digest = self.digest();
        digest.update(data);
        digest.finalize()
    }

    pub fn digest(&self) -> Digest<'_> {
        Digest {
            engine: self,
            register: self.params.init,
        }
    }
}

impl fmt::Debug for Crc32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Crc32").field("params", &self.params).finish()
    }
}

/// Incremental CRC computation, for payloads that arrive in pieces.
pub struct Digest<'a> {
    engine: &'a Crc32,
    register: u32,
}

impl Digest<'_> {
    pub fn update(&mut self, data: &[u8]) {
        let reflect_in = self.engine.params.reflect_in;
        let mut crc = self.register;
        for &byte in data {
            let byte = if reflect_in { byte.reverse_bits() } else { byte };
            let index = ((crc >> 24) as u8 ^ byte) as usize;
            crc = (crc << 8) ^ self.engine.table[index];
        }
        self.register = crc;
    }

    pub fn finalize(self) -> u32 {
        let params = self.engine.params;
        let crc = if params.reflect_out {
            self.register.reverse_bits()
        } else {
            self.register
        };
        crc ^ params.xor_out
    }
}

fn build_table(poly: u32) -> [u32; 256] {
    let mut table = [0u32; 256];
    for (index, entry) in table.iter_mut().enumerate() {
        let mut crc = (index as u32) << 24;
        for _ in 0..8 {
            crc = if crc & 0x8000_0000 != 0 {
                (crc << 1) ^ poly
            } else {
                crc << 1
            };
        }
        *entry = crc;
    }
    table
}
