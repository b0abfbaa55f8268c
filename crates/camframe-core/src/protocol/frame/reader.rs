use std::str::FromStr;

use super::error::HeaderError;
use super::layout;

/// Field access over a comma-separated header line.
pub struct HeaderReader<'a> {
    fields: Vec<&'a str>,
}

impl<'a> HeaderReader<'a> {
    pub fn new(line: &'a [u8]) -> Result<Self, HeaderError> {
        if !line.is_ascii() {
            return Err(HeaderError::NotAscii);
        }
        let text = std::str::from_utf8(line).map_err(|_| HeaderError::NotAscii)?;
        let fields = text
            .trim()
            .split(layout::FIELD_SEPARATOR)
            .map(str::trim)
            .collect();
        Ok(Self { fields })
    }

    pub fn fields(&self) -> &[&'a str] {
        &self.fields
    }

    pub fn require_fields(&self, needed: usize) -> Result<(), HeaderError> {
        if self.fields.len() < needed {
            return Err(HeaderError::MissingField {
                name: field_name(self.fields.len()),
                index: self.fields.len(),
            });
        }
        Ok(())
    }

    pub fn read_field(&self, index: usize) -> Result<&'a str, HeaderError> {
        self.fields
            .get(index)
            .copied()
            .ok_or(HeaderError::MissingField {
                name: field_name(index),
                index,
            })
    }

    pub fn read_number<T: FromStr>(&self, index: usize) -> Result<T, HeaderError> {
        let raw = self.read_field(index)?;
        raw.parse().map_err(|_| HeaderError::InvalidField {
            name: field_name(index),
            value: raw.to_string(),
        })
    }

    /// The checksum flag is optional; it counts as enabled only when it reads `1`.
    pub fn read_optional_flag(&self, index: usize) -> Result<bool, HeaderError> {
        match self.fields.get(index) {
            None => Ok(false),
            Some(raw) if raw.is_empty() => Ok(false),
            Some(_) => Ok(self.read_number::<u32>(index)? == 1),
        }
    }
}

pub fn field_name(index: usize) -> &'static str {
    match index {
        layout::TAG_FIELD => "tag",
        layout::WIDTH_FIELD => "width",
        layout::HEIGHT_FIELD => "height",
        layout::BPP_FIELD => "bpp",
        layout::CATEGORY_FIELD => "category",
        layout::CHECKSUM_FLAG_FIELD => "checksum",
        _ => "extra",
    }
}
