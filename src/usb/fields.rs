//! Little-endian field decoding for fixed descriptor headers
//!
//! A [`Layout`] is a compact string of field codes, one per field:
//!
//! * `b` 8-bit byte
//! * `w` 16-bit little-endian word
//! * `d` 32-bit little-endian double word
//! * `u` 16 byte block (GUID)
//!
//! Decoding walks the source bytes in order and places each field at the naturally aligned
//! offset of a destination record, so a layout such as `"bbwbbbbb"` maps onto the
//! configuration descriptor record with the word at offset 2.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{self, Error, ErrorKind};

/// A single field code within a [`Layout`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldCode {
    /// `b`
    Byte,
    /// `w`
    Word,
    /// `d`
    DoubleWord,
    /// `u`
    Block,
}

impl FieldCode {
    /// Number of source bytes consumed
    pub fn size(&self) -> usize {
        match self {
            FieldCode::Byte => 1,
            FieldCode::Word => 2,
            FieldCode::DoubleWord => 4,
            FieldCode::Block => 16,
        }
    }

    /// Natural alignment within the destination record
    pub fn align(&self) -> usize {
        match self {
            FieldCode::Byte | FieldCode::Block => 1,
            FieldCode::Word => 2,
            FieldCode::DoubleWord => 4,
        }
    }

    fn from_char(c: char) -> Option<Self> {
        match c {
            'b' => Some(FieldCode::Byte),
            'w' => Some(FieldCode::Word),
            'd' => Some(FieldCode::DoubleWord),
            'u' => Some(FieldCode::Block),
            _ => None,
        }
    }
}

/// Ordered field codes describing a fixed descriptor header
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Layout(Vec<FieldCode>);

impl Layout {
    /// Build from a layout string; characters that are not field codes are ignored
    pub fn new(codes: &str) -> Self {
        Layout(codes.chars().filter_map(FieldCode::from_char).collect())
    }

    /// The field codes
    pub fn codes(&self) -> &[FieldCode] {
        &self.0
    }

    /// Source bytes required to decode every field
    ///
    /// ```
    /// use uvcscan::usb::fields::Layout;
    ///
    /// assert_eq!(Layout::new("bbwbbbbb").source_len(), 9);
    /// assert_eq!(Layout::new("bbbbwbbb").source_len(), 9);
    /// ```
    pub fn source_len(&self) -> usize {
        self.0.iter().map(FieldCode::size).sum()
    }

    /// Offset of each field in the destination record, aligned to the field
    ///
    /// ```
    /// use uvcscan::usb::fields::Layout;
    ///
    /// assert_eq!(Layout::new("bwd").record_offsets(), vec![0, 2, 4]);
    /// assert_eq!(Layout::new("bbwbbbbb").record_offsets(), vec![0, 1, 2, 4, 5, 6, 7, 8]);
    /// ```
    pub fn record_offsets(&self) -> Vec<usize> {
        let mut offset = 0;
        self.0
            .iter()
            .map(|code| {
                offset = align_up(offset, code.align());
                let at = offset;
                offset += code.size();
                at
            })
            .collect()
    }

    /// Size of the destination record including alignment padding between fields
    pub fn record_len(&self) -> usize {
        self.0.iter().fold(0, |offset, code| {
            align_up(offset, code.align()) + code.size()
        })
    }
}

impl FromStr for Layout {
    type Err = Error;

    /// Strict parse, rejecting unknown field codes
    fn from_str(s: &str) -> error::Result<Self> {
        s.chars()
            .map(|c| {
                FieldCode::from_char(c).ok_or_else(|| {
                    Error::new(
                        ErrorKind::InvalidArg,
                        &format!("Unknown field code '{}' in layout '{}'", c, s),
                    )
                })
            })
            .collect::<error::Result<Vec<_>>>()
            .map(Layout)
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for code in &self.0 {
            let c = match code {
                FieldCode::Byte => 'b',
                FieldCode::Word => 'w',
                FieldCode::DoubleWord => 'd',
                FieldCode::Block => 'u',
            };
            write!(f, "{}", c)?;
        }
        Ok(())
    }
}

fn align_up(offset: usize, align: usize) -> usize {
    (offset + align - 1) & !(align - 1)
}

/// A decoded field value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Field {
    /// `b`
    Byte(u8),
    /// `w`
    Word(u16),
    /// `d`
    DoubleWord(u32),
    /// `u`
    Block([u8; 16]),
}

impl Field {
    /// Widened numeric value; `None` for blocks
    pub fn value(&self) -> Option<u32> {
        match self {
            Field::Byte(b) => Some(*b as u32),
            Field::Word(w) => Some(*w as u32),
            Field::DoubleWord(d) => Some(*d),
            Field::Block(_) => None,
        }
    }
}

/// Fields decoded from a source with a [`Layout`], placed at aligned record offsets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(usize, Field)>,
    len: usize,
}

impl Record {
    /// Decode `source` with `layout`
    ///
    /// # Panics
    ///
    /// `source` must hold at least [`Layout::source_len`] bytes. Callers check the
    /// descriptor length against the buffer before decoding; a short source is a bug in the
    /// caller, not a condition of the device data.
    pub fn decode(source: &[u8], layout: &Layout) -> Self {
        assert!(
            source.len() >= layout.source_len(),
            "source {} bytes shorter than layout '{}'",
            source.len(),
            layout
        );

        let mut sp = 0;
        let fields = layout
            .codes()
            .iter()
            .zip(layout.record_offsets())
            .map(|(code, dp)| {
                let s = &source[sp..sp + code.size()];
                sp += code.size();
                let field = match code {
                    FieldCode::Byte => Field::Byte(s[0]),
                    FieldCode::Word => Field::Word(u16::from_le_bytes([s[0], s[1]])),
                    FieldCode::DoubleWord => {
                        Field::DoubleWord(u32::from_le_bytes([s[0], s[1], s[2], s[3]]))
                    }
                    FieldCode::Block => {
                        let mut block = [0u8; 16];
                        block.copy_from_slice(s);
                        Field::Block(block)
                    }
                };
                (dp, field)
            })
            .collect();

        Record {
            fields,
            len: layout.record_len(),
        }
    }

    /// Padded record size
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the record has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field at position `index` in layout order
    pub fn get(&self, index: usize) -> Option<&Field> {
        self.fields.get(index).map(|(_, f)| f)
    }

    /// Record offset of field at position `index`
    pub fn offset(&self, index: usize) -> Option<usize> {
        self.fields.get(index).map(|(o, _)| *o)
    }

    /// Byte field at `index`; zero if the field is missing or not a byte
    pub fn byte(&self, index: usize) -> u8 {
        match self.get(index) {
            Some(Field::Byte(b)) => *b,
            _ => 0,
        }
    }

    /// Word field at `index`; zero if the field is missing or not a word
    pub fn word(&self, index: usize) -> u16 {
        match self.get(index) {
            Some(Field::Word(w)) => *w,
            _ => 0,
        }
    }

    /// Double word field at `index`; zero if the field is missing or not a double word
    pub fn double_word(&self, index: usize) -> u32 {
        match self.get(index) {
            Some(Field::DoubleWord(d)) => *d,
            _ => 0,
        }
    }

    /// 16 byte block at `index` as a little-endian GUID; nil if missing
    pub fn guid(&self, index: usize) -> Uuid {
        match self.get(index) {
            Some(Field::Block(b)) => Uuid::from_bytes_le(*b),
            _ => Uuid::nil(),
        }
    }

    /// Write the record into a zeroed, padded byte image in CPU order
    pub fn to_record_bytes(&self) -> Vec<u8> {
        let mut ret = vec![0u8; self.len];
        for (offset, field) in &self.fields {
            match field {
                Field::Byte(b) => ret[*offset] = *b,
                Field::Word(w) => ret[*offset..*offset + 2].copy_from_slice(&w.to_ne_bytes()),
                Field::DoubleWord(d) => {
                    ret[*offset..*offset + 4].copy_from_slice(&d.to_ne_bytes())
                }
                Field::Block(b) => ret[*offset..*offset + 16].copy_from_slice(b),
            }
        }
        ret
    }
}
