//! Defines for the USB Video Class (UVC) interface descriptors
//!
//! Decoders here take a whole class specific block: bLength, bDescriptorType (CS_INTERFACE),
//! bDescriptorSubtype then the subtype fields. The block must already be bounded to its
//! bLength; each decoder checks the block is long enough for what it reads.
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use std::sync::LazyLock;
use uuid::Uuid;

use super::*;
use crate::error::{self, Error, ErrorKind};

/// Class specific interface descriptor type
pub const CS_INTERFACE: u8 = 0x24;
/// Video class bInterfaceClass
pub const CC_VIDEO: u8 = 0x0e;
/// Video Control bInterfaceSubClass
pub const SC_VIDEOCONTROL: u8 = 0x01;
/// Video Streaming bInterfaceSubClass
pub const SC_VIDEOSTREAMING: u8 = 0x02;

static VC_HEADER_LAYOUT: LazyLock<Layout> = LazyLock::new(|| Layout::new("bbbwwdb"));
static INPUT_HEADER_LAYOUT: LazyLock<Layout> = LazyLock::new(|| Layout::new("bbbbwbbbb"));
static FORMAT_UNCOMPRESSED_LAYOUT: LazyLock<Layout> =
    LazyLock::new(|| Layout::new("bbbbbubbbbbb"));
static FRAME_LAYOUT: LazyLock<Layout> = LazyLock::new(|| Layout::new("bbbbbwwddddb"));
static CONTINUOUS_INTERVAL_LAYOUT: LazyLock<Layout> = LazyLock::new(|| Layout::new("ddd"));

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
#[repr(u8)]
#[non_exhaustive]
#[serde(rename_all = "kebab-case")]
pub enum ControlSubtype {
    Undefined = 0x00,
    Header = 0x01,
    InputTerminal = 0x02,
    OutputTerminal = 0x03,
    SelectorUnit = 0x04,
    ProcessingUnit = 0x05,
    ExtensionUnit = 0x06,
    EncodingUnit = 0x07,
}

impl std::fmt::Display for ControlSubtype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // lsusb style
        if f.alternate() {
            match self {
                ControlSubtype::Undefined => write!(f, "unknown"),
                _ => write!(f, "VC_{}", heck::AsShoutySnakeCase(format!("{:?}", self))),
            }
        } else {
            write!(f, "{:?}", self)
        }
    }
}

impl From<u8> for ControlSubtype {
    fn from(b: u8) -> Self {
        match b {
            0x01 => ControlSubtype::Header,
            0x02 => ControlSubtype::InputTerminal,
            0x03 => ControlSubtype::OutputTerminal,
            0x04 => ControlSubtype::SelectorUnit,
            0x05 => ControlSubtype::ProcessingUnit,
            0x06 => ControlSubtype::ExtensionUnit,
            0x07 => ControlSubtype::EncodingUnit,
            _ => ControlSubtype::Undefined,
        }
    }
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
#[repr(u8)]
#[non_exhaustive]
#[serde(rename_all = "kebab-case")]
pub enum StreamingSubtype {
    Undefined = 0x00,
    InputHeader = 0x01,
    OutputHeader = 0x02,
    StillImageFrame = 0x03,
    FormatUncompressed = 0x04,
    FrameUncompressed = 0x05,
    FormatMJPEG = 0x06,
    FrameMJPEG = 0x07,
    FormatMPEG2TS = 0x0a,
    FormatDV = 0x0c,
    ColorFormat = 0x0d,
    FormatFrameBased = 0x10,
    FrameFrameBased = 0x11,
    FormatStreamBased = 0x12,
}

impl std::fmt::Display for StreamingSubtype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // lsusb style
        if f.alternate() {
            match self {
                StreamingSubtype::Undefined => write!(f, "unknown"),
                _ => write!(f, "VS_{}", heck::AsShoutySnakeCase(format!("{:?}", self))),
            }
        } else {
            write!(f, "{:?}", self)
        }
    }
}

impl From<u8> for StreamingSubtype {
    fn from(b: u8) -> Self {
        match b {
            0x01 => StreamingSubtype::InputHeader,
            0x02 => StreamingSubtype::OutputHeader,
            0x03 => StreamingSubtype::StillImageFrame,
            0x04 => StreamingSubtype::FormatUncompressed,
            0x05 => StreamingSubtype::FrameUncompressed,
            0x06 => StreamingSubtype::FormatMJPEG,
            0x07 => StreamingSubtype::FrameMJPEG,
            0x0a => StreamingSubtype::FormatMPEG2TS,
            0x0c => StreamingSubtype::FormatDV,
            0x0d => StreamingSubtype::ColorFormat,
            0x10 => StreamingSubtype::FormatFrameBased,
            0x11 => StreamingSubtype::FrameFrameBased,
            0x12 => StreamingSubtype::FormatStreamBased,
            _ => StreamingSubtype::Undefined,
        }
    }
}

/// Video Control interface header, VC_HEADER
#[derive(Debug, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// Raw bcdUVC
    pub bcd_uvc: u16,
    /// bcdUVC decoded
    pub version: Version,
    /// wTotalLength of the class specific control descriptors
    pub total_length: u16,
    /// dwClockFrequency; UVC 1.0 and 1.0a only
    pub clock_frequency: Option<u32>,
    /// bInCollection
    pub collection_bytes: u8,
    /// baInterfaceNr: interface indices of the streaming interfaces
    pub interfaces: Vec<u8>,
}

impl TryFrom<&[u8]> for Header {
    type Error = Error;

    fn try_from(value: &[u8]) -> error::Result<Self> {
        if value.len() < VC_HEADER_LAYOUT.source_len() {
            return Err(Error::new_descriptor_len(
                "Video Control Header",
                VC_HEADER_LAYOUT.source_len(),
                value.len(),
            ));
        }

        let record = Record::decode(value, &VC_HEADER_LAYOUT);
        let bcd_uvc = record.word(3);
        let clock_frequency = match bcd_uvc {
            0x0100 | 0x010a => Some(record.double_word(5)),
            0x0110 => None,
            v => {
                return Err(Error::new(
                    ErrorKind::UnsupportedVersion,
                    &format!("bcdUVC {:#06x} not supported", v),
                ))
            }
        };

        let tail = &value[VC_HEADER_LAYOUT.source_len()..];
        let mut interfaces = Vec::new();
        interfaces.try_reserve_exact(tail.len())?;
        interfaces.extend_from_slice(tail);

        Ok(Header {
            bcd_uvc,
            version: Version::from_bcd(bcd_uvc),
            total_length: record.word(4),
            clock_frequency,
            collection_bytes: record.byte(6),
            interfaces,
        })
    }
}

/// Video Streaming input header, VS_INPUT_HEADER
#[derive(Debug, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct InputHeader {
    pub num_formats: u8,
    pub total_length: u16,
    /// bEndpointAddress masked to direction and number
    pub endpoint_address: u8,
    pub info: u8,
    pub terminal_link: u8,
    pub still_capture_method: u8,
}

impl TryFrom<&[u8]> for InputHeader {
    type Error = Error;

    fn try_from(value: &[u8]) -> error::Result<Self> {
        if value.len() < INPUT_HEADER_LAYOUT.source_len() {
            return Err(Error::new_descriptor_len(
                "InputHeader",
                INPUT_HEADER_LAYOUT.source_len(),
                value.len(),
            ));
        }

        let record = Record::decode(value, &INPUT_HEADER_LAYOUT);

        Ok(InputHeader {
            num_formats: record.byte(3),
            total_length: record.word(4),
            endpoint_address: record.byte(5) & 0x8f,
            info: record.byte(6),
            terminal_link: record.byte(7),
            still_capture_method: record.byte(8),
        })
    }
}

/// A video format with the frames and still image frames that follow it
#[derive(Debug, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct FormatDescriptor {
    pub subtype: StreamingSubtype,
    pub format_index: u8,
    pub num_frame_descriptors: u8,
    pub guid_format: Uuid,
    pub bits_per_pixel: u8,
    pub default_frame_index: u8,
    pub aspect_ratio_x: u8,
    pub aspect_ratio_y: u8,
    pub interlace_flags: u8,
    pub copy_protect: u8,
    /// In declaration order
    pub frames: Vec<FrameDescriptor>,
    /// In declaration order
    pub still_frames: Vec<StillFrameDescriptor>,
}

impl FormatDescriptor {
    /// FourCC from the first four bytes of the GUID if they are printable, e.g. "YUY2"
    pub fn fourcc(&self) -> Option<String> {
        let bytes = self.guid_format.to_bytes_le();
        let code = &bytes[..4];
        code.iter()
            .all(|b| b.is_ascii_graphic() || *b == b' ')
            .then(|| code.iter().map(|b| *b as char).collect())
    }
}

impl TryFrom<&[u8]> for FormatDescriptor {
    type Error = Error;

    /// VS_FORMAT_UNCOMPRESSED block; frames are attached by the streaming scan
    fn try_from(value: &[u8]) -> error::Result<Self> {
        if value.len() < FORMAT_UNCOMPRESSED_LAYOUT.source_len() {
            return Err(Error::new_descriptor_len(
                "FormatUncompressed",
                FORMAT_UNCOMPRESSED_LAYOUT.source_len(),
                value.len(),
            ));
        }

        let record = Record::decode(value, &FORMAT_UNCOMPRESSED_LAYOUT);

        Ok(FormatDescriptor {
            subtype: StreamingSubtype::from(record.byte(2)),
            format_index: record.byte(3),
            num_frame_descriptors: record.byte(4),
            guid_format: record.guid(5),
            bits_per_pixel: record.byte(6),
            default_frame_index: record.byte(7),
            aspect_ratio_x: record.byte(8),
            aspect_ratio_y: record.byte(9),
            interlace_flags: record.byte(10),
            copy_protect: record.byte(11),
            frames: Vec::new(),
            still_frames: Vec::new(),
        })
    }
}

/// Frame intervals in 100 ns units
#[derive(Debug, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FrameIntervals {
    /// bFrameIntervalType 0
    Continuous {
        /// dwMinFrameInterval
        min: u32,
        /// dwMaxFrameInterval
        max: u32,
        /// dwFrameIntervalStep
        step: u32,
    },
    /// bFrameIntervalType n > 0 with n intervals
    Discrete(Vec<u32>),
}

/// VS_FRAME_UNCOMPRESSED or VS_FRAME_MJPEG, which share a layout
#[derive(Debug, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct FrameDescriptor {
    pub subtype: StreamingSubtype,
    pub frame_index: u8,
    pub capabilities: u8,
    pub width: u16,
    pub height: u16,
    pub min_bit_rate: u32,
    pub max_bit_rate: u32,
    pub max_video_frame_buffer_size: u32,
    pub default_frame_interval: u32,
    pub frame_interval_type: u8,
    pub intervals: FrameIntervals,
}

impl FrameDescriptor {
    /// Default frame rate in frames per second
    pub fn default_fps(&self) -> Option<f64> {
        (self.default_frame_interval != 0)
            .then(|| 10_000_000.0 / self.default_frame_interval as f64)
    }
}

impl TryFrom<&[u8]> for FrameDescriptor {
    type Error = Error;

    fn try_from(value: &[u8]) -> error::Result<Self> {
        let fixed = FRAME_LAYOUT.source_len();
        if value.len() < fixed {
            return Err(Error::new_descriptor_len("Frame", fixed, value.len()));
        }

        let record = Record::decode(value, &FRAME_LAYOUT);
        let frame_interval_type = record.byte(11);

        let intervals = if frame_interval_type == 0 {
            let expected = fixed + CONTINUOUS_INTERVAL_LAYOUT.source_len();
            if value.len() < expected {
                return Err(Error::new_descriptor_len(
                    "Frame continuous intervals",
                    expected,
                    value.len(),
                ));
            }
            let range = Record::decode(&value[fixed..], &CONTINUOUS_INTERVAL_LAYOUT);
            FrameIntervals::Continuous {
                min: range.double_word(0),
                max: range.double_word(1),
                step: range.double_word(2),
            }
        } else {
            let count = frame_interval_type as usize;
            let expected = fixed + count * 4;
            if value.len() < expected {
                return Err(Error::new_descriptor_len(
                    "Frame discrete intervals",
                    expected,
                    value.len(),
                ));
            }
            let mut intervals = Vec::new();
            intervals.try_reserve_exact(count)?;
            intervals.extend(
                value[fixed..expected]
                    .chunks_exact(4)
                    .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]])),
            );
            FrameIntervals::Discrete(intervals)
        };

        Ok(FrameDescriptor {
            subtype: StreamingSubtype::from(record.byte(2)),
            frame_index: record.byte(3),
            capabilities: record.byte(4),
            width: record.word(5),
            height: record.word(6),
            min_bit_rate: record.double_word(7),
            max_bit_rate: record.double_word(8),
            max_video_frame_buffer_size: record.double_word(9),
            default_frame_interval: record.double_word(10),
            frame_interval_type,
            intervals,
        })
    }
}

/// Still image size pattern
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct StillResolution {
    /// 1-based position in the descriptor
    pub index: u8,
    /// wWidth
    pub width: u16,
    /// wHeight
    pub height: u16,
}

/// VS_STILL_IMAGE_FRAME
#[derive(Debug, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct StillFrameDescriptor {
    pub subtype: StreamingSubtype,
    pub endpoint_address: u8,
    pub image_size_patterns: Vec<StillResolution>,
    pub compression_patterns: Vec<u8>,
}

impl TryFrom<&[u8]> for StillFrameDescriptor {
    type Error = Error;

    fn try_from(value: &[u8]) -> error::Result<Self> {
        if value.len() < 5 {
            return Err(Error::new_descriptor_len("StillImageFrame", 5, value.len()));
        }

        let endpoint_address = value[3];
        let num_image_size_patterns = value[4] as usize;
        let mut offset = 5;

        // patterns and the bNumCompressionPattern byte after them
        let expected = offset + num_image_size_patterns * 4 + 1;
        if value.len() < expected {
            return Err(Error::new_descriptor_len(
                "StillImageFrame image size patterns",
                expected,
                value.len(),
            ));
        }

        let mut image_size_patterns = Vec::new();
        image_size_patterns.try_reserve_exact(num_image_size_patterns)?;
        for (i, b) in value[offset..offset + num_image_size_patterns * 4]
            .chunks_exact(4)
            .enumerate()
        {
            image_size_patterns.push(StillResolution {
                index: i as u8 + 1,
                width: u16::from_le_bytes([b[0], b[1]]),
                height: u16::from_le_bytes([b[2], b[3]]),
            });
        }
        offset += num_image_size_patterns * 4;

        let num_compression_patterns = value[offset] as usize;
        offset += 1;

        if value.len() < offset + num_compression_patterns {
            return Err(Error::new_descriptor_len(
                "StillImageFrame compression patterns",
                offset + num_compression_patterns,
                value.len(),
            ));
        }

        let mut compression_patterns = Vec::new();
        compression_patterns.try_reserve_exact(num_compression_patterns)?;
        compression_patterns.extend_from_slice(&value[offset..offset + num_compression_patterns]);

        Ok(StillFrameDescriptor {
            subtype: StreamingSubtype::from(value[2]),
            endpoint_address,
            image_size_patterns,
            compression_patterns,
        })
    }
}
