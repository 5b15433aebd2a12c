//! USB Video Class scan of a parsed [`Configuration`]
//!
//! [`scan_control`] finds the Video Control interface, decodes its VC_HEADER and scans every
//! streaming interface the header lists with [`scan_streaming`]. Streaming scans build the
//! formats of an interface with their frames and still image frames attached to the format
//! they follow.
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use std::convert::TryFrom;

use crate::error::{self, Error, ErrorKind};
use crate::usb::descriptors::video::*;
use crate::usb::descriptors::{AltSetting, Configuration, DescriptorIter};
use crate::usb::Version;

/// Vendor specific bInterfaceClass used by some cameras for their control interface
pub const CC_VENDOR_SPECIFIC: u8 = 0xff;

/// Which interface class/subclass pairs count as a Video Control interface
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlMatcher {
    /// Also accept vendor specific class with the Video Control subclass
    pub vendor_quirk: bool,
}

impl ControlMatcher {
    /// Matcher accepting vendor specific control interfaces as well as standard ones
    pub fn with_vendor_quirk() -> Self {
        ControlMatcher { vendor_quirk: true }
    }

    /// Whether `alt` is a Video Control interface
    ///
    /// ```
    /// use uvcscan::uvc::ControlMatcher;
    /// use uvcscan::usb::descriptors::parse_configuration;
    ///
    /// let buf = [
    ///     0x09, 0x02, 0x12, 0x00, 0x01, 0x01, 0x00, 0x80, 0xfa,
    ///     0x09, 0x04, 0x00, 0x00, 0x00, 0xff, 0x01, 0x00, 0x00,
    /// ];
    /// let (config, _) = parse_configuration(&buf).unwrap();
    /// let alt = &config.interfaces[0].alt_settings[0];
    /// assert!(!ControlMatcher::default().matches(alt));
    /// assert!(ControlMatcher::with_vendor_quirk().matches(alt));
    /// ```
    pub fn matches(&self, alt: &AltSetting) -> bool {
        if alt.sub_class != SC_VIDEOCONTROL {
            return false;
        }

        alt.class == CC_VIDEO || (self.vendor_quirk && alt.class == CC_VENDOR_SPECIFIC)
    }
}

/// Video Control interface found by [`scan_control`]
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlInterfaceInfo {
    /// Raw bcdUVC
    pub bcd_uvc: u16,
    /// bcdUVC decoded
    pub version: Version,
    /// dwClockFrequency in Hz; not present from UVC 1.1
    pub clock_frequency: Option<u32>,
    /// Slot of the interface in [`Configuration::interfaces`]
    pub interface_index: usize,
    /// bInterfaceNumber
    pub interface_number: u8,
    /// Address of the first endpoint, usually the status interrupt endpoint
    pub endpoint_address: Option<u8>,
}

/// A Video Streaming interface and its formats
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamingInterface {
    /// bInterfaceNumber
    pub interface_number: u8,
    /// Video data endpoint from the input header
    pub endpoint_address: u8,
    /// Terminal the endpoint connects to
    pub terminal_link: u8,
    /// bStillCaptureMethod
    pub still_capture_method: u8,
    /// In declaration order
    pub formats: Vec<FormatDescriptor>,
}

impl StreamingInterface {
    /// Format with bFormatIndex `index`
    pub fn format(&self, index: u8) -> Option<&FormatDescriptor> {
        self.formats.iter().find(|f| f.format_index == index)
    }

    /// Total frames across all formats
    pub fn frame_count(&self) -> usize {
        self.formats.iter().map(|f| f.frames.len()).sum()
    }
}

/// Result of a video scan of one configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// The configuration the scan ran over
    pub configuration: Configuration,
    /// The Video Control interface
    pub control: ControlInterfaceInfo,
    /// Streaming interfaces in VC_HEADER order
    pub streaming: Vec<StreamingInterface>,
}

impl DeviceInfo {
    /// Parse a configuration descriptor buffer then scan it
    pub fn from_bytes(buffer: &[u8], matcher: &ControlMatcher) -> error::Result<Self> {
        let report = Configuration::parse(buffer)?;
        scan_control(&report.configuration, matcher)
    }
}

/// Class specific blocks of an extra blob, each at least bLength, bDescriptorType,
/// bDescriptorSubtype long
///
/// Ends at the first block that is shorter than that or runs past the end of the blob.
fn class_blocks<'a>(extra: &'a [u8]) -> impl Iterator<Item = &'a [u8]> + 'a {
    DescriptorIter::new(extra).map_while(|d| match d {
        Ok(d) if d.data.len() >= 3 => Some(d.data),
        Ok(d) => {
            log::warn!(
                "class descriptor at offset {} too short ({})",
                d.offset,
                d.data.len()
            );
            None
        }
        Err(e) => {
            log::warn!("{:#}", e);
            None
        }
    })
}

/// Find the Video Control interface in `configuration` and scan it along with the streaming
/// interfaces its header lists
///
/// Fails with [`ErrorKind::NoSuitableInterface`] if no first alternate setting matches
/// `matcher`, [`ErrorKind::UnsupportedVersion`] for an unknown bcdUVC and with the first
/// error of any streaming scan.
pub fn scan_control(
    configuration: &Configuration,
    matcher: &ControlMatcher,
) -> error::Result<DeviceInfo> {
    let (interface_index, alt) = configuration
        .interfaces
        .iter()
        .enumerate()
        .find_map(|(i, interface)| {
            interface
                .alt_settings
                .first()
                .filter(|a| matcher.matches(a))
                .map(|a| (i, a))
        })
        .ok_or_else(|| {
            Error::new(
                ErrorKind::NoSuitableInterface,
                "No Video Control interface in configuration",
            )
        })?;

    log::debug!(
        "Video Control interface {} at index {}",
        alt.interface_number,
        interface_index
    );

    let mut control: Option<ControlInterfaceInfo> = None;
    let mut streaming = Vec::new();

    for block in class_blocks(alt.extra.as_slice()) {
        if block[1] != CS_INTERFACE {
            log::debug!("skipping non class descriptor 0x{:02x}", block[1]);
            continue;
        }

        match ControlSubtype::from(block[2]) {
            ControlSubtype::Header => {
                if control.is_some() {
                    log::warn!("ignoring repeated VC_HEADER");
                    continue;
                }

                let header = Header::try_from(block)?;
                log::info!(
                    "UVC {} with {} streaming interfaces",
                    header.version,
                    header.interfaces.len()
                );

                streaming.try_reserve_exact(header.interfaces.len())?;
                for index in header.interfaces.iter() {
                    streaming.push(scan_streaming(configuration, *index as usize)?);
                }

                control = Some(ControlInterfaceInfo {
                    bcd_uvc: header.bcd_uvc,
                    version: header.version,
                    clock_frequency: header.clock_frequency,
                    interface_index,
                    interface_number: alt.interface_number,
                    endpoint_address: alt.endpoints.first().map(|e| e.address),
                });
            }
            ControlSubtype::Undefined => {
                log::warn!("unsupported descriptor subtype VC 0x{:02x}", block[2])
            }
            s => log::debug!("skipping {:#}", s),
        }
    }

    let control = control.ok_or_else(|| {
        Error::new(
            ErrorKind::Malformed,
            &format!(
                "Video Control interface {} has no VC_HEADER",
                alt.interface_number
            ),
        )
    })?;

    Ok(DeviceInfo {
        configuration: configuration.clone(),
        control,
        streaming,
    })
}

fn last_format(
    formats: &mut [FormatDescriptor],
    subtype: StreamingSubtype,
) -> error::Result<&mut FormatDescriptor> {
    formats.last_mut().ok_or_else(|| {
        Error::new(
            ErrorKind::OrphanFrame,
            &format!("{:#} before any format descriptor", subtype),
        )
    })
}

/// Scan the first alternate setting of the interface at `interface_index` as a Video
/// Streaming interface
///
/// Fails with [`ErrorKind::InvalidArg`] if there is no such interface and
/// [`ErrorKind::OrphanFrame`] if a frame comes before any format.
pub fn scan_streaming(
    configuration: &Configuration,
    interface_index: usize,
) -> error::Result<StreamingInterface> {
    let alt = configuration
        .interfaces
        .get(interface_index)
        .and_then(|i| i.alt_settings.first())
        .ok_or_else(|| {
            Error::new(
                ErrorKind::InvalidArg,
                &format!(
                    "No streaming interface at index {} of {}",
                    interface_index,
                    configuration.interfaces.len()
                ),
            )
        })?;

    let mut stream = StreamingInterface {
        interface_number: alt.interface_number,
        ..Default::default()
    };

    for block in class_blocks(alt.extra.as_slice()) {
        if block[1] != CS_INTERFACE {
            log::debug!("skipping non class descriptor 0x{:02x}", block[1]);
            continue;
        }

        let subtype = StreamingSubtype::from(block[2]);
        match subtype {
            StreamingSubtype::InputHeader => {
                let header = InputHeader::try_from(block)?;
                stream.endpoint_address = header.endpoint_address;
                stream.terminal_link = header.terminal_link;
                stream.still_capture_method = header.still_capture_method;
            }
            StreamingSubtype::FormatUncompressed => {
                let format = FormatDescriptor::try_from(block)?;
                stream.formats.try_reserve(1)?;
                stream.formats.push(format);
            }
            StreamingSubtype::FrameUncompressed | StreamingSubtype::FrameMJPEG => {
                let format = last_format(&mut stream.formats, subtype)?;
                let frame = FrameDescriptor::try_from(block)?;
                format.frames.try_reserve(1)?;
                format.frames.push(frame);
            }
            StreamingSubtype::StillImageFrame => {
                let format = last_format(&mut stream.formats, subtype)?;
                let still = StillFrameDescriptor::try_from(block)?;
                format.still_frames.try_reserve(1)?;
                format.still_frames.push(still);
            }
            StreamingSubtype::Undefined => {
                log::warn!("unsupported descriptor subtype VS 0x{:02x}", block[2])
            }
            s => log::warn!("unsupported descriptor subtype {:#}", s),
        }
    }

    log::info!(
        "streaming interface {}: {} formats, {} frames",
        stream.interface_number,
        stream.formats.len(),
        stream.frame_count()
    );

    Ok(stream)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usb::descriptors::{parse_configuration, DescriptorData};

    fn interface(number: u8, class: u8, sub_class: u8, extra: &[u8]) -> Vec<u8> {
        [
            &[0x09, 0x04, number, 0x00, 0x00, class, sub_class, 0x00, 0x00][..],
            extra,
        ]
        .concat()
    }

    fn configuration(interfaces: &[Vec<u8>]) -> Configuration {
        let body = interfaces.concat();
        let total = (9 + body.len()) as u16;
        let mut buf = vec![0x09, 0x02];
        buf.extend_from_slice(&total.to_le_bytes());
        buf.extend_from_slice(&[interfaces.len() as u8, 0x01, 0x00, 0x80, 0xfa]);
        buf.extend(body);
        parse_configuration(&buf).unwrap().0
    }

    fn vc_header(bcd: u16, clock: [u8; 4], interfaces: &[u8]) -> Vec<u8> {
        let mut block = vec![12 + interfaces.len() as u8, 0x24, 0x01];
        block.extend_from_slice(&bcd.to_le_bytes());
        block.extend_from_slice(&[0x28, 0x00]);
        block.extend_from_slice(&clock);
        block.push(interfaces.len() as u8);
        block.extend_from_slice(interfaces);
        block
    }

    fn input_header() -> Vec<u8> {
        vec![
            0x0e, 0x24, 0x01, 0x01, 0x47, 0x00, 0x81, 0x00, 0x02, 0x01, 0x00, 0x00, 0x01, 0x00,
        ]
    }

    fn format(index: u8) -> Vec<u8> {
        vec![
            0x1b, 0x24, 0x04, index, 0x01, 0x59, 0x55, 0x59, 0x32, 0x00, 0x00, 0x10, 0x00, 0x80,
            0x00, 0x00, 0xaa, 0x00, 0x38, 0x9b, 0x71, 0x10, 0x01, 0x00, 0x00, 0x00, 0x00,
        ]
    }

    fn frame(index: u8, width: u16, height: u16) -> Vec<u8> {
        let mut block = vec![0x1e, 0x24, 0x05, index, 0x00];
        block.extend_from_slice(&width.to_le_bytes());
        block.extend_from_slice(&height.to_le_bytes());
        block.extend_from_slice(&[0; 12]);
        block.extend_from_slice(&333_333u32.to_le_bytes());
        block.push(0x01);
        block.extend_from_slice(&333_333u32.to_le_bytes());
        block
    }

    fn still() -> Vec<u8> {
        vec![
            0x0f, 0x24, 0x03, 0x00, 0x02, 0x40, 0x01, 0xf0, 0x00, 0x80, 0x02, 0xe0, 0x01, 0x01,
            0x01,
        ]
    }

    fn camera(vs_extra: &[u8]) -> Configuration {
        configuration(&[
            interface(
                0,
                CC_VIDEO,
                SC_VIDEOCONTROL,
                &vc_header(0x0100, [0x80, 0xc3, 0xc9, 0x01], &[1]),
            ),
            interface(1, CC_VIDEO, SC_VIDEOSTREAMING, vs_extra),
        ])
    }

    // bypasses the tree builder, which rejects or trims bad blocks itself
    fn camera_with_raw_extra(vs_extra: Vec<u8>) -> Configuration {
        let mut config = camera(&[]);
        config.interfaces[1].alt_settings[0].extra = DescriptorData(vs_extra);
        config
    }

    #[test]
    fn test_scan_camera() {
        let vs = [
            input_header(),
            format(1),
            frame(1, 640, 480),
            frame(2, 320, 240),
            still(),
        ]
        .concat();
        let info = scan_control(&camera(&vs), &ControlMatcher::default()).unwrap();

        assert_eq!(info.control.bcd_uvc, 0x0100);
        assert_eq!(info.control.clock_frequency, Some(30_000_000));
        assert_eq!(info.control.interface_index, 0);
        assert_eq!(info.control.endpoint_address, None);
        assert_eq!(info.streaming.len(), 1);

        let stream = &info.streaming[0];
        assert_eq!(stream.interface_number, 1);
        assert_eq!(stream.endpoint_address, 0x81);
        assert_eq!(stream.terminal_link, 2);
        assert_eq!(stream.still_capture_method, 1);
        assert_eq!(stream.formats.len(), 1);

        let format = stream.format(1).unwrap();
        assert_eq!(format.fourcc().as_deref(), Some("YUY2"));
        assert_eq!(
            format.frames.iter().map(|f| (f.width, f.height)).collect::<Vec<_>>(),
            vec![(640, 480), (320, 240)]
        );
        assert_eq!(format.still_frames.len(), 1);
        assert_eq!(format.still_frames[0].image_size_patterns[1].width, 640);
        assert_eq!(format.still_frames[0].compression_patterns, vec![0x01]);
    }

    #[test]
    fn test_clock_frequency_and_single_streaming_index() {
        let mut interfaces = vec![interface(
            0,
            CC_VIDEO,
            SC_VIDEOCONTROL,
            &vc_header(0x0100, [0x00, 0x00, 0x01, 0x00], &[5]),
        )];
        for n in 1..5 {
            interfaces.push(interface(n, 0x01, 0x01, &[]));
        }
        interfaces.push(interface(7, CC_VIDEO, SC_VIDEOSTREAMING, &input_header()));

        let info = scan_control(&configuration(&interfaces), &ControlMatcher::default()).unwrap();
        assert_eq!(info.control.clock_frequency, Some(0x0001_0000));
        assert_eq!(info.streaming.len(), 1);
        assert_eq!(info.streaming[0].interface_number, 7);
    }

    #[test]
    fn test_uvc11_has_no_clock() {
        let config = configuration(&[
            interface(0, CC_VIDEO, SC_VIDEOCONTROL, &vc_header(0x0110, [0; 4], &[])),
        ]);
        let info = scan_control(&config, &ControlMatcher::default()).unwrap();
        assert_eq!(info.control.clock_frequency, None);
        assert!(info.streaming.is_empty());
    }

    #[test]
    fn test_unsupported_version() {
        let config = configuration(&[
            interface(0, CC_VIDEO, SC_VIDEOCONTROL, &vc_header(0x0150, [0; 4], &[])),
        ]);
        assert_eq!(
            scan_control(&config, &ControlMatcher::default()).unwrap_err().kind(),
            ErrorKind::UnsupportedVersion
        );
    }

    #[test]
    fn test_no_suitable_interface_and_vendor_quirk() {
        let config = configuration(&[
            interface(0, 0xff, SC_VIDEOCONTROL, &vc_header(0x0100, [0; 4], &[])),
            interface(1, 0x01, 0x01, &[]),
        ]);
        assert_eq!(
            scan_control(&config, &ControlMatcher::default()).unwrap_err().kind(),
            ErrorKind::NoSuitableInterface
        );
        assert!(scan_control(&config, &ControlMatcher::with_vendor_quirk()).is_ok());
    }

    #[test]
    fn test_header_index_out_of_range() {
        let config = configuration(&[
            interface(0, CC_VIDEO, SC_VIDEOCONTROL, &vc_header(0x0100, [0; 4], &[9])),
        ]);
        assert_eq!(
            scan_control(&config, &ControlMatcher::default()).unwrap_err().kind(),
            ErrorKind::InvalidArg
        );
    }

    #[test]
    fn test_repeated_header_ignored() {
        // second header would fail on its version if it were decoded
        let extra = [
            vc_header(0x0100, [0x80, 0xc3, 0xc9, 0x01], &[1]),
            vc_header(0x0150, [0; 4], &[]),
        ]
        .concat();
        let config = configuration(&[
            interface(0, CC_VIDEO, SC_VIDEOCONTROL, &extra),
            interface(1, CC_VIDEO, SC_VIDEOSTREAMING, &input_header()),
        ]);
        let info = scan_control(&config, &ControlMatcher::default()).unwrap();
        assert_eq!(info.control.bcd_uvc, 0x0100);
        assert_eq!(info.control.clock_frequency, Some(30_000_000));
        assert_eq!(info.streaming.len(), 1);
    }

    #[test]
    fn test_last_input_header_wins() {
        let mut second = input_header();
        // reserved bits set in bEndpointAddress
        second[6] = 0xf2;
        second[8] = 0x05;
        second[9] = 0x00;
        let vs = [input_header(), second].concat();
        let stream = scan_streaming(&camera(&vs), 1).unwrap();
        assert_eq!(stream.endpoint_address, 0x82);
        assert_eq!(stream.terminal_link, 5);
        assert_eq!(stream.still_capture_method, 0);
    }

    #[test]
    fn test_missing_header_is_malformed() {
        let config = configuration(&[interface(0, CC_VIDEO, SC_VIDEOCONTROL, &[])]);
        assert_eq!(
            scan_control(&config, &ControlMatcher::default()).unwrap_err().kind(),
            ErrorKind::Malformed
        );
    }

    #[test]
    fn test_other_control_blocks_skipped() {
        // input terminal, unknown subtype then a vendor block before the header
        let extra = [
            &[0x08, 0x24, 0x02, 0x01, 0x01, 0x02, 0x00, 0x00][..],
            &[0x03, 0x24, 0x7f][..],
            &[0x04, 0x41, 0x00, 0x00][..],
            &vc_header(0x010a, [0x00, 0x00, 0x01, 0x00], &[])[..],
        ]
        .concat();
        let config = configuration(&[interface(0, CC_VIDEO, SC_VIDEOCONTROL, &extra)]);
        let info = scan_control(&config, &ControlMatcher::default()).unwrap();
        assert_eq!(info.control.bcd_uvc, 0x010a);
        assert_eq!(info.control.clock_frequency, Some(0x0001_0000));
    }

    #[test]
    fn test_orphan_frame() {
        let vs = [input_header(), frame(1, 640, 480), format(1)].concat();
        let config = camera(&vs);
        assert_eq!(
            scan_streaming(&config, 1).unwrap_err().kind(),
            ErrorKind::OrphanFrame
        );
        assert_eq!(
            scan_control(&config, &ControlMatcher::default()).unwrap_err().kind(),
            ErrorKind::OrphanFrame
        );
        let config = camera(&still());
        assert_eq!(
            scan_streaming(&config, 1).unwrap_err().kind(),
            ErrorKind::OrphanFrame
        );
    }

    #[test]
    fn test_zero_length_block_ends_walk() {
        let vs = [format(1), vec![0x00, 0x24, 0x05], frame(1, 640, 480)].concat();
        let stream = scan_streaming(&camera_with_raw_extra(vs), 1).unwrap();
        assert_eq!(stream.formats.len(), 1);
        assert!(stream.formats[0].frames.is_empty());
    }

    #[test]
    fn test_oversized_block_ends_walk() {
        let mut oversized = frame(1, 640, 480);
        oversized[0] = 0x40;
        let vs = [format(1), oversized].concat();
        let stream = scan_streaming(&camera_with_raw_extra(vs), 1).unwrap();
        assert!(stream.formats[0].frames.is_empty());
    }

    #[test]
    fn test_short_handled_block_is_error() {
        let vs = [format(1), vec![0x05, 0x24, 0x05, 0x01, 0x00]].concat();
        assert!(scan_streaming(&camera(&vs), 1)
            .unwrap_err()
            .is_descriptor_error());
    }

    #[test]
    fn test_unsupported_streaming_subtypes_skipped() {
        // VS_FORMAT_MJPEG and VS_COLORFORMAT
        let vs = [
            vec![0x0b, 0x24, 0x06, 0x02, 0x01, 0x01, 0x01, 0x00, 0x00, 0x00, 0x00],
            vec![0x06, 0x24, 0x0d, 0x01, 0x01, 0x04],
            format(1),
        ]
        .concat();
        let stream = scan_streaming(&camera(&vs), 1).unwrap();
        assert_eq!(stream.formats.len(), 1);
    }

    #[test]
    fn test_device_info_from_bytes() {
        let buf = [
            0x09, 0x02, 0x25, 0x00, 0x01, 0x01, 0x00, 0x80, 0xfa, 0x09, 0x04, 0x00, 0x00, 0x01,
            0x0e, 0x01, 0x00, 0x00, 0x0c, 0x24, 0x01, 0x00, 0x01, 0x0c, 0x00, 0x00, 0x00, 0x01,
            0x00, 0x00, 0x07, 0x05, 0x83, 0x03, 0x10, 0x00, 0x06,
        ];
        let info = DeviceInfo::from_bytes(&buf, &ControlMatcher::default()).unwrap();
        assert_eq!(info.control.endpoint_address, Some(0x83));
        assert_eq!(info.configuration.interfaces.len(), 1);
    }
}
