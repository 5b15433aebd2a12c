//! Parsed USB configuration descriptor tree; extends the `usb` module.
//!
//! [`parse_configuration`] walks the flat buffer returned by a "get configuration
//! descriptor" request and builds Configuration -> [`Interface`] -> [`AltSetting`] ->
//! [`Endpoint`]. Class and vendor specific blocks between the structural descriptors are
//! kept as opaque [`DescriptorData`] on the node they follow for class parsers such as
//! [`crate::uvc`] to interpret later.
//!
//! A malformed mandatory header is a hard error. Running out of bytes while collecting
//! extra blocks or child descriptors is not: the tree parsed so far is returned with the
//! declared counts lowered to what was actually produced, see [`ParseReport`].
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use std::fmt;
use std::sync::LazyLock;

use crate::error::{self, Error, ErrorKind};
use crate::usb::fields::{Layout, Record};
use crate::usb::*;

pub mod video;

/// Every descriptor starts with bLength, bDescriptorType
pub const DESC_HEADER_LENGTH: usize = 2;
/// Configuration descriptor size
pub const DT_CONFIG_SIZE: usize = 9;
/// Interface descriptor size
pub const DT_INTERFACE_SIZE: usize = 9;
/// Endpoint descriptor size
pub const DT_ENDPOINT_SIZE: usize = 7;
/// Endpoint descriptor size with the audio extension bRefresh, bSynchAddress
pub const DT_ENDPOINT_AUDIO_SIZE: usize = 9;
/// Ceiling on bNumInterfaces
pub const MAX_INTERFACES: u8 = 32;
/// Ceiling on bNumEndpoints
pub const MAX_ENDPOINTS: u8 = 32;

static CONFIG_LAYOUT: LazyLock<Layout> = LazyLock::new(|| Layout::new("bbwbbbbb"));
static INTERFACE_LAYOUT: LazyLock<Layout> = LazyLock::new(|| Layout::new("bbbbbbbbb"));
static ENDPOINT_LAYOUT: LazyLock<Layout> = LazyLock::new(|| Layout::new("bbbbwb"));
static ENDPOINT_AUDIO_LAYOUT: LazyLock<Layout> = LazyLock::new(|| Layout::new("bbbbwbbb"));

/// USB Descriptor Types
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
#[allow(missing_docs)]
pub enum DescriptorType {
    Device,
    Config,
    String,
    Interface,
    Endpoint,
    DeviceQualifier,
    OtherSpeedConfiguration,
    InterfacePower,
    Otg,
    Debug,
    InterfaceAssociation,
    Bos,
    DeviceCapability,
    Hid,
    Report,
    CsDevice,
    CsConfig,
    CsString,
    CsInterface,
    CsEndpoint,
    SsEndpointCompanion,
    Unknown(u8),
}

impl From<u8> for DescriptorType {
    fn from(b: u8) -> Self {
        match b {
            0x01 => DescriptorType::Device,
            0x02 => DescriptorType::Config,
            0x03 => DescriptorType::String,
            0x04 => DescriptorType::Interface,
            0x05 => DescriptorType::Endpoint,
            0x06 => DescriptorType::DeviceQualifier,
            0x07 => DescriptorType::OtherSpeedConfiguration,
            0x08 => DescriptorType::InterfacePower,
            0x09 => DescriptorType::Otg,
            0x0a => DescriptorType::Debug,
            0x0b => DescriptorType::InterfaceAssociation,
            0x0f => DescriptorType::Bos,
            0x10 => DescriptorType::DeviceCapability,
            0x21 => DescriptorType::Hid,
            0x22 => DescriptorType::Report,
            0x24 => DescriptorType::CsInterface,
            0x25 => DescriptorType::CsEndpoint,
            0x30 => DescriptorType::SsEndpointCompanion,
            0x41 => DescriptorType::CsDevice,
            0x42 => DescriptorType::CsConfig,
            0x43 => DescriptorType::CsString,
            b => DescriptorType::Unknown(b),
        }
    }
}

impl From<DescriptorType> for u8 {
    fn from(dt: DescriptorType) -> Self {
        match dt {
            DescriptorType::Device => 0x01,
            DescriptorType::Config => 0x02,
            DescriptorType::String => 0x03,
            DescriptorType::Interface => 0x04,
            DescriptorType::Endpoint => 0x05,
            DescriptorType::DeviceQualifier => 0x06,
            DescriptorType::OtherSpeedConfiguration => 0x07,
            DescriptorType::InterfacePower => 0x08,
            DescriptorType::Otg => 0x09,
            DescriptorType::Debug => 0x0a,
            DescriptorType::InterfaceAssociation => 0x0b,
            DescriptorType::Bos => 0x0f,
            DescriptorType::DeviceCapability => 0x10,
            DescriptorType::Hid => 0x21,
            DescriptorType::Report => 0x22,
            DescriptorType::CsInterface => 0x24,
            DescriptorType::CsEndpoint => 0x25,
            DescriptorType::SsEndpointCompanion => 0x30,
            DescriptorType::CsDevice => 0x41,
            DescriptorType::CsConfig => 0x42,
            DescriptorType::CsString => 0x43,
            DescriptorType::Unknown(b) => b,
        }
    }
}

impl DescriptorType {
    /// Structural descriptors end a run of extra class/vendor blocks
    pub fn is_boundary(&self) -> bool {
        matches!(
            self,
            DescriptorType::Endpoint
                | DescriptorType::Interface
                | DescriptorType::Config
                | DescriptorType::Device
        )
    }
}

impl fmt::Display for DescriptorType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DescriptorType::Unknown(b) => write!(f, "Unknown(0x{:02x})", b),
            _ => write!(f, "{}", heck::AsTitleCase(format!("{:?}", self))),
        }
    }
}

/// Extra USB device data for unknown descriptors
///
/// Owned copy of the class or vendor specific blocks following a structural descriptor.
#[derive(Debug, Default, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptorData(pub Vec<u8>);

impl DescriptorData {
    fn try_copy(bytes: &[u8]) -> error::Result<Self> {
        let mut data = Vec::new();
        data.try_reserve_exact(bytes.len())?;
        data.extend_from_slice(bytes);
        Ok(DescriptorData(data))
    }

    /// Number of extra bytes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no extra bytes
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Bytes
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// Walk the contained blocks
    pub fn iter(&self) -> DescriptorIter<'_> {
        DescriptorIter::new(&self.0)
    }
}

/// Endpoint of an [`AltSetting`]
#[skip_serializing_none]
#[derive(Debug, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct Endpoint {
    pub length: u8,
    pub descriptor_type: u8,
    /// bEndpointAddress; direction bit 7, number bits 0..3
    pub address: u8,
    /// bmAttributes; transfer type bits 0..1
    pub attributes: u8,
    pub max_packet_size: u16,
    pub interval: u8,
    /// Audio extension, only when the block is [`DT_ENDPOINT_AUDIO_SIZE`]
    pub refresh: Option<u8>,
    /// Audio extension, only when the block is [`DT_ENDPOINT_AUDIO_SIZE`]
    pub synch_address: Option<u8>,
    pub extra: DescriptorData,
}

impl Endpoint {
    /// Decoded address
    pub fn address(&self) -> EndpointAddress {
        EndpointAddress::from(self.address)
    }

    /// Transfer type from attributes
    pub fn transfer_type(&self) -> TransferType {
        TransferType::from(self.attributes)
    }

    /// Isochronous sync type from attributes
    pub fn sync_type(&self) -> SyncType {
        SyncType::from(self.attributes)
    }

    /// Isochronous usage type from attributes
    pub fn usage_type(&self) -> UsageType {
        UsageType::from(self.attributes)
    }

    /// Bytes per transaction, bits 0..10 of wMaxPacketSize
    pub fn packet_size(&self) -> u16 {
        self.max_packet_size & 0x07ff
    }

    /// Transactions per microframe for high-bandwidth endpoints, bits 11..12 plus one
    pub fn transactions(&self) -> u8 {
        ((self.max_packet_size >> 11) & 0x03) as u8 + 1
    }
}

/// One alternate setting of an interface number
#[derive(Debug, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct AltSetting {
    pub length: u8,
    pub descriptor_type: u8,
    pub interface_number: u8,
    pub alternate_setting: u8,
    /// bNumEndpoints; lowered to `endpoints.len()` if the buffer ran short
    pub num_endpoints: u8,
    pub class: u8,
    pub sub_class: u8,
    pub protocol: u8,
    /// iInterface string index; strings are not fetched
    pub interface_index: u8,
    pub endpoints: Vec<Endpoint>,
    pub extra: DescriptorData,
}

impl AltSetting {
    /// [`ClassCode`] of bInterfaceClass
    pub fn class_code(&self) -> ClassCode {
        ClassCode::from(self.class)
    }
}

/// All alternate settings sharing one interface number
#[derive(Debug, Default, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interface {
    /// In declaration order; never empty once parsed
    pub alt_settings: Vec<AltSetting>,
}

impl Interface {
    /// Interface number shared by the alternate settings
    pub fn number(&self) -> Option<u8> {
        self.alt_settings.first().map(|a| a.interface_number)
    }

    /// Alternate setting with bAlternateSetting `alt`
    pub fn alt_setting(&self, alt: u8) -> Option<&AltSetting> {
        self.alt_settings.iter().find(|a| a.alternate_setting == alt)
    }
}

/// Root of a parsed configuration descriptor buffer
#[derive(Debug, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct Configuration {
    pub length: u8,
    pub descriptor_type: u8,
    /// wTotalLength as declared by the device
    pub total_length: u16,
    /// bNumInterfaces; lowered to `interfaces.len()` if the buffer ran short
    pub num_interfaces: u8,
    pub configuration_value: u8,
    /// iConfiguration string index; strings are not fetched
    pub configuration_index: u8,
    pub attributes: u8,
    /// bMaxPower in 2 mA units
    pub max_power: u8,
    pub interfaces: Vec<Interface>,
    pub extra: DescriptorData,
}

impl Configuration {
    /// Parse `buffer` and report how much of it was used
    ///
    /// ```
    /// use uvcscan::usb::descriptors::Configuration;
    ///
    /// let report = Configuration::parse(&[0x09, 0x02, 0x09, 0x00, 0x00, 0x01, 0x00, 0x80, 0x32]).unwrap();
    /// assert!(report.configuration.interfaces.is_empty());
    /// assert_eq!(report.consumed, 9);
    /// assert!(!report.truncated);
    /// ```
    pub fn parse(buffer: &[u8]) -> error::Result<ParseReport> {
        let mut builder = TreeBuilder::default();
        let (configuration, consumed) = builder.configuration(buffer)?;
        let remaining = buffer.len() - consumed;

        if remaining > 0 {
            log::warn!("still {} bytes of descriptor data left", remaining);
        }

        Ok(ParseReport {
            configuration,
            consumed,
            remaining,
            truncated: builder.truncated,
        })
    }

    /// Decoded bmAttributes
    pub fn attributes(&self) -> Vec<ConfigAttributes> {
        ConfigAttributes::from_bitmap(self.attributes)
    }

    /// Max power in mA assuming high-speed 2 mA units
    pub fn max_power_ma(&self) -> u32 {
        self.max_power as u32 * 2
    }

    /// Interface slot with bInterfaceNumber `number`
    pub fn interface(&self, number: u8) -> Option<&Interface> {
        self.interfaces.iter().find(|i| i.number() == Some(number))
    }

    /// Every alternate setting of every interface in order
    pub fn alt_settings(&self) -> impl Iterator<Item = &AltSetting> {
        self.interfaces.iter().flat_map(|i| i.alt_settings.iter())
    }

    /// Every endpoint of every alternate setting in order
    pub fn endpoints(&self) -> impl Iterator<Item = &Endpoint> {
        self.alt_settings().flat_map(|a| a.endpoints.iter())
    }
}

/// Result of [`Configuration::parse`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseReport {
    /// The parsed tree
    pub configuration: Configuration,
    /// Bytes of the buffer making up the tree
    pub consumed: usize,
    /// Bytes after the tree that were not parsed
    pub remaining: usize,
    /// A block ran past the end of the buffer and parsing stopped early
    pub truncated: bool,
}

/// Parse a configuration descriptor buffer into a tree, returning it with the bytes consumed
///
/// Fails with [`ErrorKind::Malformed`] if the buffer does not start with a valid
/// configuration descriptor and [`ErrorKind::TooManyInterfaces`] if it declares more than
/// [`MAX_INTERFACES`].
pub fn parse_configuration(buffer: &[u8]) -> error::Result<(Configuration, usize)> {
    TreeBuilder::default().configuration(buffer)
}

/// Parse all alternate settings of the interface at the start of `buffer`
///
/// `None` if the buffer is too short to hold an interface descriptor.
pub fn parse_interface(buffer: &[u8]) -> error::Result<Option<(Interface, usize)>> {
    TreeBuilder::default().interface(buffer)
}

/// Parse the endpoint at the start of `buffer` with any class specific blocks following it
///
/// `None` if the buffer does not start with an endpoint descriptor or is too short for one.
pub fn parse_endpoint(buffer: &[u8]) -> error::Result<Option<(Endpoint, usize)>> {
    TreeBuilder::default().endpoint(buffer)
}

/// Walks one buffer; records whether any level stopped early on a short read
#[derive(Debug, Default)]
struct TreeBuilder {
    truncated: bool,
}

impl TreeBuilder {
    fn configuration(&mut self, buffer: &[u8]) -> error::Result<(Configuration, usize)> {
        if buffer.len() < DT_CONFIG_SIZE {
            return Err(Error::new(
                ErrorKind::Malformed,
                &format!(
                    "short config descriptor read {}/{}",
                    buffer.len(),
                    DT_CONFIG_SIZE
                ),
            ));
        }

        let header = Record::decode(buffer, &CONFIG_LAYOUT);
        let length = header.byte(0);
        let descriptor_type = header.byte(1);
        let mut num_interfaces = header.byte(3);

        if descriptor_type != u8::from(DescriptorType::Config) {
            return Err(Error::new(
                ErrorKind::Malformed,
                &format!(
                    "unexpected descriptor 0x{:02x} (expected 0x02)",
                    descriptor_type
                ),
            ));
        } else if (length as usize) < DT_CONFIG_SIZE {
            return Err(Error::new(
                ErrorKind::Malformed,
                &format!("invalid config bLength ({})", length),
            ));
        } else if length as usize > buffer.len() {
            return Err(Error::new(
                ErrorKind::Malformed,
                &format!(
                    "short config descriptor read {}/{}",
                    buffer.len(),
                    length
                ),
            ));
        } else if num_interfaces > MAX_INTERFACES {
            return Err(Error::new(
                ErrorKind::TooManyInterfaces,
                &format!("too many interfaces ({})", num_interfaces),
            ));
        }

        let mut interfaces = Vec::new();
        interfaces.try_reserve_exact(num_interfaces as usize)?;
        let mut extra = Vec::new();
        let mut consumed = length as usize;

        for i in 0..num_interfaces {
            let extra_len = self.extra(&buffer[consumed..], "config")?;
            if extra_len > 0 {
                extra.try_reserve(extra_len)?;
                extra.extend_from_slice(&buffer[consumed..consumed + extra_len]);
                consumed += extra_len;
            }

            if self.truncated {
                break;
            }

            match self.interface(&buffer[consumed..])? {
                Some((interface, used)) => {
                    log::trace!("interface slot {} used {} bytes", i, used);
                    interfaces.push(interface);
                    consumed += used;
                }
                None => break,
            }

            if self.truncated {
                break;
            }
        }

        if interfaces.len() < num_interfaces as usize {
            log::warn!(
                "configuration declares {} interfaces, only {} present",
                num_interfaces,
                interfaces.len()
            );
            self.truncated = true;
            num_interfaces = interfaces.len() as u8;
        }

        log::info!(
            "parsed configuration {} with {} interfaces",
            header.byte(4),
            num_interfaces
        );

        Ok((
            Configuration {
                length,
                descriptor_type,
                total_length: header.word(2),
                num_interfaces,
                configuration_value: header.byte(4),
                configuration_index: header.byte(5),
                attributes: header.byte(6),
                max_power: header.byte(7),
                interfaces,
                extra: DescriptorData(extra),
            },
            consumed,
        ))
    }

    fn interface(&mut self, buffer: &[u8]) -> error::Result<Option<(Interface, usize)>> {
        let mut alt_settings: Vec<AltSetting> = Vec::new();
        let mut consumed = 0;

        while buffer.len() - consumed >= DT_INTERFACE_SIZE {
            let rest = &buffer[consumed..];
            let header = Record::decode(rest, &INTERFACE_LAYOUT);
            let length = header.byte(0);
            let descriptor_type = header.byte(1);
            let num_endpoints = header.byte(4);

            if descriptor_type != u8::from(DescriptorType::Interface) {
                log::warn!(
                    "unexpected descriptor 0x{:02x} (expected 0x04)",
                    descriptor_type
                );
                break;
            } else if (length as usize) < DT_INTERFACE_SIZE {
                return Err(Error::new(
                    ErrorKind::Malformed,
                    &format!("invalid interface bLength ({})", length),
                ));
            } else if length as usize > rest.len() {
                log::warn!(
                    "short intf descriptor read {}/{}",
                    rest.len(),
                    length
                );
                self.truncated = true;
                break;
            } else if num_endpoints > MAX_ENDPOINTS {
                return Err(Error::new(
                    ErrorKind::TooManyEndpoints,
                    &format!("too many endpoints ({})", num_endpoints),
                ));
            }

            consumed += length as usize;

            let extra_len = self.extra(&buffer[consumed..], "intf")?;
            let extra = DescriptorData::try_copy(&buffer[consumed..consumed + extra_len])?;
            consumed += extra_len;

            let mut endpoints = Vec::new();
            if !self.truncated {
                endpoints.try_reserve_exact(num_endpoints as usize)?;
                for _ in 0..num_endpoints {
                    match self.endpoint(&buffer[consumed..])? {
                        Some((endpoint, used)) => {
                            endpoints.push(endpoint);
                            consumed += used;
                        }
                        None => break,
                    }
                    if self.truncated {
                        break;
                    }
                }
            }

            if endpoints.len() < num_endpoints as usize {
                log::warn!(
                    "interface {} alt {} declares {} endpoints, only {} present",
                    header.byte(2),
                    header.byte(3),
                    num_endpoints,
                    endpoints.len()
                );
                self.truncated = true;
            }

            alt_settings.try_reserve(1)?;
            alt_settings.push(AltSetting {
                length,
                descriptor_type,
                interface_number: header.byte(2),
                alternate_setting: header.byte(3),
                num_endpoints: endpoints.len() as u8,
                class: header.byte(5),
                sub_class: header.byte(6),
                protocol: header.byte(7),
                interface_index: header.byte(8),
                endpoints,
                extra,
            });

            if self.truncated {
                break;
            }

            // another alternate setting of this interface?
            let next = &buffer[consumed..];
            if next.len() < DT_INTERFACE_SIZE
                || next[1] != u8::from(DescriptorType::Interface)
                || next[2] != header.byte(2)
            {
                break;
            }
        }

        if alt_settings.is_empty() {
            log::warn!("no interface descriptor in remaining {} bytes", buffer.len());
            self.truncated = true;
            return Ok(None);
        }

        Ok(Some((Interface { alt_settings }, consumed)))
    }

    fn endpoint(&mut self, buffer: &[u8]) -> error::Result<Option<(Endpoint, usize)>> {
        if buffer.len() < DESC_HEADER_LENGTH {
            log::warn!(
                "short endpoint descriptor read {}/{}",
                buffer.len(),
                DESC_HEADER_LENGTH
            );
            self.truncated = true;
            return Ok(None);
        }

        let length = buffer[0] as usize;
        let descriptor_type = buffer[1];

        if descriptor_type != u8::from(DescriptorType::Endpoint) {
            log::warn!(
                "unexpected descriptor 0x{:02x} (expected 0x05)",
                descriptor_type
            );
            return Ok(None);
        } else if length < DT_ENDPOINT_SIZE {
            return Err(Error::new(
                ErrorKind::Malformed,
                &format!("invalid endpoint bLength ({})", length),
            ));
        }

        // declared length may claim the audio extension the buffer does not hold
        let available = length.min(buffer.len());
        if available < DT_ENDPOINT_SIZE {
            log::warn!("short endpoint descriptor read {}/{}", buffer.len(), length);
            self.truncated = true;
            return Ok(None);
        }

        let audio = available >= DT_ENDPOINT_AUDIO_SIZE;
        let header = if audio {
            Record::decode(buffer, &ENDPOINT_AUDIO_LAYOUT)
        } else {
            Record::decode(buffer, &ENDPOINT_LAYOUT)
        };

        let mut endpoint = Endpoint {
            length: length as u8,
            descriptor_type,
            address: header.byte(2),
            attributes: header.byte(3),
            max_packet_size: header.word(4),
            interval: header.byte(5),
            refresh: audio.then(|| header.byte(6)),
            synch_address: audio.then(|| header.byte(7)),
            extra: DescriptorData::default(),
        };

        if available < length {
            log::warn!("short endpoint descriptor read {}/{}", buffer.len(), length);
            self.truncated = true;
            return Ok(Some((endpoint, available)));
        }

        let extra_len = self.extra(&buffer[length..], "ep")?;
        endpoint.extra = DescriptorData::try_copy(&buffer[length..length + extra_len])?;

        Ok(Some((endpoint, length + extra_len)))
    }

    /// Length of the class/vendor blocks at the start of `buffer`, up to the next structural
    /// descriptor
    fn extra(&mut self, buffer: &[u8], level: &str) -> error::Result<usize> {
        let mut offset = 0;

        while buffer.len() - offset >= DESC_HEADER_LENGTH {
            let length = buffer[offset] as usize;
            let descriptor_type = DescriptorType::from(buffer[offset + 1]);

            if length < DESC_HEADER_LENGTH {
                return Err(Error::new(
                    ErrorKind::Malformed,
                    &format!("invalid extra {} desc len ({})", level, length),
                ));
            } else if length > buffer.len() - offset {
                log::warn!(
                    "short extra {} desc read {}/{}",
                    level,
                    buffer.len() - offset,
                    length
                );
                self.truncated = true;
                break;
            }

            if descriptor_type.is_boundary() {
                break;
            }

            log::debug!("skipping {} descriptor {}", level, descriptor_type);
            offset += length;
        }

        Ok(offset)
    }
}

/// A single length-prefixed block from [`DescriptorIter`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawDescriptor<'a> {
    /// Offset of the block in the walked buffer
    pub offset: usize,
    /// bDescriptorType
    pub descriptor_type: DescriptorType,
    /// Whole block including bLength and bDescriptorType
    pub data: &'a [u8],
}

impl RawDescriptor<'_> {
    /// bLength
    pub fn length(&self) -> u8 {
        self.data[0]
    }

    /// bDescriptorSubtype, the third byte, of class specific interface and endpoint blocks
    ///
    /// `None` for other types, where the third byte is a plain field.
    pub fn subtype(&self) -> Option<u8> {
        match self.descriptor_type {
            DescriptorType::CsInterface | DescriptorType::CsEndpoint => self.data.get(2).copied(),
            _ => None,
        }
    }
}

/// Flat walk over every block of a descriptor buffer without building a tree
///
/// Yields an error once and then stops if a block has an invalid length or runs past the
/// end of the buffer.
///
/// ```
/// use uvcscan::usb::descriptors::{DescriptorIter, DescriptorType};
///
/// let buf = [0x09, 0x02, 0x09, 0x00, 0x00, 0x01, 0x00, 0x80, 0x32, 0x03, 0x24, 0x01];
/// let types: Vec<DescriptorType> = DescriptorIter::new(&buf).map(|d| d.unwrap().descriptor_type).collect();
/// assert_eq!(types, vec![DescriptorType::Config, DescriptorType::CsInterface]);
/// ```
#[derive(Debug, Clone)]
pub struct DescriptorIter<'a> {
    buf: &'a [u8],
    offset: usize,
}

impl<'a> DescriptorIter<'a> {
    /// Walk `buf` from the start
    pub fn new(buf: &'a [u8]) -> Self {
        DescriptorIter { buf, offset: 0 }
    }
}

impl<'a> Iterator for DescriptorIter<'a> {
    type Item = error::Result<RawDescriptor<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        let rest = &self.buf[self.offset..];
        if rest.len() < DESC_HEADER_LENGTH {
            return None;
        }

        let length = rest[0] as usize;
        let offset = self.offset;
        if length < DESC_HEADER_LENGTH || length > rest.len() {
            self.offset = self.buf.len();
            return Some(Err(Error::new(
                ErrorKind::Malformed,
                &format!(
                    "descriptor at offset {} has length {} with {} bytes left",
                    offset,
                    length,
                    rest.len()
                ),
            )));
        }

        self.offset += length;
        Some(Ok(RawDescriptor {
            offset,
            descriptor_type: DescriptorType::from(rest[1]),
            data: &rest[..length],
        }))
    }
}
