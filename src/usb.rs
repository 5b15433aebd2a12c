//! Defines for USB, mainly those covered at [usb.org](https://www.usb.org)
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod descriptors;
pub mod fields;

/// Configuration attributes from the bmAttributes bitmap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConfigAttributes {
    /// Device is self powered
    SelfPowered,
    /// Device supports remote wakeup
    RemoteWakeup,
    /// Device is battery powered (OTG)
    BatteryPowered,
}

impl ConfigAttributes {
    /// Decode the set attributes of a configuration bmAttributes
    ///
    /// ```
    /// use uvcscan::usb::ConfigAttributes;
    ///
    /// assert_eq!(ConfigAttributes::from_bitmap(0xe0), vec![ConfigAttributes::SelfPowered, ConfigAttributes::RemoteWakeup]);
    /// assert!(ConfigAttributes::from_bitmap(0x80).is_empty());
    /// ```
    pub fn from_bitmap(bitmap: u8) -> Vec<ConfigAttributes> {
        let mut ret = Vec::new();
        if bitmap & 0x40 != 0 {
            ret.push(ConfigAttributes::SelfPowered);
        }
        if bitmap & 0x20 != 0 {
            ret.push(ConfigAttributes::RemoteWakeup);
        }
        if bitmap & 0x10 != 0 {
            ret.push(ConfigAttributes::BatteryPowered);
        }
        ret
    }
}

impl fmt::Display for ConfigAttributes {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigAttributes::SelfPowered => write!(f, "Self Powered"),
            ConfigAttributes::RemoteWakeup => write!(f, "Remote Wakeup"),
            ConfigAttributes::BatteryPowered => write!(f, "Battery Powered"),
        }
    }
}

/// USB class code defines [ref](https://www.usb.org/defined-class-codes)
#[derive(Debug, Default, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[allow(missing_docs)]
pub enum ClassCode {
    #[default]
    UseInterfaceDescriptor,
    Audio,
    CDCCommunications,
    HID,
    Physical,
    Image,
    Printer,
    MassStorage,
    Hub,
    CDCData,
    SmartCart,
    ContentSecurity,
    Video,
    PersonalHealthcare,
    AudioVideo,
    Billboard,
    USBTypeCBridge,
    I3CDevice,
    Diagnostic,
    WirelessController,
    Miscellaneous,
    ApplicationSpecific,
    VendorSpecific,
}

impl From<u8> for ClassCode {
    fn from(b: u8) -> ClassCode {
        match b {
            0 => ClassCode::UseInterfaceDescriptor,
            1 => ClassCode::Audio,
            2 => ClassCode::CDCCommunications,
            3 => ClassCode::HID,
            5 => ClassCode::Physical,
            6 => ClassCode::Image,
            7 => ClassCode::Printer,
            8 => ClassCode::MassStorage,
            9 => ClassCode::Hub,
            0x0a => ClassCode::CDCData,
            0x0b => ClassCode::SmartCart,
            0x0d => ClassCode::ContentSecurity,
            0x0e => ClassCode::Video,
            0x0f => ClassCode::PersonalHealthcare,
            0x10 => ClassCode::AudioVideo,
            0x11 => ClassCode::Billboard,
            0x12 => ClassCode::USBTypeCBridge,
            0x3c => ClassCode::I3CDevice,
            0xdc => ClassCode::Diagnostic,
            0xe0 => ClassCode::WirelessController,
            0xef => ClassCode::Miscellaneous,
            0xfe => ClassCode::ApplicationSpecific,
            0xff => ClassCode::VendorSpecific,
            _ => ClassCode::UseInterfaceDescriptor,
        }
    }
}

impl fmt::Display for ClassCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        // lsusb style
        if f.alternate() {
            match self {
                ClassCode::UseInterfaceDescriptor => write!(f, "[unknown]"),
                ClassCode::CDCCommunications => write!(f, "Communications"),
                ClassCode::CDCData => write!(f, "CDC Data"),
                ClassCode::HID => write!(f, "Human Interface Device"),
                ClassCode::VendorSpecific => write!(f, "Vendor Specific Class"),
                _ => write!(f, "{}", heck::AsTitleCase(format!("{:?}", self))),
            }
        } else {
            write!(f, "{}", heck::AsKebabCase(format!("{:?}", self)))
        }
    }
}

/// Transfer and endpoint directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Direction for write (host to device) transfers.
    Out,
    /// Direction for read (device to host) transfers.
    In,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Direction::Out => write!(f, "OUT"),
            Direction::In => write!(f, "IN"),
        }
    }
}

/// An endpoint's transfer type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransferType {
    /// Control endpoint.
    Control,
    /// Isochronous endpoint.
    Isochronous,
    /// Bulk endpoint.
    Bulk,
    /// Interrupt endpoint.
    Interrupt,
}

impl From<u8> for TransferType {
    fn from(attributes: u8) -> Self {
        match attributes & 0x03 {
            0 => TransferType::Control,
            1 => TransferType::Isochronous,
            2 => TransferType::Bulk,
            _ => TransferType::Interrupt,
        }
    }
}

impl fmt::Display for TransferType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Isochronous synchronization mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SyncType {
    /// No synchronisation.
    NoSync,
    /// Asynchronous.
    Asynchronous,
    /// Adaptive.
    Adaptive,
    /// Synchronous.
    Synchronous,
}

impl From<u8> for SyncType {
    fn from(attributes: u8) -> Self {
        match (attributes >> 2) & 0x03 {
            0 => SyncType::NoSync,
            1 => SyncType::Asynchronous,
            2 => SyncType::Adaptive,
            _ => SyncType::Synchronous,
        }
    }
}

/// Isochronous usage type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UsageType {
    /// Data endpoint.
    Data,
    /// Feedback endpoint.
    Feedback,
    /// Explicit feedback data endpoint.
    FeedbackData,
    /// Reserved.
    Reserved,
}

impl From<u8> for UsageType {
    fn from(attributes: u8) -> Self {
        match (attributes >> 4) & 0x03 {
            0 => UsageType::Data,
            1 => UsageType::Feedback,
            2 => UsageType::FeedbackData,
            _ => UsageType::Reserved,
        }
    }
}

/// Address of an endpoint: number in bits 0..3, direction in bit 7
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EndpointAddress {
    /// Raw bEndpointAddress
    pub address: u8,
    /// Endpoint number
    pub number: u8,
    /// Transfer direction
    pub direction: Direction,
}

impl From<u8> for EndpointAddress {
    fn from(b: u8) -> Self {
        EndpointAddress {
            address: b,
            number: b & 0x0f,
            direction: if b & 0x80 == 0 {
                Direction::Out
            } else {
                Direction::In
            },
        }
    }
}

impl From<EndpointAddress> for u8 {
    fn from(addr: EndpointAddress) -> Self {
        addr.address
    }
}

impl fmt::Display for EndpointAddress {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "0x{:02x}  EP {} {}", self.address, self.number, self.direction)
    }
}

/// Binary coded decimal version such as bcdUVC: major.minor.sub-minor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Version(pub u8, pub u8, pub u8);

impl Version {
    /// From the BCD encoding [MM.mP]
    ///
    /// ```
    /// use uvcscan::usb::Version;
    ///
    /// assert_eq!(Version::from_bcd(0x0110), Version(1, 1, 0));
    /// assert_eq!(Version::from_bcd(0x0100), Version(1, 0, 0));
    /// ```
    pub fn from_bcd(mut value: u16) -> Self {
        let sub_minor: u8 = (value & 0xf) as u8;
        value >>= 4;
        let minor: u8 = (value & 0xf) as u8;
        value >>= 4;
        let mut major: u8 = (value & 0xf) as u8;
        value >>= 4;
        major += (10 * (value & 0xf)) as u8;
        Version(major, minor, sub_minor)
    }
}

impl From<Version> for u16 {
    fn from(v: Version) -> Self {
        let major = ((v.0 / 10) as u16) << 12 | ((v.0 % 10) as u16) << 8;
        major | (v.1 as u16) << 4 | v.2 as u16
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:x}.{:x}{:x}", self.0, self.1, self.2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_address() {
        let addr = EndpointAddress::from(0x81);
        assert_eq!(addr.number, 1);
        assert_eq!(addr.direction, Direction::In);
        assert_eq!(u8::from(addr), 0x81);

        let addr = EndpointAddress::from(0x02);
        assert_eq!(addr.number, 2);
        assert_eq!(addr.direction, Direction::Out);
    }

    #[test]
    fn test_transfer_attributes() {
        // isochronous, asynchronous, data
        assert_eq!(TransferType::from(0x05), TransferType::Isochronous);
        assert_eq!(SyncType::from(0x05), SyncType::Asynchronous);
        assert_eq!(UsageType::from(0x05), UsageType::Data);
        assert_eq!(TransferType::from(0x03), TransferType::Interrupt);
        assert_eq!(UsageType::from(0x11), UsageType::Feedback);
    }

    #[test]
    fn test_version_bcd() {
        for bcd in [0x0100, 0x010a, 0x0110, 0x0150, 0x0200] {
            assert_eq!(u16::from(Version::from_bcd(bcd)), bcd);
        }
        assert_eq!(Version::from_bcd(0x0150).to_string(), "1.50");
    }

    #[test]
    fn test_class_code() {
        assert_eq!(ClassCode::from(0x0e), ClassCode::Video);
        assert_eq!(ClassCode::from(0xff), ClassCode::VendorSpecific);
        assert_eq!(format!("{:#}", ClassCode::Video), "Video");
        assert_eq!(format!("{}", ClassCode::VendorSpecific), "vendor-specific");
    }
}
