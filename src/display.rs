//! Text rendering of parsed descriptors: the configuration tree, the video scan and a flat
//! dump of raw blocks
//!
//! Render functions return lines so they can be checked or joined; the print functions write
//! them to stdout.
use colored::*;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::usb::descriptors::video::{
    FormatDescriptor, FrameDescriptor, FrameIntervals, StillFrameDescriptor,
};
use crate::usb::descriptors::{
    AltSetting, Configuration, DescriptorData, DescriptorIter, Endpoint,
};
use crate::usb::{EndpointAddress, TransferType};
use crate::uvc::{DeviceInfo, StreamingInterface};

// utf-8 boxes for drawing tree
const EDGE: &str = "\u{251c}\u{2500}\u{2500} "; // "├── "
const LINE: &str = "\u{2502}   "; // "│   "
const CORNER: &str = "\u{2514}\u{2500}\u{2500} "; // "└── "
const BLANK: &str = "    "; // should be same char width as above

/// Extra blobs longer than this are cut short in the tree
const MAX_EXTRA_BYTES: usize = 32;
/// Width of the type column in [`render_raw`]; "Other Speed Configuration" is the longest
pub const RAW_NAME_WIDTH: usize = 25;

/// Kinds of value printed, each with its own colour
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Blocks {
    /// Node name: Configuration, Interface, Format...
    Name,
    /// Interface, format and frame numbers
    Number,
    /// Class triplet
    Class,
    /// Endpoint address
    Address,
    /// Transfer type and direction
    Transfer,
    /// Sizes, resolutions and rates
    Size,
    /// Format GUID and FourCC
    Guid,
    /// Extra and raw bytes
    Bytes,
    /// Descriptor type names in the raw view
    Type,
    /// Soft warnings such as truncation
    Warning,
}

impl Blocks {
    /// Colour `s` for the block kind
    pub fn colour(&self, s: &str) -> ColoredString {
        match self {
            Blocks::Name => s.bold().blue(),
            Blocks::Number => s.cyan(),
            Blocks::Class => s.green(),
            Blocks::Address => s.bold().yellow(),
            Blocks::Transfer => s.purple(),
            Blocks::Size => s.magenta(),
            Blocks::Guid => s.yellow(),
            Blocks::Bytes => s.dimmed(),
            Blocks::Type => s.bold().green(),
            Blocks::Warning => s.red(),
        }
    }
}

/// Passed to render functions
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintSettings {
    /// No ANSI colour in output
    pub no_colour: bool,
    /// Skip extra class/vendor bytes in the tree
    pub hide_extra: bool,
}

impl PrintSettings {
    fn paint(&self, block: Blocks, s: &str) -> String {
        if self.no_colour {
            s.to_string()
        } else {
            block.colour(s).to_string()
        }
    }
}

/// Passed to render functions to support tree building
#[derive(Debug, Default, Clone)]
pub struct TreeData {
    /// Length of the branch sitting on
    branch_length: usize,
    /// Depth of tree being built
    depth: usize,
    /// Prefix to apply, builds up as depth increases
    prefix: String,
}

impl TreeData {
    /// Prefix for the item at `index` on this branch
    fn item_prefix(&self, index: usize) -> String {
        if self.depth == 0 {
            self.prefix.clone()
        } else if index + 1 != self.branch_length {
            format!("{}{}", self.prefix, EDGE)
        } else {
            format!("{}{}", self.prefix, CORNER)
        }
    }
}

fn generate_tree_data(current_tree: &TreeData, branch_length: usize, index: usize) -> TreeData {
    let mut pass_tree = current_tree.clone();

    pass_tree.prefix = if pass_tree.depth > 0 {
        if index + 1 != pass_tree.branch_length {
            format!("{}{}", pass_tree.prefix, LINE)
        } else {
            format!("{}{}", pass_tree.prefix, BLANK)
        }
    } else {
        pass_tree.prefix.to_string()
    };

    pass_tree.depth += 1;
    pass_tree.branch_length = branch_length;

    pass_tree
}

/// A rendered line and the nodes under it
struct Node {
    text: String,
    children: Vec<Node>,
}

impl Node {
    fn leaf(text: String) -> Self {
        Node {
            text,
            children: Vec::new(),
        }
    }

    fn render(&self, tree: &TreeData, index: usize, ret: &mut Vec<String>) {
        ret.push(format!("{}{}", tree.item_prefix(index), self.text));
        let branch = generate_tree_data(tree, self.children.len(), index);
        for (i, child) in self.children.iter().enumerate() {
            child.render(&branch, i, ret);
        }
    }
}

fn hex_bytes(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).join(" ")
}

fn extra_node(extra: &DescriptorData, settings: &PrintSettings) -> Option<Node> {
    if settings.hide_extra || extra.is_empty() {
        return None;
    }

    let shown = &extra.as_slice()[..extra.len().min(MAX_EXTRA_BYTES)];
    let more = if extra.len() > MAX_EXTRA_BYTES { " ..." } else { "" };

    Some(Node::leaf(format!(
        "extra {} bytes: {}{}",
        extra.len(),
        settings.paint(Blocks::Bytes, &hex_bytes(shown)),
        more
    )))
}

fn transfer_string(endpoint: &Endpoint, address: &EndpointAddress) -> String {
    let transfer_type = endpoint.transfer_type();
    match transfer_type {
        TransferType::Isochronous => format!(
            "{} {} {:?} {:?}",
            address.direction,
            transfer_type,
            endpoint.sync_type(),
            endpoint.usage_type()
        ),
        _ => format!("{} {}", address.direction, transfer_type),
    }
}

fn endpoint_node(endpoint: &Endpoint, settings: &PrintSettings) -> Node {
    let address = EndpointAddress::from(endpoint.address);
    let mut text = format!(
        "{} {} {} {}",
        settings.paint(Blocks::Name, "EP"),
        settings.paint(Blocks::Address, &format!("0x{:02x}", endpoint.address)),
        settings.paint(Blocks::Transfer, &transfer_string(endpoint, &address)),
        settings.paint(
            Blocks::Size,
            &format!(
                "{}x{} bytes interval {}",
                endpoint.transactions(),
                endpoint.packet_size(),
                endpoint.interval
            )
        ),
    );
    if let (Some(refresh), Some(synch)) = (endpoint.refresh, endpoint.synch_address) {
        text.push_str(&format!(" refresh {} synch 0x{:02x}", refresh, synch));
    }

    Node {
        text,
        children: extra_node(&endpoint.extra, settings).into_iter().collect(),
    }
}

fn alt_setting_node(alt: &AltSetting, settings: &PrintSettings) -> Node {
    let text = format!(
        "{} {} alt {}: {} {} {} endpoints",
        settings.paint(Blocks::Name, "Interface"),
        settings.paint(Blocks::Number, &alt.interface_number.to_string()),
        settings.paint(Blocks::Number, &alt.alternate_setting.to_string()),
        settings.paint(Blocks::Class, &format!("{:#}", alt.class_code())),
        settings.paint(
            Blocks::Class,
            &format!(
                "[0x{:02x} 0x{:02x} 0x{:02x}]",
                alt.class, alt.sub_class, alt.protocol
            )
        ),
        alt.num_endpoints,
    );

    let mut children: Vec<Node> = extra_node(&alt.extra, settings).into_iter().collect();
    children.extend(alt.endpoints.iter().map(|e| endpoint_node(e, settings)));

    Node { text, children }
}

/// Lines of the configuration tree
pub fn render_configuration(config: &Configuration, settings: &PrintSettings) -> Vec<String> {
    let attributes = config.attributes().iter().join(", ");
    let text = format!(
        "{} {}: {} interfaces, total {} bytes, {}{}",
        settings.paint(Blocks::Name, "Configuration"),
        settings.paint(Blocks::Number, &config.configuration_value.to_string()),
        config.num_interfaces,
        config.total_length,
        settings.paint(Blocks::Size, &format!("{} mA", config.max_power_ma())),
        if attributes.is_empty() {
            String::new()
        } else {
            format!(", {}", attributes)
        }
    );

    let mut children: Vec<Node> = extra_node(&config.extra, settings).into_iter().collect();
    children.extend(config.alt_settings().map(|a| alt_setting_node(a, settings)));

    let mut ret = Vec::new();
    Node { text, children }.render(&TreeData::default(), 0, &mut ret);
    ret
}

fn intervals_string(frame: &FrameDescriptor) -> String {
    match &frame.intervals {
        FrameIntervals::Continuous { min, max, step } => {
            format!("{}..{} step {}", min, max, step)
        }
        FrameIntervals::Discrete(intervals) => {
            format!("[{}]", intervals.iter().join(", "))
        }
    }
}

fn frame_node(frame: &FrameDescriptor, settings: &PrintSettings) -> Node {
    Node::leaf(format!(
        "{} {}: {} {} intervals {}",
        settings.paint(Blocks::Name, "Frame"),
        settings.paint(Blocks::Number, &frame.frame_index.to_string()),
        settings.paint(Blocks::Size, &format!("{}x{}", frame.width, frame.height)),
        frame
            .default_fps()
            .map(|fps| settings.paint(Blocks::Size, &format!("{:.2} fps", fps)))
            .unwrap_or_default(),
        intervals_string(frame)
    ))
}

fn still_node(still: &StillFrameDescriptor, settings: &PrintSettings) -> Node {
    Node::leaf(format!(
        "{} EP 0x{:02x}: {} compression [{}]",
        settings.paint(Blocks::Name, "Still"),
        still.endpoint_address,
        settings.paint(
            Blocks::Size,
            &still
                .image_size_patterns
                .iter()
                .map(|r| format!("{}x{}", r.width, r.height))
                .join(", ")
        ),
        hex_bytes(&still.compression_patterns)
    ))
}

fn format_node(format: &FormatDescriptor, settings: &PrintSettings) -> Node {
    let text = format!(
        "{} {}: {:#} {} {} {} bpp default frame {}",
        settings.paint(Blocks::Name, "Format"),
        settings.paint(Blocks::Number, &format.format_index.to_string()),
        format.subtype,
        settings.paint(Blocks::Guid, &format.fourcc().unwrap_or_default()),
        settings.paint(Blocks::Guid, &format.guid_format.to_string()),
        format.bits_per_pixel,
        format.default_frame_index
    );

    let mut children: Vec<Node> = format
        .frames
        .iter()
        .map(|f| frame_node(f, settings))
        .collect();
    children.extend(format.still_frames.iter().map(|s| still_node(s, settings)));

    Node { text, children }
}

fn streaming_node(stream: &StreamingInterface, settings: &PrintSettings) -> Node {
    Node {
        text: format!(
            "{} {}: {} {} terminal {} still method {}",
            settings.paint(Blocks::Name, "Streaming interface"),
            settings.paint(Blocks::Number, &stream.interface_number.to_string()),
            settings.paint(Blocks::Name, "EP"),
            settings.paint(Blocks::Address, &format!("0x{:02x}", stream.endpoint_address)),
            stream.terminal_link,
            stream.still_capture_method
        ),
        children: stream
            .formats
            .iter()
            .map(|f| format_node(f, settings))
            .collect(),
    }
}

/// Lines of the video scan
pub fn render_device_info(info: &DeviceInfo, settings: &PrintSettings) -> Vec<String> {
    let control = &info.control;
    let text = format!(
        "{} {}: interface {}{}{}",
        settings.paint(Blocks::Name, "UVC"),
        settings.paint(Blocks::Number, &control.version.to_string()),
        settings.paint(Blocks::Number, &control.interface_number.to_string()),
        control
            .clock_frequency
            .map(|c| format!(
                ", clock {}",
                settings.paint(Blocks::Size, &format!("{} Hz", c))
            ))
            .unwrap_or_default(),
        control
            .endpoint_address
            .map(|a| format!(
                ", status EP {}",
                settings.paint(Blocks::Address, &format!("0x{:02x}", a))
            ))
            .unwrap_or_default()
    );

    let children = info
        .streaming
        .iter()
        .map(|s| streaming_node(s, settings))
        .collect();

    let mut ret = Vec::new();
    Node { text, children }.render(&TreeData::default(), 0, &mut ret);
    ret
}

/// One line per length-prefixed block of `buffer` with its offset and bytes
pub fn render_raw(buffer: &[u8], settings: &PrintSettings) -> Vec<String> {
    let mut ret = Vec::new();

    for desc in DescriptorIter::new(buffer) {
        match desc {
            Ok(d) => {
                let name = format!(
                    "{}{}",
                    d.descriptor_type,
                    d.subtype()
                        .map(|s| format!("/0x{:02x}", s))
                        .unwrap_or_default()
                );
                ret.push(format!(
                    "0x{:04x} {} {}",
                    d.offset,
                    settings.paint(Blocks::Type, &format!("{:<w$}", name, w = RAW_NAME_WIDTH)),
                    settings.paint(Blocks::Bytes, &hex_bytes(d.data))
                ))
            }
            Err(e) => ret.push(settings.paint(Blocks::Warning, &format!("{:#}", e))),
        }
    }

    ret
}

/// Print the configuration tree
pub fn print_configuration(config: &Configuration, settings: &PrintSettings) {
    log::debug!("Print configuration settings {:?}", settings);
    for line in render_configuration(config, settings) {
        println!("{}", line);
    }
}

/// Print the video scan
pub fn print_device_info(info: &DeviceInfo, settings: &PrintSettings) {
    for line in render_device_info(info, settings) {
        println!("{}", line);
    }
}

/// Print raw blocks of `buffer`
pub fn print_raw(buffer: &[u8], settings: &PrintSettings) {
    for line in render_raw(buffer, settings) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usb::descriptors::parse_configuration;

    fn plain() -> PrintSettings {
        PrintSettings {
            no_colour: true,
            hide_extra: false,
        }
    }

    const BUF: [u8; 31] = [
        0x09, 0x02, 0x1f, 0x00, 0x02, 0x01, 0x00, 0xc0, 0x32, 0x09, 0x04, 0x00, 0x00, 0x01, 0xff,
        0x00, 0x00, 0x00, 0x07, 0x05, 0x81, 0x02, 0x00, 0x02, 0x00, 0x09, 0x04, 0x01, 0x00, 0x00,
        0x03,
    ];

    #[test]
    fn test_render_configuration_tree() {
        // declares two interfaces, slice holds only the first
        let (config, _) = parse_configuration(&BUF[..25]).unwrap();
        let lines = render_configuration(&config, &plain());
        assert_eq!(
            lines,
            vec![
                "Configuration 1: 1 interfaces, total 31 bytes, 100 mA, Self Powered",
                "└── Interface 0 alt 0: Vendor Specific Class [0xff 0x00 0x00] 1 endpoints",
                "    └── EP 0x81 IN Bulk 1x512 bytes interval 0",
            ]
        );
    }

    #[test]
    fn test_render_extra_hidden() {
        let mut buf = BUF[..25].to_vec();
        buf.extend_from_slice(&[0x04, 0x25, 0x01, 0x00]);
        let (config, _) = parse_configuration(&buf).unwrap();
        let lines = render_configuration(&config, &plain());
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[3], "        └── extra 4 bytes: 04 25 01 00");

        let settings = PrintSettings {
            hide_extra: true,
            ..plain()
        };
        assert_eq!(render_configuration(&config, &settings).len(), 3);
    }

    #[test]
    fn test_render_raw() {
        let lines = render_raw(&BUF[..25], &plain());
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            format!(
                "0x0000 {:<25} 09 02 1f 00 02 01 00 c0 32",
                "Config"
            )
        );
        assert_eq!(
            lines[2],
            format!("0x0012 {:<25} 07 05 81 02 00 02 00", "Endpoint")
        );

        // subtype only for class specific blocks
        let mut buf = BUF[..25].to_vec();
        buf.extend_from_slice(&[0x08, 0x0b, 0x00, 0x02, 0x0e, 0x03, 0x00, 0x02]);
        buf.extend_from_slice(&[0x05, 0x25, 0x03, 0x10, 0x00]);
        let lines = render_raw(&buf, &plain());
        assert_eq!(
            lines[3],
            format!(
                "0x0019 {:<25} 08 0b 00 02 0e 03 00 02",
                "Interface Association"
            )
        );
        assert_eq!(
            lines[4],
            format!("0x0021 {:<25} 05 25 03 10 00", "Cs Endpoint/0x03")
        );

        // last block runs past the end
        let lines = render_raw(&BUF[..28], &plain());
        assert_eq!(lines.len(), 4);
        assert!(lines[3].contains("offset 25"));
    }

    #[test]
    fn test_render_isochronous_endpoint() {
        // asynchronous data, 3x1024
        let mut buf = BUF[..25].to_vec();
        buf[21] = 0x05;
        buf[22] = 0x00;
        buf[23] = 0x14;
        let (config, _) = parse_configuration(&buf).unwrap();
        let lines = render_configuration(&config, &plain());
        assert_eq!(
            lines[2],
            "    └── EP 0x81 IN Isochronous Asynchronous Data 3x1024 bytes interval 0"
        );

        // feedback
        buf[21] = 0x11;
        let (config, _) = parse_configuration(&buf).unwrap();
        assert!(render_configuration(&config, &plain())[2]
            .contains("Isochronous NoSync Feedback"));
    }

    #[test]
    fn test_tree_prefixes() {
        let node = Node {
            text: "root".into(),
            children: vec![
                Node {
                    text: "a".into(),
                    children: vec![Node::leaf("a1".into())],
                },
                Node::leaf("b".into()),
            ],
        };
        let mut ret = Vec::new();
        node.render(&TreeData::default(), 0, &mut ret);
        assert_eq!(ret, vec!["root", "├── a", "│   └── a1", "└── b"]);
    }
}
