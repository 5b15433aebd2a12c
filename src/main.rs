//! uvcscan binary: parse a captured configuration descriptor dump and print it
use clap::Parser;
use colored::*;
use serde::Serialize;
use std::env;
use std::path::PathBuf;

use uvcscan::config::Config;
use uvcscan::display;
use uvcscan::dump;
use uvcscan::error::Result;
use uvcscan::usb::descriptors::{Configuration, ParseReport};
use uvcscan::uvc::{self, DeviceInfo};

#[derive(Parser, Debug, Default)]
#[command(author, version, about, long_about = None, max_term_width=80)]
struct Args {
    /// Configuration descriptor dump: raw bytes or hex text
    path: PathBuf,

    /// Read the dump as hex text even if it does not look like it
    #[arg(long, default_value_t = false)]
    hex: bool,

    /// Print each descriptor block of the dump without building a tree
    #[arg(long, default_value_t = false)]
    raw: bool,

    /// Output as json format
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Also match vendor specific class interfaces with the Video Control subclass
    #[arg(long, default_value_t = false)]
    vendor_quirk: bool,

    /// Only parse the configuration tree, no video scan
    #[arg(long, default_value_t = false)]
    skip_video: bool,

    /// Do not print extra class/vendor descriptor bytes
    #[arg(long, default_value_t = false)]
    hide_extra: bool,

    /// Disable coloured output, can also use NO_COLOR environment variable
    #[arg(long, default_value_t = false)]
    no_colour: bool,

    /// Path to user config file to use for custom settings
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Turn debugging information on. Alternatively can use RUST_LOG env: INFO, DEBUG, TRACE
    #[arg(short = 'z', long, action = clap::ArgAction::Count)]
    debug: u8,
}

/// What `--json` prints
#[derive(Debug, Serialize)]
struct JsonOutput {
    report: ParseReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    video: Option<VideoOutput>,
}

/// Video scan without the configuration that is already in the report
#[derive(Debug, Serialize)]
struct VideoOutput {
    control: uvc::ControlInterfaceInfo,
    streaming: Vec<uvc::StreamingInterface>,
}

impl From<DeviceInfo> for VideoOutput {
    fn from(info: DeviceInfo) -> Self {
        VideoOutput {
            control: info.control,
            streaming: info.streaming,
        }
    }
}

fn merge_config(args: &Args) -> Result<Config> {
    let mut config = match args.config.as_ref() {
        Some(path) => Config::from_file(path)?,
        None => Config::sys()?,
    };
    log::debug!("Loaded config {:?}", config);

    config.vendor_video_control |= args.vendor_quirk;
    config.no_colour |= args.no_colour || env::var_os("NO_COLOR").is_some();
    config.hide_extra |= args.hide_extra;

    Ok(config)
}

fn run(args: Args) -> Result<()> {
    let config = merge_config(&args)?;
    let settings = config.print_settings();

    if settings.no_colour {
        colored::control::set_override(false);
    }

    let buffer = dump::read_dump(&args.path, args.hex)?;
    log::info!("Read {} bytes from {:?}", buffer.len(), args.path);

    if args.raw {
        display::print_raw(&buffer, &settings);
        return Ok(());
    }

    let report = Configuration::parse(&buffer)?;
    if report.truncated {
        log::warn!("Descriptor data was truncated; counts lowered to what was present");
    }

    let video = if args.skip_video {
        None
    } else {
        Some(uvc::scan_control(
            &report.configuration,
            &config.control_matcher(),
        )?)
    };

    if args.json {
        let output = JsonOutput {
            report,
            video: video.map(VideoOutput::from),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        display::print_configuration(&report.configuration, &settings);
        if let Some(info) = video {
            println!();
            display::print_device_info(&info, &settings);
        }
    }

    Ok(())
}

fn main() {
    let args = Args::parse();

    if let Err(e) = uvcscan::set_log_level(args.debug) {
        eprintln!("{}", e.to_string().red());
    }

    if let Err(e) = run(args) {
        eprintln!("{}", e.to_string().red());
        std::process::exit(1);
    }
}
