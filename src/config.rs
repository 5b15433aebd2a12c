//! Config for uvcscan binary
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use crate::display::PrintSettings;
use crate::error::{Error, ErrorKind, Result};
use crate::uvc::ControlMatcher;

const CONF_DIR: &str = "uvcscan";
const CONF_NAME: &str = "uvcscan.json";

/// Scan and display settings; command line flags override these
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields, default)]
pub struct Config {
    /// Accept vendor specific class (0xff) interfaces with the Video Control subclass
    pub vendor_video_control: bool,
    /// Disable coloured output, can also use NO_COLOR environment variable
    pub no_colour: bool,
    /// Do not print extra class/vendor descriptor bytes in the tree
    pub hide_extra: bool,
}

impl Config {
    /// Default new
    pub fn new() -> Config {
        Config {
            ..Default::default()
        }
    }

    /// Get example [`Config`]
    pub fn example() -> Config {
        Config {
            vendor_video_control: true,
            hide_extra: true,
            ..Default::default()
        }
    }

    /// Default location, `uvcscan/uvcscan.json` in the platform config directory
    pub fn sys_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(CONF_DIR).join(CONF_NAME))
    }

    /// Read from [`Config::sys_path`] if it exists, else default
    pub fn sys() -> Result<Config> {
        match Self::sys_path() {
            Some(p) if p.exists() => {
                log::info!("Using system config {:?}", p);
                Config::from_file(p)
            }
            _ => Ok(Config::new()),
        }
    }

    /// Attempt to read from .json format config at `file_path`
    pub fn from_file<P: AsRef<Path>>(file_path: P) -> Result<Config> {
        let f = File::open(file_path.as_ref())?;
        let mut br = BufReader::new(f);
        let mut data = String::new();

        br.read_to_string(&mut data)?;
        serde_json::from_str::<Config>(&data).map_err(|e| {
            Error::new(
                ErrorKind::Config,
                &format!(
                    "Failed to parse config at {:?}; {}",
                    file_path.as_ref(),
                    e
                ),
            )
        })
    }

    /// [`ControlMatcher`] for these settings
    pub fn control_matcher(&self) -> ControlMatcher {
        ControlMatcher {
            vendor_quirk: self.vendor_video_control,
        }
    }

    /// [`PrintSettings`] for these settings
    pub fn print_settings(&self) -> PrintSettings {
        PrintSettings {
            no_colour: self.no_colour,
            hide_extra: self.hide_extra,
        }
    }
}
