//! Parse USB configuration descriptors into a tree and scan the USB Video Class (UVC)
//! descriptors of cameras within it.
//!
//! The [`usb::descriptors`] tree builder takes the raw bytes a device returns for a
//! configuration descriptor request and tolerates truncated and vendor extended input. The
//! [`uvc`] scanner then interprets the class specific bytes attached to video interfaces.
#![warn(missing_docs)]
use simple_logger::SimpleLogger;

pub mod config;
pub mod display;
pub mod dump;
pub mod error;
pub mod usb;
pub mod uvc;

/// Set uvcscan module and binary log level
pub fn set_log_level(debug: u8) -> crate::error::Result<()> {
    match debug {
        // just use env if not passed
        0 => SimpleLogger::new()
            .with_utc_timestamps()
            .with_level(log::Level::Error.to_level_filter())
            .env(),
        1 => SimpleLogger::new()
            .with_utc_timestamps()
            .with_level(log::Level::Info.to_level_filter()),
        2 => SimpleLogger::new()
            .with_utc_timestamps()
            .with_level(log::Level::Debug.to_level_filter()),
        _ => SimpleLogger::new()
            .with_utc_timestamps()
            .with_level(log::Level::Trace.to_level_filter()),
    }
    .init()
    .map_err(|e| {
        crate::error::Error::new(
            crate::error::ErrorKind::Other("simple_logger"),
            &format!("Failed to set log level: {}", e),
        )
    })?;

    Ok(())
}

// run any Rust code as doctest
#[doc = include_str!("../README.md")]
#[cfg(doctest)]
pub struct ReadmeDoctests;
