//! Error type used within crate with From for commonly used crate errors
use std::collections::TryReserveError;
use std::error;
use std::{fmt, io};

/// Result type used within crate
pub type Result<T> = std::result::Result<T, Error>;

/// Contained with [`ErrorKind`] to provide more context
#[derive(Debug, PartialEq, Clone)]
pub struct ErrorArg<E, G>
where
    E: fmt::Debug,
    G: fmt::Debug,
{
    expected: E,
    got: G,
}

impl fmt::Display for ErrorArg<usize, usize> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Expected: {}, Got: {}", self.expected, self.got)
    }
}

impl<E, G> ErrorArg<E, G>
where
    E: fmt::Debug,
    G: fmt::Debug,
{
    /// New ErrorArg
    pub fn new(expected: E, got: G) -> ErrorArg<E, G> {
        ErrorArg { expected, got }
    }

    /// The expected value
    pub fn expected(&self) -> &E {
        &self.expected
    }

    /// The actual value
    pub fn got(&self) -> &G {
        &self.got
    }
}

#[derive(Debug, PartialEq, Clone)]
/// Kind of error produced
pub enum ErrorKind {
    /// Descriptor header type or length inconsistent with its position; the buffer is not a valid descriptor there
    Malformed,
    /// Configuration declares more interfaces than [`crate::usb::descriptors::MAX_INTERFACES`]
    TooManyInterfaces,
    /// Interface declares more endpoints than [`crate::usb::descriptors::MAX_ENDPOINTS`]
    TooManyEndpoints,
    /// Allocation for a descriptor node or extra bytes failed
    OutOfMemory,
    /// Video Control header bcdUVC not one the scanner handles
    UnsupportedVersion,
    /// No Video Control interface in the configuration
    NoSuitableInterface,
    /// Frame or still image frame descriptor before any format descriptor
    OrphanFrame,
    /// Invalid arg for method or cli
    InvalidArg,
    /// [`std::io::Error`] probably not found when reading file to parse
    Io,
    /// Error parsing a string into a value - hex dumps and json
    Parsing,
    /// Error parsing config file
    Config,
    /// Error From other crate without enum variant
    Other(&'static str),
    /// Invalid descriptor length for a class specific block
    DescriptorLength(ErrorArg<usize, usize>),
}

#[derive(Debug, PartialEq)]
/// uvcscan error which impl [`std::error`]
pub struct Error {
    /// The [`ErrorKind`]
    pub kind: ErrorKind,
    /// String description
    pub message: String,
}

impl Error {
    /// New error helper
    pub fn new(kind: ErrorKind, message: &str) -> Error {
        Error {
            kind,
            message: message.to_string(),
        }
    }

    /// New error helper for descriptor length
    pub fn new_descriptor_len(name: &str, expected: usize, got: usize) -> Error {
        let error_arg = ErrorArg::new(expected, got);
        Error {
            kind: ErrorKind::DescriptorLength(error_arg),
            message: format!(
                "Invalid descriptor length for {}. Expected: {}, Got {}",
                name, expected, got
            ),
        }
    }

    /// The [`ErrorKind`]
    pub fn kind(&self) -> ErrorKind {
        self.kind.to_owned()
    }

    /// The description
    pub fn message(&self) -> &String {
        &self.message
    }

    /// Whether the error came from the device data rather than the caller or host
    ///
    /// ```
    /// use uvcscan::error::{Error, ErrorKind};
    ///
    /// assert!(Error::new(ErrorKind::OrphanFrame, "").is_descriptor_error());
    /// assert!(!Error::new(ErrorKind::Io, "").is_descriptor_error());
    /// ```
    pub fn is_descriptor_error(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::Malformed
                | ErrorKind::TooManyInterfaces
                | ErrorKind::TooManyEndpoints
                | ErrorKind::UnsupportedVersion
                | ErrorKind::NoSuitableInterface
                | ErrorKind::OrphanFrame
                | ErrorKind::DescriptorLength(_)
        )
    }
}

impl error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if f.alternate() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{:?} Error: {}", self.kind, self.message)
        }
    }
}

impl From<io::Error> for Error {
    fn from(error: io::Error) -> Self {
        Error {
            kind: ErrorKind::Io,
            message: error.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Error {
            kind: ErrorKind::Parsing,
            message: error.to_string(),
        }
    }
}

impl From<TryReserveError> for Error {
    fn from(error: TryReserveError) -> Self {
        Error {
            kind: ErrorKind::OutOfMemory,
            message: error.to_string(),
        }
    }
}

impl From<std::num::ParseIntError> for Error {
    fn from(error: std::num::ParseIntError) -> Self {
        Error {
            kind: ErrorKind::Parsing,
            message: error.to_string(),
        }
    }
}
