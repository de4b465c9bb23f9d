use core::fmt;

/// The error type for packet parsing and construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A packet could not be parsed because it was shorter than assumed.
    ///
    /// The buffer may be shorter than the minimum length of the format, or
    /// shorter than a length one of its own fields claims.
    Truncated,

    /// A packet was recognized but was self-contradictory.
    ///
    /// Example: an IPv4 header whose header length exceeds its total length.
    Malformed,
}

/// The result type for the wire module.
pub type Result<T> = core::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Truncated => write!(f, "truncated packet"),
            Error::Malformed => write!(f, "malformed packet"),
        }
    }
}
