use std::{error, fmt, io};

/// Error constructing a `CanId` or `CanFrame` from invalid parts.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ConstructionError {
    /// The address does not fit the requested frame format.
    IdTooLarge,

    /// More than 8 bytes of payload were supplied.
    TooMuchData,
}

impl fmt::Display for ConstructionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ConstructionError::IdTooLarge => write!(f, "CAN ID too large for frame format"),
            ConstructionError::TooMuchData => write!(f, "payload is larger than 8 bytes"),
        }
    }
}

impl error::Error for ConstructionError {}

/// Errors returned by `CanTransport` operations.
///
/// The first three variants are precondition failures and are always
/// reported before any I/O takes place.
#[derive(Debug)]
pub enum TransportError {
    /// The identifier has the error flag set or its address does not fit the
    /// frame format.
    InvalidId,

    /// The payload is longer than 8 bytes.
    DataTooLong,

    /// The receive buffer is shorter than 8 bytes.
    BufferTooSmall,

    /// The underlying socket failed (open, read, write or setsockopt).
    Io(io::Error),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            TransportError::InvalidId => write!(
                f,
                "invalid CAN ID (error flag set or address out of range for the frame format)"
            ),
            TransportError::DataTooLong => write!(f, "data length cannot exceed 8 bytes"),
            TransportError::BufferTooSmall => write!(f, "read buffer must hold at least 8 bytes"),
            TransportError::Io(ref e) => write!(f, "CAN socket I/O error: {}", e),
        }
    }
}

impl error::Error for TransportError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            TransportError::Io(ref e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for TransportError {
    fn from(e: io::Error) -> TransportError {
        TransportError::Io(e)
    }
}

/// Frame construction failures map onto the transport's precondition errors.
impl From<ConstructionError> for TransportError {
    fn from(e: ConstructionError) -> TransportError {
        match e {
            ConstructionError::IdTooLarge => TransportError::InvalidId,
            ConstructionError::TooMuchData => TransportError::DataTooLong,
        }
    }
}
