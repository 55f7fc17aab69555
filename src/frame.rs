use std::fmt;

use itertools::Itertools;

use crate::constants::*;
use crate::errors::ConstructionError;
use crate::id::CanId;

/// CanFrame
///
/// A classic CAN frame as exchanged with a `CAN_RAW` socket. The kernel
/// presents it as `struct can_frame`; the mapping to and from those 16 bytes
/// is done explicitly by `to_bytes` and `from_bytes`:
///
/// | offset | size | field                               |
/// |--------|------|-------------------------------------|
/// | 0      | 4    | `can_id`, native byte order         |
/// | 4      | 1    | data length                         |
/// | 5      | 3    | padding / reserved, zero on write   |
/// | 8      | 8    | data, zero filled past the length   |
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CanFrame {
    id: CanId,
    /// data length. Bytes beyond are not valid. Kept as received, so it may
    /// exceed 8 for frames read off the wire.
    len: u8,
    data: [u8; MAX_DATA_LEN],
}

const ID_OFFSET: usize = 0;
const LEN_OFFSET: usize = 4;
const DATA_OFFSET: usize = 8;

impl CanFrame {
    /// Build a frame carrying `data`, zero filling the unused part.
    pub fn new(id: CanId, data: &[u8]) -> Result<CanFrame, ConstructionError> {
        if data.len() > MAX_DATA_LEN {
            return Err(ConstructionError::TooMuchData);
        }

        let mut full_data = [0; MAX_DATA_LEN];
        full_data[..data.len()].copy_from_slice(data);

        Ok(CanFrame {
            id,
            len: data.len() as u8,
            data: full_data,
        })
    }

    #[inline]
    pub fn id(&self) -> CanId {
        self.id
    }

    /// Length as stored in the frame, not clamped.
    #[inline]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// A slice into the actual data. Slice will always be <= 8 bytes in length
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data[..self.len().min(MAX_DATA_LEN)]
    }

    /// A frame is valid if its length fits the data region and its id is valid.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.len() <= MAX_DATA_LEN && self.id.is_valid()
    }

    /// Serialize into the kernel's `struct can_frame` layout.
    pub fn to_bytes(&self) -> [u8; CAN_MTU] {
        let mut buf = [0u8; CAN_MTU];
        buf[ID_OFFSET..LEN_OFFSET].copy_from_slice(&self.id.raw().to_ne_bytes());
        buf[LEN_OFFSET] = self.len;
        buf[DATA_OFFSET..].copy_from_slice(&self.data);
        buf
    }

    /// Decode a `struct can_frame`. Reserved bytes 5..8 are ignored.
    ///
    /// Never fails: whether the result is usable is answered by `is_valid`.
    pub fn from_bytes(buf: &[u8; CAN_MTU]) -> CanFrame {
        let mut raw_id = [0u8; 4];
        raw_id.copy_from_slice(&buf[ID_OFFSET..LEN_OFFSET]);

        let mut data = [0u8; MAX_DATA_LEN];
        data.copy_from_slice(&buf[DATA_OFFSET..]);

        CanFrame {
            id: CanId::from_raw(u32::from_ne_bytes(raw_id)),
            len: buf[LEN_OFFSET],
            data,
        }
    }
}

impl fmt::UpperHex for CanFrame {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        write!(f, "{:X}#", self.id)?;

        let mut parts = self.data().iter().map(|v| format!("{:02X}", v));

        let sep = if f.alternate() { " " } else { "" };
        write!(f, "{}", parts.join(sep))
    }
}
