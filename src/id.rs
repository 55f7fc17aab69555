use std::fmt;

use crate::constants::*;
use crate::errors::ConstructionError;

/// CanId
///
/// The 32 bit `can_id` word of a kernel frame: the address in the low 29
/// bits and the EFF/RTR/ERR flags in the top three.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct CanId(u32);

impl CanId {
    /// Wrap a raw `can_id` word as found on the wire.
    #[inline]
    pub const fn from_raw(raw: u32) -> CanId {
        CanId(raw)
    }

    /// Build an identifier from its components.
    ///
    /// Addresses wider than 29 bits would spill into the flag bits and are
    /// refused. A standard id with an address above 11 bits is accepted
    /// here and reported by `is_valid`.
    pub fn new(
        address: u32,
        extended: bool,
        rtr: bool,
        err: bool,
    ) -> Result<CanId, ConstructionError> {
        if address > EFF_MASK {
            return Err(ConstructionError::IdTooLarge);
        }

        let mut raw = address;

        if extended {
            raw |= EFF_FLAG;
        }

        if rtr {
            raw |= RTR_FLAG;
        }

        if err {
            raw |= ERR_FLAG;
        }

        Ok(CanId(raw))
    }

    /// Standard (11 bit) identifier with all flags clear. Refuses addresses
    /// above `SFF_MASK`.
    pub fn standard(address: u32) -> Result<CanId, ConstructionError> {
        if address > SFF_MASK {
            return Err(ConstructionError::IdTooLarge);
        }
        CanId::new(address, false, false, false)
    }

    /// Extended (29 bit) identifier. Refuses addresses above `EFF_MASK`.
    #[inline]
    pub fn extended(address: u32) -> Result<CanId, ConstructionError> {
        CanId::new(address, true, false, false)
    }

    #[inline]
    pub fn with_rtr(self, rtr: bool) -> CanId {
        CanId(if rtr { self.0 | RTR_FLAG } else { self.0 & !RTR_FLAG })
    }

    #[inline]
    pub fn with_error(self, err: bool) -> CanId {
        CanId(if err { self.0 | ERR_FLAG } else { self.0 & !ERR_FLAG })
    }

    /// The id word including flag bits.
    #[inline]
    pub fn raw(&self) -> u32 {
        self.0
    }

    /// Address bits (without EFF/RTR/ERR flags).
    ///
    /// Always the full 29 bits, also for standard frames, so that an out of
    /// range standard address stays visible.
    #[inline]
    pub fn address(&self) -> u32 {
        self.0 & EFF_MASK
    }

    /// Check if the id uses 29 bit extended frame format
    #[inline]
    pub fn is_extended(&self) -> bool {
        self.0 & EFF_FLAG != 0
    }

    /// Check if the id marks a remote transmission request
    #[inline]
    pub fn is_rtr(&self) -> bool {
        self.0 & RTR_FLAG != 0
    }

    /// Check if the id marks an error frame
    #[inline]
    pub fn is_error(&self) -> bool {
        self.0 & ERR_FLAG != 0
    }

    /// True if the address has bits set outside the 11 bit standard range.
    #[inline]
    pub fn requires_extended(&self) -> bool {
        self.address() & EFF_MASK != self.address() & SFF_MASK
    }

    /// An id is valid for sending when the error flag is clear and the
    /// address fits the frame format selected by the EFF flag.
    pub fn is_valid(&self) -> bool {
        if self.is_error() {
            return false;
        }

        // every 29 bit address is in range for an extended id
        self.is_extended() || !self.requires_extended()
    }
}

impl From<u32> for CanId {
    fn from(raw: u32) -> CanId {
        CanId(raw)
    }
}

impl From<CanId> for u32 {
    fn from(id: CanId) -> u32 {
        id.0
    }
}

impl fmt::UpperHex for CanId {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        if self.is_extended() {
            write!(f, "{:08X}", self.address())
        } else {
            write!(f, "{:03X}", self.address())
        }
    }
}
