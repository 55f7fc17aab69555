use crate::constants::{EFF_FLAG, RTR_FLAG};
use crate::id::CanId;

/// CanFilter
///
/// Contains an internal id and mask. Packets are considered to be matched by
/// a filter if `received_id & mask == filter_id & mask` holds true.
///
/// Layout matches `struct can_filter`, it is handed to `setsockopt` as is.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(C)]
pub struct CanFilter {
    _id: u32,
    _mask: u32,
}

impl CanFilter {
    /// Construct a new CAN filter.
    pub fn new(id: u32, mask: u32) -> CanFilter {
        CanFilter { _id: id, _mask: mask }
    }

    /// Filter accepting frames addressed like `id`.
    ///
    /// The mask covers the id bits plus the EFF and RTR flags, so frame
    /// format and remote requests must match while the error flag is ignored.
    pub fn for_id(id: CanId) -> CanFilter {
        CanFilter::new(id.raw(), id.raw() | EFF_FLAG | RTR_FLAG)
    }

    #[inline]
    pub fn id(&self) -> u32 {
        self._id
    }

    #[inline]
    pub fn mask(&self) -> u32 {
        self._mask
    }

    /// Evaluate the filter the way the kernel does.
    #[inline]
    pub fn matches(&self, id: CanId) -> bool {
        id.raw() & self._mask == self._id & self._mask
    }
}
