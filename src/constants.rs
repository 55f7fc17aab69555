// values from include/uapi/linux/can.h and include/uapi/linux/can/raw.h

/// Address family / protocol family of SocketCAN
pub const AF_CAN: libc::c_int = 29;
pub const PF_CAN: libc::c_int = AF_CAN;

// Protocol of the PF_CAN Family: raw sockets
pub const CAN_RAW: libc::c_int = 1;

pub const SOL_CAN_BASE: libc::c_int = 100;
pub const SOL_CAN_RAW: libc::c_int = SOL_CAN_BASE + CAN_RAW;
pub const CAN_RAW_FILTER: libc::c_int = 1;
pub const CAN_RAW_LOOPBACK: libc::c_int = 3;
pub const CAN_RAW_RECV_OWN_MSGS: libc::c_int = 4;

/// Special address description flags for the CAN_ID
///
/// EFF/SFF is set in the MSB
pub const EFF_FLAG: u32 = 0x80000000;
/// remote transmission request
pub const RTR_FLAG: u32 = 0x40000000;
/// error message frame
pub const ERR_FLAG: u32 = 0x20000000;

/// valid bits in CAN ID for frame formats
/// standard frame format (SFF)
pub const SFF_MASK: u32 = 0x000007ff;
/// extended frame format (EFF)
pub const EFF_MASK: u32 = 0x1fffffff;

/// Size of a classic `struct can_frame` on the wire
pub const CAN_MTU: usize = 16;

/// Maximum payload of a classic CAN frame
pub const MAX_DATA_LEN: usize = 8;

/// Interface bound when no name is given
pub const DEFAULT_INTERFACE: &str = "can0";
