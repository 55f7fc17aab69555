//! Raw SocketCAN transport.
//!
//! The Linux kernel supports using CAN-devices through a network-like API
//! (see https://www.kernel.org/doc/Documentation/networking/can.txt). This
//! crate sends and receives classic CAN frames over a single `CAN_RAW`
//! socket bound to one interface, without having to wrestle libc calls.
//!
//! # An introduction to CAN
//!
//! The CAN bus was originally designed to allow microcontrollers inside a
//! vehicle to communicate over a single shared bus. Messages called
//! *frames* are multicast to all devices on the bus.
//!
//! Every frame consists of an ID and a payload of up to 8 bytes. The ID is
//! either a standard 11 bit or an extended 29 bit address, plus flags for
//! remote transmission requests and error frames. Anyone connected to the bus
//! can read or write any frame; the ID only tells receivers what the frame is
//! about.
//!
//! # Usage
//!
//! ```no_run
//! use canraw::{CanId, CanTransport};
//!
//! let id = CanId::standard(0x123)?;
//! let mut bus = CanTransport::open("vcan0")?;
//! bus.set_filter(id)?;
//! bus.write_frame(&[0xde, 0xad, 0xbe, 0xef], id)?;
//!
//! let mut buf = [0u8; 8];
//! let (valid, len, id) = bus.try_read_frame(&mut buf)?;
//! if valid {
//!     println!("{:X}: {:?}", id, &buf[..len]);
//! }
//! # Ok::<(), canraw::TransportError>(())
//! ```
//!
//! # RawFd
//!
//! Raw access to the underlying file descriptor is available through the
//! `AsRawFd` and `IntoRawFd` implementations of `CanSocket`.

mod config;
mod constants;
mod errors;
mod filter;
mod frame;
mod id;
mod socket;
mod transport;
pub mod util;


pub use crate::config::{Config, ENV_INTERFACE, ENV_READ_TIMEOUT_MS, ENV_WRITE_TIMEOUT_MS};
pub use crate::constants::{
    CAN_MTU, DEFAULT_INTERFACE, EFF_FLAG, EFF_MASK, ERR_FLAG, MAX_DATA_LEN, RTR_FLAG, SFF_MASK,
};
pub use crate::errors::{ConstructionError, TransportError};
pub use crate::filter::CanFilter;
pub use crate::frame::CanFrame;
pub use crate::id::CanId;
pub use crate::socket::{CanIo, CanSocket};
pub use crate::transport::CanTransport;
pub use crate::util::ShouldRetry;
