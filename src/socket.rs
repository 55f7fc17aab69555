use std::io;
use std::mem::size_of;
use std::os::unix::io::{AsRawFd, IntoRawFd, RawFd};
use std::time;

use log::debug;
use nix::net::if_::if_nametoindex;

use crate::constants::*;
use crate::filter::CanFilter;
use crate::util::{set_socket_option, set_socket_option_mult, timeval_from_duration};

/// Byte level access to a bound CAN socket.
///
/// `CanTransport` talks to the bus only through this trait. Reads and writes
/// may be short; the transport is responsible for completing a frame.
pub trait CanIo {
    /// Read up to `buf.len()` bytes, blocking until at least one is available.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Write up to `buf.len()` bytes, returning how many were accepted.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize>;

    /// Replace the receive filters.
    fn set_filters(&mut self, filters: &[CanFilter]) -> io::Result<()>;
}

impl<T: CanIo + ?Sized> CanIo for &mut T {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (**self).read(buf)
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        (**self).write(buf)
    }

    fn set_filters(&mut self, filters: &[CanFilter]) -> io::Result<()> {
        (**self).set_filters(filters)
    }
}

/// `struct sockaddr_can` with the transport protocol part left zeroed.
#[derive(Debug)]
#[repr(C)]
struct CanAddr {
    _af_can: libc::sa_family_t,
    if_index: libc::c_int,
    rx_id: u32,
    tx_id: u32,
}

/// A raw socket bound to one CAN interface.
///
/// Will be closed upon deallocation. To close early, use `close`; closing
/// twice is harmless. Internally this is just a wrapped file-descriptor.
#[derive(Debug)]
pub struct CanSocket {
    fd: libc::c_int,
}

impl CanSocket {
    /// Open a named CAN device.
    ///
    /// Usually the more common case, opens a socket can device by name, such
    /// as "vcan0" or "can0". A missing interface is reported as the
    /// `if_nametoindex` error, without trying any other name.
    pub fn open(ifname: &str) -> io::Result<CanSocket> {
        let if_index = if_nametoindex(ifname).map_err(io::Error::from)?;
        debug!("resolved CAN interface {} to index {}", ifname, if_index);
        CanSocket::open_if(if_index)
    }

    /// Open CAN device by interface number.
    pub fn open_if(if_index: libc::c_uint) -> io::Result<CanSocket> {
        let addr = CanAddr {
            _af_can: AF_CAN as libc::sa_family_t,
            if_index: if_index as libc::c_int,
            rx_id: 0,
            tx_id: 0,
        };

        let fd = unsafe { libc::socket(PF_CAN, libc::SOCK_RAW | libc::SOCK_CLOEXEC, CAN_RAW) };

        if fd == -1 {
            return Err(io::Error::last_os_error());
        }

        // from here on the descriptor is owned, so a failed bind closes it
        let sock = CanSocket { fd };

        let bind_rv = unsafe {
            let sockaddr_ptr = &addr as *const CanAddr;
            libc::bind(
                sock.fd,
                sockaddr_ptr as *const libc::sockaddr,
                size_of::<CanAddr>() as libc::socklen_t,
            )
        };

        if bind_rv == -1 {
            return Err(io::Error::last_os_error());
        }

        debug!("bound CAN_RAW socket fd {} to interface index {}", sock.fd, if_index);
        Ok(sock)
    }

    /// Single `read(2)` call. May return fewer bytes than a whole frame.
    pub fn read(&self, buf: &mut [u8]) -> io::Result<usize> {
        let rv = unsafe { libc::read(self.fd, buf.as_mut_ptr() as *mut libc::c_void, buf.len()) };

        if rv < 0 {
            return Err(io::Error::last_os_error());
        }

        Ok(rv as usize)
    }

    /// Single `write(2)` call. May accept fewer bytes than given.
    pub fn write(&self, buf: &[u8]) -> io::Result<usize> {
        let rv = unsafe { libc::write(self.fd, buf.as_ptr() as *const libc::c_void, buf.len()) };

        if rv < 0 {
            return Err(io::Error::last_os_error());
        }

        Ok(rv as usize)
    }

    /// Sets filters on the socket.
    ///
    /// CAN packages received by SocketCAN are matched against these filters,
    /// only matching packets are returned by the interface. By default a
    /// single filter matching all incoming frames is installed.
    pub fn set_filters(&self, filters: &[CanFilter]) -> io::Result<()> {
        set_socket_option_mult(self.fd, SOL_CAN_RAW, CAN_RAW_FILTER, filters)
    }

    /// Sets the read timeout on the socket
    ///
    /// For convenience, the result value can be checked using
    /// `ShouldRetry::should_retry` when a timeout is set.
    pub fn set_read_timeout(&self, duration: time::Duration) -> io::Result<()> {
        set_socket_option(
            self.fd,
            libc::SOL_SOCKET,
            libc::SO_RCVTIMEO,
            &timeval_from_duration(duration),
        )
    }

    /// Sets the write timeout on the socket
    pub fn set_write_timeout(&self, duration: time::Duration) -> io::Result<()> {
        set_socket_option(
            self.fd,
            libc::SOL_SOCKET,
            libc::SO_SNDTIMEO,
            &timeval_from_duration(duration),
        )
    }

    /// Change socket to non-blocking mode
    pub fn set_nonblocking(&self, nonblocking: bool) -> io::Result<()> {
        let oldfl = unsafe { libc::fcntl(self.fd, libc::F_GETFL) };

        if oldfl == -1 {
            return Err(io::Error::last_os_error());
        }

        let newfl = if nonblocking {
            oldfl | libc::O_NONBLOCK
        } else {
            oldfl & !libc::O_NONBLOCK
        };

        let rv = unsafe { libc::fcntl(self.fd, libc::F_SETFL, newfl) };

        if rv != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    /// Enable or disable loopback.
    ///
    /// By default, loopback is enabled, causing other applications that open
    /// the same CAN bus to see frames emitted by different applications on
    /// the same system.
    pub fn set_loopback(&self, enabled: bool) -> io::Result<()> {
        let loopback: libc::c_int = if enabled { 1 } else { 0 };
        set_socket_option(self.fd, SOL_CAN_RAW, CAN_RAW_LOOPBACK, &loopback)
    }

    /// Enable or disable receiving of own frames.
    ///
    /// When loopback is enabled, this settings controls if CAN frames sent
    /// are received back immediately by sender. Default is off.
    pub fn set_recv_own_msgs(&self, enabled: bool) -> io::Result<()> {
        let recv_own_msgs: libc::c_int = if enabled { 1 } else { 0 };
        set_socket_option(self.fd, SOL_CAN_RAW, CAN_RAW_RECV_OWN_MSGS, &recv_own_msgs)
    }

    /// Release the descriptor. Later calls are no-ops.
    pub fn close(&mut self) -> io::Result<()> {
        if self.fd < 0 {
            return Ok(());
        }

        let fd = self.fd;
        self.fd = -1;

        if unsafe { libc::close(fd) } == -1 {
            return Err(io::Error::last_os_error());
        }

        debug!("closed CAN socket fd {}", fd);
        Ok(())
    }
}

impl CanIo for CanSocket {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        CanSocket::read(self, buf)
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        CanSocket::write(self, buf)
    }

    fn set_filters(&mut self, filters: &[CanFilter]) -> io::Result<()> {
        CanSocket::set_filters(self, filters)
    }
}

impl AsRawFd for CanSocket {
    fn as_raw_fd(&self) -> RawFd {
        self.fd
    }
}

impl IntoRawFd for CanSocket {
    fn into_raw_fd(mut self) -> RawFd {
        // hand the descriptor over without closing it in drop
        let fd = self.fd;
        self.fd = -1;
        fd
    }
}

impl Drop for CanSocket {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            debug!("error closing CAN socket: {}", e);
        }
    }
}
