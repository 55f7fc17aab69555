use std::{io, mem, ptr, time};

/// `setsockopt` wrapper
///
/// The libc `setsockopt` function is set to set various options on a socket.
/// `set_socket_option` offers a somewhat type-safe wrapper that does not
/// require messing around with `*const c_void`s.
///
/// A proper `std::io::Error` will be returned on failure.
///
/// Note that the `val` parameter must be specified correctly; if an option
/// expects an integer, it is advisable to pass in a `c_int`, not the default
/// of `i32`.
pub fn set_socket_option<T>(
    fd: libc::c_int,
    level: libc::c_int,
    name: libc::c_int,
    val: &T,
) -> io::Result<()> {
    let r = unsafe {
        let val_ptr: *const T = val as *const T;
        libc::setsockopt(
            fd,
            level,
            name,
            val_ptr as *const libc::c_void,
            mem::size_of::<T>() as libc::socklen_t,
        )
    };

    if r != 0 {
        return Err(io::Error::last_os_error());
    }

    Ok(())
}

pub fn set_socket_option_mult<T>(
    fd: libc::c_int,
    level: libc::c_int,
    name: libc::c_int,
    values: &[T],
) -> io::Result<()> {
    let r = if values.is_empty() {
        // can't pass in a pointer to the first element if a 0-length slice,
        // pass a nullpointer instead
        unsafe { libc::setsockopt(fd, level, name, ptr::null(), 0) }
    } else {
        unsafe {
            libc::setsockopt(
                fd,
                level,
                name,
                values.as_ptr() as *const libc::c_void,
                (mem::size_of::<T>() * values.len()) as libc::socklen_t,
            )
        }
    };

    if r != 0 {
        return Err(io::Error::last_os_error());
    }

    Ok(())
}

pub fn timeval_from_duration(t: time::Duration) -> libc::timeval {
    libc::timeval {
        tv_sec: t.as_secs() as libc::time_t,
        tv_usec: t.subsec_micros() as libc::suseconds_t,
    }
}

/// Compare two byte sequences: lengths first, then element by element.
pub fn bytes_equal(first: &[u8], second: &[u8]) -> bool {
    if first.len() != second.len() {
        return false;
    }

    first.iter().zip(second).all(|(a, b)| a == b)
}

/// Check an error return value for timeouts.
///
/// Due to the fact that timeouts are reported as errors, reading from a
/// socket with a timeout that does not receive a frame in time will result
/// in an error being returned. This trait adds a `should_retry` method to
/// `Error` and `Result` to check for this condition.
pub trait ShouldRetry {
    /// Check for timeout
    ///
    /// If `true`, the error is probably due to a timeout.
    fn should_retry(&self) -> bool;
}

impl ShouldRetry for io::Error {
    fn should_retry(&self) -> bool {
        match self.kind() {
            // EAGAIN, EINPROGRESS and EWOULDBLOCK are the three possible codes
            // returned when a timeout occurs. the stdlib already maps EAGAIN
            // and EWOULDBLOCK os WouldBlock
            io::ErrorKind::WouldBlock => true,
            // however, EINPROGRESS is also valid
            _ => self.raw_os_error() == Some(libc::EINPROGRESS),
        }
    }
}

impl<T> ShouldRetry for io::Result<T> {
    fn should_retry(&self) -> bool {
        if let Err(ref e) = *self {
            e.should_retry()
        } else {
            false
        }
    }
}

impl ShouldRetry for crate::errors::TransportError {
    fn should_retry(&self) -> bool {
        match *self {
            crate::errors::TransportError::Io(ref e) => e.should_retry(),
            _ => false,
        }
    }
}
