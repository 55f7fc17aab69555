use std::io;

use log::{debug, trace, warn};

use crate::config::Config;
use crate::constants::*;
use crate::errors::TransportError;
use crate::filter::CanFilter;
use crate::frame::CanFrame;
use crate::id::CanId;
use crate::socket::{CanIo, CanSocket};

/// Sends and receives classic CAN frames over one bound socket.
///
/// The transport owns its socket. Dropping it, or calling `close`, releases
/// the socket exactly once; after that no operation can be reached. All
/// operations block and take `&mut self`, so concurrent use of one transport
/// needs an external lock.
#[derive(Debug)]
pub struct CanTransport<S: CanIo = CanSocket> {
    io: S,
}

impl CanTransport<CanSocket> {
    /// Open a raw socket on the named interface.
    pub fn open(ifname: &str) -> Result<CanTransport<CanSocket>, TransportError> {
        let sock = CanSocket::open(ifname)?;
        debug!("CAN transport open on {}", ifname);
        Ok(CanTransport::new(sock))
    }

    /// Open the default interface, `can0`.
    pub fn open_default() -> Result<CanTransport<CanSocket>, TransportError> {
        CanTransport::open(DEFAULT_INTERFACE)
    }

    /// Open and configure a socket as described by `config`.
    ///
    /// If any option fails the socket is dropped, and so closed, before the
    /// error is returned.
    pub fn with_config(config: &Config) -> Result<CanTransport<CanSocket>, TransportError> {
        let sock = CanSocket::open(&config.interface)?;

        if let Some(timeout) = config.read_timeout {
            sock.set_read_timeout(timeout)?;
        }
        if let Some(timeout) = config.write_timeout {
            sock.set_write_timeout(timeout)?;
        }
        sock.set_loopback(config.loopback)?;
        sock.set_recv_own_msgs(config.recv_own_msgs)?;

        debug!("CAN transport open with {:?}", config);
        Ok(CanTransport::new(sock))
    }

    /// Close the socket now and report the outcome, instead of leaving it
    /// to `Drop` where errors are only logged.
    pub fn close(self) -> io::Result<()> {
        let mut sock = self.io;
        sock.close()
    }
}

impl<S: CanIo> CanTransport<S> {
    /// Wrap an already bound socket.
    pub fn new(io: S) -> CanTransport<S> {
        CanTransport { io }
    }

    pub fn get_ref(&self) -> &S {
        &self.io
    }

    pub fn get_mut(&mut self) -> &mut S {
        &mut self.io
    }

    pub fn into_inner(self) -> S {
        self.io
    }

    /// Send `data` as one frame addressed to `id`.
    ///
    /// The id is checked before the length, and both before any I/O. A
    /// short write is continued until the whole frame has been written.
    pub fn write_frame(&mut self, data: &[u8], id: CanId) -> Result<(), TransportError> {
        if !id.is_valid() {
            return Err(TransportError::InvalidId);
        }

        // too much data surfaces as DataTooLong
        let frame = CanFrame::new(id, data)?;
        debug_assert!(frame.is_valid());

        let buf = frame.to_bytes();
        trace!("tx {}", hex::encode(&buf[..]));
        self.write_all(&buf)?;

        Ok(())
    }

    /// Block until one whole frame has been read.
    ///
    /// Returns `(true, len, id)` and the payload in `out[..len]` for a valid
    /// frame. A frame that fails validation yields `(false, 0, id)` with the
    /// id as received, and `out` untouched. `out` must hold at least 8
    /// bytes.
    pub fn try_read_frame(&mut self, out: &mut [u8]) -> Result<(bool, usize, CanId), TransportError> {
        if out.len() < MAX_DATA_LEN {
            return Err(TransportError::BufferTooSmall);
        }

        let mut buf = [0u8; CAN_MTU];
        self.read_exact(&mut buf)?;
        trace!("rx {}", hex::encode(&buf[..]));

        let frame = CanFrame::from_bytes(&buf);
        let id = frame.id();

        if !frame.is_valid() {
            warn!("dropping invalid CAN frame (id {:#010x}, length {})", id.raw(), frame.len());
            return Ok((false, 0, id));
        }

        let data = frame.data();
        out[..data.len()].copy_from_slice(data);

        Ok((true, data.len(), id))
    }

    /// Only receive frames addressed like `id` from now on.
    ///
    /// Replaces any filter installed before; see `CanFilter::for_id` for the
    /// mask used.
    pub fn set_filter(&mut self, id: CanId) -> Result<(), TransportError> {
        if !id.is_valid() {
            return Err(TransportError::InvalidId);
        }

        let filter = CanFilter::for_id(id);
        self.io.set_filters(&[filter])?;
        debug!("installed CAN filter id {:#010x} mask {:#010x}", filter.id(), filter.mask());

        Ok(())
    }

    fn write_all(&mut self, mut buf: &[u8]) -> io::Result<()> {
        while !buf.is_empty() {
            match self.io.write(buf) {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::WriteZero,
                        "CAN socket accepted no bytes",
                    ))
                }
                Ok(n) => {
                    if n < buf.len() {
                        trace!("short write of {} bytes, {} left", n, buf.len() - n);
                    }
                    buf = &buf[n..];
                }
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    fn read_exact(&mut self, mut buf: &mut [u8]) -> io::Result<()> {
        while !buf.is_empty() {
            match self.io.read(buf) {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "CAN socket closed in the middle of a frame",
                    ))
                }
                Ok(n) => {
                    let tmp = buf;
                    buf = &mut tmp[n..];
                }
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Replays scripted read chunks and records everything written.
    #[derive(Default)]
    struct ScriptedIo {
        reads: VecDeque<io::Result<Vec<u8>>>,
        max_write: Option<usize>,
        write_errors: VecDeque<io::Error>,
        written: Vec<u8>,
        write_calls: usize,
        filters: Vec<CanFilter>,
        filter_error: Option<io::ErrorKind>,
    }

    impl ScriptedIo {
        fn with_reads(chunks: Vec<Vec<u8>>) -> ScriptedIo {
            ScriptedIo {
                reads: chunks.into_iter().map(Ok).collect(),
                ..ScriptedIo::default()
            }
        }
    }

    impl CanIo for ScriptedIo {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.reads.pop_front() {
                None => Ok(0),
                Some(Err(e)) => Err(e),
                Some(Ok(chunk)) => {
                    let n = chunk.len().min(buf.len());
                    buf[..n].copy_from_slice(&chunk[..n]);
                    if n < chunk.len() {
                        self.reads.push_front(Ok(chunk[n..].to_vec()));
                    }
                    Ok(n)
                }
            }
        }

        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.write_calls += 1;
            if let Some(e) = self.write_errors.pop_front() {
                return Err(e);
            }
            let n = self.max_write.map_or(buf.len(), |max| max.min(buf.len()));
            self.written.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn set_filters(&mut self, filters: &[CanFilter]) -> io::Result<()> {
            if let Some(kind) = self.filter_error {
                return Err(io::Error::from(kind));
            }
            self.filters = filters.to_vec();
            Ok(())
        }
    }

    fn frame_bytes(id: CanId, data: &[u8]) -> Vec<u8> {
        CanFrame::new(id, data).unwrap().to_bytes().to_vec()
    }

    #[test]
    fn write_serializes_frame() {
        let mut bus = CanTransport::new(ScriptedIo::default());
        bus.write_frame(&[0xde, 0xad, 0xbe, 0xef], CanId::standard(0x7b).unwrap()).unwrap();

        let io = bus.into_inner();
        assert_eq!(io.write_calls, 1);
        assert_eq!(io.written, frame_bytes(CanId::standard(0x7b).unwrap(), &[0xde, 0xad, 0xbe, 0xef]));
        assert_eq!(&io.written[12..], &[0; 4]);
    }

    #[test]
    fn write_rejects_long_data_without_io() {
        let mut bus = CanTransport::new(ScriptedIo::default());
        match bus.write_frame(&[0; 9], CanId::standard(1).unwrap()) {
            Err(TransportError::DataTooLong) => {}
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(bus.get_ref().write_calls, 0);
    }

    #[test]
    fn write_checks_id_before_length() {
        let mut bus = CanTransport::new(ScriptedIo::default());
        match bus.write_frame(&[0; 9], CanId::from_raw(0x800)) {
            Err(TransportError::InvalidId) => {}
            other => panic!("unexpected {:?}", other),
        }
        match bus.write_frame(&[], CanId::standard(1).unwrap().with_error(true)) {
            Err(TransportError::InvalidId) => {}
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(bus.get_ref().write_calls, 0);
    }

    #[test]
    fn oversized_address_never_reaches_the_socket() {
        fn send(bus: &mut CanTransport<ScriptedIo>, address: u32) -> Result<(), TransportError> {
            bus.write_frame(&[1], CanId::standard(address)?)
        }

        let mut bus = CanTransport::new(ScriptedIo::default());
        for &address in &[0x8000_0123, 0x2000_0000, 0x4000_0010, 0x800] {
            match send(&mut bus, address) {
                Err(TransportError::InvalidId) => {}
                other => panic!("{:#x}: unexpected {:?}", address, other),
            }
        }
        assert_eq!(bus.get_ref().write_calls, 0);
    }

    #[test]
    fn short_writes_are_completed() {
        let mut bus = CanTransport::new(ScriptedIo {
            max_write: Some(5),
            ..ScriptedIo::default()
        });
        bus.write_frame(&[1, 2, 3], CanId::extended(0x1234).unwrap()).unwrap();

        let io = bus.into_inner();
        assert_eq!(io.write_calls, 4);
        assert_eq!(io.written, frame_bytes(CanId::extended(0x1234).unwrap(), &[1, 2, 3]));
    }

    #[test]
    fn interrupted_write_is_retried() {
        let mut io = ScriptedIo::default();
        io.write_errors.push_back(io::Error::from(io::ErrorKind::Interrupted));
        let mut bus = CanTransport::new(io);

        bus.write_frame(&[7], CanId::standard(2).unwrap()).unwrap();
        assert_eq!(bus.get_ref().write_calls, 2);
        assert_eq!(bus.get_ref().written.len(), CAN_MTU);
    }

    #[test]
    fn hard_write_failure_is_io() {
        let mut io = ScriptedIo::default();
        io.write_errors.push_back(io::Error::from_raw_os_error(libc::ENETDOWN));
        let mut bus = CanTransport::new(io);

        match bus.write_frame(&[7], CanId::standard(2).unwrap()) {
            Err(TransportError::Io(e)) => assert_eq!(e.raw_os_error(), Some(libc::ENETDOWN)),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(bus.get_ref().write_calls, 1);
    }

    #[test]
    fn zero_length_write_is_io() {
        let mut bus = CanTransport::new(ScriptedIo {
            max_write: Some(0),
            ..ScriptedIo::default()
        });
        match bus.write_frame(&[], CanId::standard(2).unwrap()) {
            Err(TransportError::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::WriteZero),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn read_reassembles_partial_chunks() {
        let id = CanId::standard(0x321).unwrap();
        let bytes = frame_bytes(id, &[0xaa, 0xbb, 0xcc, 0xdd, 0xee]);
        let mut bus = CanTransport::new(ScriptedIo::with_reads(vec![
            bytes[..3].to_vec(),
            bytes[3..].to_vec(),
        ]));

        let mut out = [0u8; 8];
        let (ok, len, got) = bus.try_read_frame(&mut out).unwrap();
        assert!(ok);
        assert_eq!(len, 5);
        assert_eq!(got, id);
        assert_eq!(&out[..len], &[0xaa, 0xbb, 0xcc, 0xdd, 0xee]);
    }

    #[test]
    fn read_byte_by_byte() {
        let id = CanId::extended(0x1fff_ffff).unwrap().with_rtr(true);
        let bytes = frame_bytes(id, &[]);
        let chunks = bytes.iter().map(|b| vec![*b]).collect();
        let mut bus = CanTransport::new(ScriptedIo::with_reads(chunks));

        let mut out = [0u8; 8];
        assert_eq!(bus.try_read_frame(&mut out).unwrap(), (true, 0, id));
    }

    #[test]
    fn read_only_consumes_one_frame() {
        let first = frame_bytes(CanId::standard(1).unwrap(), &[1]);
        let second = frame_bytes(CanId::standard(2).unwrap(), &[2, 2]);
        let both = [first, second].concat();
        let mut bus = CanTransport::new(ScriptedIo::with_reads(vec![both]));

        let mut out = [0u8; 8];
        assert_eq!(bus.try_read_frame(&mut out).unwrap(), (true, 1, CanId::standard(1).unwrap()));
        assert_eq!(bus.try_read_frame(&mut out).unwrap(), (true, 2, CanId::standard(2).unwrap()));
        assert_eq!(&out[..2], &[2, 2]);
    }

    #[test]
    fn invalid_length_is_reported_not_raised() {
        let id = CanId::standard(0x10).unwrap();
        let mut bytes = frame_bytes(id, &[0; 8]);
        bytes[4] = 9;
        let mut bus = CanTransport::new(ScriptedIo::with_reads(vec![bytes]));

        let mut out = [0x55u8; 8];
        assert_eq!(bus.try_read_frame(&mut out).unwrap(), (false, 0, id));
        assert_eq!(out, [0x55; 8]);
    }

    #[test]
    fn error_frame_is_reported_not_raised() {
        let id = CanId::standard(0x10).unwrap().with_error(true);
        let bytes = frame_bytes(id, &[1, 2]);
        let mut bus = CanTransport::new(ScriptedIo::with_reads(vec![bytes]));

        let mut out = [0u8; 8];
        assert_eq!(bus.try_read_frame(&mut out).unwrap(), (false, 0, id));
    }

    #[test]
    fn read_rejects_small_buffer_before_io() {
        let bytes = frame_bytes(CanId::standard(1).unwrap(), &[1]);
        let mut bus = CanTransport::new(ScriptedIo::with_reads(vec![bytes]));

        let mut out = [0u8; 7];
        match bus.try_read_frame(&mut out) {
            Err(TransportError::BufferTooSmall) => {}
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(bus.get_ref().reads.len(), 1);
    }

    #[test]
    fn read_error_is_passed_through() {
        let mut io = ScriptedIo::with_reads(vec![vec![0; 4]]);
        io.reads.push_back(Err(io::Error::from(io::ErrorKind::WouldBlock)));
        let mut bus = CanTransport::new(io);

        let mut out = [0u8; 8];
        match bus.try_read_frame(&mut out) {
            Err(TransportError::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::WouldBlock),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn eof_mid_frame_is_io() {
        let mut bus = CanTransport::new(ScriptedIo::with_reads(vec![vec![0; 10]]));

        let mut out = [0u8; 8];
        match bus.try_read_frame(&mut out) {
            Err(TransportError::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::UnexpectedEof),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn filter_mask_for_standard_id() {
        let mut bus = CanTransport::new(ScriptedIo::default());
        bus.set_filter(CanId::standard(0x123).unwrap()).unwrap();

        let filters = &bus.get_ref().filters;
        assert_eq!(filters.len(), 1);
        assert_eq!(filters[0].id(), 0x123);
        assert_eq!(filters[0].mask(), 0x123 | EFF_FLAG | RTR_FLAG);
        assert_eq!(filters[0].mask(), 0xc000_0123);
    }

    #[test]
    fn filter_rejects_invalid_id() {
        let mut bus = CanTransport::new(ScriptedIo::default());
        match bus.set_filter(CanId::extended(0x10).unwrap().with_error(true)) {
            Err(TransportError::InvalidId) => {}
            other => panic!("unexpected {:?}", other),
        }
        assert!(bus.get_ref().filters.is_empty());
    }

    #[test]
    fn filter_failure_is_io() {
        let mut bus = CanTransport::new(ScriptedIo {
            filter_error: Some(io::ErrorKind::PermissionDenied),
            ..ScriptedIo::default()
        });
        match bus.set_filter(CanId::standard(0x123).unwrap()) {
            Err(TransportError::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::PermissionDenied),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn borrowed_io_can_be_used() {
        let mut io = ScriptedIo::default();
        {
            let mut bus = CanTransport::new(&mut io);
            bus.write_frame(&[1], CanId::standard(3).unwrap()).unwrap();
        }
        assert_eq!(io.written.len(), CAN_MTU);
    }

    #[test]
    fn opening_missing_interface_fails() {
        match CanTransport::open("nosuchcan42") {
            Err(TransportError::Io(_)) => {}
            other => panic!("unexpected {:?}", other.map(|_| ())),
        }
    }
}
