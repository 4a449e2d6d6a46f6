//! Blocking netlink socket and the transport seam.

use std::io;
use std::os::unix::io::{AsRawFd, RawFd};

use netlink_sys::{Socket, SocketAddr, protocols};

use super::error::Result;

/// Read/write primitives over a connected datagram socket.
///
/// The framing and decoding layers are generic over this trait so tests can
/// drive them with scripted byte sequences instead of a live kernel. Both
/// calls block; there is no timeout mechanism.
pub trait Transport {
    /// Write one datagram. Returns the number of bytes accepted.
    fn send(&mut self, buf: &[u8]) -> io::Result<usize>;

    /// Read into `buf`, blocking until data arrives. Returns the number of
    /// bytes read; 0 means the peer closed the channel.
    fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn send(&mut self, buf: &[u8]) -> io::Result<usize> {
        (**self).send(buf)
    }

    fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (**self).recv(buf)
    }
}

/// Blocking netlink socket, autobound and connected to the kernel.
pub struct NetlinkSocket {
    socket: Socket,
    /// Local port ID (assigned by the kernel on bind).
    pid: u32,
}

impl NetlinkSocket {
    /// Open a socket for the given netlink protocol number.
    pub fn new(protocol: isize) -> Result<Self> {
        let mut socket = Socket::new(protocol)?;
        let addr = socket.bind_auto()?;
        let pid = addr.port_number();

        // Endpoint 0 is the kernel; all traffic on this socket goes there.
        socket.connect(&SocketAddr::new(0, 0))?;

        Ok(Self { socket, pid })
    }

    /// Open a `NETLINK_GENERIC` socket.
    pub fn generic() -> Result<Self> {
        Self::new(protocols::NETLINK_GENERIC)
    }

    /// Get the local port ID.
    pub fn pid(&self) -> u32 {
        self.pid
    }
}

impl Transport for NetlinkSocket {
    fn send(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.socket.send(buf, 0)
    }

    fn recv(&mut self, mut buf: &mut [u8]) -> io::Result<usize> {
        // bytes::BufMut on &mut [u8] writes from the front; recv returns the
        // datagram length actually copied in.
        self.socket.recv(&mut buf, 0)
    }
}

impl AsRawFd for NetlinkSocket {
    fn as_raw_fd(&self) -> RawFd {
        self.socket.as_raw_fd()
    }
}
