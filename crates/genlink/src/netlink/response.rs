//! Response stream framing.
//!
//! The kernel answers a dump request with a train of length-prefixed
//! messages, delivered through however many socket reads it takes.
//! [`ResponseIter`] owns the receive buffer and hands out one validated
//! message at a time; each [`Message`] is a borrowed view into that buffer
//! and is only valid until the next call to [`ResponseIter::advance`].

use tracing::trace;

use super::error::{Error, Result};
use super::message::{NLMSG_HDRLEN, NlMsgError, NlMsgHdr, nlmsg_align};
use super::socket::Transport;

/// Receive buffer capacity. Sixteen 8 KiB blocks: large enough that a full
/// family dump usually arrives in a single read, though nothing below relies
/// on that.
pub const RECV_BUF_LEN: usize = 16 * 8192;

/// One decoded message from the response stream.
///
/// `payload` covers `nlmsg_len - NLMSG_HDRLEN` bytes: the generic netlink
/// sub-header (when present) followed by the attribute buffer.
#[derive(Debug)]
pub struct Message<'a> {
    /// The outer header, copied out of the buffer.
    pub header: NlMsgHdr,
    /// Everything after the outer header.
    pub payload: &'a [u8],
}

impl<'a> Message<'a> {
    /// Reinterpret the payload of an error message as its kernel error code.
    pub fn error_code(&self) -> Result<i32> {
        NlMsgError::from_bytes(self.payload).map(|e| e.error)
    }
}

/// Iterator over the messages of one response stream.
///
/// Yields messages in exactly the order the kernel emitted them. After a
/// message of type `DONE` or `ERROR` has been returned, the following call
/// reports the stream as finished; the terminating message itself is still
/// handed to the caller so its payload can be inspected.
pub struct ResponseIter<S> {
    socket: S,
    buf: Box<[u8]>,
    /// Offset of the next unconsumed byte.
    start: usize,
    /// Offset one past the last valid byte.
    end: usize,
    exhausted: bool,
}

impl<S: Transport> ResponseIter<S> {
    /// Create an iterator reading from `socket`.
    pub fn new(socket: S) -> Self {
        Self {
            socket,
            buf: vec![0u8; RECV_BUF_LEN].into_boxed_slice(),
            start: 0,
            end: 0,
            exhausted: false,
        }
    }

    /// Give the socket back once the stream is no longer needed.
    pub fn into_inner(self) -> S {
        self.socket
    }

    /// Advance to the next message.
    ///
    /// Returns `Ok(None)` when the stream has terminated: an end-of-dump or
    /// error message was already yielded, or the socket reported a clean
    /// close. Framing violations and I/O failures surface as errors and end
    /// the stream.
    pub fn advance(&mut self) -> Result<Option<Message<'_>>> {
        if self.exhausted {
            return Ok(None);
        }

        loop {
            let avail = self.end - self.start;
            if avail >= NLMSG_HDRLEN {
                let header = *NlMsgHdr::from_bytes(&self.buf[self.start..self.end])?;
                let msg_len = header.nlmsg_len as usize;

                if msg_len < NLMSG_HDRLEN {
                    self.exhausted = true;
                    return Err(Error::InvalidMessage(format!(
                        "declared length {} is smaller than the header",
                        msg_len
                    )));
                }
                if msg_len > self.buf.len() {
                    self.exhausted = true;
                    return Err(Error::InvalidMessage(format!(
                        "declared length {} exceeds receive buffer capacity {}",
                        msg_len,
                        self.buf.len()
                    )));
                }

                if msg_len <= avail {
                    let body = self.start + NLMSG_HDRLEN;
                    let msg_end = self.start + msg_len;
                    self.start = (self.start + nlmsg_align(msg_len)).min(self.end);

                    // The terminator applies to the *next* call; this one
                    // still returns the message for inspection.
                    if header.is_done() || header.is_error() {
                        self.exhausted = true;
                    }

                    return Ok(Some(Message {
                        header,
                        payload: &self.buf[body..msg_end],
                    }));
                }
            }

            self.refill()?;
            if self.exhausted {
                return Ok(None);
            }
        }
    }

    /// Perform exactly one blocking read, keeping any partial message.
    fn refill(&mut self) -> Result<()> {
        // Move the unconsumed tail to the front so a message split across
        // reads is reassembled instead of dropped.
        if self.start > 0 {
            self.buf.copy_within(self.start..self.end, 0);
            self.end -= self.start;
            self.start = 0;
        }

        let n = match self.socket.recv(&mut self.buf[self.end..]) {
            Ok(n) => n,
            Err(e) => {
                self.exhausted = true;
                return Err(Error::Io(e));
            }
        };
        trace!(bytes = n, buffered = self.end, "socket read");

        if n == 0 {
            self.exhausted = true;
            if self.end > 0 {
                // The stream closed in the middle of a message.
                return Err(Error::Truncated {
                    expected: NLMSG_HDRLEN.max(self.pending_len()),
                    actual: self.end,
                });
            }
            return Ok(());
        }

        self.end += n;
        Ok(())
    }

    /// Declared length of the partial message at the front of the buffer,
    /// if enough of its header arrived to read one.
    fn pending_len(&self) -> usize {
        NlMsgHdr::from_bytes(&self.buf[..self.end])
            .map(|h| h.nlmsg_len as usize)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlink::builder::MessageBuilder;
    use crate::netlink::message::{NLM_F_MULTI, NlMsgType};
    use std::io;

    /// Scripted transport: each entry is one `recv` result.
    struct ScriptedSocket {
        reads: Vec<io::Result<Vec<u8>>>,
    }

    impl ScriptedSocket {
        fn new(reads: Vec<io::Result<Vec<u8>>>) -> Self {
            Self { reads }
        }
    }

    impl Transport for ScriptedSocket {
        fn send(&mut self, buf: &[u8]) -> io::Result<usize> {
            Ok(buf.len())
        }

        fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.reads.is_empty() {
                return Ok(0);
            }
            match self.reads.remove(0) {
                Ok(bytes) => {
                    assert!(bytes.len() <= buf.len(), "scripted read larger than buffer");
                    buf[..bytes.len()].copy_from_slice(&bytes);
                    Ok(bytes.len())
                }
                Err(e) => Err(e),
            }
        }
    }

    fn data_message(msg_type: u16, seq: u32, attr: (u16, &[u8])) -> Vec<u8> {
        let mut b = MessageBuilder::new(msg_type, NLM_F_MULTI);
        b.set_seq(seq);
        b.append_attr(attr.0, attr.1);
        b.finish()
    }

    fn done_message() -> Vec<u8> {
        let mut b = MessageBuilder::new(NlMsgType::DONE, NLM_F_MULTI);
        b.append_bytes(&0i32.to_ne_bytes());
        b.finish()
    }

    fn error_message(code: i32) -> Vec<u8> {
        let mut b = MessageBuilder::new(NlMsgType::ERROR, 0);
        b.append_bytes(&code.to_ne_bytes());
        b.finish()
    }

    fn collect_headers(mut iter: ResponseIter<ScriptedSocket>) -> Vec<(u16, u32)> {
        let mut out = Vec::new();
        while let Some(msg) = iter.advance().unwrap() {
            out.push((msg.header.nlmsg_type, msg.header.nlmsg_seq));
        }
        out
    }

    #[test]
    fn test_multi_message_single_read() {
        let mut stream = data_message(0x10, 0, (2, b"one\0"));
        stream.extend_from_slice(&data_message(0x10, 0, (2, b"two\0")));
        stream.extend_from_slice(&done_message());

        let iter = ResponseIter::new(ScriptedSocket::new(vec![Ok(stream)]));
        let seen = collect_headers(iter);
        assert_eq!(
            seen,
            vec![(0x10, 0), (0x10, 0), (NlMsgType::DONE, 0)]
        );
    }

    #[test]
    fn test_split_read_reassembly_matches_single_read() {
        let mut stream = data_message(0x10, 0, (2, b"one\0"));
        stream.extend_from_slice(&data_message(0x10, 0, (2, b"two\0")));
        stream.extend_from_slice(&done_message());

        // Split in the middle of the second message.
        let cut = stream.len() - done_message().len() - 5;
        let first = stream[..cut].to_vec();
        let second = stream[cut..].to_vec();

        let single = collect_headers(ResponseIter::new(ScriptedSocket::new(vec![Ok(
            stream.clone(),
        )])));
        let split = collect_headers(ResponseIter::new(ScriptedSocket::new(vec![
            Ok(first),
            Ok(second),
        ])));
        assert_eq!(single, split);
    }

    #[test]
    fn test_payload_survives_split() {
        let msg = data_message(0x10, 9, (2, b"payload\0"));
        let (a, b) = msg.split_at(NLMSG_HDRLEN + 2);

        let mut iter = ResponseIter::new(ScriptedSocket::new(vec![
            Ok(a.to_vec()),
            Ok(b.to_vec()),
        ]));
        let got = iter.advance().unwrap().unwrap();
        assert_eq!(got.header.nlmsg_seq, 9);
        assert_eq!(&got.payload[4..12], b"payload\0");
    }

    #[test]
    fn test_clean_close_yields_none() {
        let mut iter = ResponseIter::new(ScriptedSocket::new(vec![]));
        assert!(iter.advance().unwrap().is_none());
        // Terminal: stays None without touching the socket again.
        assert!(iter.advance().unwrap().is_none());
    }

    #[test]
    fn test_close_mid_message_is_truncation() {
        let msg = data_message(0x10, 0, (2, b"half\0"));
        let partial = msg[..msg.len() - 3].to_vec();

        let mut iter = ResponseIter::new(ScriptedSocket::new(vec![Ok(partial)]));
        assert!(matches!(iter.advance(), Err(Error::Truncated { .. })));
        assert!(iter.advance().unwrap().is_none());
    }

    #[test]
    fn test_read_error_propagates() {
        let mut iter = ResponseIter::new(ScriptedSocket::new(vec![Err(io::Error::new(
            io::ErrorKind::ConnectionReset,
            "reset",
        ))]));
        assert!(matches!(iter.advance(), Err(Error::Io(_))));
        assert!(iter.advance().unwrap().is_none());
    }

    #[test]
    fn test_error_message_then_exhausted() {
        let mut iter =
            ResponseIter::new(ScriptedSocket::new(vec![Ok(error_message(-13))]));

        let msg = iter.advance().unwrap().unwrap();
        assert!(msg.header.is_error());
        assert_eq!(msg.error_code().unwrap(), -13);
        assert!(iter.advance().unwrap().is_none());
    }

    #[test]
    fn test_error_after_data_messages() {
        let mut stream = data_message(0x10, 0, (2, b"one\0"));
        stream.extend_from_slice(&error_message(-22));

        let mut iter = ResponseIter::new(ScriptedSocket::new(vec![Ok(stream)]));
        assert_eq!(iter.advance().unwrap().unwrap().header.nlmsg_type, 0x10);
        let err = iter.advance().unwrap().unwrap();
        assert_eq!(err.error_code().unwrap(), -22);
        assert!(iter.advance().unwrap().is_none());
    }

    #[test]
    fn test_undersized_declared_length_rejected() {
        let mut bad = data_message(0x10, 0, (2, b"ok\0"));
        bad[0..4].copy_from_slice(&8u32.to_ne_bytes()); // shorter than the header

        let mut iter = ResponseIter::new(ScriptedSocket::new(vec![Ok(bad)]));
        assert!(matches!(iter.advance(), Err(Error::InvalidMessage(_))));
        assert!(iter.advance().unwrap().is_none());
    }

    #[test]
    fn test_oversized_declared_length_rejected() {
        let mut bad = data_message(0x10, 0, (2, b"ok\0"));
        bad[0..4].copy_from_slice(&((RECV_BUF_LEN + 4) as u32).to_ne_bytes());

        let mut iter = ResponseIter::new(ScriptedSocket::new(vec![Ok(bad)]));
        assert!(matches!(iter.advance(), Err(Error::InvalidMessage(_))));
    }
}
