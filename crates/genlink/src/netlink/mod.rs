//! Synchronous netlink protocol plumbing.
//!
//! The modules here follow the on-wire layering: [`message`] covers the outer
//! `nlmsghdr` framing, [`attr`] the TLV attribute format shared by every
//! netlink family, and [`genl`] the generic netlink controller on top. The
//! [`response`] module turns a blocking socket into an iterator of framed
//! messages; [`builder`] constructs outbound datagrams.
//!
//! The wire format is host-endian throughout, with 4-byte alignment for both
//! messages and attributes.

pub mod attr;
pub mod builder;
mod error;
pub mod genl;
pub mod message;
pub mod response;
mod socket;

pub use attr::{AttrIter, NlAttr};
pub use builder::{MessageBuilder, NestToken};
pub use error::{Error, Result};
pub use message::{NLMSG_HDRLEN, NlMsgError, NlMsgHdr, NlMsgType};
pub use response::{Message, ResponseIter};
pub use socket::{NetlinkSocket, Transport};
