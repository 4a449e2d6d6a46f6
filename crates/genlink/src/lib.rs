//! Synchronous generic netlink library for Linux.
//!
//! This crate queries the kernel's generic netlink controller for the set of
//! registered protocol families and decodes the responses into typed
//! descriptors. It is built around three pieces:
//!
//! - a bounds-checked TLV attribute walker ([`netlink::AttrIter`]),
//! - a message framer that consumes a blocking socket into discrete
//!   kernel-framed messages ([`netlink::ResponseIter`]),
//! - a decoder for the controller family's attribute layout
//!   ([`netlink::genl::FamilyDescriptor`]).
//!
//! All I/O is blocking and single-threaded. There is no timeout mechanism: a
//! kernel that never answers blocks the caller indefinitely. That is an
//! accepted property of a single-shot diagnostic query, not an oversight.
//!
//! # Example
//!
//! ```no_run
//! use genlink::netlink::NetlinkSocket;
//! use genlink::netlink::genl::dump_families;
//!
//! fn main() -> genlink::Result<()> {
//!     let mut socket = NetlinkSocket::generic()?;
//!     for family in dump_families(&mut socket)? {
//!         println!("{:3}  {}", family.id, family.name);
//!     }
//!     Ok(())
//! }
//! ```

pub mod netlink;

// Re-export common types at crate root for convenience
pub use netlink::{Error, NetlinkSocket, Result, Transport};
