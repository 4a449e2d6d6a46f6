//! Controller family requests and decoding.
//!
//! The controller (`nlctrl`) answers a `GetFamily` dump with one message per
//! registered family. Each message is a flat attribute buffer, except for
//! `Ops` and `McastGroups`: those hold an array of index-numbered wrapper
//! attributes, each wrapping the id/flags or id/name pair of one entry, so
//! decoding them takes two further walker passes.

use tracing::debug;

use super::header::{GENL_HDRLEN, GenlMsgHdr};
use super::{CtrlAttr, CtrlAttrMcastGrp, CtrlAttrOp, CtrlCmd, GENL_ID_CTRL};
use crate::netlink::attr::{AttrIter, get};
use crate::netlink::builder::MessageBuilder;
use crate::netlink::error::{Error, Result};
use crate::netlink::message::{NLM_F_ACK, NLM_F_DUMP, NLM_F_REQUEST};
use crate::netlink::response::{Message, ResponseIter};
use crate::netlink::socket::Transport;

/// Builder for controller dump requests.
///
/// Owns the sequence counter. The starting value is injectable so callers
/// (and tests) can run independent counters; each built request consumes
/// exactly one number.
#[derive(Debug, Default)]
pub struct CtrlRequestBuilder {
    seq: u32,
}

impl CtrlRequestBuilder {
    /// Create a builder whose sequence numbers start at 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder whose sequence numbers start at `seq`.
    pub fn with_seq(seq: u32) -> Self {
        Self { seq }
    }

    /// Build a "get all families" request datagram.
    ///
    /// The outer length field equals the exact encoded size, the destination
    /// port id is 0 (the kernel), and the sequence counter advances once.
    pub fn next_dump_request(&mut self) -> Vec<u8> {
        let mut builder =
            MessageBuilder::new(GENL_ID_CTRL, NLM_F_REQUEST | NLM_F_ACK | NLM_F_DUMP);
        builder.set_seq(self.seq);
        self.seq = self.seq.wrapping_add(1);
        builder.append(&GenlMsgHdr::new(CtrlCmd::GetFamily as u8, 1));
        builder.finish()
    }
}

/// One registered generic netlink family, as reported by the controller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "output", derive(serde::Serialize))]
pub struct FamilyDescriptor {
    /// Dynamically assigned family id (used as the message type when
    /// talking to the family).
    pub id: u16,
    /// Family name.
    pub name: String,
    /// Family version.
    pub version: u16,
    /// Family-specific header size after the genl header.
    pub header_size: u16,
    /// Highest attribute number the family accepts.
    pub max_attr: u16,
    /// Supported operations, in kernel order.
    pub operations: Vec<FamilyOp>,
    /// Multicast groups, in kernel order.
    pub groups: Vec<MulticastGroup>,
}

/// One operation supported by a family.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "output", derive(serde::Serialize))]
pub struct FamilyOp {
    /// Position in the kernel's operation array (the wrapper attribute's
    /// type code).
    pub index: u16,
    /// Command id.
    pub id: u16,
    /// Operation flags.
    pub flags: u16,
}

/// One multicast group registered by a family.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "output", derive(serde::Serialize))]
pub struct MulticastGroup {
    /// Position in the kernel's group array.
    pub index: u16,
    /// Group id, usable for membership subscription.
    pub id: u16,
    /// Group name.
    pub name: String,
}

/// Decode one dump message into a family descriptor.
///
/// Unknown attribute types are skipped (with a debug log), never fatal. A
/// framing violation anywhere in the attribute buffer aborts the decode.
pub fn decode_family(msg: &Message<'_>) -> Result<FamilyDescriptor> {
    GenlMsgHdr::from_bytes(msg.payload)?;
    let mut family = FamilyDescriptor::default();

    for attr in AttrIter::new(&msg.payload[GENL_HDRLEN..]) {
        let (kind, payload) = attr?;
        match kind {
            t if t == CtrlAttr::FamilyId as u16 => family.id = get::u16_ne(payload)?,
            t if t == CtrlAttr::FamilyName as u16 => {
                family.name = get::string(payload)?.to_string();
            }
            t if t == CtrlAttr::Version as u16 => family.version = get::u16_ne(payload)?,
            t if t == CtrlAttr::HdrSize as u16 => family.header_size = get::u16_ne(payload)?,
            t if t == CtrlAttr::MaxAttr as u16 => family.max_attr = get::u16_ne(payload)?,
            t if t == CtrlAttr::Ops as u16 => family.operations = decode_ops(payload)?,
            t if t == CtrlAttr::McastGroups as u16 => family.groups = decode_groups(payload)?,
            other => {
                debug!(attr_type = other, len = payload.len(), "skipping unknown attribute");
            }
        }
    }

    Ok(family)
}

/// Decode the `Ops` array: wrapper attributes whose type code is an ordinal,
/// each containing an id/flags pair.
fn decode_ops(data: &[u8]) -> Result<Vec<FamilyOp>> {
    let mut ops = Vec::new();

    for item in AttrIter::new(data) {
        let (index, item_payload) = item?;
        let mut op = FamilyOp {
            index,
            ..Default::default()
        };

        for field in AttrIter::new(item_payload) {
            let (kind, payload) = field?;
            match kind {
                t if t == CtrlAttrOp::Id as u16 => op.id = get::u16_ne(payload)?,
                t if t == CtrlAttrOp::Flags as u16 => op.flags = get::u16_ne(payload)?,
                other => debug!(attr_type = other, "skipping unknown op attribute"),
            }
        }

        ops.push(op);
    }

    Ok(ops)
}

/// Decode the `McastGroups` array, same wrapper shape as `Ops`.
fn decode_groups(data: &[u8]) -> Result<Vec<MulticastGroup>> {
    let mut groups = Vec::new();

    for item in AttrIter::new(data) {
        let (index, item_payload) = item?;
        let mut group = MulticastGroup {
            index,
            ..Default::default()
        };

        for field in AttrIter::new(item_payload) {
            let (kind, payload) = field?;
            match kind {
                t if t == CtrlAttrMcastGrp::Id as u16 => group.id = get::u16_ne(payload)?,
                t if t == CtrlAttrMcastGrp::Name as u16 => {
                    group.name = get::string(payload)?.to_string();
                }
                other => debug!(attr_type = other, "skipping unknown group attribute"),
            }
        }

        groups.push(group);
    }

    Ok(groups)
}

/// Query the kernel for every registered generic netlink family.
///
/// Writes one dump request, then drains the response stream: data messages
/// are decoded in order, an end-of-dump marker (or a plain ACK) terminates
/// cleanly, and a kernel error message surfaces as [`Error::Kernel`] with
/// the reported code.
pub fn dump_families<S: Transport>(socket: &mut S) -> Result<Vec<FamilyDescriptor>> {
    let request = CtrlRequestBuilder::new().next_dump_request();
    socket.send(&request)?;

    let mut families = Vec::new();
    let mut iter = ResponseIter::new(socket);

    while let Some(msg) = iter.advance()? {
        if msg.header.is_noop() {
            continue;
        }
        if msg.header.is_done() {
            break;
        }
        if msg.header.is_error() {
            let code = msg.error_code()?;
            if code == 0 {
                break; // ACK, nothing to report
            }
            return Err(Error::from_errno(code));
        }
        families.push(decode_family(&msg)?);
    }

    Ok(families)
}
