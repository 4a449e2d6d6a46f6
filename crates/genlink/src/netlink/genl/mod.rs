//! Generic Netlink (GENL) support.
//!
//! Generic netlink families are dynamically registered, name-addressed
//! control protocols. The controller family (`nlctrl`, fixed id
//! [`GENL_ID_CTRL`]) enumerates all of them; this module builds the
//! controller dump request and decodes the answers into
//! [`FamilyDescriptor`] records.

mod ctrl;
mod header;

pub use ctrl::{
    CtrlRequestBuilder, FamilyDescriptor, FamilyOp, MulticastGroup, decode_family, dump_families,
};
pub use header::{GENL_HDRLEN, GenlMsgHdr};

/// The controller family's fixed id (not dynamically assigned).
pub const GENL_ID_CTRL: u16 = 0x10;

/// Controller family commands.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CtrlCmd {
    Unspec = 0,
    NewFamily = 1,
    DelFamily = 2,
    GetFamily = 3,
    NewOps = 4,
    DelOps = 5,
    GetOps = 6,
    NewMcastGrp = 7,
    DelMcastGrp = 8,
    GetMcastGrp = 9,
    GetPolicy = 10,
}

/// Controller family attributes.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CtrlAttr {
    Unspec = 0,
    FamilyId = 1,
    FamilyName = 2,
    Version = 3,
    HdrSize = 4,
    MaxAttr = 5,
    Ops = 6,
    McastGroups = 7,
    Policy = 8,
    OpPolicy = 9,
    Op = 10,
}

/// Attributes of one entry in the `Ops` array.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CtrlAttrOp {
    Unspec = 0,
    Id = 1,
    Flags = 2,
}

/// Attributes of one entry in the `McastGroups` array.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CtrlAttrMcastGrp {
    Unspec = 0,
    Name = 1,
    Id = 2,
}
